//! buyer-core: Negotiation loop between a seller and an LLM-backed buyer
//!
//! Provides:
//! - Configuration loading (buyer.toml)
//! - OpenAI-compatible chat client
//! - Budget ledger and asset catalog with price drift
//! - Purchase intent detection over free-text replies
//! - Simulated clock and memory log
//! - Buyer agent and the per-turn negotiation session

pub mod agent;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod intent;
pub mod ledger;
pub mod memory;
pub mod openai;
pub mod session;

pub use agent::{AgentIdentity, BuyerAgent, MarketView};
pub use catalog::{Asset, Catalog};
pub use clock::GameClock;
pub use config::Config;
pub use intent::IntentMatcher;
pub use ledger::{InsufficientFunds, Ledger};
pub use memory::{MemoriesComponent, MemoryEntry, MemoryLog};
pub use openai::{ChatMessage, LanguageModel, OpenAiClient, Role};
pub use session::{PurchaseOutcome, PurchaseRecord, Session, TurnReport};
