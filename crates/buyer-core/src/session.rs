//! One negotiation between the seller and the buyer agent
//!
//! A turn records the seller's line, drifts prices, asks the agent for a
//! reply, settles any purchase the reply commits to, and writes the exchange
//! to memory before the clock moves on.

use anyhow::Result;
use chrono::NaiveDateTime;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use crate::agent::{AgentIdentity, BuyerAgent, MarketView};
use crate::catalog::Catalog;
use crate::clock::GameClock;
use crate::config::Config;
use crate::intent::IntentMatcher;
use crate::ledger::Ledger;
use crate::memory::MemoryLog;
use crate::openai::LanguageModel;

/// Seller inputs that end the conversation
const EXIT_WORDS: &[&str] = &["exit", "quit", "bye"];

const SELLER_LABEL: &str = "Seller";
const BUYER_LABEL: &str = "Buyer";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub asset: String,
    pub price: u64,
    pub timestamp: NaiveDateTime,
}

/// What came of the buyer's reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    Purchased {
        asset: String,
        price: u64,
        remaining: u64,
    },
    InsufficientBudget {
        asset: String,
        price: u64,
        budget: u64,
    },
    NoIntent,
}

impl PurchaseOutcome {
    /// Event text written to memory, if anything happened
    fn memory_text(&self, buyer: &str) -> Option<String> {
        match self {
            Self::Purchased {
                asset,
                price,
                remaining,
            } => Some(format!(
                "{} purchased the {} for {}. Remaining budget: {}.",
                buyer, asset, price, remaining
            )),
            Self::InsufficientBudget {
                asset,
                price,
                budget,
            } => Some(format!(
                "{} tried to buy the {} for {} but only had {} left.",
                buyer, asset, price, budget
            )),
            Self::NoIntent => None,
        }
    }
}

impl fmt::Display for PurchaseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Purchased {
                asset,
                price,
                remaining,
            } => write!(
                f,
                "Purchased {} for {} (remaining budget: {})",
                asset, price, remaining
            ),
            Self::InsufficientBudget {
                asset,
                price,
                budget,
            } => write!(
                f,
                "Cannot buy {} for {}: only {} left in budget",
                asset, price, budget
            ),
            Self::NoIntent => write!(f, "No purchase"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TurnReport {
    pub reply: String,
    pub outcome: PurchaseOutcome,
}

pub struct Session {
    agent: BuyerAgent,
    catalog: Catalog,
    ledger: Ledger,
    matcher: IntentMatcher,
    memory: MemoryLog,
    clock: GameClock,
    rng: StdRng,
    drift_percent: u64,
    starting_budget: u64,
    history: Vec<String>,
    purchases: Vec<PurchaseRecord>,
    turns: u64,
}

impl Session {
    /// Build a session and announce every asset to the buyer's memory
    pub fn new(config: &Config, model: Box<dyn LanguageModel>) -> Result<Self> {
        config.validate()?;

        let start = config.clock.start_time()?;
        let mut clock = GameClock::new(start, config.clock.major_step(), config.clock.minor_step());

        let rng = match config.market.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let catalog = Catalog::from_assets(config.assets.clone());
        let mut memory = MemoryLog::new();
        for asset in catalog.iter() {
            memory.add(
                format!("Available asset for purchase: {}", asset.summary()),
                start,
            );
        }
        clock.advance();

        let identity = AgentIdentity::from(config.agent.clone());
        info!(
            agent = %identity.name,
            model = model.name(),
            budget = config.market.budget,
            assets = catalog.len(),
            "session_started"
        );

        Ok(Self {
            agent: BuyerAgent::new(identity, model),
            catalog,
            ledger: Ledger::new(config.market.budget),
            matcher: IntentMatcher::default(),
            memory,
            clock,
            rng,
            drift_percent: config.market.drift_percent,
            starting_budget: config.market.budget,
            history: Vec::new(),
            purchases: Vec::new(),
            turns: 0,
        })
    }

    /// Whether the seller asked to end the conversation
    pub fn is_exit(utterance: &str) -> bool {
        let word = utterance.trim().to_lowercase();
        EXIT_WORDS.contains(&word.as_str())
    }

    /// Record the seller's closing line without asking the buyer
    pub fn close(&mut self, utterance: &str) {
        self.history.push(format!("{}: {}", SELLER_LABEL, utterance));
    }

    /// Run one exchange. On error the seller's line stays in the history.
    pub async fn turn(&mut self, utterance: &str) -> Result<TurnReport> {
        let seller_line = format!("{}: {}", SELLER_LABEL, utterance);
        self.history.push(seller_line.clone());

        self.catalog.apply_drift(&mut self.rng, self.drift_percent);

        let now = self.clock.now();
        let market = MarketView {
            catalog: &self.catalog,
            budget: self.ledger.balance(),
        };
        let reply = self.agent.say(utterance, market, &self.memory, now).await?;

        let buyer_line = format!("{}: {}", BUYER_LABEL, reply);
        self.history.push(buyer_line.clone());

        let outcome = self.settle(&reply);

        self.memory
            .add(format!("Conversation: {}\n{}", seller_line, buyer_line), now);
        if let Some(event) = outcome.memory_text(self.agent.name()) {
            self.clock.tick();
            self.memory.add(event, self.clock.now());
        }
        self.clock.advance();
        self.turns += 1;

        info!(
            turn = self.turns,
            outcome = %outcome,
            budget = self.ledger.balance(),
            "turn_complete"
        );

        Ok(TurnReport { reply, outcome })
    }

    fn settle(&mut self, reply: &str) -> PurchaseOutcome {
        let Some(asset) = self.matcher.detect(reply, &self.catalog) else {
            return PurchaseOutcome::NoIntent;
        };
        let Some(price) = self.catalog.get(&asset).map(|a| a.price) else {
            return PurchaseOutcome::NoIntent;
        };

        debug!(asset = %asset, price, "purchase_intent");

        match self.ledger.spend(price) {
            Ok(remaining) => {
                self.purchases.push(PurchaseRecord {
                    asset: asset.clone(),
                    price,
                    timestamp: self.clock.now(),
                });
                PurchaseOutcome::Purchased {
                    asset,
                    price,
                    remaining,
                }
            }
            Err(refused) => PurchaseOutcome::InsufficientBudget {
                asset,
                price,
                budget: refused.balance,
            },
        }
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn memory(&self) -> &MemoryLog {
        &self.memory
    }

    pub fn purchases(&self) -> &[PurchaseRecord] {
        &self.purchases
    }

    /// Completed exchanges; failed turns are not counted
    pub fn turns(&self) -> u64 {
        self.turns
    }

    pub fn starting_budget(&self) -> u64 {
        self.starting_budget
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    pub fn agent_name(&self) -> &str {
        self.agent.name()
    }

    pub fn model_name(&self) -> &str {
        self.agent.model_name()
    }
}
