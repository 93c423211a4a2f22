//! LLM-backed buyer agent

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use tracing::debug;

use crate::catalog::Catalog;
use crate::config::AgentConfig;
use crate::memory::{MemoriesComponent, MemoryLog};
use crate::openai::{ChatMessage, LanguageModel};

/// Who the buyer is
#[derive(Debug, Clone)]
pub struct AgentIdentity {
    pub name: String,
    pub traits: String,
}

impl Default for AgentIdentity {
    fn default() -> Self {
        AgentConfig::default().into()
    }
}

impl From<AgentConfig> for AgentIdentity {
    fn from(config: AgentConfig) -> Self {
        Self {
            name: config.name,
            traits: config.traits,
        }
    }
}

/// Snapshot of the market the buyer sees when replying
#[derive(Debug, Clone, Copy)]
pub struct MarketView<'a> {
    pub catalog: &'a Catalog,
    pub budget: u64,
}

/// Buyer agent: composes its context and asks the language model what to say
pub struct BuyerAgent {
    identity: AgentIdentity,
    model: Box<dyn LanguageModel>,
    memories: MemoriesComponent,
}

impl BuyerAgent {
    pub fn new(identity: AgentIdentity, model: Box<dyn LanguageModel>) -> Self {
        Self {
            identity,
            model,
            memories: MemoriesComponent::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Reply to a seller utterance
    pub async fn say(
        &self,
        utterance: &str,
        market: MarketView<'_>,
        memory: &MemoryLog,
        now: NaiveDateTime,
    ) -> Result<String> {
        let messages = vec![
            ChatMessage::system(self.context(market, memory, now)),
            ChatMessage::user(format!(
                "Seller: {}\nWhat does {} say in response?",
                utterance, self.identity.name
            )),
        ];

        debug!(
            agent = %self.identity.name,
            model = self.model.name(),
            memories = memory.len(),
            "agent_say"
        );

        let reply = self
            .model
            .complete(&messages)
            .await
            .with_context(|| format!("{} failed to reply", self.identity.name))?;

        Ok(reply.trim().to_string())
    }

    fn context(&self, market: MarketView<'_>, memory: &MemoryLog, now: NaiveDateTime) -> String {
        let name = &self.identity.name;
        format!(
            "{instructions}\n\n\
             {name}'s traits: {traits}.\n\n\
             Current time: {now}.\n\n\
             Assets on offer:\n{assets}\n\
             {name}'s remaining budget: {budget}.\n\n\
             {component}:\n{memories}\n\
             {name} can only buy an asset whose price is within the remaining budget. \
             When {name} commits to buying an asset, end the reply with a line \
             \"DECISION: BUY <asset name>\". Otherwise end it with \"DECISION: NONE\".",
            instructions = self.instructions(),
            traits = self.identity.traits,
            now = now.format("%d %b %Y %H:%M"),
            assets = market.catalog.describe(),
            budget = market.budget,
            component = self.memories.name(),
            memories = self.memories.state(memory),
        )
    }

    fn instructions(&self) -> String {
        let name = &self.identity.name;
        format!(
            "The instructions for how to play the role of {name} are as follows. \
             This is a simulation of a buyer agent. The goal is to be realistic in \
             making purchasing decisions. It is important to play the role of a buyer \
             like {name} as accurately as possible, i.e., by responding in ways that \
             you think it is likely a buyer would respond, taking into account all \
             information about the assets and {name}'s traits. Always use third-person \
             limited perspective."
        )
    }
}
