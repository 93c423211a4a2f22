//! Negotiation transcripts and REPL input history
//!
//! A transcript is a JSON snapshot of one negotiation, written on request.

use anyhow::{Context, Result};
use buyer_core::{PurchaseRecord, Session};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// A saved negotiation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Unique identifier
    pub id: String,
    /// Model the buyer ran on
    pub model: String,
    /// When the conversation started (wall clock)
    pub started_at: DateTime<Utc>,
    /// When the transcript was written
    pub saved_at: DateTime<Utc>,
    pub starting_budget: u64,
    pub final_budget: u64,
    /// Chat lines in the order they were spoken
    pub history: Vec<String>,
    pub purchases: Vec<PurchaseRecord>,
}

impl Transcript {
    /// Snapshot the current state of a session
    pub fn capture(id: &str, started_at: DateTime<Utc>, session: &Session) -> Self {
        Self {
            id: id.to_string(),
            model: session.model_name().to_string(),
            started_at,
            saved_at: Utc::now(),
            starting_budget: session.starting_budget(),
            final_budget: session.ledger().balance(),
            history: session.history().to_vec(),
            purchases: session.purchases().to_vec(),
        }
    }

    /// Total spent across all purchases. Zero for a transcript whose final
    /// budget exceeds its starting one.
    pub fn spent(&self) -> u64 {
        self.starting_budget.saturating_sub(self.final_budget)
    }
}

/// Manages transcript storage
pub struct TranscriptStore {
    dir: PathBuf,
}

impl TranscriptStore {
    /// Create a store in the platform data directory
    pub fn new() -> Result<Self> {
        let dir = data_dir().join("transcripts");
        Self::with_dir(dir)
    }

    /// Create a store in a specific directory
    pub fn with_dir(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).context("Failed to create transcripts directory")?;
        Ok(Self { dir })
    }

    /// Save a transcript, overwriting any earlier save with the same id
    pub fn save(&self, transcript: &Transcript) -> Result<PathBuf> {
        let path = self.path_for(&transcript.id);
        let content =
            serde_json::to_string_pretty(transcript).context("Failed to serialize transcript")?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!(id = %transcript.id, path = %path.display(), "Saved transcript");
        Ok(path)
    }

    /// Load a transcript by id
    pub fn load(&self, id: &str) -> Result<Transcript> {
        let path = self.path_for(id);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Transcript not found: {}", id))?;
        serde_json::from_str(&content).context("Failed to parse transcript")
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }
}

/// REPL input history location
pub struct InputHistory {
    path: PathBuf,
}

impl InputHistory {
    pub fn new() -> Result<Self> {
        let dir = data_dir();
        fs::create_dir_all(&dir)?;

        Ok(Self {
            path: dir.join("history"),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("buyer-sim")
}

/// Fresh transcript id
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn sample(id: &str) -> Transcript {
        let bought_at = NaiveDate::from_ymd_opt(2024, 10, 1)
            .unwrap()
            .and_hms_opt(20, 30, 10)
            .unwrap();

        Transcript {
            id: id.to_string(),
            model: "gpt-4o".to_string(),
            started_at: Utc::now(),
            saved_at: Utc::now(),
            starting_budget: 5_000,
            final_budget: 3_830,
            history: vec![
                "Seller: laptop for 1170?".to_string(),
                "Buyer: Deal.\nDECISION: BUY Laptop".to_string(),
                "Seller: bye".to_string(),
            ],
            purchases: vec![PurchaseRecord {
                asset: "Laptop".to_string(),
                price: 1_170,
                timestamp: bought_at,
            }],
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = TranscriptStore::with_dir(dir.path().join("t")).unwrap();

        let transcript = sample("abc");
        let path = store.save(&transcript).unwrap();
        assert!(path.ends_with("abc.json"));

        let loaded = store.load("abc").unwrap();
        assert_eq!(loaded.history, transcript.history);
        assert_eq!(loaded.purchases, transcript.purchases);
        assert_eq!(loaded.spent(), 1_170);
    }

    #[test]
    fn test_spent_with_edited_budgets() {
        let dir = TempDir::new().unwrap();
        let store = TranscriptStore::with_dir(dir.path()).unwrap();

        let mut transcript = sample("edited");
        transcript.starting_budget = 100;
        transcript.final_budget = 200;
        store.save(&transcript).unwrap();

        let loaded = store.load("edited").unwrap();
        assert_eq!(loaded.spent(), 0);
    }

    #[test]
    fn test_load_missing() {
        let dir = TempDir::new().unwrap();
        let store = TranscriptStore::with_dir(dir.path()).unwrap();
        assert!(store.load("missing").is_err());
    }

    #[test]
    fn test_new_id_is_unique() {
        assert_ne!(new_id(), new_id());
        assert_eq!(new_id().len(), 36);
    }
}
