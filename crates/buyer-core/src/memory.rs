//! Append-only memory log of the negotiation

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Number of recent memories folded into the buyer's context
pub const RECENT_MEMORY_LIMIT: usize = 1000;

const TIMESTAMP_FORMAT: &str = "%d %b %Y %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub text: String,
    pub timestamp: NaiveDateTime,
}

impl MemoryEntry {
    fn render(&self, add_time: bool) -> String {
        if add_time {
            format!("[{}] {}", self.timestamp.format(TIMESTAMP_FORMAT), self.text)
        } else {
            self.text.clone()
        }
    }
}

/// Memories in insertion order. Nothing is ever removed.
#[derive(Debug, Clone, Default)]
pub struct MemoryLog {
    entries: Vec<MemoryEntry>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, text: impl Into<String>, timestamp: NaiveDateTime) {
        self.entries.push(MemoryEntry {
            text: text.into(),
            timestamp,
        });
    }

    /// The last `k` memories, oldest first
    pub fn retrieve_recent(&self, k: usize, add_time: bool) -> Vec<String> {
        let skip = self.entries.len().saturating_sub(k);
        self.entries[skip..]
            .iter()
            .map(|e| e.render(add_time))
            .collect()
    }

    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Context component exposing recent memories as one block of text
#[derive(Debug, Clone)]
pub struct MemoriesComponent {
    name: String,
}

impl Default for MemoriesComponent {
    fn default() -> Self {
        Self::new("memories")
    }
}

impl MemoriesComponent {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Recent memories joined by newlines, with a trailing newline
    pub fn state(&self, memory: &MemoryLog) -> String {
        let mut out = memory
            .retrieve_recent(RECENT_MEMORY_LIMIT, true)
            .join("\n");
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 10, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_insertion_order() {
        let mut log = MemoryLog::new();
        log.add("first", at(20));
        log.add("second", at(19));
        log.add("third", at(21));

        assert_eq!(
            log.retrieve_recent(10, false),
            vec!["first", "second", "third"]
        );
    }

    #[test]
    fn test_retrieve_recent_limits_to_tail() {
        let mut log = MemoryLog::new();
        for i in 0..5 {
            log.add(format!("m{}", i), at(20));
        }
        assert_eq!(log.retrieve_recent(2, false), vec!["m3", "m4"]);
        assert_eq!(log.retrieve_recent(0, false), Vec::<String>::new());
    }

    #[test]
    fn test_retrieve_with_time() {
        let mut log = MemoryLog::new();
        log.add("hello", at(20));
        assert_eq!(
            log.retrieve_recent(1, true),
            vec!["[01 Oct 2024 20:00:00] hello"]
        );
    }

    #[test]
    fn test_component_state() {
        let component = MemoriesComponent::default();
        let mut log = MemoryLog::new();
        assert_eq!(component.state(&log), "\n");

        log.add("a", at(20));
        log.add("b", at(21));
        assert_eq!(
            component.state(&log),
            "[01 Oct 2024 20:00:00] a\n[01 Oct 2024 21:00:00] b\n"
        );
        assert_eq!(component.name(), "memories");
    }
}
