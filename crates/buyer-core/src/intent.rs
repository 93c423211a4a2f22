//! Purchase intent detection over free-text buyer replies
//!
//! Detection is a case-insensitive search. An explicit
//! `DECISION: BUY <asset>` (or `PURCHASE`) / `DECISION: NONE` line wins;
//! otherwise the reply needs a purchase phrase, no rejection phrase, and a
//! catalog asset name. Every phrase must sit on word boundaries so "buy"
//! never fires on "Buyer". Curly apostrophes are folded to straight ones
//! before matching.

use tracing::debug;

use crate::catalog::Catalog;

const DECISION_MARKER: &str = "decision:";

const DEFAULT_PHRASES: &[&str] = &[
    "buy",
    "buys",
    "buying",
    "purchase",
    "purchases",
    "purchasing",
    "acquire",
    "acquires",
    "take it",
];

const DEFAULT_REJECTIONS: &[&str] = &[
    "not buy",
    "not to buy",
    "won't buy",
    "don't buy",
    "can't buy",
    "wouldn't buy",
    "shouldn't buy",
    "not purchase",
    "not to purchase",
    "won't purchase",
    "don't purchase",
    "declines to",
    "decline to",
    "declines the",
    "decline the",
    "pass on",
    "passes on",
    "not interested",
    "no deal",
    "cannot afford",
    "can't afford",
];

/// Verbs accepted after the decision marker
const DECISION_VERBS: &[&str] = &["buy", "purchase"];

#[derive(Debug, Clone)]
pub struct IntentMatcher {
    phrases: Vec<String>,
    rejections: Vec<String>,
}

impl Default for IntentMatcher {
    fn default() -> Self {
        Self::new(
            DEFAULT_PHRASES.iter().map(|s| s.to_string()).collect(),
            DEFAULT_REJECTIONS.iter().map(|s| s.to_string()).collect(),
        )
    }
}

impl IntentMatcher {
    pub fn new(phrases: Vec<String>, rejections: Vec<String>) -> Self {
        Self {
            phrases: phrases.iter().map(|p| fold(p)).collect(),
            rejections: rejections.iter().map(|r| fold(r)).collect(),
        }
    }

    /// Return the catalog name of the asset the reply commits to buying
    pub fn detect(&self, reply: &str, catalog: &Catalog) -> Option<String> {
        let text = fold(reply);

        if let Some(decision) = explicit_decision(&text) {
            debug!(decision, "decision_marker");
            return DECISION_VERBS
                .iter()
                .find_map(|verb| decision.strip_prefix(*verb))
                .and_then(|rest| first_asset(rest, catalog));
        }

        if !self.phrases.iter().any(|p| find_word(&text, p).is_some()) {
            return None;
        }
        if let Some(rejection) = self
            .rejections
            .iter()
            .find(|r| find_word(&text, r.as_str()).is_some())
        {
            debug!(rejection = %rejection, "purchase_rejected_in_reply");
            return None;
        }

        first_asset(&text, catalog)
    }
}

/// Lowercase with curly apostrophes straightened
fn fold(text: &str) -> String {
    text.to_lowercase().replace('\u{2019}', "'")
}

/// Text after the first `decision:` marker at the start of a line
fn explicit_decision(text: &str) -> Option<&str> {
    text.lines().find_map(|line| {
        line.trim()
            .trim_start_matches('*')
            .strip_prefix(DECISION_MARKER)
            .map(|rest| {
                rest.trim()
                    .trim_end_matches(|c: char| matches!(c, '.' | '!' | '*'))
                    .trim()
            })
    })
}

/// Asset whose name (or plural) appears earliest in `text`
fn first_asset(text: &str, catalog: &Catalog) -> Option<String> {
    catalog
        .iter()
        .filter_map(|asset| {
            let name = asset.name.to_lowercase();
            let plural = format!("{}s", name);
            let pos = [find_word(text, &name), find_word(text, &plural)]
                .into_iter()
                .flatten()
                .min()?;
            Some((pos, asset.name.clone()))
        })
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, name)| name)
}

/// Byte offset of the first occurrence of `needle` bounded by non-alphanumerics
fn find_word(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    haystack.match_indices(needle).map(|(i, _)| i).find(|&i| {
        let before = haystack[..i].chars().next_back();
        let after = haystack[i + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
