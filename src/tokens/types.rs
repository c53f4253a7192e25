//! Token file types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// File name of the per-model token mapping
pub const TOKENS_FILE_NAME: &str = "tokens.json";

/// Number of random bytes in a token (hex-encoded to twice as many chars)
pub const TOKEN_BYTES: usize = 16;

/// Length of a token string
pub const TOKEN_LENGTH: usize = TOKEN_BYTES * 2;

/// Day a single token grants access to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMapping {
    pub day: u32,
}

/// Contents of `tokens.json`
///
/// ```json
/// {"tokens": {"<token>": {"day": 3}}}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokensFile {
    pub tokens: BTreeMap<String, TokenMapping>,
}

impl TokensFile {
    /// Issue one fresh token per day
    pub fn issue_for_days(days: impl IntoIterator<Item = u32>) -> Self {
        let tokens = days
            .into_iter()
            .map(|day| (super::generate_token(), TokenMapping { day }))
            .collect();
        Self { tokens }
    }

    /// First token mapped to `day`
    pub fn token_for_day(&self, day: u32) -> Option<&str> {
        self.tokens
            .iter()
            .find(|(_, mapping)| mapping.day == day)
            .map(|(token, _)| token.as_str())
    }

    /// Day a token maps to
    pub fn day_for_token(&self, token: &str) -> Option<u32> {
        self.tokens.get(token).map(|mapping| mapping.day)
    }

    /// Distinct days present in the mapping, ascending
    pub fn days(&self) -> Vec<u32> {
        let mut days: Vec<u32> = self.tokens.values().map(|m| m.day).collect();
        days.sort_unstable();
        days.dedup();
        days
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Where a token resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenLocation {
    pub model: String,
    pub day: u32,
}

/// Token persistence errors
///
/// Reads never fail (a missing or corrupt file is "no tokens"); only
/// writes surface errors.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Failed to write tokens file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize tokens: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(entries: &[(&str, u32)]) -> TokensFile {
        TokensFile {
            tokens: entries
                .iter()
                .map(|(t, d)| (t.to_string(), TokenMapping { day: *d }))
                .collect(),
        }
    }

    #[test]
    fn test_wire_format() {
        let file = mapping(&[("abc", 2)]);
        let json = serde_json::to_string(&file).unwrap();
        assert_eq!(json, r#"{"tokens":{"abc":{"day":2}}}"#);

        let parsed: TokensFile = serde_json::from_str(r#"{"tokens":{"x":{"day":7}}}"#).unwrap();
        assert_eq!(parsed.day_for_token("x"), Some(7));
    }

    #[test]
    fn test_days_are_distinct_and_sorted() {
        let file = mapping(&[("a", 5), ("b", 1), ("c", 5), ("d", 3)]);
        assert_eq!(file.days(), vec![1, 3, 5]);
    }

    #[test]
    fn test_token_for_day() {
        let file = mapping(&[("a", 5), ("b", 1)]);
        assert_eq!(file.token_for_day(1), Some("b"));
        assert_eq!(file.token_for_day(9), None);
    }

    #[test]
    fn test_issue_for_days() {
        let file = TokensFile::issue_for_days([1, 2, 3]);
        assert_eq!(file.len(), 3);
        assert_eq!(file.days(), vec![1, 2, 3]);
        for day in 1..=3 {
            let token = file.token_for_day(day).unwrap();
            assert_eq!(token.len(), TOKEN_LENGTH);
        }
    }
}
