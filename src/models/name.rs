//! Model names
//!
//! A model name doubles as a directory name under the models root, so it is
//! restricted to a conservative character set.

use std::fmt;

use crate::pdf::qr_sheet::model_initial;

/// Validated, filesystem-safe model name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelName(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidModelName {
    #[error("Model name is required")]
    Empty,

    #[error("Model name is longer than {max} characters")]
    TooLong { max: usize },

    #[error("Model name contains invalid character {0:?}")]
    InvalidCharacter(char),

    #[error("Model name may not start with '.'")]
    LeadingDot,
}

impl ModelName {
    pub const MAX_LEN: usize = 64;

    /// Trim and validate a raw name
    pub fn parse(raw: &str) -> Result<Self, InvalidModelName> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(InvalidModelName::Empty);
        }
        if name.chars().count() > Self::MAX_LEN {
            return Err(InvalidModelName::TooLong { max: Self::MAX_LEN });
        }
        if name.starts_with('.') {
            return Err(InvalidModelName::LeadingDot);
        }
        if let Some(bad) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ' ')))
        {
            return Err(InvalidModelName::InvalidCharacter(bad));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Uppercase first character, used in QR labels
    pub fn initial(&self) -> String {
        model_initial(&self.0)
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ModelName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
