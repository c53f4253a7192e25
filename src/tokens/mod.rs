//! Download tokens
//!
//! Each model directory carries a `tokens.json` mapping opaque tokens to
//! day numbers. Tokens are the only credential on the public download path,
//! so they are 16 random bytes rendered as lowercase hex.
//!
//! Lookup by token walks every model directory. That is fine for a handful
//! of calendars; a reverse index would be needed beyond that.

pub mod store;
pub mod types;

pub use store::{generate_token, is_valid_token, TokenStore};
pub use types::*;
