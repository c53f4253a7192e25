//! Flat-file token store
//!
//! Reads and writes `<root>/<model>/tokens.json` and resolves tokens back to
//! their model by scanning every model directory.

use std::path::{Path, PathBuf};

use super::types::{
    TokenError, TokenLocation, TokensFile, TOKENS_FILE_NAME, TOKEN_BYTES, TOKEN_LENGTH,
};

/// Generate an unguessable download token
///
/// 16 bytes from the thread-local CSPRNG, lowercase hex.
pub fn generate_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::random();
    hex::encode(bytes)
}

/// Check the public token format (`^[a-f0-9]{32}$`)
pub fn is_valid_token(token: &str) -> bool {
    token.len() == TOKEN_LENGTH
        && token
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Token persistence rooted at the models directory
#[derive(Debug, Clone)]
pub struct TokenStore {
    root: PathBuf,
}

impl TokenStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn tokens_path(&self, model: &str) -> PathBuf {
        self.root.join(model).join(TOKENS_FILE_NAME)
    }

    /// Load a model's token mapping
    ///
    /// Returns `None` when the file is missing, unreadable or not valid JSON.
    pub async fn read_tokens(&self, model: &str) -> Option<TokensFile> {
        read_tokens_at(&self.tokens_path(model)).await
    }

    /// Persist a model's full token mapping, replacing any previous content
    pub async fn write_tokens(&self, model: &str, tokens: &TokensFile) -> Result<(), TokenError> {
        let json = serde_json::to_vec_pretty(tokens)?;
        tokio::fs::write(self.tokens_path(model), json).await?;

        tracing::debug!(model = %model, tokens = tokens.len(), "Tokens written");
        Ok(())
    }

    /// Resolve a token to the model and day it was issued for
    ///
    /// Directories are visited in name order so the result is stable when a
    /// token (improbably) appears in more than one model.
    pub async fn lookup_token(&self, token: &str) -> Option<TokenLocation> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("Models directory not readable: {}", e);
                return None;
            }
        };

        let mut models = Vec::new();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
                    if is_dir {
                        models.push(entry.file_name().to_string_lossy().into_owned());
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Error scanning models directory: {}", e);
                    break;
                }
            }
        }
        models.sort();

        for model in models {
            if let Some(day) = self
                .read_tokens(&model)
                .await
                .and_then(|file| file.day_for_token(token))
            {
                return Some(TokenLocation { model, day });
            }
        }

        None
    }

    /// First token issued for `day` in `model`
    pub async fn token_for_day(&self, model: &str, day: u32) -> Option<String> {
        self.read_tokens(model)
            .await
            .and_then(|file| file.token_for_day(day).map(str::to_string))
    }
}

async fn read_tokens_at(path: &Path) -> Option<TokensFile> {
    let content = tokio::fs::read(path).await.ok()?;
    match serde_json::from_slice(&content) {
        Ok(file) => Some(file),
        Err(e) => {
            tracing::warn!(path = %path.display(), "Ignoring unparsable tokens file: {}", e);
            None
        }
    }
}
