//! Process-wide crypto code selection
//!
//! Explicitly constructed and passed by `Arc` to every consumer; guarded by a
//! readers-writer lock so concurrent reads never block each other.

use tokio::sync::RwLock;

/// Currently selected base cryptocurrency code. Defaults to BTC.
#[derive(Debug)]
pub struct SettingsStore {
    crypto_code: RwLock<String>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self {
            crypto_code: RwLock::new("BTC".to_string()),
        }
    }

    /// Current code. Always uppercase and non-empty.
    pub async fn get(&self) -> String {
        self.crypto_code.read().await.clone()
    }

    /// Store a new code, uppercased. Blank input is ignored so the stored
    /// code can never become empty; the HTTP boundary rejects it with an
    /// error before this is ever called.
    pub async fn set(&self, crypto_code: &str) {
        let trimmed = crypto_code.trim();
        if trimmed.is_empty() {
            return;
        }
        let mut code = self.crypto_code.write().await;
        *code = trimmed.to_uppercase();
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}
