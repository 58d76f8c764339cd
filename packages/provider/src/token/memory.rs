use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;

use super::{NewToken, ResumptionToken, TokenStore};
use crate::error::Result;

/// Token store held in process memory. Tokens do not survive a restart.
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<HashMap<String, ResumptionToken>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a fully formed token, bypassing minting.
    pub async fn insert(&self, token: ResumptionToken) {
        self.tokens.write().await.insert(token.id.clone(), token);
    }

    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn create(&self, token: NewToken, ttl: Duration) -> Result<ResumptionToken> {
        let token = token.mint(Utc::now(), ttl)?;
        self.insert(token.clone()).await;
        tracing::debug!(token = %token.id, cursor = token.cursor, "resumption token created");
        Ok(token)
    }

    async fn resolve(&self, id: &str) -> Result<Option<ResumptionToken>> {
        Ok(self.tokens.read().await.get(id).cloned())
    }

    async fn purge_expired(&self) -> Result<u64> {
        let now = Utc::now();
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, token| !token.is_expired(now));
        Ok((before - tokens.len()) as u64)
    }
}
