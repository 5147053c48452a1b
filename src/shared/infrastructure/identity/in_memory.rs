use crate::shared::core::primitives::UserId;
use crate::shared::infrastructure::identity::{IdentityError, IdentityVerifier};
use std::collections::HashMap;

/// Fixed token table for tests and local development.
#[derive(Debug, Default)]
pub struct StaticIdentityVerifier {
    tokens: HashMap<String, UserId>,
}

impl StaticIdentityVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, uid: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), UserId::new(uid));
        self
    }
}

#[async_trait::async_trait]
impl IdentityVerifier for StaticIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<UserId, IdentityError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| IdentityError::Invalid("unknown token".into()))
    }
}
