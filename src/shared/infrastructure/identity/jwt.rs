use crate::shared::core::primitives::UserId;
use crate::shared::infrastructure::identity::{IdentityError, IdentityVerifier};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
}

/// HS256 bearer token verifier. The `sub` claim is the user id.
pub struct JwtIdentityVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

#[async_trait::async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<UserId, IdentityError> {
        let data = decode::<IdTokenClaims>(token, &self.key, &self.validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => IdentityError::Expired,
                ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) => {
                    IdentityError::Malformed(err.to_string())
                }
                _ => IdentityError::Invalid(err.to_string()),
            }
        })?;
        if data.claims.sub.is_empty() {
            return Err(IdentityError::Invalid("empty subject".into()));
        }
        Ok(UserId::new(data.claims.sub))
    }
}
