//! Bearer token issuance and verification.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::{AuthConfig, MAX_TOKEN_TTL_HOURS};
use crate::error::AppError;

/// Claims carried by a storefront token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

/// Signs and checks HS256 tokens. Stateless: nothing is stored server side.
#[derive(Clone)]
pub struct TokenService {
    keys: Arc<Keys>,
}

impl TokenService {
    /// Configs built in code skip load-time validation, so the lifetime is
    /// clamped here as well.
    pub fn new(config: &AuthConfig) -> Self {
        let hours = config.token_ttl_hours.clamp(1, MAX_TOKEN_TTL_HOURS);
        Self::with_ttl(&config.secret, Duration::hours(hours))
    }

    pub fn with_ttl(secret: &str, ttl: Duration) -> Self {
        Self {
            keys: Arc::new(Keys {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
                ttl,
            }),
        }
    }

    pub fn issue(&self, user_id: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.keys.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding)
            .map_err(|e| AppError::Internal(format!("failed to sign token: {}", e)))
    }

    /// Returns the user id of a valid, unexpired token.
    pub fn verify(&self, token: &str) -> Result<String, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<Claims>(token, &self.keys.decoding, &validation)
            .map(|data| data.claims.sub)
            .map_err(|e| {
                tracing::debug!(error = %e, "token rejected");
                AppError::Unauthorized("Invalid or expired token".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_then_verify() {
        let tokens = TokenService::with_ttl("secret", Duration::hours(24));
        let token = tokens.issue("u-1").unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), "u-1");
    }

    #[test]
    fn test_expired_token_rejected() {
        // past the default 60s leeway
        let tokens = TokenService::with_ttl("secret", Duration::minutes(-5));
        let token = tokens.issue("u-1").unwrap();
        assert!(matches!(tokens.verify(&token), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let ours = TokenService::with_ttl("secret", Duration::hours(1));
        let theirs = TokenService::with_ttl("other-secret", Duration::hours(1));

        let token = theirs.issue("u-1").unwrap();
        assert!(matches!(ours.verify(&token), Err(AppError::Unauthorized(_))));
        assert!(matches!(ours.verify("not.a.token"), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_unbounded_ttl_is_clamped() {
        let config = AuthConfig {
            secret: "secret".to_string(),
            token_ttl_hours: i64::MAX,
        };
        let tokens = TokenService::new(&config);
        let token = tokens.issue("u-1").unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), "u-1");
    }
}
