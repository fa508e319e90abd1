//! Session tokens
//!
//! Self-contained HS256 JWTs. No server-side session storage and no
//! revocation: any holder of the signing key can verify a token until
//! it expires.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::api::UserProfile;
use crate::config::SessionConfig;
use crate::error::AppError;

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Provider user ID
    pub sub: String,
    /// Provider username
    pub login: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration (unix seconds)
    pub exp: i64,
}

impl SessionClaims {
    /// Rebuild the profile this token was issued for
    pub fn profile(&self) -> Result<UserProfile, AppError> {
        let id = self.sub.parse().map_err(|_| AppError::Unauthorized)?;
        Ok(UserProfile {
            id,
            login: self.login.clone(),
            name: self.name.clone(),
            avatar_url: self.avatar_url.clone(),
            racket: None,
        })
    }
}

/// Signs and verifies session tokens with a symmetric key
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    key_is_empty: bool,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            key_is_empty: secret.is_empty(),
            ttl,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(
            config.signing_key.as_bytes(),
            Duration::seconds(config.ttl_seconds),
        )
    }

    /// Issue a session token for `profile`
    ///
    /// `sub` is the profile ID and `exp` is `iat + ttl`.
    ///
    /// # Errors
    /// `TokenSigning` if the key is empty or signing fails
    pub fn issue(&self, profile: &UserProfile) -> Result<String, AppError> {
        if self.key_is_empty {
            return Err(AppError::TokenSigning("signing key is empty".to_string()));
        }

        let now = Utc::now();
        let claims = SessionClaims {
            sub: profile.id.to_string(),
            login: profile.login.clone(),
            name: profile.name.clone(),
            avatar_url: profile.avatar_url.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )
        .map_err(|e| AppError::TokenSigning(e.to_string()))?;

        crate::metrics::SESSION_TOKENS_ISSUED_TOTAL.inc();
        tracing::debug!(sub = %claims.sub, exp = claims.exp, "Session token issued");

        Ok(token)
    }

    /// Verify signature and expiry of a session token
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AppError> {
        if self.key_is_empty {
            return Err(AppError::Unauthorized);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        jsonwebtoken::decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected session token");
                AppError::Unauthorized
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn octocat() -> UserProfile {
        UserProfile {
            id: 42,
            login: "octocat".to_string(),
            name: Some("The Octocat".to_string()),
            avatar_url: None,
            racket: None,
        }
    }

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(b"test-signing-key-that-is-long-enough", Duration::hours(24))
    }

    #[test]
    fn issued_token_carries_subject_and_24h_expiry() {
        let issuer = issuer();
        let before = Utc::now().timestamp();
        let token = issuer.issue(&octocat()).unwrap();

        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.login, "octocat");
        assert_eq!(claims.exp - claims.iat, 86_400);
        assert!((claims.exp - (before + 86_400)).abs() <= 1);
    }

    #[test]
    fn claims_rebuild_profile() {
        let issuer = issuer();
        let token = issuer.issue(&octocat()).unwrap();
        let profile = issuer.verify(&token).unwrap().profile().unwrap();
        assert_eq!(profile, octocat());
    }

    #[test]
    fn empty_key_cannot_sign() {
        let issuer = TokenIssuer::new(b"", Duration::hours(24));
        let error = issuer.issue(&octocat()).expect_err("empty key must fail");
        assert!(matches!(error, AppError::TokenSigning(_)));
    }

    #[test]
    fn verify_rejects_other_key() {
        let token = issuer().issue(&octocat()).unwrap();
        let other = TokenIssuer::new(b"a-completely-different-signing-key", Duration::hours(24));
        assert!(matches!(other.verify(&token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn verify_rejects_expired_token() {
        let issuer = TokenIssuer::new(b"test-signing-key-that-is-long-enough", Duration::seconds(-10));
        let token = issuer.issue(&octocat()).unwrap();
        assert!(matches!(issuer.verify(&token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn verify_rejects_garbage() {
        assert!(matches!(issuer().verify("not.a.jwt"), Err(AppError::Unauthorized)));
    }
}
