#![deny(clippy::all, clippy::pedantic, clippy::nursery, warnings)]

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use knowledge_core_core::error::{Error, Result};

/// Bearer token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Authenticated subject (user or service identifier)
    pub sub: String,
    /// Expiry as unix seconds
    pub exp: i64,
}

/// Issue an HS256 bearer token for a subject.
///
/// # Errors
/// Returns an auth error if signing fails
pub fn create_token(subject: &str, secret: &str, expiration_secs: u64) -> Result<String> {
    let exp = OffsetDateTime::now_utc().unix_timestamp()
        + i64::try_from(expiration_secs).unwrap_or(86400);
    let claims = Claims {
        sub: subject.to_string(),
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Auth(format!("Token generation failed: {e}")))
}

/// Decode and validate a bearer token.
///
/// # Errors
/// Returns an auth error for expired or malformed tokens
pub fn validate_token(token: &str, secret: &str) -> Result<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            Error::Auth("Token has expired".to_string())
        }
        _ => Error::Auth("Invalid token".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let token = create_token("sophia", "secret", 3600).unwrap();
        let claims = validate_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, "sophia");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_token("sophia", "secret", 3600).unwrap();
        assert!(validate_token(&token, "other").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = create_token("sophia", "secret", 0).unwrap();
        // Validation applies default leeway, so force an already-old expiry
        let claims = Claims {
            sub: "sophia".to_string(),
            exp: OffsetDateTime::now_utc().unix_timestamp() - 600,
        };
        let stale = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(validate_token(&stale, "secret").is_err());
        // A zero-lifetime token is within leeway and still accepted
        assert!(validate_token(&token, "secret").is_ok());
    }
}
