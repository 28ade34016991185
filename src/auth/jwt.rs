//! JWT Token Provider
//! Mission: Issue and verify signed bearer tokens

use crate::auth::models::TokenClaims;
use crate::auth::principal::UserPrincipal;
use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use std::fmt;
use tracing::debug;

/// Issuer claim stamped into every token.
pub const TOKEN_ISSUER: &str = "Member Portal";

/// Response header carrying a freshly issued token after login.
pub const JWT_TOKEN_HEADER: &str = "Jwt-Token";

/// Scheme prefix expected on the Authorization request header.
pub const TOKEN_PREFIX: &str = "Bearer ";

/// Why a presented token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Signature does not verify against the configured secret and
    /// algorithm.
    InvalidSignature,
    /// Claim expiry is in the past.
    Expired,
    /// The token structure or claims cannot be parsed.
    Malformed,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::InvalidSignature => write!(f, "token signature can not be verified"),
            TokenError::Expired => write!(f, "token has expired"),
            TokenError::Malformed => write!(f, "token is malformed"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Stateless HS256 token provider. Issuance and verification read only
/// the process secret and the clock, so a single instance is shared
/// freely across tasks.
pub struct TokenProvider {
    secret: String,
    expiration_hours: i64,
}

impl TokenProvider {
    /// Create a provider with the default 24-hour token lifetime.
    pub fn new(secret: String) -> Self {
        Self {
            secret,
            expiration_hours: 24,
        }
    }

    /// Create a provider with a custom lifetime (hours).
    pub fn with_lifetime_hours(secret: String, expiration_hours: i64) -> Self {
        Self {
            secret,
            expiration_hours,
        }
    }

    /// Issue a token for an authenticated principal.
    ///
    /// Claims carry the username as subject plus the principal's full
    /// authority list, so authorization decisions on later requests
    /// need no user lookup.
    pub fn generate_token(&self, principal: &UserPrincipal) -> Result<String> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(chrono::Duration::hours(self.expiration_hours))
            .context("Invalid timestamp")?
            .timestamp() as usize;

        let claims = TokenClaims {
            sub: principal.username.clone(),
            authorities: principal.authorities().to_vec(),
            iss: TOKEN_ISSUER.to_string(),
            iat: now.timestamp() as usize,
            exp: expiration,
        };

        debug!(
            username = %principal.username,
            expires_in_hours = self.expiration_hours,
            "Generating JWT"
        );

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to generate JWT")
    }

    /// Verify a token and extract its claims.
    ///
    /// The algorithm is pinned to HS256 and expiry is checked with zero
    /// leeway; there is no algorithm negotiation.
    pub fn verify_token(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[TOKEN_ISSUER]);

        let decoded = decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                TokenError::InvalidSignature
            }
            _ => TokenError::Malformed,
        })?;

        debug!(username = %decoded.claims.sub, "Validated JWT");

        Ok(decoded.claims)
    }
}

/// Strip the bearer scheme from an Authorization header value.
pub fn strip_bearer(header_value: &str) -> Option<&str> {
    header_value.strip_prefix(TOKEN_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::attempts::LoginAttemptTracker;
    use crate::auth::models::UserRecord;
    use crate::auth::roles::Role;
    use chrono::Utc;

    fn test_principal(role: Role) -> UserPrincipal {
        let record = UserRecord {
            id: 1,
            member_id: "1111111111".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: "test@example.com".to_string(),
            username: "testuser".to_string(),
            password_hash: "hash".to_string(),
            profile_image_url: None,
            last_login_date: None,
            last_login_date_display: None,
            date_of_join: Utc::now(),
            role,
            active: true,
            not_locked: true,
        };
        UserPrincipal::from_record(&record, &LoginAttemptTracker::default())
    }

    #[test]
    fn test_generate_and_verify_round_trip() {
        let provider = TokenProvider::new("test-secret-key-12345".to_string());
        let principal = test_principal(Role::User);

        let token = provider.generate_token(&principal).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let claims = provider.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "testuser");
        assert_eq!(claims.authorities, principal.authorities());
        assert_eq!(claims.iss, TOKEN_ISSUER);
        assert!(claims.exp > Utc::now().timestamp() as usize);
    }

    #[test]
    fn test_admin_token_carries_full_authority_set() {
        let provider = TokenProvider::new("test-secret-key-12345".to_string());
        let claims = provider
            .verify_token(&provider.generate_token(&test_principal(Role::Admin)).unwrap())
            .unwrap();
        assert_eq!(
            claims.authorities,
            ["user:read", "user:update", "user:create", "user:delete"]
        );
    }

    #[test]
    fn test_expired_token_fails_as_expired_only() {
        let provider = TokenProvider::with_lifetime_hours("secret".to_string(), -1);
        let token = provider.generate_token(&test_principal(Role::User)).unwrap();

        assert_eq!(provider.verify_token(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_tampered_signature_is_invalid_signature() {
        let provider = TokenProvider::new("test-secret-key-12345".to_string());
        let token = provider.generate_token(&test_principal(Role::User)).unwrap();

        // Flip one character of the signature segment to another valid
        // base64url character.
        let (head, signature) = token.rsplit_once('.').unwrap();
        let mut sig: Vec<u8> = signature.bytes().collect();
        sig[0] = if sig[0] == b'A' { b'B' } else { b'A' };
        let tampered = format!("{}.{}", head, String::from_utf8(sig).unwrap());

        assert_eq!(
            provider.verify_token(&tampered),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_token_from_different_secret_rejected() {
        let issuing = TokenProvider::new("secret-one".to_string());
        let verifying = TokenProvider::new("secret-two".to_string());
        let token = issuing.generate_token(&test_principal(Role::User)).unwrap();

        assert_eq!(
            verifying.verify_token(&token),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_garbage_token_is_malformed() {
        let provider = TokenProvider::new("secret".to_string());
        assert_eq!(
            provider.verify_token("not.a.token"),
            Err(TokenError::Malformed)
        );
        assert_eq!(provider.verify_token(""), Err(TokenError::Malformed));
    }

    #[test]
    fn test_strip_bearer_prefix() {
        assert_eq!(strip_bearer("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(strip_bearer("bearer abc"), None);
        assert_eq!(strip_bearer("abc"), None);
    }
}
