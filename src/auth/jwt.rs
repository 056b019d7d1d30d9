//! JWT Token Handler
//! Mission: Generate and validate JWT tokens securely

use crate::auth::models::{Claims, User};
use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use tracing::debug;

/// Default token lifetime
pub const DEFAULT_EXPIRATION_HOURS: i64 = 24;

/// Longest accepted token lifetime (one year)
pub const MAX_EXPIRATION_HOURS: i64 = 24 * 365;

/// Why a presented token was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Signature does not match (tampered, or signed with another secret)
    InvalidSignature,
    /// Not a structurally valid token, or the claims do not decode
    Malformed,
    /// Signature fine but `exp` has passed
    Expired,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::InvalidSignature => write!(f, "Invalid token signature"),
            TokenError::Malformed => write!(f, "Malformed token"),
            TokenError::Expired => write!(f, "Token expired"),
        }
    }
}

impl std::error::Error for TokenError {}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        }
    }
}

/// JWT Handler for token operations
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiration_hours: i64,
}

impl JwtHandler {
    /// Create a new JWT handler with secret key
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
            expiration_hours: DEFAULT_EXPIRATION_HOURS,
        }
    }

    /// Override token lifetime, clamped to `1..=MAX_EXPIRATION_HOURS`
    pub fn with_expiration_hours(mut self, hours: i64) -> Self {
        self.expiration_hours = hours.clamp(1, MAX_EXPIRATION_HOURS);
        self
    }

    /// Generate a JWT token for a user, returning the token and its lifetime in seconds
    pub fn generate_token(&self, user: &User) -> Result<(String, usize)> {
        let now = Utc::now();
        let lifetime =
            chrono::Duration::try_hours(self.expiration_hours).context("Token lifetime out of range")?;
        let expiration = now
            .checked_add_signed(lifetime)
            .context("Invalid timestamp")?
            .timestamp() as usize;

        let expires_in = self
            .expiration_hours
            .checked_mul(3600)
            .and_then(|secs| usize::try_from(secs).ok())
            .context("Token lifetime out of range")?;

        let claims = Claims {
            sub: user.id,
            role: user.role,
            university_id: user.university_id,
            iat: now.timestamp() as usize,
            exp: expiration,
        };

        debug!(
            "Generating JWT for user {} ({}), expires in {}h",
            user.username, user.id, self.expiration_hours
        );

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .context("Failed to generate JWT")?;

        Ok((token, expires_in))
    }

    /// Validate a JWT token and extract claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, TokenError> {
        let decoded = decode::<Claims>(token, &self.decoding_key, &self.validation)?;

        debug!("Validated JWT for user {}", decoded.claims.sub);

        Ok(decoded.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::UserRole;

    fn create_test_user(role: UserRole, university_id: Option<i64>) -> User {
        User {
            id: 42,
            username: "testuser".to_string(),
            password_hash: "hash".to_string(),
            role,
            university_id,
            created_at: Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn test_jwt_generation_and_validation() {
        let handler = JwtHandler::new("test-secret-key-12345");
        let user = create_test_user(UserRole::Regular, Some(7));

        let (token, expires_in) = handler.generate_token(&user).unwrap();
        assert!(!token.is_empty());
        assert_eq!(expires_in, 24 * 3600);

        let claims = handler.validate_token(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, UserRole::Regular);
        assert_eq!(claims.university_id, Some(7));
        assert!(claims.exp > Utc::now().timestamp() as usize);
    }

    #[test]
    fn test_claims_without_university() {
        let handler = JwtHandler::new("test-secret-key-12345");
        let user = create_test_user(UserRole::SuperAdmin, None);

        let (token, _) = handler.generate_token(&user).unwrap();
        let claims = handler.validate_token(&token).unwrap();

        assert_eq!(claims.role, UserRole::SuperAdmin);
        assert_eq!(claims.university_id, None);
    }

    #[test]
    fn test_malformed_token_rejected() {
        let handler = JwtHandler::new("test-secret-key-12345");

        assert_eq!(
            handler.validate_token("invalid.token.here"),
            Err(TokenError::Malformed)
        );
        assert_eq!(handler.validate_token("abc"), Err(TokenError::Malformed));
        assert_eq!(handler.validate_token(""), Err(TokenError::Malformed));
    }

    #[test]
    fn test_different_secrets_reject() {
        let handler1 = JwtHandler::new("secret1");
        let handler2 = JwtHandler::new("secret2");
        let user = create_test_user(UserRole::Vip, None);

        let (token, _) = handler1.generate_token(&user).unwrap();

        assert_eq!(
            handler2.validate_token(&token),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let handler = JwtHandler::new("test-secret-key-12345");
        let regular = create_test_user(UserRole::Regular, Some(7));
        let admin = create_test_user(UserRole::SuperAdmin, None);

        let (regular_token, _) = handler.generate_token(&regular).unwrap();
        let (admin_token, _) = handler.generate_token(&admin).unwrap();

        // Graft the admin payload onto the regular user's signature
        let r: Vec<&str> = regular_token.split('.').collect();
        let a: Vec<&str> = admin_token.split('.').collect();
        let forged = format!("{}.{}.{}", r[0], a[1], r[2]);

        assert_eq!(
            handler.validate_token(&forged),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_expired_token_rejected() {
        let handler = JwtHandler::new("test-secret-key-12345");
        let past = (Utc::now().timestamp() - 3 * 3600) as usize;
        let claims = Claims {
            sub: 1,
            role: UserRole::Regular,
            university_id: None,
            iat: past - 3600,
            exp: past,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret-key-12345"),
        )
        .unwrap();

        assert_eq!(handler.validate_token(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_custom_expiration() {
        let handler = JwtHandler::new("s").with_expiration_hours(2);
        let (_, expires_in) = handler
            .generate_token(&create_test_user(UserRole::Vip, None))
            .unwrap();
        assert_eq!(expires_in, 7200);
    }

    #[test]
    fn test_expiration_is_clamped() {
        let user = create_test_user(UserRole::Regular, None);

        let (_, expires_in) = JwtHandler::new("s")
            .with_expiration_hours(0)
            .generate_token(&user)
            .unwrap();
        assert_eq!(expires_in, 3600);

        for hours in [i64::MAX / 1000, 10_000_000_000, i64::MAX] {
            let handler = JwtHandler::new("s").with_expiration_hours(hours);
            let (token, expires_in) = handler.generate_token(&user).unwrap();
            assert_eq!(expires_in, (MAX_EXPIRATION_HOURS * 3600) as usize);
            assert!(handler.validate_token(&token).is_ok());
        }
    }
}
