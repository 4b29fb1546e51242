//! JWT token service
//!
//! Verifies (and, for tests and tooling, issues) the HS256 access
//! tokens minted by the identity service.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use shared::models::order::UserRole;
use std::str::FromStr;
use thiserror::Error;

/// Expiry leeway to absorb clock skew between services
const EXPIRY_LEEWAY_SECS: u64 = 30;

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Shared HS256 secret (at least 32 bytes)
    pub secret: String,
    /// Token lifetime in minutes
    pub expiration_minutes: i64,
    /// Expected token issuer
    pub issuer: String,
    /// Expected token audience
    pub audience: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: load_jwt_secret(),
            expiration_minutes: std::env::var("JWT_EXPIRATION_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "auth-service".to_string()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "order-api".to_string()),
        }
    }
}

fn load_jwt_secret() -> String {
    match std::env::var("JWT_SECRET") {
        Ok(secret) if secret.len() >= 32 => secret,
        Ok(_) => {
            tracing::warn!("JWT_SECRET is shorter than 32 characters, generating a random key");
            generate_secure_jwt_secret()
        }
        Err(_) => {
            tracing::warn!("JWT_SECRET not set, generating a random key (tokens will not survive a restart)");
            generate_secure_jwt_secret()
        }
    }
}

/// Generate a printable 64-character random secret
pub fn generate_secure_jwt_secret() -> String {
    const ALLOWED: &[u8] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
    let rng = SystemRandom::new();
    let mut bytes = [0u8; 64];
    // SystemRandom failure means the platform RNG is broken; a fixed
    // fallback would silently weaken every token, so keep retrying.
    while rng.fill(&mut bytes).is_err() {}
    bytes
        .iter()
        .map(|b| ALLOWED[(*b as usize) % ALLOWED.len()] as char)
        .collect()
}

/// JWT claims carried in the access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id (subject)
    pub sub: String,
    /// Role name (customer / courier / manager / admin)
    pub role: String,
    /// Unique token id, the revocation key
    pub jti: String,
    /// Token type ("access")
    pub token_type: String,
    /// Expiry timestamp (seconds)
    pub exp: i64,
    /// Issued-at timestamp (seconds)
    pub iat: i64,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
}

/// JWT errors
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    ExpiredToken,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Token generation failed: {0}")]
    GenerationFailed(String),
}

/// JWT token service
#[derive(Debug, Clone)]
pub struct JwtService {
    pub config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    /// Create a new JWT service with default configuration
    pub fn new() -> Self {
        Self::with_config(JwtConfig::default())
    }

    /// Create a new JWT service with the given configuration
    pub fn with_config(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Issue a token for a user
    pub fn generate_token(&self, user_id: &str, role: UserRole) -> Result<String, JwtError> {
        let now = Utc::now();
        let expiration = now + Duration::minutes(self.config.expiration_minutes);

        let claims = Claims {
            sub: user_id.to_string(),
            role: role.as_str().to_string(),
            jti: shared::util::new_id(),
            token_type: "access".to_string(),
            exp: expiration.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    /// Verify signature, issuer, audience and expiry, then decode
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss", "aud"]);
        validation.leeway = EXPIRY_LEEWAY_SECS;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                ErrorKind::InvalidToken => JwtError::InvalidToken(e.to_string()),
                _ => JwtError::InvalidToken(format!("Token validation failed: {}", e)),
            }
        })?;

        Ok(token_data.claims)
    }

    /// Extract the token from an Authorization header
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ")
    }
}

impl Default for JwtService {
    fn default() -> Self {
        Self::new()
    }
}

/// Current user context (parsed from JWT claims)
///
/// Created by the auth middleware and injected into request extensions.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// User id
    pub id: String,
    /// Role from the token
    pub role: UserRole,
    /// Token id (jti), used for logout
    pub token_id: String,
    /// Token expiry, used to bound the revocation marker
    pub expires_at: DateTime<Utc>,
}

impl CurrentUser {
    /// Couriers and above
    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    /// Managers and admins
    pub fn is_manager(&self) -> bool {
        self.role.is_manager()
    }
}

impl TryFrom<Claims> for CurrentUser {
    type Error = JwtError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let role = UserRole::from_str(&claims.role).map_err(JwtError::InvalidToken)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| JwtError::InvalidToken(format!("invalid exp: {}", claims.exp)))?;
        Ok(Self {
            id: claims.sub,
            role,
            token_id: claims.jti,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> JwtService {
        JwtService::with_config(JwtConfig {
            secret: "test-secret-test-secret-test-secret!".to_string(),
            expiration_minutes: 60,
            issuer: "auth-service".to_string(),
            audience: "order-api".to_string(),
        })
    }

    #[test]
    fn test_jwt_generation_and_validation() {
        let service = test_service();

        let token = service
            .generate_token("user123", UserRole::Customer)
            .expect("Failed to generate test token");

        let claims = service
            .validate_token(&token)
            .expect("Failed to validate test token");

        assert_eq!(claims.sub, "user123");
        assert_eq!(claims.role, "customer");
        assert_eq!(claims.token_type, "access");
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = test_service();
        let now = Utc::now();
        // Expired beyond the leeway window
        let claims = Claims {
            sub: "user123".to_string(),
            role: "customer".to_string(),
            jti: shared::util::new_id(),
            token_type: "access".to_string(),
            exp: (now - Duration::minutes(10)).timestamp(),
            iat: (now - Duration::minutes(70)).timestamp(),
            iss: service.config.issuer.clone(),
            aud: service.config.audience.clone(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(service.config.secret.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            service.validate_token(&token),
            Err(JwtError::ExpiredToken)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let service = test_service();
        let other = JwtService::with_config(JwtConfig {
            secret: "another-secret-another-secret-another!".to_string(),
            ..service.config.clone()
        });

        let token = other.generate_token("user123", UserRole::Customer).unwrap();
        assert!(service.validate_token(&token).is_err());
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let service = test_service();
        let other = JwtService::with_config(JwtConfig {
            audience: "someone-else".to_string(),
            ..service.config.clone()
        });

        let token = other.generate_token("user123", UserRole::Customer).unwrap();
        assert!(service.validate_token(&token).is_err());
    }

    #[test]
    fn test_extract_from_header() {
        assert_eq!(JwtService::extract_from_header("Bearer abc"), Some("abc"));
        assert_eq!(JwtService::extract_from_header("Basic abc"), None);
    }

    #[test]
    fn test_current_user_from_claims() {
        let service = test_service();
        let token = service.generate_token("u1", UserRole::Manager).unwrap();
        let claims = service.validate_token(&token).unwrap();

        let user = CurrentUser::try_from(claims).unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.role, UserRole::Manager);
        assert!(user.is_staff());
        assert!(user.is_manager());
        assert!(user.expires_at > Utc::now());
    }

    #[test]
    fn test_unknown_role_rejected() {
        let claims = Claims {
            sub: "u1".to_string(),
            role: "superuser".to_string(),
            jti: "j1".to_string(),
            token_type: "access".to_string(),
            exp: Utc::now().timestamp() + 3600,
            iat: Utc::now().timestamp(),
            iss: "auth-service".to_string(),
            aud: "order-api".to_string(),
        };
        assert!(CurrentUser::try_from(claims).is_err());
    }
}
