/// Bearer token issuance and validation
///
/// Tokens are HS256-signed JWTs carrying the user ID as subject. They are
/// issued at registration and login and are the only credential accepted by
/// the authenticated endpoints.
///
/// # Example
///
/// ```
/// use kanmind_shared::auth::jwt::{create_token, validate_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
/// let token = create_token(&Claims::new(user_id), "a-secret-of-at-least-32-bytes!!!")?;
///
/// let claims = validate_token(&token, "a-secret-of-at-least-32-bytes!!!")?;
/// assert_eq!(claims.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer written into and required from every token
pub const ISSUER: &str = "kanmind";

/// Lifetime of an issued token
pub fn default_expiration() -> Duration {
    Duration::hours(24)
}

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token issuer")]
    InvalidIssuer,
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub sub: Uuid,

    /// Issuer - always "kanmind"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,
}

impl Claims {
    /// Claims for `user_id` with the default 24h lifetime
    pub fn new(user_id: Uuid) -> Self {
        Self::with_expiration(user_id, default_expiration())
    }

    pub fn with_expiration(user_id: Uuid, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            nbf: now.timestamp(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs `claims` with HS256
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&Header::new(Algorithm::HS256), claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Verifies signature, expiry, not-before and issuer, returning the claims
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::ValidationError(e.to_string()),
    })?;

    Ok(data.claims)
}
