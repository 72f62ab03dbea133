//! JWT authentication.
//!
//! Tokens carry the caller's id in `sub` and its roles in `roles`. The rest of
//! the API only ever sees the resulting [`Principal`].

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use herald_core::principal::{Principal, Role};

use crate::config::JwtConfig;
use crate::error::ApiError;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Not before (Unix timestamp)
    pub nbf: i64,
    /// JWT ID (unique identifier)
    pub jti: String,
    /// Granted roles
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl Claims {
    /// Builds the principal these claims describe.
    #[must_use]
    pub fn principal(&self) -> Principal {
        Principal::new(self.sub.clone(), self.roles.clone())
    }
}

/// JWT token manager.
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    expiration_secs: i64,
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("expiration_secs", &self.expiration_secs)
            .finish_non_exhaustive()
    }
}

impl JwtManager {
    /// Creates a new JWT manager from configuration.
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            expiration_secs: i64::try_from(config.expiration_secs).unwrap_or(i64::MAX),
        }
    }

    /// Issues a token for `user_id` with the given roles.
    pub fn generate_token(&self, user_id: &str, roles: &[Role]) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.expiration_secs);

        let claims = Claims {
            sub: user_id.to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            roles: roles.to_vec(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ApiError::Internal(format!("Failed to generate token: {e}")))
    }

    /// Validates a JWT token and returns the claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        let token_data: TokenData<Claims> = decode(token, &self.decoding_key, &validation)
            .map_err(|e| ApiError::Unauthorized(format!("Invalid token: {e}")))?;

        Ok(token_data.claims)
    }

    /// Validates a token and returns its principal.
    pub fn authenticate(&self, token: &str) -> Result<Principal, ApiError> {
        self.validate_token(token).map(|claims| claims.principal())
    }
}

/// Extracts the bearer token from an Authorization header value.
#[must_use]
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
}
