//! JWT bearer authentication.
//!
//! Tokens are HS256-signed by the credential service; this server only
//! verifies them and trusts the subject claim as the tenant identifier.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

/// Role carried in the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Viewer,
    Editor,
    Admin,
}

impl Role {
    /// Uploads are restricted to editors and admins.
    pub fn can_upload(&self) -> bool {
        matches!(self, Role::Editor | Role::Admin)
    }
}

/// Decoded token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Tenant identifier (the authenticated user)
    pub sub: String,
    /// Role for authorization decisions
    pub role: Role,
    /// Expiration (unix seconds)
    pub exp: i64,
    /// Issued at (unix seconds)
    pub iat: i64,
}

impl Claims {
    /// Tenant identifier (alias for sub).
    pub fn tenant_id(&self) -> &str {
        &self.sub
    }
}

/// HS256 token verifier.
pub struct JwtVerifier {
    decoding: DecodingKey,
    encoding: EncodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Create a verifier from a shared secret.
    pub fn new(secret: &str) -> Self {
        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Create from the `JWT_SECRET` environment variable.
    pub fn from_env() -> Result<Self, ApiError> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| ApiError::internal("JWT_SECRET not set"))?;
        Ok(Self::new(&secret))
    }

    /// Verify a bearer token.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))
    }

    /// Sign a token. Used by tests and operational tooling; issuance in
    /// production belongs to the credential service.
    pub fn sign(&self, tenant_id: &str, role: Role, ttl_secs: i64) -> Result<String, ApiError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: tenant_id.to_string(),
            role,
            exp: now + ttl_secs,
            iat: now,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ApiError::internal(format!("Failed to sign token: {}", e)))
    }
}

/// Authenticated caller extracted from the Authorization header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub tenant_id: String,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            tenant_id: claims.sub,
            role: claims.role,
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Expected Bearer token"))?;

        let claims = state.jwt.verify(token)?;
        Ok(AuthUser::from(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify_roundtrip() {
        let verifier = JwtVerifier::new("test-secret");
        let token = verifier.sign("tenant-1", Role::Editor, 3600).unwrap();

        let claims = verifier.verify(&token).unwrap();
        assert_eq!(claims.tenant_id(), "tenant-1");
        assert_eq!(claims.role, Role::Editor);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let signer = JwtVerifier::new("secret-a");
        let verifier = JwtVerifier::new("secret-b");
        let token = signer.sign("tenant-1", Role::Admin, 3600).unwrap();

        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let verifier = JwtVerifier::new("test-secret");
        let token = verifier.sign("tenant-1", Role::Viewer, -120).unwrap();

        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_upload_roles() {
        assert!(!Role::Viewer.can_upload());
        assert!(Role::Editor.can_upload());
        assert!(Role::Admin.can_upload());
    }
}
