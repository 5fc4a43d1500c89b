//! Bearer token authentication.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use cbams_models::UserId;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Claims carried by tokens issued at login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID; issuers emit it as a string or a number
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub role: Option<String>,
    /// Expiration
    pub exp: i64,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    })
}

/// Authenticated user extracted from request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: UserId,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: UserId(claims.id),
        }
    }
}

/// HS256 token verifier.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Verify signature and expiry.
    pub fn verify_token(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Token rejected: {}", e);
                ApiError::unauthorized(format!("Token validation failed: {}", e))
            })
    }
}

/// Axum extractor for authenticated user.
#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Invalid Authorization header format"))?;

        let claims = state.jwt.verify_token(token)?;

        Ok(AuthUser::from(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn token(claims: &serde_json::Value, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn future_exp() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn test_valid_token() {
        let verifier = JwtVerifier::new(SECRET);
        let jwt = token(&serde_json::json!({"id": "u-1", "role": "farmer", "exp": future_exp()}), SECRET);

        let claims = verifier.verify_token(&jwt).unwrap();
        assert_eq!(claims.id, "u-1");
        assert_eq!(claims.role.as_deref(), Some("farmer"));
    }

    #[test]
    fn test_numeric_id() {
        let verifier = JwtVerifier::new(SECRET);
        let jwt = token(&serde_json::json!({"id": 42, "exp": future_exp()}), SECRET);

        let user = AuthUser::from(verifier.verify_token(&jwt).unwrap());
        assert_eq!(user.id.to_string(), "42");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let verifier = JwtVerifier::new(SECRET);
        let jwt = token(&serde_json::json!({"id": "u-1", "exp": future_exp()}), "other");
        assert!(matches!(verifier.verify_token(&jwt), Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let verifier = JwtVerifier::new(SECRET);
        let exp = chrono::Utc::now().timestamp() - 3600;
        let jwt = token(&serde_json::json!({"id": "u-1", "exp": exp}), SECRET);
        assert!(verifier.verify_token(&jwt).is_err());
    }
}
