use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use model::entities::user::{self, UserRole};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::schemas::AppState;

/// Issued tokens are valid for one day.
const TOKEN_LIFETIME_HOURS: i64 = 24;

/// JWT claims carried by every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i32,
    pub username: String,
    pub role: UserRole,
    /// Expiration (unix seconds)
    pub exp: usize,
    /// Issued at (unix seconds)
    pub iat: usize,
    /// Token id
    pub jti: String,
}

/// Sign a token for the given user (HS256).
pub fn issue_token(user: &user::Model, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        role: user.role,
        exp: (now + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp() as usize,
        iat: now.timestamp() as usize,
        jti: Uuid::new_v4().to_string(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verify a token's signature and expiry and return its claims.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// The authenticated caller, extracted from the `Authorization` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
    pub role: UserRole,
}

impl AuthUser {
    /// Resolve which user's rows the caller may operate on.
    ///
    /// Regular users are pinned to their own rows; admin and manager
    /// roles may target any user via an explicit `user_id` filter.
    pub fn effective_user_id(&self, requested: Option<i32>) -> Result<i32, StatusCode> {
        match requested {
            None => Ok(self.id),
            Some(id) if id == self.id => Ok(id),
            Some(id) if self.role.is_elevated() => Ok(id),
            Some(id) => {
                warn!(
                    caller = self.id,
                    requested = id,
                    "Rejected cross-user access for non-elevated caller"
                );
                Err(StatusCode::FORBIDDEN)
            }
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let claims = decode_token(token, &state.jwt_secret).map_err(|e| {
            debug!("Rejected bearer token: {}", e);
            StatusCode::UNAUTHORIZED
        })?;

        Ok(AuthUser {
            id: claims.sub,
            username: claims.username,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user(role: UserRole) -> user::Model {
        user::Model {
            id: 42,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "irrelevant".to_string(),
            role,
        }
    }

    #[test]
    fn test_token_round_trip() {
        let token = issue_token(&test_user(UserRole::User), "secret").unwrap();
        let claims = decode_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, UserRole::User);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = issue_token(&test_user(UserRole::User), "secret").unwrap();
        assert!(decode_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
        assert!(!verify_password("hunter2", "not-a-bcrypt-hash"));
    }

    #[test]
    fn test_effective_user_id_rules() {
        let regular = AuthUser {
            id: 1,
            username: "u".to_string(),
            role: UserRole::User,
        };
        assert_eq!(regular.effective_user_id(None), Ok(1));
        assert_eq!(regular.effective_user_id(Some(1)), Ok(1));
        assert_eq!(regular.effective_user_id(Some(2)), Err(StatusCode::FORBIDDEN));

        let admin = AuthUser {
            id: 1,
            username: "a".to_string(),
            role: UserRole::Admin,
        };
        assert_eq!(admin.effective_user_id(Some(2)), Ok(2));

        let manager = AuthUser {
            id: 1,
            username: "m".to_string(),
            role: UserRole::Manager,
        };
        assert_eq!(manager.effective_user_id(Some(2)), Ok(2));
    }
}
