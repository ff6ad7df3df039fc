use std::sync::Arc;

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::types::Role;

/// Cookie carrying the short-lived access token
pub const ACCESS_COOKIE: &str = "token";
/// Cookie carrying the refresh token
pub const REFRESH_COOKIE: &str = "refresh";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub name: String,
    pub kind: TokenKind,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("JWT secret not configured")]
    MissingSecret,
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Token used for the wrong purpose")]
    WrongTokenKind,
    #[error("Password hashing error: {0}")]
    Hashing(String),
}

/// A freshly signed token and its lifetime
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub max_age_secs: i64,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

/// Signs and verifies access and refresh tokens with separate secrets
#[derive(Clone)]
pub struct TokenKeys {
    access: Arc<KeyPair>,
    refresh: Arc<KeyPair>,
}

impl TokenKeys {
    pub fn from_config(security: &SecurityConfig) -> Result<Self, AuthError> {
        if security.jwt_secret.is_empty() || security.refresh_secret.is_empty() {
            return Err(AuthError::MissingSecret);
        }

        let pair = |secret: &str, lifetime: Duration| {
            Arc::new(KeyPair {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
                lifetime,
            })
        };

        Ok(Self {
            access: pair(&security.jwt_secret, Duration::minutes(security.access_token_minutes)),
            refresh: pair(&security.refresh_secret, Duration::days(security.refresh_token_days)),
        })
    }

    fn keys(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    pub fn issue(&self, user_id: Uuid, role: Role, name: &str, kind: TokenKind) -> Result<IssuedToken, AuthError> {
        let keys = self.keys(kind);
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            role,
            name: name.to_string(),
            kind,
            exp: (now + keys.lifetime).timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &keys.encoding)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))?;

        Ok(IssuedToken {
            token,
            max_age_secs: keys.lifetime.num_seconds(),
        })
    }

    /// Verify signature, expiry and purpose of a token
    pub fn decode(&self, token: &str, kind: TokenKind) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.keys(kind).decoding, &Validation::default())
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        if data.claims.kind != kind {
            return Err(AuthError::WrongTokenKind);
        }
        Ok(data.claims)
    }
}

/// bcrypt is CPU bound, keep it off the async workers
pub async fn hash_password(password: String, cost: u32) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

pub async fn verify_password(password: String, hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// HttpOnly session cookie. SameSite=None requires Secure, so plain-HTTP
/// development falls back to Lax.
pub fn session_cookie(name: &'static str, issued: IssuedToken, secure: bool) -> Cookie<'static> {
    Cookie::build((name, issued.token))
        .http_only(true)
        .secure(secure)
        .same_site(if secure { SameSite::None } else { SameSite::Lax })
        .path("/")
        .max_age(time::Duration::seconds(issued.max_age_secs))
        .build()
}

pub fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn keys() -> TokenKeys {
        TokenKeys::from_config(&AppConfig::testing().security).unwrap()
    }

    #[test]
    fn access_token_round_trip() {
        let keys = keys();
        let id = Uuid::new_v4();
        let issued = keys.issue(id, Role::Admin, "Ada", TokenKind::Access).unwrap();

        let claims = keys.decode(&issued.token, TokenKind::Access).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(issued.max_age_secs, 24 * 60 * 60);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let keys = keys();
        let issued = keys.issue(Uuid::new_v4(), Role::Teacher, "Tom", TokenKind::Refresh).unwrap();
        assert!(keys.decode(&issued.token, TokenKind::Access).is_err());
        assert!(keys.decode(&issued.token, TokenKind::Refresh).is_ok());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let mut security = AppConfig::testing().security;
        security.access_token_minutes = -10;
        let keys = TokenKeys::from_config(&security).unwrap();
        let issued = keys.issue(Uuid::new_v4(), Role::Teacher, "Tom", TokenKind::Access).unwrap();
        assert!(matches!(
            keys.decode(&issued.token, TokenKind::Access),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn missing_secret_is_an_error() {
        let mut security = AppConfig::testing().security;
        security.jwt_secret.clear();
        assert!(matches!(TokenKeys::from_config(&security), Err(AuthError::MissingSecret)));
    }

    #[test]
    fn session_cookie_attributes() {
        let issued = IssuedToken { token: "abc".to_string(), max_age_secs: 60 };
        let cookie = session_cookie(ACCESS_COOKIE, issued.clone(), true);
        assert_eq!(cookie.name(), "token");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::None));
        assert_eq!(cookie.secure(), Some(true));

        let dev = session_cookie(REFRESH_COOKIE, issued, false);
        assert_eq!(dev.same_site(), Some(SameSite::Lax));
    }

    #[tokio::test]
    async fn password_hash_verifies() {
        let hash = hash_password("correct horse".to_string(), 4).await.unwrap();
        assert!(verify_password("correct horse".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password("battery staple".to_string(), hash).await.unwrap());
    }
}
