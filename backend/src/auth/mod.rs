use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use chrono::Utc;
use crates::domain::{
    entities::users::UserEntity, value_objects::enums::subscription_tiers::SubscriptionTier,
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{axum_http::error_responses::error_response, config::config_model::Session};

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub email: String,
    pub tier: String,
    pub iat: usize,
    pub exp: usize,
}

/// Tokens with at least this much lifetime left are returned unchanged by
/// [`SessionKeys::refresh`].
pub const REFRESH_WINDOW_SECONDS: usize = 3600;

/// HS256 keys for session tokens. Shared with extractors through a request extension.
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: u64,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl_seconds: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds,
        }
    }

    pub fn from_config(session: &Session) -> Self {
        Self::new(&session.jwt_secret, session.ttl_seconds)
    }

    pub fn issue(&self, user: &UserEntity) -> Result<String, AuthError> {
        self.sign(
            user.id.to_string(),
            user.email.clone(),
            user.subscription_tier.clone(),
        )
    }

    /// Re-issues a valid token that expires within the refresh window, keeping
    /// its subject, email and tier. Longer-lived tokens come back as-is.
    pub fn refresh(&self, token: &str) -> Result<String, AuthError> {
        let claims = self.validate(token)?;
        if claims.exp.saturating_sub(now_seconds()) >= REFRESH_WINDOW_SECONDS {
            return Ok(token.to_string());
        }

        self.sign(claims.sub, claims.email, claims.tier)
    }

    fn sign(&self, sub: String, email: String, tier: String) -> Result<String, AuthError> {
        let now = now_seconds();
        let claims = SessionClaims {
            sub,
            email,
            tier,
            iat: now,
            exp: now + self.ttl_seconds as usize,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError(anyhow::anyhow!("JWT encoding failed: {}", e)))
    }

    pub fn validate(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);

        let token_data = decode::<SessionClaims>(token, &self.decoding, &validation)
            .map_err(|e| anyhow::anyhow!("JWT validation failed: {}", e))?;

        Ok(token_data.claims)
    }
}

fn now_seconds() -> usize {
    Utc::now().timestamp().max(0) as usize
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    /// Tier at token issue time. Gating reads the stored tier instead.
    pub tier: SubscriptionTier,
}

/// Anonymous callers resolve to `None`; a malformed or expired token is
/// treated the same as no token.
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<AuthUser>);

#[derive(Debug)]
pub struct AuthError(anyhow::Error);

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError(err)
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl axum::response::IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        error_response(StatusCode::UNAUTHORIZED, format!("Unauthorized: {}", self.0))
    }
}

fn bearer_token(parts: &Parts) -> Result<Option<&str>, AuthError> {
    let Some(auth_header) = parts.headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| anyhow::anyhow!("Invalid Authorization header"))?;

    auth_str
        .strip_prefix("Bearer ")
        .map(|token| Some(token.trim()))
        .ok_or_else(|| AuthError(anyhow::anyhow!("Invalid Authorization header format")))
}

fn authenticate(parts: &Parts, token: &str) -> Result<AuthUser, AuthError> {
    let keys = parts
        .extensions
        .get::<Arc<SessionKeys>>()
        .ok_or_else(|| anyhow::anyhow!("session keys are not configured"))?;

    let claims = keys.validate(token)?;
    let user_id =
        Uuid::parse_str(&claims.sub).map_err(|_| anyhow::anyhow!("Invalid user ID in token"))?;

    Ok(AuthUser {
        user_id,
        email: claims.email,
        tier: SubscriptionTier::from_str(&claims.tier),
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?
            .ok_or_else(|| AuthError(anyhow::anyhow!("Missing Authorization header")))?;

        authenticate(parts, token)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for OptionalAuthUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match bearer_token(parts) {
            Ok(Some(token)) => authenticate(parts, token).ok(),
            _ => None,
        };

        Ok(OptionalAuthUser(user))
    }
}
