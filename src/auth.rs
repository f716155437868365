use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header;
use axum::http::request::Parts;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::config::Config;
use crate::error::ApiError;
use crate::models::AccountId;

/// Name of the cookie the session token travels in.
pub const SESSION_COOKIE: &str = "token";

/// Claims carried by a session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Identifier of the account the session belongs to.
    #[serde(default)]
    pub id: Option<String>,
    pub exp: usize,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("no session token supplied")]
    Missing,
    #[error("session token failed verification: {0}")]
    Malformed(#[source] jsonwebtoken::errors::Error),
    #[error("session token is missing the account id claim")]
    Incomplete,
}

/// Verify a session token against the server secret and extract the account
/// it belongs to. Deterministic; no side effects.
pub fn verify_token(token: Option<&str>, secret: &str) -> Result<AccountId, AuthError> {
    let token = token.ok_or(AuthError::Missing)?;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(AuthError::Malformed)?;

    match data.claims.id {
        Some(id) if !id.is_empty() => Ok(AccountId(id)),
        _ => Err(AuthError::Incomplete),
    }
}

/// A verified session. Extraction rejects the request before any handler
/// logic runs, so unauthenticated callers never reach the account store.
pub struct Session(pub AccountId);

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    Config: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = Config::from_ref(state);
        let token = bearer_token(parts).or_else(|| cookie_token(parts));

        match verify_token(token.as_deref(), &config.auth.token_secret) {
            Ok(id) => Ok(Session(id)),
            Err(err) => {
                // the three failure modes stay distinct in the logs but
                // collapse to one response, so callers can't probe accounts
                warn!("rejected session token: {err}");
                Err(ApiError::Unauthenticated)
            }
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix("Bearer ").map(str::to_owned)
}

fn cookie_token(parts: &Parts) -> Option<String> {
    let cookies = parts.headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_owned())
    })
}

#[cfg(test)]
pub(crate) fn sign_test_token(id: Option<&str>, exp: i64, secret: &str) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = Claims {
        id: id.map(str::to_owned),
        exp: exp as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}
