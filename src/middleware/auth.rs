use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::error::ApiError;

/// Staff-only routes sit behind this gate. Tokens come from the identity
/// provider; all we check is the signature and the expiry.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "));

    let Some(token) = token else {
        return ApiError::Unauthorized.into_response();
    };

    match validate_token(&state.secret, token) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(err) => {
            debug!(error = %err, "Rejected bearer token");
            ApiError::Unauthorized.into_response()
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

#[derive(Clone, Debug)]
pub struct AuthState {
    pub secret: Arc<String>,
}

pub fn generate_token(subject: &str, secret: &str, ttl: Duration) -> Result<String, AuthMiddlewareError> {
    let exp = Utc::now()
        .checked_add_signed(ttl)
        .ok_or(AuthMiddlewareError::GenerationFail)?
        .timestamp() as usize;

    let claims = Claims {
        sub: subject.to_string(),
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthMiddlewareError::GenerationFail)
}

pub fn validate_token(secret: &str, token: &str) -> Result<Claims, AuthMiddlewareError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|err| match err.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthMiddlewareError::TokenExpired,
        _ => AuthMiddlewareError::ValidationFail,
    })
}

#[derive(Error, Debug)]
pub enum AuthMiddlewareError {
    #[error("Token expired")]
    TokenExpired,
    #[error("Failed to validate token")]
    ValidationFail,
    #[error("Failed to generate token")]
    GenerationFail,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_fresh_token() {
        let token = generate_token("staff-7", "secret", Duration::hours(1)).unwrap();
        let claims = validate_token("secret", &token).unwrap();
        assert_eq!(claims.sub, "staff-7");
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        let token = generate_token("staff-7", "secret", Duration::hours(1)).unwrap();
        assert!(matches!(
            validate_token("other", &token),
            Err(AuthMiddlewareError::ValidationFail)
        ));

        let stale = generate_token("staff-7", "secret", Duration::hours(-2)).unwrap();
        assert!(matches!(
            validate_token("secret", &stale),
            Err(AuthMiddlewareError::TokenExpired)
        ));
    }
}
