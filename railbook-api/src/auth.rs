use axum::{
    extract::{FromRequestParts, State},
    http::request::Parts,
    routing::get,
    Json, Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use railbook_core::{PassengerInput, Session, SessionContext};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::{AppState, AuthConfig};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
}

pub fn verify_token(token: &str, auth: &AuthConfig) -> Result<Session, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    match &auth.audience {
        Some(aud) => validation.set_audience(&[aud]),
        None => validation.validate_aud = false,
    }

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        warn!("Rejected bearer token: {}", e);
        AppError::AuthenticationError("Invalid or expired token".to_string())
    })?;

    let user_id = Uuid::parse_str(&token_data.claims.sub)
        .map_err(|_| AppError::AuthenticationError("Invalid token subject".to_string()))?;

    Ok(Session {
        user_id,
        email: token_data.claims.email,
    })
}

/// Session for the current request. A missing header yields an anonymous
/// context; a header that fails verification is rejected outright.
pub struct RequestSession(pub SessionContext);

impl FromRequestParts<AppState> for RequestSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(axum::http::header::AUTHORIZATION) {
            return Ok(RequestSession(SessionContext::fixed(None)));
        }

        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::AuthenticationError("Malformed Authorization header".to_string()))?;

        let session = verify_token(bearer.token(), &state.auth)?;
        Ok(RequestSession(SessionContext::fixed(Some(session))))
    }
}

#[derive(Debug, Serialize)]
struct SessionResponse {
    user_id: Uuid,
    email: Option<String>,
    passenger: PassengerInput,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/session", get(current_session))
}

async fn current_session(
    State(state): State<AppState>,
    RequestSession(session): RequestSession,
) -> Result<Json<SessionResponse>, AppError> {
    let storefront = state.storefront(session);
    let passenger = storefront.passenger_defaults()?;
    let session = storefront.session().require()?;

    Ok(Json(SessionResponse {
        user_id: session.user_id,
        email: session.email,
        passenger,
    }))
}
