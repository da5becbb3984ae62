use axum::{
    extract::{ConnectInfo, Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use railbook_store::redis_repo::rate_limit_key;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

pub mod auth;
pub mod bookings;
pub mod error;
pub mod metrics;
pub mod seed;
pub mod state;
pub mod trains;

pub use state::AppState;

use crate::error::AppError;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let mut router = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics::metrics_handler))
        .merge(auth::routes())
        .merge(trains::routes())
        .merge(bookings::routes());

    // needs ConnectInfo, which only the real listener provides
    if state.rate_limiter.is_some() {
        router = router.layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));
    }

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn rate_limit_middleware(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Response {
    let Some(limiter) = state.rate_limiter.as_ref() else {
        return next.run(req).await;
    };

    let key = rate_limit_key(&addr.ip().to_string());
    match limiter
        .redis
        .check_rate_limit(&key, limiter.requests_per_window, limiter.window_seconds)
        .await
    {
        Ok(true) => next.run(req).await,
        Ok(false) => {
            warn!("Rate limit exceeded for {}", addr.ip());
            AppError::TooManyRequests.into_response()
        }
        Err(e) => {
            // fail open
            warn!("Rate limiter unavailable: {}", e);
            next.run(req).await
        }
    }
}
