use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use railbook_core::{SearchResults, SessionContext, Train, TrainQuery};
use uuid::Uuid;

use crate::auth::RequestSession;
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/trains", get(search_trains))
        .route("/v1/trains/{id}", get(get_train))
        .route("/v1/trains/{id}/select", post(select_train))
}

async fn search_trains(
    State(state): State<AppState>,
    Query(query): Query<TrainQuery>,
) -> Result<Json<SearchResults>, AppError> {
    let results = state
        .storefront(SessionContext::fixed(None))
        .search(&query)
        .await?;
    state.metrics.train_searches.inc();
    Ok(Json(results))
}

async fn get_train(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Train>, AppError> {
    let train = state.storefront(SessionContext::fixed(None)).train(id).await?;
    Ok(Json(train))
}

async fn select_train(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    RequestSession(session): RequestSession,
) -> Result<Json<Train>, AppError> {
    let train = state
        .storefront(session)
        .select_train(id)
        .await
        .inspect_err(|e| state.metrics.record_rejection(e))?;
    Ok(Json(train))
}
