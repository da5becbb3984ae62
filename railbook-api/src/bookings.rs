use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use chrono::NaiveDate;
use railbook_core::{Booking, BookingWithTrain, PassengerInput};
use railbook_shared::Masked;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::auth::RequestSession;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub train_id: Uuid,
    pub journey_date: NaiveDate,
    pub passenger: PassengerInput,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", get(list_bookings).post(create_booking))
        .route("/v1/bookings/{id}", delete(cancel_booking))
}

async fn create_booking(
    State(state): State<AppState>,
    RequestSession(session): RequestSession,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = state
        .storefront(session)
        .confirm_booking(req.train_id, req.journey_date, &req.passenger)
        .await
        .map_err(|e| {
            state.metrics.record_rejection(&e);
            AppError::from_booking(e)
        })?;

    state.metrics.bookings_created.inc();
    debug!(
        "Created booking {} for passenger {}",
        booking.id,
        Masked(&booking.passenger_name)
    );
    Ok((StatusCode::CREATED, Json(booking)))
}

async fn list_bookings(
    State(state): State<AppState>,
    RequestSession(session): RequestSession,
) -> Result<Json<Vec<BookingWithTrain>>, AppError> {
    let bookings = state.storefront(session).my_bookings().await?;
    Ok(Json(bookings))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    RequestSession(session): RequestSession,
) -> Result<Json<Vec<BookingWithTrain>>, AppError> {
    let outcome = state.storefront(session).cancel_booking(id).await?;
    if outcome.removed {
        state.metrics.bookings_cancelled.inc();
    }
    Ok(Json(outcome.bookings))
}
