use axum::{extract::State, http::header, response::IntoResponse};
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use railbook_core::CoreError;

use crate::error::AppError;
use crate::state::AppState;

pub struct Metrics {
    registry: Registry,
    pub train_searches: IntCounter,
    pub bookings_created: IntCounter,
    pub bookings_cancelled: IntCounter,
    pub booking_rejections: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let train_searches =
            IntCounter::new("railbook_train_searches_total", "Train searches served")?;
        let bookings_created =
            IntCounter::new("railbook_bookings_created_total", "Bookings confirmed")?;
        let bookings_cancelled =
            IntCounter::new("railbook_bookings_cancelled_total", "Bookings cancelled")?;
        let booking_rejections = IntCounterVec::new(
            Opts::new("railbook_booking_rejections_total", "Booking attempts rejected"),
            &["reason"],
        )?;

        registry.register(Box::new(train_searches.clone()))?;
        registry.register(Box::new(bookings_created.clone()))?;
        registry.register(Box::new(bookings_cancelled.clone()))?;
        registry.register(Box::new(booking_rejections.clone()))?;

        Ok(Self {
            registry,
            train_searches,
            bookings_created,
            bookings_cancelled,
            booking_rejections,
        })
    }

    pub fn record_rejection(&self, err: &CoreError) {
        self.booking_rejections
            .with_label_values(&[rejection_reason(err)])
            .inc();
    }

    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

fn rejection_reason(err: &CoreError) -> &'static str {
    match err {
        CoreError::Validation(_) => "validation",
        CoreError::Persistence(_) => "persistence",
        CoreError::NotFound(_) => "not_found",
        CoreError::SoldOut(_) => "sold_out",
        CoreError::Unauthenticated => "unauthenticated",
    }
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = state
        .metrics
        .render()
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}
