use std::sync::Arc;

use railbook_core::repository::{BookingRepository, TrainRepository};
use railbook_core::{Allocator, BookingLedger, BookingWriter, SessionContext, Storefront, TrainCatalog};
use railbook_store::RedisClient;

use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub audience: Option<String>,
}

#[derive(Clone)]
pub struct RateLimiter {
    pub redis: Arc<RedisClient>,
    pub requests_per_window: i64,
    pub window_seconds: i64,
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: TrainCatalog,
    pub writer: BookingWriter,
    pub ledger: BookingLedger,
    pub rate_limiter: Option<RateLimiter>,
    pub auth: AuthConfig,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        trains: Arc<dyn TrainRepository>,
        bookings: Arc<dyn BookingRepository>,
        allocator: Arc<Allocator>,
        auth: AuthConfig,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            catalog: TrainCatalog::new(trains),
            writer: BookingWriter::new(bookings.clone(), allocator),
            ledger: BookingLedger::new(bookings),
            rate_limiter: None,
            auth,
            metrics,
        }
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Flows for one request, run under the caller's session.
    pub fn storefront(&self, session: SessionContext) -> Storefront {
        Storefront::new(
            self.catalog.clone(),
            self.writer.clone(),
            self.ledger.clone(),
            session,
        )
    }
}
