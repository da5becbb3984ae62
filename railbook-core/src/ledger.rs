use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::booking::BookingWithTrain;
use crate::repository::BookingRepository;
use crate::CoreResult;

/// Booking reader and canceller.
#[derive(Clone)]
pub struct BookingLedger {
    bookings: Arc<dyn BookingRepository>,
}

impl BookingLedger {
    pub fn new(bookings: Arc<dyn BookingRepository>) -> Self {
        Self { bookings }
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> CoreResult<Vec<BookingWithTrain>> {
        self.bookings.list_bookings(user_id).await
    }

    /// Hard delete. Ownership is left to the store's access scope.
    ///
    /// Returns whether a booking was actually removed; a missing id is not an
    /// error.
    pub async fn cancel(&self, user_id: Uuid, booking_id: Uuid) -> CoreResult<bool> {
        let removed = self.bookings.delete_booking(user_id, booking_id).await?;
        if removed {
            info!("Booking cancelled: {}", booking_id);
        } else {
            debug!("Cancel of {} removed nothing", booking_id);
        }
        Ok(removed)
    }
}
