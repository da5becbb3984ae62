use async_trait::async_trait;
use uuid::Uuid;

use crate::booking::{Booking, BookingWithTrain, NewBooking};
use crate::search::TrainQuery;
use crate::train::Train;
use crate::CoreResult;

/// Read access to the train catalog
#[async_trait]
pub trait TrainRepository: Send + Sync {
    /// Trains whose stations contain the query fragments, in listing order.
    async fn find_trains(&self, query: &TrainQuery) -> CoreResult<Vec<Train>>;

    async fn find_train(&self, id: Uuid) -> CoreResult<Option<Train>>;
}

/// Booking persistence.
///
/// `owner` arguments are the data layer's access scope: a store only lists or
/// deletes rows belonging to that user.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert_booking(&self, booking: NewBooking) -> CoreResult<Booking>;

    /// Newest first.
    async fn list_bookings(&self, owner: Uuid) -> CoreResult<Vec<BookingWithTrain>>;

    /// Returns whether a row was removed; a missing id is not an error.
    async fn delete_booking(&self, owner: Uuid, booking_id: Uuid) -> CoreResult<bool>;
}
