use chrono::{DateTime, NaiveDate, Utc};
use railbook_shared::pii::MaskedEmail;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::allocation::Allocator;
use crate::booking::{Booking, BookingStatus, NewBooking};
use crate::repository::BookingRepository;
use crate::train::Train;
use crate::validation::ValidatedPassenger;
use crate::CoreResult;

/// Creates bookings: derives seat and reference, then a single insert.
#[derive(Clone)]
pub struct BookingWriter {
    bookings: Arc<dyn BookingRepository>,
    allocator: Arc<Allocator>,
}

impl BookingWriter {
    pub fn new(bookings: Arc<dyn BookingRepository>, allocator: Arc<Allocator>) -> Self {
        Self { bookings, allocator }
    }

    pub async fn write(
        &self,
        passenger: &ValidatedPassenger,
        train: &Train,
        journey_date: NaiveDate,
        user_id: Uuid,
    ) -> CoreResult<Booking> {
        self.write_at(passenger, train, journey_date, user_id, Utc::now()).await
    }

    /// Same as [`write`](Self::write) with an explicit creation time.
    pub async fn write_at(
        &self,
        passenger: &ValidatedPassenger,
        train: &Train,
        journey_date: NaiveDate,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> CoreResult<Booking> {
        let (seat_number, booking_reference) = self.allocator.allocate(now);

        let new_booking = NewBooking {
            user_id,
            train_id: train.id,
            passenger_name: passenger.name().to_string(),
            passenger_age: passenger.age(),
            passenger_email: passenger.email().to_string(),
            seat_number,
            journey_date,
            total_amount: train.price_per_seat,
            booking_reference,
            booking_status: BookingStatus::Confirmed,
            created_at: now,
        };

        let booking = self.bookings.insert_booking(new_booking).await.map_err(|e| {
            error!("Failed to create booking on train {}: {}", train.train_number, e);
            e
        })?;

        info!(
            "Booking confirmed: {} seat {} on {} for {} ({})",
            booking.booking_reference,
            booking.seat_number,
            train.train_number,
            journey_date,
            MaskedEmail(&booking.passenger_email)
        );
        Ok(booking)
    }
}
