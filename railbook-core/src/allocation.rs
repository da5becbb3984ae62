use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

use crate::booking::{BookingReference, SeatNumber, SEATS_PER_ROW, SEAT_ROWS};

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Picks a row letter and seat index uniformly at random.
///
/// Nothing here consults existing bookings, so two bookings on the same
/// train and date can land on the same seat.
pub fn derive_seat_number<R: Rng + ?Sized>(rng: &mut R) -> SeatNumber {
    let row = SEAT_ROWS[rng.gen_range(0..SEAT_ROWS.len())];
    let seat = rng.gen_range(1..=SEATS_PER_ROW);
    SeatNumber::from_parts(row, seat)
}

/// `RB` + creation time in milliseconds + 9 uppercase base36 characters.
pub fn derive_booking_reference<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> BookingReference {
    let suffix: String = (0..BookingReference::SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    BookingReference::compose(now.timestamp_millis(), &suffix)
}

/// Shared random source for seat and reference derivation.
pub struct Allocator {
    rng: Mutex<StdRng>,
}

impl Allocator {
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible sequence, for tests and staging environments.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn allocate(&self, now: DateTime<Utc>) -> (SeatNumber, BookingReference) {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let seat = derive_seat_number(&mut *rng);
        let reference = derive_booking_reference(&mut *rng, now);
        (seat, reference)
    }
}

impl Default for Allocator {
    fn default() -> Self {
        Self::from_entropy()
    }
}
