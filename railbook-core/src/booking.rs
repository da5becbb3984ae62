use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::train::TrainSummary;
use crate::CoreError;

pub const SEAT_ROWS: [char; 6] = ['A', 'B', 'C', 'D', 'E', 'F'];
pub const SEATS_PER_ROW: u8 = 72;

/// Row letter plus seat index, rendered as e.g. `C41`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SeatNumber {
    row: char,
    seat: u8,
}

impl SeatNumber {
    pub fn new(row: char, seat: u8) -> Result<Self, CoreError> {
        if !SEAT_ROWS.contains(&row) {
            return Err(CoreError::Validation(format!("Invalid seat row: {}", row)));
        }
        if !(1..=SEATS_PER_ROW).contains(&seat) {
            return Err(CoreError::Validation(format!("Invalid seat index: {}", seat)));
        }
        Ok(Self { row, seat })
    }

    /// Caller guarantees `row` is one of `SEAT_ROWS` and `seat` is within `1..=SEATS_PER_ROW`.
    pub(crate) fn from_parts(row: char, seat: u8) -> Self {
        debug_assert!(SEAT_ROWS.contains(&row) && (1..=SEATS_PER_ROW).contains(&seat));
        Self { row, seat }
    }

    pub fn row(&self) -> char {
        self.row
    }

    pub fn seat(&self) -> u8 {
        self.seat
    }
}

impl fmt::Display for SeatNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row, self.seat)
    }
}

impl FromStr for SeatNumber {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let row = chars
            .next()
            .ok_or_else(|| CoreError::Validation("Empty seat number".to_string()))?;
        let digits = chars.as_str();
        // "A07" is not a seat this system ever hands out
        if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::Validation(format!("Malformed seat number: {}", s)));
        }
        let seat: u8 = digits
            .parse()
            .map_err(|_| CoreError::Validation(format!("Malformed seat number: {}", s)))?;
        Self::new(row, seat)
    }
}

impl TryFrom<String> for SeatNumber {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SeatNumber> for String {
    fn from(value: SeatNumber) -> Self {
        value.to_string()
    }
}

/// Human-presentable booking code (`RB<unix millis><9 base36 chars>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingReference(String);

impl BookingReference {
    pub const PREFIX: &'static str = "RB";
    pub const SUFFIX_LEN: usize = 9;

    /// Wraps a reference read back from the store.
    pub fn from_stored(value: String) -> Self {
        Self(value)
    }

    pub(crate) fn compose(millis: i64, suffix: &str) -> Self {
        Self(format!("{}{}{}", Self::PREFIX, millis, suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Checks the shape the allocator produces.
    pub fn is_well_formed(&self) -> bool {
        let Some(rest) = self.0.strip_prefix(Self::PREFIX) else {
            return false;
        };
        if rest.len() <= Self::SUFFIX_LEN {
            return false;
        }
        let (millis, suffix) = rest.split_at(rest.len() - Self::SUFFIX_LEN);
        millis.bytes().all(|b| b.is_ascii_digit())
            && suffix.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_uppercase())
    }
}

impl fmt::Display for BookingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bookings exist only while confirmed; cancelling deletes the record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    #[default]
    Confirmed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(BookingStatus::Confirmed),
            other => Err(CoreError::Validation(format!("Unknown booking status: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub train_id: Uuid,
    pub passenger_name: String,
    pub passenger_age: i32,
    pub passenger_email: String,
    pub seat_number: SeatNumber,
    pub journey_date: NaiveDate,
    pub total_amount: Decimal,
    pub booking_reference: BookingReference,
    pub booking_status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

/// Insert payload handed to the data layer; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub user_id: Uuid,
    pub train_id: Uuid,
    pub passenger_name: String,
    pub passenger_age: i32,
    pub passenger_email: String,
    pub seat_number: SeatNumber,
    pub journey_date: NaiveDate,
    pub total_amount: Decimal,
    pub booking_reference: BookingReference,
    pub booking_status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl NewBooking {
    pub fn into_booking(self, id: Uuid) -> Booking {
        Booking {
            id,
            user_id: self.user_id,
            train_id: self.train_id,
            passenger_name: self.passenger_name,
            passenger_age: self.passenger_age,
            passenger_email: self.passenger_email,
            seat_number: self.seat_number,
            journey_date: self.journey_date,
            total_amount: self.total_amount,
            booking_reference: self.booking_reference,
            booking_status: self.booking_status,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingWithTrain {
    #[serde(flatten)]
    pub booking: Booking,
    pub train: TrainSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seat_number_parse() {
        let seat: SeatNumber = "C41".parse().unwrap();
        assert_eq!(seat.row(), 'C');
        assert_eq!(seat.seat(), 41);
        assert_eq!(seat.to_string(), "C41");

        assert!("A1".parse::<SeatNumber>().is_ok());
        assert!("F72".parse::<SeatNumber>().is_ok());
    }

    #[test]
    fn test_seat_number_rejects_out_of_range() {
        for bad in ["", "G1", "a1", "A0", "A73", "A07", "A", "A1x", "AA1", "A256"] {
            assert!(bad.parse::<SeatNumber>().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_seat_number_serde() {
        let seat = SeatNumber::new('B', 12).unwrap();
        assert_eq!(serde_json::to_string(&seat).unwrap(), "\"B12\"");
        assert!(serde_json::from_str::<SeatNumber>("\"Z9\"").is_err());
    }

    #[test]
    fn test_booking_reference_shape() {
        let reference = BookingReference::compose(1_717_000_000_123, "K2J9QX0AB");
        assert_eq!(reference.as_str(), "RB1717000000123K2J9QX0AB");
        assert!(reference.is_well_formed());

        assert!(!BookingReference::from_stored("XX1717000000123K2J9QX0AB".into()).is_well_formed());
        assert!(!BookingReference::from_stored("RB1717000000123k2j9qx0ab".into()).is_well_formed());
        assert!(!BookingReference::from_stored("RBK2J9QX0AB".into()).is_well_formed());
    }

    #[test]
    fn test_status_round_trip() {
        assert_eq!(BookingStatus::default(), BookingStatus::Confirmed);
        assert_eq!("confirmed".parse::<BookingStatus>().unwrap(), BookingStatus::Confirmed);
        assert!("pending".parse::<BookingStatus>().is_err());
        assert_eq!(serde_json::to_string(&BookingStatus::Confirmed).unwrap(), "\"confirmed\"");
    }
}
