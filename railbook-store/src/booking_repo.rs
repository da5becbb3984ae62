use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use railbook_core::repository::BookingRepository;
use railbook_core::{
    Booking, BookingReference, BookingStatus, BookingWithTrain, CoreError, CoreResult, NewBooking,
    SeatNumber, TrainSummary,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::persistence;

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct BookingRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub train_id: Uuid,
    pub passenger_name: String,
    pub passenger_age: i32,
    pub passenger_email: String,
    pub seat_number: String,
    pub journey_date: NaiveDate,
    pub total_amount: Decimal,
    pub booking_reference: String,
    pub booking_status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct BookingWithTrainRow {
    #[sqlx(flatten)]
    pub booking: BookingRow,
    pub train_number: String,
    pub train_name: String,
    pub from_station: String,
    pub to_station: String,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,
}

impl TryFrom<BookingRow> for Booking {
    type Error = CoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let seat_number: SeatNumber = row
            .seat_number
            .parse()
            .map_err(|e| invalid_row(row.id, e))?;
        let booking_status: BookingStatus = row
            .booking_status
            .parse()
            .map_err(|e| invalid_row(row.id, e))?;
        if row.total_amount.is_sign_negative() {
            return Err(invalid_row(row.id, "negative total_amount"));
        }

        Ok(Booking {
            id: row.id,
            user_id: row.user_id,
            train_id: row.train_id,
            passenger_name: row.passenger_name,
            passenger_age: row.passenger_age,
            passenger_email: row.passenger_email,
            seat_number,
            journey_date: row.journey_date,
            total_amount: row.total_amount,
            booking_reference: BookingReference::from_stored(row.booking_reference),
            booking_status,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<BookingWithTrainRow> for BookingWithTrain {
    type Error = CoreError;

    fn try_from(row: BookingWithTrainRow) -> Result<Self, Self::Error> {
        Ok(BookingWithTrain {
            booking: Booking::try_from(row.booking)?,
            train: TrainSummary {
                train_number: row.train_number,
                train_name: row.train_name,
                from_station: row.from_station,
                to_station: row.to_station,
                departure_time: row.departure_time,
                arrival_time: row.arrival_time,
            },
        })
    }
}

fn invalid_row(id: Uuid, what: impl std::fmt::Display) -> CoreError {
    CoreError::Persistence(format!("invalid booking record {}: {}", id, what))
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn insert_booking(&self, booking: NewBooking) -> CoreResult<Booking> {
        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            INSERT INTO bookings (
                user_id, train_id, passenger_name, passenger_age, passenger_email,
                seat_number, journey_date, total_amount, booking_reference,
                booking_status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING
                id, user_id, train_id, passenger_name, passenger_age, passenger_email,
                seat_number, journey_date, total_amount, booking_reference,
                booking_status, created_at
            "#,
        )
        .bind(booking.user_id)
        .bind(booking.train_id)
        .bind(&booking.passenger_name)
        .bind(booking.passenger_age)
        .bind(&booking.passenger_email)
        .bind(booking.seat_number.to_string())
        .bind(booking.journey_date)
        .bind(booking.total_amount)
        .bind(booking.booking_reference.as_str())
        .bind(booking.booking_status.as_str())
        .bind(booking.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(persistence)?;

        Booking::try_from(row)
    }

    async fn list_bookings(&self, owner: Uuid) -> CoreResult<Vec<BookingWithTrain>> {
        let rows = sqlx::query_as::<_, BookingWithTrainRow>(
            r#"
            SELECT
                b.id, b.user_id, b.train_id, b.passenger_name, b.passenger_age,
                b.passenger_email, b.seat_number, b.journey_date, b.total_amount,
                b.booking_reference, b.booking_status, b.created_at,
                t.train_number, t.train_name, t.from_station, t.to_station,
                t.departure_time, t.arrival_time
            FROM bookings b
            JOIN trains t ON t.id = b.train_id
            WHERE b.user_id = $1
            ORDER BY b.created_at DESC, b.seq DESC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;

        rows.into_iter().map(BookingWithTrain::try_from).collect()
    }

    async fn delete_booking(&self, owner: Uuid, booking_id: Uuid) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1 AND user_id = $2")
            .bind(booking_id)
            .bind(owner)
            .execute(&self.pool)
            .await
            .map_err(persistence)?;

        Ok(result.rows_affected() > 0)
    }
}
