use async_trait::async_trait;
use chrono::NaiveTime;
use railbook_core::repository::TrainRepository;
use railbook_core::search::{like_pattern, TrainQuery};
use railbook_core::{CoreError, CoreResult, Train};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::persistence;

pub struct PgTrainRepository {
    pool: PgPool,
}

impl PgTrainRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct TrainRow {
    pub id: Uuid,
    pub train_number: String,
    pub train_name: String,
    pub from_station: String,
    pub to_station: String,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,
    pub available_seats: i32,
    pub price_per_seat: Decimal,
}

impl TryFrom<TrainRow> for Train {
    type Error = CoreError;

    fn try_from(row: TrainRow) -> Result<Self, Self::Error> {
        if row.available_seats < 0 {
            return Err(invalid_row(row.id, "negative available_seats"));
        }
        if row.price_per_seat.is_sign_negative() {
            return Err(invalid_row(row.id, "negative price_per_seat"));
        }
        if row.from_station.trim().is_empty() || row.to_station.trim().is_empty() {
            return Err(invalid_row(row.id, "blank station"));
        }

        Ok(Train {
            id: row.id,
            train_number: row.train_number,
            train_name: row.train_name,
            from_station: row.from_station,
            to_station: row.to_station,
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            available_seats: row.available_seats,
            price_per_seat: row.price_per_seat,
        })
    }
}

fn invalid_row(id: Uuid, what: &str) -> CoreError {
    CoreError::Persistence(format!("invalid train record {}: {}", id, what))
}

#[async_trait]
impl TrainRepository for PgTrainRepository {
    async fn find_trains(&self, query: &TrainQuery) -> CoreResult<Vec<Train>> {
        let rows = sqlx::query_as::<_, TrainRow>(
            r#"
            SELECT
                id, train_number, train_name, from_station, to_station,
                departure_time, arrival_time, available_seats, price_per_seat
            FROM trains
            WHERE from_station ILIKE $1
              AND to_station ILIKE $2
            ORDER BY departure_time, train_number
            "#,
        )
        .bind(like_pattern(query.from_fragment()))
        .bind(like_pattern(query.to_fragment()))
        .fetch_all(&self.pool)
        .await
        .map_err(persistence)?;

        rows.into_iter().map(Train::try_from).collect()
    }

    async fn find_train(&self, id: Uuid) -> CoreResult<Option<Train>> {
        let row = sqlx::query_as::<_, TrainRow>(
            r#"
            SELECT
                id, train_number, train_name, from_station, to_station,
                departure_time, arrival_time, available_seats, price_per_seat
            FROM trains
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence)?;

        row.map(Train::try_from).transpose()
    }
}
