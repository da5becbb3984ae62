use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A scheduled service between two stations.
///
/// The booking flow only ever reads trains; `available_seats` is maintained
/// elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Train {
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

impl Train {
    pub fn is_sold_out(&self) -> bool {
        self.available_seats <= 0
    }

    pub fn summary(&self) -> TrainSummary {
        TrainSummary {
            train_number: self.train_number.clone(),
            train_name: self.train_name.clone(),
            from_station: self.from_station.clone(),
            to_station: self.to_station.clone(),
            departure_time: self.departure_time,
            arrival_time: self.arrival_time,
        }
    }
}

/// The train columns joined onto a booking listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainSummary {
    pub train_number: String,
    pub train_name: String,
    pub from_station: String,
    pub to_station: String,
    pub departure_time: NaiveTime,
    pub arrival_time: NaiveTime,
}
