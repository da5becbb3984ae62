use chrono::NaiveTime;
use railbook_core::Train;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Timetable loaded into the in-memory store. Matches the rows seeded by the
/// SQL migrations.
pub fn demo_trains() -> Vec<Train> {
    vec![
        train("12951", "Mumbai Rajdhani Express", "New Delhi", "Mumbai Central", (16, 55), (8, 35), 120, 304500),
        train("12953", "August Kranti Rajdhani", "Hazrat Nizamuddin", "Mumbai Central", (17, 15), (10, 5), 0, 289000),
        train("12002", "Bhopal Shatabdi Express", "New Delhi", "Rani Kamlapati", (6, 0), (14, 25), 78, 125050),
        train("12627", "Karnataka Express", "KSR Bengaluru", "New Delhi", (19, 20), (9, 0), 64, 178500),
        train("12301", "Howrah Rajdhani Express", "New Delhi", "Howrah Junction", (16, 50), (9, 55), 96, 295500),
        train("22691", "Bengaluru Rajdhani Express", "KSR Bengaluru", "Hazrat Nizamuddin", (20, 0), (5, 30), 40, 382000),
    ]
}

#[allow(clippy::too_many_arguments)]
fn train(
    number: &str,
    name: &str,
    from: &str,
    to: &str,
    departs: (u32, u32),
    arrives: (u32, u32),
    seats: i32,
    price_paise: i64,
) -> Train {
    Train {
        id: Uuid::new_v4(),
        train_number: number.to_string(),
        train_name: name.to_string(),
        from_station: from.to_string(),
        to_station: to.to_string(),
        departure_time: at(departs),
        arrival_time: at(arrives),
        available_seats: seats,
        price_per_seat: Decimal::new(price_paise, 2),
    }
}

fn at((hour, minute): (u32, u32)) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}
