use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::booking::{Booking, BookingWithTrain, NewBooking};
use crate::repository::{BookingRepository, TrainRepository};
use crate::search::{sort_for_listing, TrainQuery};
use crate::train::Train;
use crate::{CoreError, CoreResult};

/// In-process data layer used when no database is configured, and by tests.
#[derive(Default)]
pub struct InMemoryStore {
    trains: RwLock<HashMap<Uuid, Train>>,
    // insertion order, oldest first
    bookings: RwLock<Vec<Booking>>,
    offline: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trains(trains: impl IntoIterator<Item = Train>) -> Self {
        let mut store = Self::default();
        let map = store.trains.get_mut();
        for train in trains {
            map.insert(train.id, train);
        }
        store
    }

    pub async fn upsert_train(&self, train: Train) {
        self.trains.write().await.insert(train.id, train);
    }

    /// Makes every call fail as if the store were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> CoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(CoreError::Persistence("data store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl TrainRepository for InMemoryStore {
    async fn find_trains(&self, query: &TrainQuery) -> CoreResult<Vec<Train>> {
        self.ensure_online()?;
        let mut found: Vec<Train> = self
            .trains
            .read()
            .await
            .values()
            .filter(|t| query.matches(t))
            .cloned()
            .collect();
        sort_for_listing(&mut found);
        Ok(found)
    }

    async fn find_train(&self, id: Uuid) -> CoreResult<Option<Train>> {
        self.ensure_online()?;
        Ok(self.trains.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn insert_booking(&self, booking: NewBooking) -> CoreResult<Booking> {
        self.ensure_online()?;
        if !self.trains.read().await.contains_key(&booking.train_id) {
            return Err(CoreError::Persistence(format!(
                "train {} does not exist",
                booking.train_id
            )));
        }

        let mut bookings = self.bookings.write().await;
        if bookings
            .iter()
            .any(|b| b.booking_reference == booking.booking_reference)
        {
            return Err(CoreError::Persistence(format!(
                "duplicate booking reference {}",
                booking.booking_reference
            )));
        }

        let stored = booking.into_booking(Uuid::new_v4());
        bookings.push(stored.clone());
        Ok(stored)
    }

    async fn list_bookings(&self, owner: Uuid) -> CoreResult<Vec<BookingWithTrain>> {
        self.ensure_online()?;
        let trains = self.trains.read().await;
        let bookings = self.bookings.read().await;

        let mut listed: Vec<BookingWithTrain> = bookings
            .iter()
            .rev()
            .filter(|b| b.user_id == owner)
            .filter_map(|b| {
                trains.get(&b.train_id).map(|t| BookingWithTrain {
                    booking: b.clone(),
                    train: t.summary(),
                })
            })
            .collect();
        // stable, so equal timestamps keep newest-inserted first
        listed.sort_by(|a, b| b.booking.created_at.cmp(&a.booking.created_at));
        Ok(listed)
    }

    async fn delete_booking(&self, owner: Uuid, booking_id: Uuid) -> CoreResult<bool> {
        self.ensure_online()?;
        let mut bookings = self.bookings.write().await;
        let before = bookings.len();
        bookings.retain(|b| !(b.id == booking_id && b.user_id == owner));
        Ok(bookings.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::Allocator;
    use crate::booking::BookingStatus;
    use crate::train::fixtures::train;
    use chrono::{Duration, NaiveDate, Utc};
    use rust_decimal::Decimal;

    fn new_booking(user_id: Uuid, train: &Train, allocator: &Allocator, offset_secs: i64) -> NewBooking {
        let now = Utc::now() + Duration::seconds(offset_secs);
        let (seat_number, booking_reference) = allocator.allocate(now);
        NewBooking {
            user_id,
            train_id: train.id,
            passenger_name: "Asha".to_string(),
            passenger_age: 30,
            passenger_email: "asha@example.com".to_string(),
            seat_number,
            journey_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            total_amount: train.price_per_seat,
            booking_reference,
            booking_status: BookingStatus::Confirmed,
            created_at: now,
        }
    }

    #[tokio::test]
    async fn test_find_trains_filters_and_orders() {
        let mut late = train("12952", "New Delhi", "Mumbai Central", 10, Decimal::ONE);
        late.departure_time = chrono::NaiveTime::from_hms_opt(16, 35, 0).unwrap();
        let early = train("12954", "Hazrat Nizamuddin", "Mumbai Central", 10, Decimal::ONE);
        let other = train("12002", "New Delhi", "Bhopal", 10, Decimal::ONE);
        let store = InMemoryStore::with_trains([late.clone(), early.clone(), other]);

        let found = store.find_trains(&TrainQuery::new("", "mumbai")).await.unwrap();
        let numbers: Vec<_> = found.iter().map(|t| t.train_number.as_str()).collect();
        assert_eq!(numbers, vec!["12954", "12952"]);

        assert_eq!(store.find_trains(&TrainQuery::default()).await.unwrap().len(), 3);
        assert_eq!(store.find_train(early.id).await.unwrap(), Some(early));
        assert_eq!(store.find_train(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_insert_requires_existing_train() {
        let t = train("12951", "New Delhi", "Mumbai Central", 10, Decimal::ONE);
        let store = InMemoryStore::new();
        let allocator = Allocator::seeded(3);

        let err = store
            .insert_booking(new_booking(Uuid::new_v4(), &t, &allocator, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Persistence(_)));
    }

    #[tokio::test]
    async fn test_duplicate_reference_rejected() {
        let t = train("12951", "New Delhi", "Mumbai Central", 10, Decimal::ONE);
        let store = InMemoryStore::with_trains([t.clone()]);
        let allocator = Allocator::seeded(3);
        let first = new_booking(Uuid::new_v4(), &t, &allocator, 0);
        let mut second = new_booking(Uuid::new_v4(), &t, &allocator, 0);
        second.booking_reference = first.booking_reference.clone();

        store.insert_booking(first).await.unwrap();
        assert!(matches!(
            store.insert_booking(second).await,
            Err(CoreError::Persistence(_))
        ));
    }

    #[tokio::test]
    async fn test_list_scoped_to_owner_newest_first() {
        let t = train("12951", "New Delhi", "Mumbai Central", 10, Decimal::ONE);
        let store = InMemoryStore::with_trains([t.clone()]);
        let allocator = Allocator::seeded(5);
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let older = store.insert_booking(new_booking(alice, &t, &allocator, -60)).await.unwrap();
        store.insert_booking(new_booking(bob, &t, &allocator, 0)).await.unwrap();
        let newer = store.insert_booking(new_booking(alice, &t, &allocator, 0)).await.unwrap();

        let listed = store.list_bookings(alice).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|b| b.booking.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
        assert_eq!(listed[0].train.train_number, "12951");
    }

    #[tokio::test]
    async fn test_delete_is_scoped_and_idempotent() {
        let t = train("12951", "New Delhi", "Mumbai Central", 10, Decimal::ONE);
        let store = InMemoryStore::with_trains([t.clone()]);
        let allocator = Allocator::seeded(8);
        let alice = Uuid::new_v4();
        let booking = store.insert_booking(new_booking(alice, &t, &allocator, 0)).await.unwrap();

        assert!(!store.delete_booking(Uuid::new_v4(), booking.id).await.unwrap());
        assert_eq!(store.list_bookings(alice).await.unwrap().len(), 1);

        assert!(store.delete_booking(alice, booking.id).await.unwrap());
        assert!(!store.delete_booking(alice, booking.id).await.unwrap());
        assert!(store.list_bookings(alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_offline_store_fails() {
        let store = InMemoryStore::new();
        store.set_offline(true);
        assert!(matches!(
            store.find_trains(&TrainQuery::default()).await,
            Err(CoreError::Persistence(_))
        ));
        store.set_offline(false);
        assert!(store.find_trains(&TrainQuery::default()).await.is_ok());
    }
}
