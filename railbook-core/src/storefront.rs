use chrono::NaiveDate;
use tracing::warn;
use uuid::Uuid;

use crate::booking::{Booking, BookingWithTrain};
use crate::catalog::TrainCatalog;
use crate::ledger::BookingLedger;
use crate::search::{SearchResults, TrainQuery};
use crate::session::SessionContext;
use crate::train::Train;
use crate::validation::{validate_passenger, PassengerInput};
use crate::writer::BookingWriter;
use crate::{CoreError, CoreResult};

/// Outcome of [`Storefront::cancel_booking`].
#[derive(Debug, Clone)]
pub struct Cancellation {
    /// False when the id was unknown or belonged to someone else.
    pub removed: bool,
    pub bookings: Vec<BookingWithTrain>,
}

/// User-facing booking flows, run under an explicit session.
///
/// Search is open to anyone; everything else needs a signed-in user.
#[derive(Clone)]
pub struct Storefront {
    catalog: TrainCatalog,
    writer: BookingWriter,
    ledger: BookingLedger,
    session: SessionContext,
}

impl Storefront {
    pub fn new(
        catalog: TrainCatalog,
        writer: BookingWriter,
        ledger: BookingLedger,
        session: SessionContext,
    ) -> Self {
        Self {
            catalog,
            writer,
            ledger,
            session,
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub async fn search(&self, query: &TrainQuery) -> CoreResult<SearchResults> {
        let trains = self.catalog.search(query).await?;
        Ok(SearchResults::new(query, trains))
    }

    pub async fn train(&self, train_id: Uuid) -> CoreResult<Train> {
        self.catalog.get(train_id).await
    }

    /// Picking a train to book. Sold-out trains stop here, before any
    /// passenger details are looked at.
    pub async fn select_train(&self, train_id: Uuid) -> CoreResult<Train> {
        self.session.require()?;
        let train = self.catalog.get(train_id).await?;
        if train.is_sold_out() {
            warn!("Booking attempt on sold-out train {}", train.train_number);
            return Err(CoreError::SoldOut("No seats available".to_string()));
        }
        Ok(train)
    }

    /// Empty form with the session email filled in.
    pub fn passenger_defaults(&self) -> CoreResult<PassengerInput> {
        let session = self.session.require()?;
        Ok(PassengerInput {
            email: session.email.unwrap_or_default(),
            ..PassengerInput::default()
        })
    }

    pub async fn confirm_booking(
        &self,
        train_id: Uuid,
        journey_date: NaiveDate,
        input: &PassengerInput,
    ) -> CoreResult<Booking> {
        let session = self.session.require()?;
        let train = self.select_train(train_id).await?;
        let passenger = validate_passenger(input).map_err(|e| {
            warn!("Rejected passenger details: {}", e);
            e
        })?;
        self.writer
            .write(&passenger, &train, journey_date, session.user_id)
            .await
    }

    pub async fn my_bookings(&self) -> CoreResult<Vec<BookingWithTrain>> {
        let session = self.session.require()?;
        self.ledger.list_for_user(session.user_id).await
    }

    /// Cancels and returns the refreshed listing.
    pub async fn cancel_booking(&self, booking_id: Uuid) -> CoreResult<Cancellation> {
        let session = self.session.require()?;
        let removed = self.ledger.cancel(session.user_id, booking_id).await?;
        let bookings = self.ledger.list_for_user(session.user_id).await?;
        Ok(Cancellation { removed, bookings })
    }
}
