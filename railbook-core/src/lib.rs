pub mod allocation;
pub mod booking;
pub mod catalog;
pub mod ledger;
pub mod memory;
pub mod repository;
pub mod search;
pub mod session;
pub mod storefront;
pub mod train;
pub mod validation;
pub mod writer;

pub use allocation::Allocator;
pub use booking::{Booking, BookingReference, BookingStatus, BookingWithTrain, NewBooking, SeatNumber};
pub use catalog::TrainCatalog;
pub use ledger::BookingLedger;
pub use memory::InMemoryStore;
pub use search::{SearchResults, TrainQuery};
pub use session::{Session, SessionContext, SessionEvent, SessionObserver, SessionProvider};
pub use storefront::{Cancellation, Storefront};
pub use train::{Train, TrainSummary};
pub use validation::{validate_passenger, PassengerInput, ValidatedPassenger};
pub use writer::BookingWriter;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{0}")]
    Validation(String),
    #[error("Persistence failure: {0}")]
    Persistence(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    SoldOut(String),
    #[error("Sign in required")]
    Unauthenticated,
}

pub type CoreResult<T> = Result<T, CoreError>;
