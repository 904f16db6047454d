//! The tracker facade and the clock it stamps records with.

pub mod clock;
pub mod tracker;

pub use clock::{Clock, SystemClock};
pub use tracker::{
    EditOutcome, MutationOutcome, SyncState, Tracker, TransactionEdit, ViewMode,
};
