//! Ledger domain models, aggregation, and the deletion journal.

#[allow(clippy::module_inception)]
pub mod ledger;
pub mod summary;
pub mod transaction;
pub mod undo;

pub use ledger::{Ledger, Partition};
pub use summary::{DateWindow, EntryRow, LedgerSummary, Totals};
pub use transaction::{
    parse_amount, Category, Transaction, TransactionKind, TransactionRef,
};
pub use undo::{DeletedEntry, UndoStack};
