pub mod json_backend;

use crate::{errors::LedgerError, ledger::Ledger};

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Abstraction over persistence backends for the two ledger partitions.
pub trait StorageBackend: Send + Sync {
    /// Reads both partitions. Loading never fails: unreadable content is
    /// replaced with an empty partition and reported in the `LoadReport`.
    fn load(&self) -> (Ledger, LoadReport);

    /// Writes both partitions.
    fn save(&self, ledger: &Ledger) -> Result<()>;
}

/// What the loader repaired or dropped while reading.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Records that came back with a fresh id because theirs was missing,
    /// unreadable, or already taken.
    pub repaired_ids: usize,
    pub warnings: Vec<String>,
}

pub use json_backend::{default_data_dir, JsonStorage};
