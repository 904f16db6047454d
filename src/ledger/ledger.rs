use std::collections::BTreeMap;

use chrono::NaiveDate;
use uuid::Uuid;

use super::{
    summary::DateWindow,
    transaction::{Transaction, TransactionKind},
};

/// Date-keyed store for one side of the ledger. Buckets keep insertion
/// order; iterating over days is chronological.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    entries: BTreeMap<NaiveDate, Vec<Transaction>>,
}

impl Partition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record to the bucket for `date`, creating the bucket on
    /// first use.
    pub fn append(&mut self, date: NaiveDate, transaction: Transaction) {
        self.entries.entry(date).or_default().push(transaction);
    }

    /// Removes the record with `id` from the `date` bucket, returning it
    /// together with the position it held. Emptied buckets stay in place
    /// so a later undo can refill them.
    pub fn remove_by_id(&mut self, date: NaiveDate, id: Uuid) -> Option<(Transaction, usize)> {
        let bucket = self.entries.get_mut(&date)?;
        let index = bucket.iter().position(|tx| tx.id == id)?;
        Some((bucket.remove(index), index))
    }

    /// Re-inserts a record at `index` within the `date` bucket, clamping to
    /// the current length when the bucket has shrunk since removal.
    pub fn insert_at(&mut self, date: NaiveDate, index: usize, transaction: Transaction) {
        let bucket = self.entries.entry(date).or_default();
        let slot = index.min(bucket.len());
        bucket.insert(slot, transaction);
    }

    pub fn find_by_id(&self, date: NaiveDate, id: Uuid) -> Option<&Transaction> {
        self.entries.get(&date)?.iter().find(|tx| tx.id == id)
    }

    pub fn find_by_id_mut(&mut self, date: NaiveDate, id: Uuid) -> Option<&mut Transaction> {
        self.entries.get_mut(&date)?.iter_mut().find(|tx| tx.id == id)
    }

    /// Records for one day, oldest first. Missing days read as empty.
    pub fn day(&self, date: NaiveDate) -> &[Transaction] {
        self.entries.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn days(&self) -> impl Iterator<Item = (NaiveDate, &[Transaction])> {
        self.entries
            .iter()
            .map(|(date, bucket)| (*date, bucket.as_slice()))
    }

    pub fn days_in(&self, window: DateWindow) -> impl Iterator<Item = (NaiveDate, &[Transaction])> {
        self.entries
            .range(window.start..=window.end)
            .map(|(date, bucket)| (*date, bucket.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }
}

/// The two partitions that make up the in-memory ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    pub expenses: Partition,
    pub incomes: Partition,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn partition(&self, kind: TransactionKind) -> &Partition {
        match kind {
            TransactionKind::Expense => &self.expenses,
            TransactionKind::Income => &self.incomes,
        }
    }

    pub fn partition_mut(&mut self, kind: TransactionKind) -> &mut Partition {
        match kind {
            TransactionKind::Expense => &mut self.expenses,
            TransactionKind::Income => &mut self.incomes,
        }
    }

    pub fn transaction_count(&self) -> usize {
        self.expenses.len() + self.incomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty() && self.incomes.is_empty()
    }
}
