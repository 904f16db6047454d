use chrono::NaiveDate;

use super::{
    ledger::Ledger,
    transaction::{Transaction, TransactionKind},
};

/// One removed record plus everything needed to put it back where it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedEntry {
    pub transaction: Transaction,
    pub kind: TransactionKind,
    pub date: NaiveDate,
    pub index: usize,
}

impl DeletedEntry {
    pub fn new(transaction: Transaction, index: usize) -> Self {
        let kind = transaction.kind;
        let date = transaction.date;
        Self {
            transaction,
            kind,
            date,
            index,
        }
    }
}

/// LIFO journal of deletion batches. One multi-select delete forms one
/// batch, so one undo reverses it wholesale.
#[derive(Debug, Clone, Default)]
pub struct UndoStack {
    batches: Vec<Vec<DeletedEntry>>,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a batch of removals. Empty batches are dropped so an undo
    /// never pops a no-op.
    pub fn record(&mut self, batch: Vec<DeletedEntry>) {
        if !batch.is_empty() {
            self.batches.push(batch);
        }
    }

    pub fn pop(&mut self) -> Option<Vec<DeletedEntry>> {
        self.batches.pop()
    }

    /// Pops the most recent batch and re-inserts every record at its
    /// remembered position. Returns how many records came back.
    pub fn restore_last(&mut self, ledger: &mut Ledger) -> usize {
        let Some(batch) = self.batches.pop() else {
            return 0;
        };
        let restored = batch.len();
        for entry in batch {
            ledger
                .partition_mut(entry.kind)
                .insert_at(entry.date, entry.index, entry.transaction);
        }
        restored
    }

    pub fn depth(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}
