use chrono::NaiveDate;

use crate::{
    errors::LedgerError,
    ledger::{
        parse_amount, Category, DateWindow, DeletedEntry, Ledger, LedgerSummary, Transaction,
        TransactionKind, TransactionRef, UndoStack,
    },
    storage::{LoadReport, StorageBackend},
};

use super::clock::{Clock, SystemClock};

/// Period the tracker is currently presenting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Day(NaiveDate),
    Range(DateWindow),
}

/// Where in-memory state stands relative to the files on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Clean,
    Dirty,
    PersistFailed,
}

/// Result of a mutating call: the refreshed view plus anything the caller
/// should surface to the user.
#[derive(Debug, Clone)]
pub struct MutationOutcome {
    pub summary: LedgerSummary,
    pub warnings: Vec<String>,
}

/// Outcome of an edit. `transaction` is `None` when the target was
/// already gone, which is not an error.
#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub transaction: Option<Transaction>,
    pub summary: LedgerSummary,
    pub warnings: Vec<String>,
}

/// Replacement values for one record. The date of a record never changes
/// through an edit.
#[derive(Debug, Clone)]
pub struct TransactionEdit {
    pub kind: TransactionKind,
    pub category: Category,
    pub amount: String,
}

/// Facade that coordinates the ledger, the deletion journal, persistence,
/// and the viewed period.
pub struct Tracker {
    ledger: Ledger,
    undo: UndoStack,
    storage: Box<dyn StorageBackend>,
    clock: Box<dyn Clock>,
    view: ViewMode,
    sync: SyncState,
}

impl Tracker {
    pub fn open(storage: Box<dyn StorageBackend>) -> (Self, LoadReport) {
        Self::open_with_clock(storage, Box::new(SystemClock))
    }

    pub fn open_with_clock(
        storage: Box<dyn StorageBackend>,
        clock: Box<dyn Clock>,
    ) -> (Self, LoadReport) {
        let (ledger, report) = storage.load();
        let today = clock.now().date();
        let tracker = Self {
            ledger,
            undo: UndoStack::new(),
            storage,
            clock,
            view: ViewMode::Day(today),
            sync: SyncState::Clean,
        };
        (tracker, report)
    }

    /// Appends a record stamped with the clock's current time. For income,
    /// a parseable `bonus` appends a companion record under
    /// `Category::Bonus`; an unparseable one is skipped with a warning.
    pub fn add_transaction(
        &mut self,
        kind: TransactionKind,
        category: Category,
        date: NaiveDate,
        amount: &str,
        bonus: Option<&str>,
    ) -> Result<MutationOutcome, LedgerError> {
        let amount = parse_amount(amount)?;
        let time = self.clock.now().time();
        let transaction = Transaction::new(kind, category, date, time, amount);
        tracing::debug!("adding {} record {} on {date}", kind.name(), transaction.id);
        self.ledger.partition_mut(kind).append(date, transaction);

        let mut warnings = Vec::new();
        if kind == TransactionKind::Income {
            if let Some(raw) = bonus {
                match parse_amount(raw) {
                    Ok(extra) => {
                        let companion = Transaction::new(kind, Category::Bonus, date, time, extra);
                        self.ledger.partition_mut(kind).append(date, companion);
                    }
                    Err(err) => warnings.push(format!("bonus skipped: {err}")),
                }
            }
        }
        warnings.extend(self.persist());
        Ok(MutationOutcome {
            summary: self.summary(),
            warnings,
        })
    }

    /// Removes every resolvable target and journals them as one batch.
    /// Targets that no longer resolve are skipped. Nothing is written when
    /// the whole selection missed.
    pub fn delete_transactions(&mut self, targets: &[TransactionRef]) -> MutationOutcome {
        let mut batch = Vec::new();
        for target in targets {
            if let Some((transaction, index)) = self
                .ledger
                .partition_mut(target.kind)
                .remove_by_id(target.date, target.id)
            {
                batch.push(DeletedEntry::new(transaction, index));
            }
        }
        if batch.is_empty() {
            return MutationOutcome {
                summary: self.summary(),
                warnings: Vec::new(),
            };
        }
        tracing::debug!("deleted {} records", batch.len());
        self.undo.record(batch);
        let warnings = self.persist();
        MutationOutcome {
            summary: self.summary(),
            warnings,
        }
    }

    /// Puts the most recently deleted batch back. An empty journal is a
    /// no-op that touches neither memory nor disk.
    pub fn undo_last_deletion(&mut self) -> MutationOutcome {
        let restored = self.undo.restore_last(&mut self.ledger);
        if restored == 0 {
            return MutationOutcome {
                summary: self.summary(),
                warnings: Vec::new(),
            };
        }
        tracing::debug!("restored {restored} records");
        let warnings = self.persist();
        MutationOutcome {
            summary: self.summary(),
            warnings,
        }
    }

    /// Rewrites one record. The amount is validated before the target is
    /// looked up, so bad input never leaves a half-applied edit. Changing
    /// the kind moves the record to the other partition, at the end of its
    /// date bucket.
    pub fn edit_transaction(
        &mut self,
        target: TransactionRef,
        edit: TransactionEdit,
    ) -> Result<EditOutcome, LedgerError> {
        let amount = parse_amount(&edit.amount)?;
        let updated = if edit.kind == target.kind {
            match self
                .ledger
                .partition_mut(target.kind)
                .find_by_id_mut(target.date, target.id)
            {
                Some(record) => {
                    record.category = edit.category;
                    record.amount = amount;
                    Some(record.clone())
                }
                None => None,
            }
        } else {
            match self
                .ledger
                .partition_mut(target.kind)
                .remove_by_id(target.date, target.id)
            {
                Some((mut record, _)) => {
                    record.kind = edit.kind;
                    record.category = edit.category;
                    record.amount = amount;
                    self.ledger
                        .partition_mut(edit.kind)
                        .append(target.date, record.clone());
                    Some(record)
                }
                None => None,
            }
        };
        let warnings = match &updated {
            Some(record) => {
                tracing::debug!("edited record {}", record.id);
                self.persist()
            }
            None => Vec::new(),
        };
        Ok(EditOutcome {
            transaction: updated,
            summary: self.summary(),
            warnings,
        })
    }

    pub fn select_date(&mut self, date: NaiveDate) -> LedgerSummary {
        self.view = ViewMode::Day(date);
        self.summary()
    }

    /// Selects an inclusive range; endpoints may arrive in either order.
    pub fn select_range(&mut self, start: NaiveDate, end: NaiveDate) -> LedgerSummary {
        self.view = ViewMode::Range(DateWindow::normalized(start, end));
        self.summary()
    }

    /// Totals and rows for the current view, regenerated from the ledger.
    pub fn summary(&self) -> LedgerSummary {
        match self.view {
            ViewMode::Day(date) => LedgerSummary {
                totals: self.ledger.totals_for_date(date),
                rows: self.ledger.rows_for_date(date),
            },
            ViewMode::Range(window) => LedgerSummary {
                totals: self.ledger.totals_for_range(window.start, window.end),
                rows: self.ledger.rows_for_range(window.start, window.end),
            },
        }
    }

    /// Writes the ledger out, for a shutdown flush or a retry after an
    /// earlier failure.
    pub fn save(&mut self) -> Result<(), LedgerError> {
        match self.storage.save(&self.ledger) {
            Ok(()) => {
                self.sync = SyncState::Clean;
                Ok(())
            }
            Err(err) => {
                self.sync = SyncState::PersistFailed;
                Err(err)
            }
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    pub fn sync_state(&self) -> SyncState {
        self.sync
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.depth()
    }

    fn persist(&mut self) -> Vec<String> {
        self.sync = SyncState::Dirty;
        match self.storage.save(&self.ledger) {
            Ok(()) => {
                self.sync = SyncState::Clean;
                Vec::new()
            }
            Err(err) => {
                tracing::warn!("failed to persist ledger: {err}");
                self.sync = SyncState::PersistFailed;
                vec![format!(
                    "changes kept in memory but not written to disk: {err}"
                )]
            }
        }
    }
}
