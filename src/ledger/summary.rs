use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    ledger::Ledger,
    transaction::{Category, Transaction, TransactionKind, TransactionRef},
};

/// Inclusive date range with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Builds a window from two dates given in either order.
    pub fn normalized(a: NaiveDate, b: NaiveDate) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Aggregated amounts for one day or one date window. `bonus` is the
/// slice of `income` contributed by bonus records, not an extra bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub expense: Decimal,
    pub income: Decimal,
    pub bonus: Decimal,
    pub balance: Decimal,
}

/// One display row, newest first in the lists produced below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryRow {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub category: Category,
    pub amount: Decimal,
}

impl EntryRow {
    pub fn to_ref(&self) -> TransactionRef {
        TransactionRef {
            id: self.id,
            kind: self.kind,
            date: self.date,
        }
    }
}

impl From<&Transaction> for EntryRow {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.id,
            kind: tx.kind,
            date: tx.date,
            time: tx.time,
            category: tx.category,
            amount: tx.amount,
        }
    }
}

/// Totals plus display rows for whatever period is being viewed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    pub totals: Totals,
    pub rows: Vec<EntryRow>,
}

impl Ledger {
    pub fn totals_for_date(&self, date: NaiveDate) -> Totals {
        accumulate(
            self.expenses.day(date).iter(),
            self.incomes.day(date).iter(),
        )
    }

    pub fn totals_for_range(&self, start: NaiveDate, end: NaiveDate) -> Totals {
        let window = DateWindow::normalized(start, end);
        accumulate(
            self.expenses.days_in(window).flat_map(|(_, day)| day),
            self.incomes.days_in(window).flat_map(|(_, day)| day),
        )
    }

    pub fn rows_for_date(&self, date: NaiveDate) -> Vec<EntryRow> {
        let mut rows: Vec<EntryRow> = self.expenses.day(date).iter().map(EntryRow::from).collect();
        rows.extend(self.incomes.day(date).iter().map(EntryRow::from));
        sort_newest_first(&mut rows);
        rows
    }

    pub fn rows_for_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<EntryRow> {
        let window = DateWindow::normalized(start, end);
        let mut rows: Vec<EntryRow> = self
            .expenses
            .days_in(window)
            .flat_map(|(_, day)| day)
            .map(EntryRow::from)
            .collect();
        rows.extend(
            self.incomes
                .days_in(window)
                .flat_map(|(_, day)| day)
                .map(EntryRow::from),
        );
        sort_newest_first(&mut rows);
        rows
    }
}

fn accumulate<'a, E, I>(expenses: E, incomes: I) -> Totals
where
    E: Iterator<Item = &'a Transaction>,
    I: Iterator<Item = &'a Transaction>,
{
    let mut totals = Totals::default();
    for tx in expenses {
        totals.expense += tx.amount;
    }
    for tx in incomes {
        totals.income += tx.amount;
        if tx.category == Category::Bonus {
            totals.bonus += tx.amount;
        }
    }
    totals.balance = totals.income - totals.expense;
    totals
}

// The sort is stable, so records sharing a timestamp keep the order their
// buckets held them in.
fn sort_newest_first(rows: &mut [EntryRow]) {
    rows.sort_by(|a, b| (b.date, b.time).cmp(&(a.date, a.time)));
}
