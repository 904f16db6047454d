use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::LedgerError;

/// A single dated ledger record. The `kind` always matches the partition
/// the record lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub amount: Decimal,
    pub category: Category,
    pub kind: TransactionKind,
}

impl Transaction {
    pub fn new(
        kind: TransactionKind,
        category: Category,
        date: NaiveDate,
        time: NaiveTime,
        amount: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            time,
            amount,
            category,
            kind,
        }
    }
}

/// Which of the two ledger partitions a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Expense,
    Income,
}

impl TransactionKind {
    pub fn name(&self) -> &'static str {
        match self {
            TransactionKind::Expense => "Expense",
            TransactionKind::Income => "Income",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Expense" => Some(TransactionKind::Expense),
            "Income" => Some(TransactionKind::Income),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Food,
    Transport,
    Shopping,
    Entertainment,
    Bills,
    Salary,
    Freelance,
    Investment,
    /// Synthetic category assigned to the companion record created when an
    /// income entry carries a bonus amount.
    Bonus,
    Other,
}

impl Category {
    pub fn name(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transport => "Transport",
            Category::Shopping => "Shopping",
            Category::Entertainment => "Entertainment",
            Category::Bills => "Bills",
            Category::Salary => "Salary",
            Category::Freelance => "Freelance",
            Category::Investment => "Investment",
            Category::Bonus => "Bonus",
            Category::Other => "Other",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Food" => Some(Category::Food),
            "Transport" => Some(Category::Transport),
            "Shopping" => Some(Category::Shopping),
            "Entertainment" => Some(Category::Entertainment),
            "Bills" => Some(Category::Bills),
            "Salary" => Some(Category::Salary),
            "Freelance" => Some(Category::Freelance),
            "Investment" => Some(Category::Investment),
            "Bonus" => Some(Category::Bonus),
            "Other" => Some(Category::Other),
            _ => None,
        }
    }

    /// Categories offered by the entry form's picker, in display order.
    /// One shared list serves both kinds; `Bonus` is never offered and only
    /// appears on generated bonus records.
    pub fn selectable() -> &'static [Category] {
        &[
            Category::Food,
            Category::Transport,
            Category::Shopping,
            Category::Entertainment,
            Category::Bills,
            Category::Salary,
            Category::Freelance,
            Category::Investment,
            Category::Other,
        ]
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything needed to locate one record: which partition, which date
/// bucket, which id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRef {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub date: NaiveDate,
}

/// Parses user-entered amount text into a non-negative decimal.
pub fn parse_amount(raw: &str) -> Result<Decimal, LedgerError> {
    let trimmed = raw.trim();
    match trimmed.parse::<Decimal>() {
        Ok(value) if value >= Decimal::ZERO => Ok(value),
        _ => Err(LedgerError::InvalidAmount(raw.to_string())),
    }
}
