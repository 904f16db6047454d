use std::{
    collections::{BTreeMap, HashSet},
    env,
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::{
    prelude::{FromPrimitive, ToPrimitive},
    Decimal,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::{Category, Ledger, Partition, Transaction, TransactionKind};

use super::{LoadReport, Result, StorageBackend};

const EXPENSES_FILE: &str = "expenses.json";
const INCOME_FILE: &str = "income.json";
const TMP_SUFFIX: &str = "tmp";
const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";
const DATA_DIR_ENV: &str = "FINANCE_CORE_HOME";
const DATA_DIR_NAME: &str = ".finance_core";

/// Resolves the managed data directory: `$FINANCE_CORE_HOME` when set,
/// otherwise `.finance_core` under the home directory.
pub fn default_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(DATA_DIR_ENV) {
        return PathBuf::from(custom);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR_NAME)
}

/// Stores each partition as one pretty-printed JSON file keyed by date.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    dir: PathBuf,
}

impl JsonStorage {
    pub fn new(root: Option<PathBuf>) -> Result<Self> {
        let dir = root.unwrap_or_else(default_data_dir);
        ensure_dir(&dir)?;
        Ok(Self { dir })
    }

    pub fn new_default() -> Result<Self> {
        Self::new(None)
    }

    pub fn base_dir(&self) -> &Path {
        &self.dir
    }

    pub fn partition_path(&self, kind: TransactionKind) -> PathBuf {
        let name = match kind {
            TransactionKind::Expense => EXPENSES_FILE,
            TransactionKind::Income => INCOME_FILE,
        };
        self.dir.join(name)
    }

    /// Moves ledger files that earlier releases wrote into `from_dir` over
    /// to the managed data directory. Files already present there win.
    pub fn migrate_legacy_files(&self, from_dir: &Path) -> Vec<String> {
        let mut report = Vec::new();
        for name in [EXPENSES_FILE, INCOME_FILE] {
            let source = from_dir.join(name);
            let target = self.dir.join(name);
            if !source.exists() || target.exists() {
                continue;
            }
            match move_file(&source, &target) {
                Ok(()) => {
                    tracing::info!("migrated {} to {}", source.display(), target.display());
                    report.push(format!(
                        "migrated {} to {}",
                        source.display(),
                        target.display()
                    ));
                }
                Err(err) => {
                    tracing::warn!("could not migrate {}: {err}", source.display());
                    report.push(format!("could not migrate {}: {err}", source.display()));
                }
            }
        }
        report
    }

    fn load_partition(
        &self,
        kind: TransactionKind,
        seen: &mut HashSet<Uuid>,
        report: &mut LoadReport,
    ) -> Partition {
        let path = self.partition_path(kind);
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Partition::new(),
            Err(err) => {
                tracing::warn!("failed to read {}: {err}", path.display());
                report.warnings.push(format!(
                    "failed to read {}: {err}; starting empty",
                    path.display()
                ));
                return Partition::new();
            }
        };
        let raw: BTreeMap<String, Vec<RawTransaction>> = match serde_json::from_str(&data) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!("failed to parse {}: {err}", path.display());
                report.warnings.push(format!(
                    "failed to parse {}: {err}; starting empty",
                    path.display()
                ));
                return Partition::new();
            }
        };
        let mut partition = Partition::new();
        for (key, records) in raw {
            let Ok(date) = NaiveDate::parse_from_str(&key, DATE_FORMAT) else {
                report.warnings.push(format!(
                    "{}: dropped {} records under unreadable date key {:?}",
                    path.display(),
                    records.len(),
                    key
                ));
                continue;
            };
            for record in records {
                let transaction = record.into_transaction(date, kind, seen, report);
                partition.append(date, transaction);
            }
        }
        partition
    }

    fn save_partition(&self, partition: &Partition, kind: TransactionKind) -> Result<()> {
        let mut document: BTreeMap<String, Vec<RawTransaction>> = BTreeMap::new();
        for (date, records) in partition.days() {
            document.insert(
                date.format(DATE_FORMAT).to_string(),
                records.iter().map(RawTransaction::from_transaction).collect(),
            );
        }
        let json = serde_json::to_string_pretty(&document)?;
        let path = self.partition_path(kind);
        let tmp = tmp_path(&path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

impl StorageBackend for JsonStorage {
    fn load(&self) -> (Ledger, LoadReport) {
        let mut report = LoadReport::default();
        let mut seen = HashSet::new();
        let expenses = self.load_partition(TransactionKind::Expense, &mut seen, &mut report);
        let incomes = self.load_partition(TransactionKind::Income, &mut seen, &mut report);
        (Ledger { expenses, incomes }, report)
    }

    fn save(&self, ledger: &Ledger) -> Result<()> {
        self.save_partition(&ledger.expenses, TransactionKind::Expense)?;
        self.save_partition(&ledger.incomes, TransactionKind::Income)?;
        Ok(())
    }
}

/// On-disk record shape. Validation happens in the conversion below, not
/// in serde, so one bad field never rejects a whole document.
#[derive(Debug, Serialize, Deserialize)]
struct RawTransaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default)]
    date: String,
    #[serde(default)]
    time: String,
    #[serde(default)]
    amount: f64,
    #[serde(default)]
    category: String,
    #[serde(rename = "type", default)]
    kind: String,
}

impl RawTransaction {
    fn from_transaction(tx: &Transaction) -> Self {
        Self {
            id: Some(tx.id.to_string()),
            date: tx.date.format(DATE_FORMAT).to_string(),
            time: tx.time.format(TIME_FORMAT).to_string(),
            amount: tx.amount.to_f64().unwrap_or(0.0),
            category: tx.category.name().to_string(),
            kind: tx.kind.name().to_string(),
        }
    }

    fn into_transaction(
        self,
        date: NaiveDate,
        kind: TransactionKind,
        seen: &mut HashSet<Uuid>,
        report: &mut LoadReport,
    ) -> Transaction {
        let id = match self.id.as_deref().and_then(|raw| Uuid::parse_str(raw).ok()) {
            Some(parsed) if seen.insert(parsed) => parsed,
            _ => {
                report.repaired_ids += 1;
                fresh_id(seen)
            }
        };
        match NaiveDate::parse_from_str(&self.date, DATE_FORMAT) {
            Ok(recorded) if recorded == date => {}
            _ => report.warnings.push(format!(
                "record {id}: date {:?} replaced with its bucket date {date}",
                self.date
            )),
        }
        let time = match NaiveTime::parse_from_str(&self.time, TIME_FORMAT) {
            Ok(parsed) => parsed,
            Err(_) => {
                report.warnings.push(format!(
                    "record {id}: unreadable time {:?} reset to 00:00:00",
                    self.time
                ));
                NaiveTime::MIN
            }
        };
        let amount = match Decimal::from_f64(self.amount) {
            Some(value) if value >= Decimal::ZERO => value,
            _ => {
                report
                    .warnings
                    .push(format!("record {id}: amount {} reset to 0", self.amount));
                Decimal::ZERO
            }
        };
        let category = match Category::from_name(&self.category) {
            Some(category) => category,
            None => {
                report.warnings.push(format!(
                    "record {id}: unknown category {:?} mapped to Other",
                    self.category
                ));
                Category::Other
            }
        };
        if TransactionKind::from_name(&self.kind) != Some(kind) {
            report.warnings.push(format!(
                "record {id}: type {:?} coerced to {}",
                self.kind,
                kind.name()
            ));
        }
        Transaction {
            id,
            date,
            time,
            amount,
            category,
            kind,
        }
    }
}

fn fresh_id(seen: &mut HashSet<Uuid>) -> Uuid {
    loop {
        let id = Uuid::new_v4();
        if seen.insert(id) {
            return id;
        }
    }
}

fn move_file(source: &Path, target: &Path) -> Result<()> {
    if fs::rename(source, target).is_ok() {
        return Ok(());
    }
    fs::copy(source, target)?;
    fs::remove_file(source)?;
    Ok(())
}

fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn storage_with_temp_dir() -> (JsonStorage, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let storage = JsonStorage::new(Some(temp.path().to_path_buf())).expect("json storage");
        (storage, temp)
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).expect("date")
    }

    fn time(hour: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, 30, 0).expect("time")
    }

    fn sample_ledger() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.expenses.append(
            date(5),
            Transaction::new(
                TransactionKind::Expense,
                Category::Food,
                date(5),
                time(9),
                Decimal::new(500, 0),
            ),
        );
        ledger.incomes.append(
            date(5),
            Transaction::new(
                TransactionKind::Income,
                Category::Salary,
                date(5),
                time(10),
                Decimal::new(2000, 0),
            ),
        );
        ledger.incomes.append(
            date(5),
            Transaction::new(
                TransactionKind::Income,
                Category::Bonus,
                date(5),
                time(10),
                Decimal::new(300, 0),
            ),
        );
        ledger
    }

    #[test]
    fn save_and_load_roundtrip() {
        let (storage, _guard) = storage_with_temp_dir();
        let ledger = sample_ledger();
        storage.save(&ledger).expect("save ledger");

        let (loaded, report) = storage.load();
        assert_eq!(loaded, ledger);
        assert_eq!(report.repaired_ids, 0);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn missing_files_load_as_empty_ledger() {
        let (storage, _guard) = storage_with_temp_dir();
        let (loaded, report) = storage.load();
        assert!(loaded.is_empty());
        assert_eq!(report.repaired_ids, 0);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn corrupt_file_loads_as_empty_with_warning() {
        let (storage, _guard) = storage_with_temp_dir();
        let ledger = sample_ledger();
        storage.save(&ledger).expect("save ledger");
        fs::write(
            storage.partition_path(TransactionKind::Expense),
            "{not json",
        )
        .expect("corrupt file");

        let (loaded, report) = storage.load();
        assert!(loaded.expenses.is_empty());
        assert_eq!(loaded.incomes.len(), 2);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("expenses.json"));
    }

    #[test]
    fn records_without_ids_are_assigned_fresh_ones() {
        let (storage, _guard) = storage_with_temp_dir();
        let document = r#"{
            "2024-03-05": [
                {"date": "2024-03-05", "time": "09:30:00", "amount": 500.0, "category": "Food", "type": "Expense"},
                {"date": "2024-03-05", "time": "10:30:00", "amount": 120.0, "category": "Bills", "type": "Expense"}
            ]
        }"#;
        fs::write(storage.partition_path(TransactionKind::Expense), document)
            .expect("write document");

        let (loaded, report) = storage.load();
        assert_eq!(report.repaired_ids, 2);
        let day = loaded.expenses.day(date(5));
        assert_eq!(day.len(), 2);
        assert_ne!(day[0].id, day[1].id);
    }

    #[test]
    fn duplicate_ids_are_reassigned_across_partitions() {
        let (storage, _guard) = storage_with_temp_dir();
        let id = Uuid::new_v4();
        let expense = format!(
            r#"{{"2024-03-05": [{{"id": "{id}", "date": "2024-03-05", "time": "09:30:00", "amount": 500.0, "category": "Food", "type": "Expense"}}]}}"#
        );
        let income = format!(
            r#"{{"2024-03-05": [{{"id": "{id}", "date": "2024-03-05", "time": "10:30:00", "amount": 2000.0, "category": "Salary", "type": "Income"}}]}}"#
        );
        fs::write(storage.partition_path(TransactionKind::Expense), expense)
            .expect("write expenses");
        fs::write(storage.partition_path(TransactionKind::Income), income).expect("write income");

        let (loaded, report) = storage.load();
        assert_eq!(report.repaired_ids, 1);
        assert_eq!(loaded.expenses.day(date(5))[0].id, id);
        assert_ne!(loaded.incomes.day(date(5))[0].id, id);
    }

    #[test]
    fn damaged_fields_are_coerced_with_warnings() {
        let (storage, _guard) = storage_with_temp_dir();
        let document = r#"{
            "2024-03-05": [
                {"date": "2024-12-31", "time": "late", "amount": -42.0, "category": "Groceries", "type": "Income"}
            ],
            "not-a-date": [
                {"date": "2024-03-05", "time": "09:30:00", "amount": 10.0, "category": "Food", "type": "Expense"}
            ]
        }"#;
        fs::write(storage.partition_path(TransactionKind::Expense), document)
            .expect("write document");

        let (loaded, report) = storage.load();
        assert_eq!(loaded.expenses.len(), 1);
        let record = &loaded.expenses.day(date(5))[0];
        assert_eq!(record.date, date(5));
        assert_eq!(record.time, NaiveTime::MIN);
        assert_eq!(record.amount, Decimal::ZERO);
        assert_eq!(record.category, Category::Other);
        assert_eq!(record.kind, TransactionKind::Expense);
        assert_eq!(report.repaired_ids, 1);
        // date, time, amount, category, and type coercions plus the
        // dropped bucket each leave a warning.
        assert_eq!(report.warnings.len(), 6);
    }

    #[test]
    fn files_are_pretty_printed_and_tmp_files_removed() {
        let (storage, _guard) = storage_with_temp_dir();
        storage.save(&sample_ledger()).expect("save ledger");

        let path = storage.partition_path(TransactionKind::Income);
        let data = fs::read_to_string(&path).expect("read income file");
        assert!(data.starts_with("{\n"));
        assert!(data.contains("\"type\": \"Income\""));
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn migrate_legacy_files_moves_missing_targets_only() {
        let (storage, _guard) = storage_with_temp_dir();
        let legacy = TempDir::new().expect("legacy dir");
        fs::write(legacy.path().join(EXPENSES_FILE), "{}").expect("legacy expenses");
        fs::write(legacy.path().join(INCOME_FILE), "{}").expect("legacy income");
        fs::write(
            storage.partition_path(TransactionKind::Income),
            r#"{"2024-03-05": []}"#,
        )
        .expect("existing income");

        let report = storage.migrate_legacy_files(legacy.path());
        assert_eq!(report.len(), 1);
        assert!(report[0].contains(EXPENSES_FILE));
        assert!(storage.partition_path(TransactionKind::Expense).exists());
        assert!(!legacy.path().join(EXPENSES_FILE).exists());
        // The income file in place was not overwritten.
        let data = fs::read_to_string(storage.partition_path(TransactionKind::Income))
            .expect("read income file");
        assert!(data.contains("2024-03-05"));
        assert!(legacy.path().join(INCOME_FILE).exists());
    }

    #[test]
    fn fractional_amounts_survive_the_roundtrip() {
        let (storage, _guard) = storage_with_temp_dir();
        let mut ledger = Ledger::new();
        ledger.expenses.append(
            date(5),
            Transaction::new(
                TransactionKind::Expense,
                Category::Food,
                date(5),
                time(9),
                Decimal::new(12345, 2),
            ),
        );
        storage.save(&ledger).expect("save ledger");

        let (loaded, _report) = storage.load();
        assert_eq!(loaded.expenses.day(date(5))[0].amount, Decimal::new(12345, 2));
    }
}
