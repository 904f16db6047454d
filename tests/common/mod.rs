use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::{NaiveDate, NaiveDateTime};
use finance_core::{
    config::ConfigManager,
    core::{Clock, Tracker},
    storage::{JsonStorage, LoadReport},
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Clock pinned to a fixed instant so record timestamps are predictable.
pub struct FrozenClock(pub NaiveDateTime);

impl Clock for FrozenClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

pub fn march(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).expect("valid day in March 2024")
}

pub fn frozen_clock() -> Box<FrozenClock> {
    Box::new(FrozenClock(
        march(5).and_hms_opt(9, 15, 0).expect("timestamp"),
    ))
}

/// Registers an isolated data directory that outlives the calling test.
pub fn test_data_dir() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// Opens a tracker on a fresh directory, with its config manager beside it.
#[allow(dead_code)]
pub fn setup_test_env() -> (Tracker, ConfigManager, PathBuf) {
    let base = test_data_dir();
    let storage = JsonStorage::new(Some(base.clone())).expect("create json storage backend");
    let (tracker, report) = Tracker::open_with_clock(Box::new(storage), frozen_clock());
    assert!(
        report.warnings.is_empty(),
        "a fresh data directory must load without warnings"
    );
    let config = ConfigManager::new(Some(base.clone())).expect("create config manager");
    (tracker, config, base)
}

/// Reopens a tracker over an existing data directory.
#[allow(dead_code)]
pub fn reopen_tracker(base: &Path) -> (Tracker, LoadReport) {
    let storage = JsonStorage::new(Some(base.to_path_buf())).expect("reopen json storage backend");
    Tracker::open_with_clock(Box::new(storage), frozen_clock())
}
