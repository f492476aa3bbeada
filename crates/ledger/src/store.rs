// In crates/ledger/src/store.rs
//
// The append-only cycle-record store. Each record is persisted as one
// independently named JSON file, which keeps writes crash-safe and makes
// the retention sweep a plain file walk.

use crate::error::Result;
use crate::record::CycleRecord;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

const FILE_PREFIX: &str = "cycle_";

/// The ordered-record interface the rest of the system depends on. The
/// store exclusively owns persisted records; callers only read and append.
pub trait RecordStore {
    /// Stamps the record with the next cycle number and the current time,
    /// then persists it.
    fn append(&mut self, record: &mut CycleRecord) -> Result<()>;

    /// The `n` most recently written records, ordered oldest first.
    fn latest(&self, n: usize) -> Result<Vec<CycleRecord>>;

    /// All records written on the given date.
    fn by_date(&self, date: NaiveDate) -> Result<Vec<CycleRecord>>;

    /// Deletes records older than the retention horizon. Returns how many
    /// were removed.
    fn prune(&mut self, retention_days: u32) -> Result<usize>;
}

/// One-JSON-file-per-record store rooted at a directory.
#[derive(Debug)]
pub struct FileRecordStore {
    dir: PathBuf,
    cycle_number: u64,
}

impl FileRecordStore {
    /// Opens (or creates) the store directory and resumes the cycle counter
    /// from the highest number already on disk.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let mut cycle_number = 0;
        for path in record_files(&dir)? {
            if let Some(number) = parse_cycle_number(&path) {
                cycle_number = cycle_number.max(number);
            }
        }

        Ok(Self { dir, cycle_number })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl RecordStore for FileRecordStore {
    fn append(&mut self, record: &mut CycleRecord) -> Result<()> {
        self.cycle_number += 1;
        record.cycle_number = self.cycle_number;
        record.timestamp = Utc::now();

        let filename = format!(
            "{FILE_PREFIX}{}_{:05}.json",
            record.timestamp.format("%Y%m%d_%H%M%S"),
            record.cycle_number
        );
        let path = self.dir.join(filename);

        let data = serde_json::to_vec_pretty(record)?;
        fs::write(&path, data)?;

        tracing::info!(path = %path.display(), cycle = record.cycle_number, "Cycle record persisted.");
        Ok(())
    }

    fn latest(&self, n: usize) -> Result<Vec<CycleRecord>> {
        let files = record_files(&self.dir)?;

        // Walk newest-first, counting only records that actually decode;
        // unreadable files are skipped, not fatal.
        let mut records = Vec::new();
        for path in files.iter().rev() {
            if records.len() >= n {
                break;
            }
            if let Some(record) = read_record(path) {
                records.push(record);
            }
        }

        records.reverse();
        Ok(records)
    }

    fn by_date(&self, date: NaiveDate) -> Result<Vec<CycleRecord>> {
        let prefix = format!("{FILE_PREFIX}{}", date.format("%Y%m%d"));

        let mut records = Vec::new();
        for path in record_files(&self.dir)? {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if !name.starts_with(&prefix) {
                continue;
            }
            if let Some(record) = read_record(&path) {
                records.push(record);
            }
        }
        Ok(records)
    }

    fn prune(&mut self, retention_days: u32) -> Result<usize> {
        let cutoff = SystemTime::now()
            - Duration::from_secs(u64::from(retention_days) * 24 * 60 * 60);

        let mut removed = 0;
        for path in record_files(&self.dir)? {
            let modified = match fs::metadata(&path).and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "Skipping unreadable record file during prune.");
                    continue;
                }
            };
            if modified < cutoff {
                if let Err(err) = fs::remove_file(&path) {
                    tracing::warn!(path = %path.display(), error = %err, "Failed to remove old record.");
                    continue;
                }
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::info!(removed, retention_days, "Pruned old cycle records.");
        }
        Ok(removed)
    }
}

/// Record file paths sorted by name; the timestamped naming makes name
/// order chronological order.
fn record_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if path.is_file() && name.starts_with(FILE_PREFIX) && name.ends_with(".json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_record(path: &Path) -> Option<CycleRecord> {
    let data = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&data) {
        Ok(record) => Some(record),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "Skipping undecodable record file.");
            None
        }
    }
}

fn parse_cycle_number(path: &Path) -> Option<u64> {
    let stem = path.file_stem()?.to_str()?;
    stem.rsplit('_').next()?.parse().ok()
}

/// Cycle-level counts across a set of records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_cycles: usize,
    pub successful_cycles: usize,
    pub failed_cycles: usize,
    pub opens_executed: usize,
    pub closes_executed: usize,
}

/// Folds cycle records into summary counts.
pub fn statistics(records: &[CycleRecord]) -> Statistics {
    let mut stats = Statistics::default();

    for record in records {
        stats.total_cycles += 1;
        if record.success {
            stats.successful_cycles += 1;
        } else {
            stats.failed_cycles += 1;
        }

        for action in &record.executed {
            if !action.success {
                continue;
            }
            if action.action.is_open() {
                stats.opens_executed += 1;
            } else if action.action.is_close() {
                stats.closes_executed += 1;
            }
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::AccountSnapshot;
    use core_types::{Action, ExecutedAction};
    use tempfile::TempDir;

    fn sample_record(equity: f64) -> CycleRecord {
        CycleRecord {
            reasoning: "trace".to_string(),
            decision_json: "[]".to_string(),
            account: AccountSnapshot {
                total_equity: equity,
                ..Default::default()
            },
            success: true,
            ..Default::default()
        }
    }

    #[test]
    fn append_stamps_and_persists_records() {
        let dir = TempDir::new().unwrap();
        let mut store = FileRecordStore::open(dir.path()).unwrap();

        let mut first = sample_record(10_000.0);
        let mut second = sample_record(10_100.0);
        store.append(&mut first).unwrap();
        store.append(&mut second).unwrap();

        assert_eq!(first.cycle_number, 1);
        assert_eq!(second.cycle_number, 2);

        let records = store.latest(10).unwrap();
        assert_eq!(records.len(), 2);
        // Oldest first.
        assert_eq!(records[0].cycle_number, 1);
        assert_eq!(records[1].cycle_number, 2);
        assert_eq!(records[1].account.total_equity, 10_100.0);
    }

    #[test]
    fn latest_truncates_to_the_requested_count() {
        let dir = TempDir::new().unwrap();
        let mut store = FileRecordStore::open(dir.path()).unwrap();
        for i in 0..5 {
            store.append(&mut sample_record(10_000.0 + i as f64)).unwrap();
        }

        let records = store.latest(2).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].cycle_number, 4);
        assert_eq!(records[1].cycle_number, 5);
    }

    #[test]
    fn undecodable_files_are_skipped() {
        let dir = TempDir::new().unwrap();
        let mut store = FileRecordStore::open(dir.path()).unwrap();
        store.append(&mut sample_record(10_000.0)).unwrap();

        std::fs::write(dir.path().join("cycle_20990101_000000_99999.json"), "junk").unwrap();

        let records = store.latest(10).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].cycle_number, 1);
    }

    #[test]
    fn reopening_resumes_the_cycle_counter() {
        let dir = TempDir::new().unwrap();
        {
            let mut store = FileRecordStore::open(dir.path()).unwrap();
            store.append(&mut sample_record(10_000.0)).unwrap();
            store.append(&mut sample_record(10_000.0)).unwrap();
        }

        let mut reopened = FileRecordStore::open(dir.path()).unwrap();
        let mut record = sample_record(10_000.0);
        reopened.append(&mut record).unwrap();
        assert_eq!(record.cycle_number, 3);
    }

    #[test]
    fn by_date_matches_only_that_day() {
        let dir = TempDir::new().unwrap();
        let mut store = FileRecordStore::open(dir.path()).unwrap();
        store.append(&mut sample_record(10_000.0)).unwrap();

        let today = Utc::now().date_naive();
        assert_eq!(store.by_date(today).unwrap().len(), 1);

        let long_ago = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap();
        assert!(store.by_date(long_ago).unwrap().is_empty());
    }

    #[test]
    fn prune_keeps_recent_records() {
        let dir = TempDir::new().unwrap();
        let mut store = FileRecordStore::open(dir.path()).unwrap();
        store.append(&mut sample_record(10_000.0)).unwrap();

        let removed = store.prune(7).unwrap();
        assert_eq!(removed, 0);
        assert_eq!(store.latest(10).unwrap().len(), 1);
    }

    #[test]
    fn statistics_counts_cycles_and_fills() {
        let mut win = sample_record(10_000.0);
        win.executed = vec![
            ExecutedAction {
                action: Action::OpenLong,
                symbol: "BTCUSDT".to_string(),
                quantity: 0.01,
                leverage: 10,
                price: 60_000.0,
                order_id: 1,
                timestamp: Utc::now(),
                success: true,
                error: String::new(),
            },
            ExecutedAction {
                action: Action::CloseLong,
                symbol: "BTCUSDT".to_string(),
                quantity: 0.01,
                leverage: 10,
                price: 61_000.0,
                order_id: 2,
                timestamp: Utc::now(),
                success: true,
                error: String::new(),
            },
            ExecutedAction {
                action: Action::OpenShort,
                symbol: "ETHUSDT".to_string(),
                quantity: 0.1,
                leverage: 10,
                price: 3_000.0,
                order_id: 3,
                timestamp: Utc::now(),
                success: false,
                error: "insufficient margin".to_string(),
            },
        ];
        let mut failed = sample_record(10_000.0);
        failed.success = false;

        let stats = statistics(&[win, failed]);
        assert_eq!(stats.total_cycles, 2);
        assert_eq!(stats.successful_cycles, 1);
        assert_eq!(stats.failed_cycles, 1);
        assert_eq!(stats.opens_executed, 1);
        assert_eq!(stats.closes_executed, 1);
    }
}
