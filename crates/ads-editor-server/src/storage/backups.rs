//! Bounded, ordered set of dataset backups.
//!
//! Backups live next to the live dataset as
//! `{stem}_backup_{YYYYMMDD_HHMMSS}[_{n}].json`. The `_{n}` suffix keeps
//! names unique when several saves land in the same second. The set is an
//! explicit in-memory list rebuilt by one directory scan at startup;
//! afterwards every mutation goes through it, so retention never depends
//! on re-scanning the directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct BackupEntry {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug)]
pub struct BackupSet {
    dir: PathBuf,
    prefix: String,
    max: usize,
    // Oldest first. Timestamp names sort lexicographically, so the scan
    // order and the creation order agree.
    entries: Vec<BackupEntry>,
}

impl BackupSet {
    /// Rebuild the set from whatever is already on disk. A missing
    /// directory just means no backups yet.
    pub fn scan(dir: &Path, stem: &str, max: usize) -> io::Result<Self> {
        let prefix = format!("{}_backup_", stem);
        let mut entries = Vec::new();

        if dir.is_dir() {
            for entry in fs::read_dir(dir)? {
                let entry = entry?;
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.starts_with(&prefix) && name.ends_with(".json") {
                    entries.push(BackupEntry {
                        name,
                        path: entry.path(),
                    });
                }
            }
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Self {
            dir: dir.to_path_buf(),
            prefix,
            max,
            entries,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Next free backup path for the given timestamp, appending `_{n}`
    /// until the name collides with neither the set nor the directory.
    pub fn next_path(&self, stamp: &str) -> (String, PathBuf) {
        let base = format!("{}{}", self.prefix, stamp);
        let mut name = format!("{}.json", base);
        let mut n = 0;

        while self.entries.iter().any(|e| e.name == name) || self.dir.join(&name).exists() {
            n += 1;
            name = format!("{}_{}.json", base, n);
        }

        let path = self.dir.join(&name);
        (name, path)
    }

    /// Record a backup that was just written. Entries arrive in creation
    /// order, which keeps the list sorted.
    pub fn record(&mut self, name: String, path: PathBuf) {
        debug!("Recorded backup {}", name);
        self.entries.push(BackupEntry { name, path });
    }

    /// Evict the oldest entries beyond the retention limit. Returns
    /// (pruned, failures); a failed delete is dropped from the list anyway
    /// and will be picked up again by the scan on the next restart.
    pub fn prune(&mut self) -> (usize, usize) {
        let mut pruned = 0;
        let mut failures = 0;

        while self.entries.len() > self.max {
            let oldest = self.entries.remove(0);
            match fs::remove_file(&oldest.path) {
                Ok(()) => {
                    debug!("Pruned old backup {}", oldest.name);
                    pruned += 1;
                }
                Err(e) => {
                    warn!("Failed to prune backup {}: {}", oldest.name, e);
                    failures += 1;
                }
            }
        }

        (pruned, failures)
    }

    /// Backup names, oldest first.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn scan_ignores_unrelated_files_and_sorts() {
        let dir = tempdir().unwrap();
        for name in [
            "ads_data_backup_20250102_090000.json",
            "ads_data_backup_20250101_090000.json",
            "ads_data.json",
            "notes.txt",
            "other_backup_20250101_090000.json",
        ] {
            fs::write(dir.path().join(name), b"{}").unwrap();
        }

        let set = BackupSet::scan(dir.path(), "ads_data", 10).unwrap();
        assert_eq!(
            set.names(),
            vec![
                "ads_data_backup_20250101_090000.json",
                "ads_data_backup_20250102_090000.json",
            ]
        );
    }

    #[test]
    fn scan_of_missing_directory_is_empty() {
        let dir = tempdir().unwrap();
        let set = BackupSet::scan(&dir.path().join("nope"), "ads_data", 10).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn next_path_disambiguates_same_second_saves() {
        let dir = tempdir().unwrap();
        let mut set = BackupSet::scan(dir.path(), "ads_data", 10).unwrap();

        let (first, path) = set.next_path("20250101_120000");
        assert_eq!(first, "ads_data_backup_20250101_120000.json");
        fs::write(&path, b"{}").unwrap();
        set.record(first, path);

        let (second, path) = set.next_path("20250101_120000");
        assert_eq!(second, "ads_data_backup_20250101_120000_1.json");
        fs::write(&path, b"{}").unwrap();
        set.record(second, path);

        let (third, _) = set.next_path("20250101_120000");
        assert_eq!(third, "ads_data_backup_20250101_120000_2.json");
    }

    #[test]
    fn prune_keeps_newest_and_deletes_files() {
        let dir = tempdir().unwrap();
        let mut set = BackupSet::scan(dir.path(), "ads_data", 3).unwrap();

        for i in 0..5 {
            let (name, path) = set.next_path(&format!("20250101_12000{}", i));
            fs::write(&path, b"{}").unwrap();
            set.record(name, path);
        }

        let (pruned, failures) = set.prune();
        assert_eq!(pruned, 2);
        assert_eq!(failures, 0);
        assert_eq!(set.len(), 3);
        assert_eq!(
            set.names(),
            vec![
                "ads_data_backup_20250101_120002.json",
                "ads_data_backup_20250101_120003.json",
                "ads_data_backup_20250101_120004.json",
            ]
        );
        // The evicted files are really gone.
        assert!(!dir
            .path()
            .join("ads_data_backup_20250101_120000.json")
            .exists());
        assert!(!dir
            .path()
            .join("ads_data_backup_20250101_120001.json")
            .exists());
    }
}
