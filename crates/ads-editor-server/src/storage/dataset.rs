//! File-backed dataset store.
//!
//! The dataset is an opaque JSON blob; its schema belongs to the editor
//! UI. The store guarantees two things: a save never leaves the live file
//! corrupted or truncated (write-temp-then-rename), and every save keeps a
//! bounded history of timestamped backups.
//!
//! First-run seeding (copying the bundled dataset into the data directory
//! when the live file is absent) assumes a single instance per storage
//! directory. Multiple instances sharing a volume may race the seed copy;
//! the result is still a complete seed file, but that is a non-guarantee.

use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::backups::BackupSet;
use crate::config::StorageConfig;
use crate::utils::Clock;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Io(#[from] io::Error),

    #[error("bundled seed dataset missing at {0}")]
    SeedMissing(String),
}

/// What a successful save did, beyond replacing the live bytes.
#[derive(Debug)]
pub struct SaveReport {
    pub bytes_written: usize,
    /// Backup of the pre-save dataset, when one existed to back up.
    pub backup: Option<PathBuf>,
    pub pruned: usize,
    /// Retention failures are non-fatal: the live write already completed.
    pub retention_failures: usize,
}

pub struct DatasetStore {
    live_path: PathBuf,
    seed_path: PathBuf,
    data_dir: PathBuf,
    clock: Arc<dyn Clock>,
    // Guards the entire backup+write+retention sequence so concurrent
    // saves cannot interleave.
    backups: Mutex<BackupSet>,
}

impl DatasetStore {
    pub fn open(cfg: &StorageConfig, clock: Arc<dyn Clock>) -> Result<Self, StoreError> {
        let live_path = cfg.data_dir.join(&cfg.dataset_file);
        let stem = Path::new(&cfg.dataset_file)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| cfg.dataset_file.clone());

        let backups = BackupSet::scan(&cfg.data_dir, &stem, cfg.max_backups)?;
        if !backups.is_empty() {
            info!("Found {} existing backup(s) in {}", backups.len(), cfg.data_dir.display());
        }

        Ok(Self {
            live_path,
            seed_path: cfg.seed_path.clone(),
            data_dir: cfg.data_dir.clone(),
            clock,
            backups: Mutex::new(backups),
        })
    }

    pub fn live_path(&self) -> &Path {
        &self.live_path
    }

    /// Read the current dataset. On first run the live file is seeded from
    /// the bundled default before reading, so a bootstrapped deployment
    /// never sees "file missing".
    pub async fn load(&self) -> Result<Vec<u8>, StoreError> {
        match tokio::fs::read(&self.live_path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.seed().await?;
                Ok(tokio::fs::read(&self.live_path).await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn seed(&self) -> Result<(), StoreError> {
        if !tokio::fs::try_exists(&self.seed_path).await.unwrap_or(false) {
            return Err(StoreError::SeedMissing(self.seed_path.display().to_string()));
        }
        tokio::fs::create_dir_all(&self.data_dir).await?;
        tokio::fs::copy(&self.seed_path, &self.live_path).await?;
        info!(
            "Seeded dataset from {} to {}",
            self.seed_path.display(),
            self.live_path.display()
        );
        Ok(())
    }

    /// Replace the dataset with `bytes`.
    ///
    /// Sequence, serialized against other saves: back up the current live
    /// file under a timestamp name, atomically swap the new bytes into
    /// place, then evict backups beyond the retention limit. If anything
    /// before the swap fails, the live dataset is untouched; a backup from
    /// the failed attempt may be left behind but is never canonical.
    pub async fn save(&self, bytes: &[u8]) -> Result<SaveReport, StoreError> {
        let mut backups = self.backups.lock().await;

        tokio::fs::create_dir_all(&self.data_dir).await?;

        let mut backup = None;
        if tokio::fs::try_exists(&self.live_path).await? {
            let stamp = self.stamp();
            let (name, path) = backups.next_path(&stamp);
            tokio::fs::copy(&self.live_path, &path).await?;
            debug!("Backed up current dataset to {}", path.display());
            backups.record(name, path.clone());
            backup = Some(path);
        }

        atomic_replace(&self.live_path, bytes).await?;

        let (pruned, retention_failures) = backups.prune();
        if retention_failures > 0 {
            warn!(
                "Save succeeded but {} old backup(s) could not be pruned",
                retention_failures
            );
        }

        Ok(SaveReport {
            bytes_written: bytes.len(),
            backup,
            pruned,
            retention_failures,
        })
    }

    /// Number of retained backups. Exposed for monitoring.
    pub async fn backup_count(&self) -> usize {
        self.backups.lock().await.len()
    }

    fn stamp(&self) -> String {
        let now = self.clock.now();
        DateTime::<Utc>::from_timestamp(now, 0)
            .map(|t| t.format("%Y%m%d_%H%M%S").to_string())
            .unwrap_or_else(|| now.to_string())
    }
}

/// Write `bytes` to a temp file beside `path` and rename it into place.
/// Readers observe either the old or the new content, never a partial
/// write; a failure leaves the original file intact.
async fn atomic_replace(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = path.with_extension("tmp");

    if let Err(e) = tokio::fs::write(&tmp, bytes).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }

    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }

    Ok(())
}
