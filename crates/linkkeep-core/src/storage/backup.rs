//! Timestamped backups of the link file
//!
//! Backups are whole-file copies kept in a `backups/` directory beside the
//! link file, named `links_backup_<YYYYMMDD_HHMMSS>.json`. The timestamp is
//! zero-padded, so sorting names sorts backups by age. A second backup in
//! the same second gets a zero-padded `_<nnn>` suffix, which also sorts
//! after the first.
//!
//! When a retention limit is set, the oldest backups beyond it are removed
//! after each new backup.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, warn};

use super::error::{StorageError, StorageResult};

/// File name prefix shared by every backup
pub const BACKUP_PREFIX: &str = "links_backup_";

/// File name suffix shared by every backup
pub const BACKUP_SUFFIX: &str = ".json";

/// Name of the backup directory beside the link file
pub const BACKUP_DIR_NAME: &str = "backups";

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Result of a backup attempt
///
/// Backups never fail loudly; callers decide whether a failure matters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    /// A backup was written to this path
    Created(PathBuf),
    /// The source file does not exist
    NothingToBackUp,
    /// The copy failed for the given reason
    Failed(String),
}

impl BackupOutcome {
    pub fn path(&self) -> Option<&Path> {
        match self {
            BackupOutcome::Created(path) => Some(path),
            _ => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, BackupOutcome::Failed(_))
    }
}

impl fmt::Display for BackupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackupOutcome::Created(path) => write!(f, "Backup created: {}", path.display()),
            BackupOutcome::NothingToBackUp => write!(f, "No link file to back up."),
            BackupOutcome::Failed(reason) => write!(f, "Backup failed: {}", reason),
        }
    }
}

/// Check whether a file name follows the backup naming convention
pub fn is_backup_name(name: &str) -> bool {
    name.starts_with(BACKUP_PREFIX) && name.ends_with(BACKUP_SUFFIX)
}

/// Creates, lists and reads backups in one directory
#[derive(Debug, Clone)]
pub struct BackupManager {
    backup_dir: PathBuf,
    /// Backups to keep; 0 keeps all
    max_backups: usize,
}

impl BackupManager {
    /// Manage backups in `backup_dir`, keeping all of them
    pub fn new(backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            backup_dir: backup_dir.into(),
            max_backups: 0,
        }
    }

    /// Manage backups in the `backups/` directory beside `path`
    pub fn beside(path: &Path) -> Self {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        Self::new(parent.join(BACKUP_DIR_NAME))
    }

    /// Keep at most `max_backups` backups (0 keeps all)
    pub fn with_retention(mut self, max_backups: usize) -> Self {
        self.max_backups = max_backups;
        self
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Copy `path` into the backup directory
    pub fn create_backup(&self, path: &Path) -> BackupOutcome {
        if !path.exists() {
            return BackupOutcome::NothingToBackUp;
        }

        match self.copy_to_new_backup(path) {
            Ok(backup_path) => {
                debug!("Backed up {:?} to {:?}", path, backup_path);
                if let Err(e) = self.prune() {
                    warn!("Failed to prune old backups: {}", e);
                }
                BackupOutcome::Created(backup_path)
            }
            Err(e) => {
                warn!("Backup of {:?} failed: {}", path, e);
                BackupOutcome::Failed(e.to_string())
            }
        }
    }

    /// Backup file names, most recent first
    ///
    /// A missing backup directory has no backups.
    pub fn list_backups(&self) -> StorageResult<Vec<String>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.backup_dir)
            .map_err(|e| StorageError::from_read_io(e, self.backup_dir.clone()))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if is_backup_name(name) {
                    names.push(name.to_string());
                }
            }
        }

        names.sort_unstable_by(|a, b| b.cmp(a));
        Ok(names)
    }

    /// Full path of a backup by name
    pub fn backup_path(&self, name: &str) -> PathBuf {
        self.backup_dir.join(name)
    }

    /// Read a backup's bytes
    ///
    /// With no name, the most recent backup is read. Returns the resolved
    /// name with the content.
    pub fn read_backup(&self, name: Option<&str>) -> StorageResult<(String, Vec<u8>)> {
        let name = match name {
            Some(name) => name.to_string(),
            None => self
                .list_backups()?
                .into_iter()
                .next()
                .ok_or(StorageError::NoBackups)?,
        };

        // Only plain backup names; never paths outside the backup directory
        let path = self.backup_path(&name);
        if !is_backup_name(&name) || name.contains(['/', '\\']) || !path.is_file() {
            return Err(StorageError::BackupNotFound { name });
        }

        let bytes = fs::read(&path).map_err(|e| StorageError::from_read_io(e, path.clone()))?;
        Ok((name, bytes))
    }

    fn copy_to_new_backup(&self, path: &Path) -> StorageResult<PathBuf> {
        fs::create_dir_all(&self.backup_dir).map_err(|source| StorageError::CreateDirectory {
            path: self.backup_dir.clone(),
            source,
        })?;

        let backup_path = self.next_backup_path();
        fs::copy(path, &backup_path).map_err(|e| StorageError::from_io(e, backup_path.clone()))?;
        Ok(backup_path)
    }

    /// Pick an unused backup path for the current time
    fn next_backup_path(&self) -> PathBuf {
        let stem = format!("{}{}", BACKUP_PREFIX, Local::now().format(TIMESTAMP_FORMAT));
        let first = self.backup_dir.join(format!("{}{}", stem, BACKUP_SUFFIX));
        if !first.exists() {
            return first;
        }

        (1..)
            .map(|n| self.backup_dir.join(format!("{}_{:03}{}", stem, n, BACKUP_SUFFIX)))
            .find(|candidate| !candidate.exists())
            .unwrap_or(first)
    }

    /// Remove the oldest backups beyond the retention limit
    fn prune(&self) -> StorageResult<usize> {
        if self.max_backups == 0 {
            return Ok(0);
        }

        let stale: Vec<String> = self
            .list_backups()?
            .into_iter()
            .skip(self.max_backups)
            .collect();
        for name in &stale {
            let path = self.backup_path(name);
            fs::remove_file(&path).map_err(|e| StorageError::from_io(e, path.clone()))?;
            debug!("Pruned old backup {:?}", path);
        }
        Ok(stale.len())
    }
}
