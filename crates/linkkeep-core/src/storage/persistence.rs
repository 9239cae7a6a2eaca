//! Link file persistence
//!
//! Handles loading and saving the store to a JSON file. Saves back up the
//! previous file first, then use atomic writes (write to temp file, sync,
//! then rename) so the link file is never left half-written.
//!
//! Storage location: `~/.local/share/linkkeep/` (configurable via `Config`)
//!
//! Files:
//! - `links.json` - The link file
//! - `backups/links_backup_<timestamp>.json` - Backups of earlier versions

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::backup::{BackupManager, BackupOutcome};
use super::error::{StorageError, StorageResult};
use super::format;
use crate::config::Config;
use crate::store::Store;

/// Result of loading the link file
#[derive(Debug)]
pub struct LoadOutcome {
    pub store: Store,
    /// Set when the file was corrupt and replaced with an empty one
    pub recovered: Option<StorageError>,
    /// Whether the file did not exist and was created
    pub created: bool,
}

/// Result of restoring a backup
#[derive(Debug)]
pub struct RestoreOutcome {
    /// Name of the restored backup
    pub name: String,
    /// Backup of the file that was overwritten
    pub safety_backup: BackupOutcome,
    /// The store reloaded from the restored file
    pub store: Store,
}

/// Persistence layer for the link file
pub struct JsonPersistence {
    path: PathBuf,
    backups: BackupManager,
}

impl JsonPersistence {
    /// Persist to `path`, with backups in a `backups/` directory beside it
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let backups = BackupManager::beside(&path);
        Self { path, backups }
    }

    /// Persist to the configured link file and backup directory
    pub fn from_config(config: &Config) -> Self {
        Self {
            path: config.links_path(),
            backups: BackupManager::new(config.backup_dir()).with_retention(config.max_backups),
        }
    }

    /// Keep at most `max_backups` backups (0 keeps all)
    pub fn with_retention(mut self, max_backups: usize) -> Self {
        self.backups = self.backups.with_retention(max_backups);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    /// Check if the link file exists on disk
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the store from disk
    ///
    /// A missing file is created empty. A file that cannot be parsed is
    /// backed up (unless it is empty), replaced with an empty one, and
    /// reported through [`LoadOutcome::recovered`] rather than as an error.
    /// Errors are returned only when the file can be neither read nor
    /// rewritten.
    pub fn load(&self) -> StorageResult<LoadOutcome> {
        if !self.path.exists() {
            let store = Store::new();
            self.write(&store)?;
            info!("Created new link file at {:?}", self.path);
            return Ok(LoadOutcome {
                store,
                recovered: None,
                created: true,
            });
        }

        let bytes =
            fs::read(&self.path).map_err(|e| StorageError::from_read_io(e, self.path.clone()))?;

        match format::decode(&bytes) {
            Ok(store) => {
                info!("Loaded {} links from {:?}", store.len(), self.path);
                Ok(LoadOutcome {
                    store,
                    recovered: None,
                    created: false,
                })
            }
            Err(e) => {
                warn!("Link file {:?} is corrupted: {}", self.path, e);
                let backup_path = if bytes.is_empty() {
                    None
                } else {
                    let outcome = self.backups.create_backup(&self.path);
                    if outcome.is_failure() {
                        warn!("{}", outcome);
                    }
                    outcome.path().map(Path::to_path_buf)
                };

                let store = Store::new();
                self.write(&store)?;

                Ok(LoadOutcome {
                    store,
                    recovered: Some(StorageError::CorruptDocument {
                        path: self.path.clone(),
                        backup_path,
                        details: e.to_string(),
                    }),
                    created: false,
                })
            }
        }
    }

    /// Save the store to disk
    ///
    /// An existing file is backed up first. A failed backup is logged and
    /// returned but does not stop the save. On error the previous file is
    /// left untouched.
    pub fn save(&self, store: &Store) -> StorageResult<BackupOutcome> {
        let bytes = format::encode(store)?;

        let backup = self.backups.create_backup(&self.path);
        if backup.is_failure() {
            warn!("{}", backup);
        }

        atomic_write(&self.path, &bytes)?;
        info!("Saved {} links to {:?}", store.len(), self.path);
        Ok(backup)
    }

    /// Back up the link file now
    pub fn backup(&self) -> BackupOutcome {
        self.backups.create_backup(&self.path)
    }

    /// Backup names, most recent first
    pub fn list_backups(&self) -> StorageResult<Vec<String>> {
        self.backups.list_backups()
    }

    /// Replace the link file with a backup and reload it
    ///
    /// With no name, the most recent backup is restored. The current file
    /// is backed up before it is overwritten. A backup that does not parse
    /// is refused and the link file is left alone.
    pub fn restore(&self, name: Option<&str>) -> StorageResult<RestoreOutcome> {
        let (name, bytes) = self.backups.read_backup(name)?;
        if let Err(e) = format::decode(&bytes) {
            return Err(StorageError::InvalidFormat {
                path: self.backups.backup_path(&name),
                details: e.to_string(),
            });
        }

        let safety_backup = self.backups.create_backup(&self.path);
        if safety_backup.is_failure() {
            warn!("{}", safety_backup);
        }

        atomic_write(&self.path, &bytes)?;
        info!("Restored {:?} from backup {}", self.path, name);

        let loaded = self.load()?;
        Ok(RestoreOutcome {
            name,
            safety_backup,
            store: loaded.store,
        })
    }

    fn write(&self, store: &Store) -> StorageResult<()> {
        let bytes = format::encode(store)?;
        atomic_write(&self.path, &bytes)
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
///
/// The temp file is removed if any step fails.
fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let temp_path = temp_path_for(path);

    if let Err(e) = write_synced(&temp_path, data) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    if let Err(source) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(StorageError::AtomicWriteFailed {
            from: temp_path,
            to: path.to_path_buf(),
            source,
        });
    }

    Ok(())
}

fn write_synced(path: &Path, data: &[u8]) -> StorageResult<()> {
    let mut file = File::create(path).map_err(|e| StorageError::from_io(e, path.to_path_buf()))?;
    file.write_all(data)
        .map_err(|e| StorageError::from_io(e, path.to_path_buf()))?;
    file.sync_all()
        .map_err(|e| StorageError::from_io(e, path.to_path_buf()))
}

/// `links.json` -> `links.json.tmp`
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_persistence(temp_dir: &TempDir) -> JsonPersistence {
        JsonPersistence::new(temp_dir.path().join("links.json"))
    }

    fn sample_store() -> Store {
        let mut store = Store::new();
        store
            .add_link("example.com", "Example", ["reading"], ["rust"])
            .unwrap();
        store
            .add_link("https://rust-lang.org", "", ["dev"], ["rust", "lang"])
            .unwrap();
        store
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = test_persistence(&temp_dir);
        let store = sample_store();

        assert!(!persistence.exists());
        persistence.save(&store).unwrap();
        assert!(persistence.exists());

        let loaded = persistence.load().unwrap();
        assert!(!loaded.created);
        assert!(loaded.recovered.is_none());
        assert_eq!(loaded.store, store);
    }

    #[test]
    fn test_load_missing_file_bootstraps() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = test_persistence(&temp_dir);

        let loaded = persistence.load().unwrap();
        assert!(loaded.created);
        assert!(loaded.store.is_empty());
        assert!(persistence.exists());

        let bytes = fs::read(persistence.path()).unwrap();
        assert!(format::decode(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_load_corrupt_file_backs_up_once() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = test_persistence(&temp_dir);
        let garbage = b"{\"links\": [ this is not json";
        fs::write(persistence.path(), garbage).unwrap();

        let loaded = persistence.load().unwrap();
        assert!(loaded.store.is_empty());

        let backup_path = match loaded.recovered {
            Some(StorageError::CorruptDocument {
                backup_path: Some(path),
                ..
            }) => path,
            other => panic!("expected corrupt document with backup, got {:?}", other),
        };

        let backups = persistence.list_backups().unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(
            fs::metadata(&backup_path).unwrap().len(),
            garbage.len() as u64
        );

        let bytes = fs::read(persistence.path()).unwrap();
        assert!(format::decode(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_load_empty_corrupt_file_skips_backup() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = test_persistence(&temp_dir);
        fs::write(persistence.path(), b"").unwrap();

        let loaded = persistence.load().unwrap();
        assert!(matches!(
            loaded.recovered,
            Some(StorageError::CorruptDocument {
                backup_path: None,
                ..
            })
        ));
        assert!(persistence.list_backups().unwrap().is_empty());
    }

    #[test]
    fn test_save_backs_up_previous_file() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = test_persistence(&temp_dir);
        let mut store = sample_store();

        let first = persistence.save(&store).unwrap();
        assert_eq!(first, BackupOutcome::NothingToBackUp);
        let before = fs::read(persistence.path()).unwrap();

        store.remove_link(0).unwrap();
        let second = persistence.save(&store).unwrap();
        let backup_path = second.path().unwrap();

        assert_eq!(fs::read(backup_path).unwrap(), before);
        assert_eq!(persistence.load().unwrap().store.len(), 1);
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = test_persistence(&temp_dir);

        persistence.save(&sample_store()).unwrap();
        assert!(!temp_dir.path().join("links.json.tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_save_into_read_only_dir_keeps_prior_content() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("locked");
        fs::create_dir(&dir).unwrap();
        let persistence = JsonPersistence::new(dir.join("links.json"));

        let mut store = sample_store();
        persistence.save(&store).unwrap();
        let before = fs::read(persistence.path()).unwrap();

        fs::set_permissions(&dir, fs::Permissions::from_mode(0o555)).unwrap();

        // Directory permissions do not bind a privileged user
        let scratch = dir.join("scratch");
        if fs::write(&scratch, b"").is_ok() {
            let _ = fs::remove_file(&scratch);
            fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        store.add_link("another.com", "", Vec::<String>::new(), Vec::<String>::new()).unwrap();
        let result = persistence.save(&store);
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(result.is_err());
        assert_eq!(fs::read(persistence.path()).unwrap(), before);
        assert!(!dir.join("links.json.tmp").exists());
    }

    #[test]
    fn test_failed_write_keeps_prior_content() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = test_persistence(&temp_dir);

        let mut store = sample_store();
        persistence.save(&store).unwrap();
        let before = fs::read(persistence.path()).unwrap();

        // A directory in the temp file's place makes the write fail for any user
        let temp_path = temp_dir.path().join("links.json.tmp");
        fs::create_dir(&temp_path).unwrap();

        store.add_link("another.com", "", Vec::<String>::new(), Vec::<String>::new()).unwrap();
        let result = persistence.save(&store);

        assert!(result.is_err());
        assert_eq!(fs::read(persistence.path()).unwrap(), before);
        assert_eq!(store.len(), 3);
        assert_eq!(persistence.load().unwrap().store.len(), 2);
        assert!(temp_path.is_dir());
    }

    #[test]
    fn test_restore_latest_backup() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = test_persistence(&temp_dir);
        let mut store = sample_store();

        persistence.save(&store).unwrap();
        store.remove_link(0).unwrap();
        persistence.save(&store).unwrap();

        let restored = persistence.restore(None).unwrap();
        assert_eq!(restored.store.len(), 2);
        assert!(restored.safety_backup.path().is_some());
        assert_eq!(persistence.load().unwrap().store.len(), 2);
        assert_eq!(persistence.list_backups().unwrap().len(), 2);
    }

    #[test]
    fn test_restore_named_backup() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = test_persistence(&temp_dir);
        let mut store = sample_store();

        persistence.save(&store).unwrap();
        store.remove_link(0).unwrap();
        persistence.save(&store).unwrap();
        let name = persistence.list_backups().unwrap().remove(0);

        store.remove_link(0).unwrap();
        persistence.save(&store).unwrap();
        assert!(persistence.load().unwrap().store.is_empty());

        let restored = persistence.restore(Some(&name)).unwrap();
        assert_eq!(restored.name, name);
        assert_eq!(restored.store.len(), 2);
    }

    #[test]
    fn test_restore_without_backups() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = test_persistence(&temp_dir);
        persistence.save(&sample_store()).unwrap();

        assert!(matches!(
            persistence.restore(None),
            Err(StorageError::NoBackups)
        ));
        assert!(matches!(
            persistence.restore(Some("links_backup_20000101_000000.json")),
            Err(StorageError::BackupNotFound { .. })
        ));
    }

    #[test]
    fn test_restore_refuses_corrupt_backup() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = test_persistence(&temp_dir);
        persistence.save(&sample_store()).unwrap();
        let before = fs::read(persistence.path()).unwrap();

        let backup_dir = persistence.backups().backup_dir().to_path_buf();
        fs::create_dir_all(&backup_dir).unwrap();
        fs::write(backup_dir.join("links_backup_20000101_000000.json"), b"oops").unwrap();

        assert!(matches!(
            persistence.restore(None),
            Err(StorageError::InvalidFormat { .. })
        ));
        assert_eq!(fs::read(persistence.path()).unwrap(), before);
    }

    #[test]
    fn test_retention_limits_backups() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = test_persistence(&temp_dir).with_retention(2);
        let store = sample_store();

        for _ in 0..5 {
            persistence.save(&store).unwrap();
        }

        assert_eq!(persistence.list_backups().unwrap().len(), 2);
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir.path().join("a").join("b").join("links.json");

        atomic_write(&nested_path, b"test data").unwrap();

        assert_eq!(fs::read_to_string(&nested_path).unwrap(), "test data");
    }

    #[test]
    fn test_temp_path_is_sibling() {
        assert_eq!(
            temp_path_for(Path::new("/data/links.json")),
            PathBuf::from("/data/links.json.tmp")
        );
    }
}
