//! File backups, atomic writes and the migration log

use crate::core::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use walkdir::WalkDir;

/// Backup directory, relative to the project root
pub const BACKUP_DIR: &str = ".grammar-ops-backup";
/// Migration log, relative to the project root. One JSON object per line.
pub const MIGRATION_LOG: &str = ".grammar-ops-migration.log";

/// Mirrors project files under [`BACKUP_DIR`] before they are rewritten
#[derive(Debug, Clone)]
pub struct BackupStore {
    root: PathBuf,
    dir: PathBuf,
}

impl BackupStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let dir = root.join(BACKUP_DIR);
        Self { root, dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn has_backups(&self) -> bool {
        self.dir.is_dir()
    }

    fn relative<'a>(&self, file: &'a Path) -> Result<&'a Path> {
        file.strip_prefix(&self.root).map_err(|_| {
            Error::Migration(format!(
                "{} is outside the project root {}",
                file.display(),
                self.root.display()
            ))
        })
    }

    pub fn backup_path(&self, file: &Path) -> Result<PathBuf> {
        Ok(self.dir.join(self.relative(file)?))
    }

    /// Copy `file` into the backup tree. An existing backup is kept so the
    /// backup always holds the state before the first migration.
    pub fn backup(&self, file: &Path) -> Result<bool> {
        let target = self.backup_path(file)?;
        if target.exists() {
            log::debug!("Keeping existing backup of {}", file.display());
            return Ok(false);
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::file_system("failed to create backup directory", parent, e))?;
        }
        fs::copy(file, &target)
            .map_err(|e| Error::file_system("failed to back up file", file, e))?;
        Ok(true)
    }

    /// Put one file back from its backup
    pub fn restore(&self, file: &Path) -> Result<()> {
        let source = self.backup_path(file)?;
        fs::copy(&source, file)
            .map_err(|e| Error::file_system("failed to restore file from backup", file, e))?;
        Ok(())
    }

    /// Restore every backed-up file and remove the backup directory.
    /// Returns the restored paths, sorted.
    pub fn rollback(&self) -> Result<Vec<PathBuf>> {
        if !self.has_backups() {
            return Ok(Vec::new());
        }

        let mut restored = Vec::new();
        for entry in WalkDir::new(&self.dir).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                Error::Migration(format!("failed to read backup directory: {e}"))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&self.dir)
                .map_err(|_| Error::Migration("backup entry outside backup dir".to_string()))?;
            let target = self.root.join(relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| Error::file_system("failed to recreate directory", parent, e))?;
            }
            fs::copy(entry.path(), &target)
                .map_err(|e| Error::file_system("failed to restore file", &target, e))?;
            log::info!("Restored {}", target.display());
            restored.push(target);
        }

        fs::remove_dir_all(&self.dir)
            .map_err(|e| Error::file_system("failed to remove backup directory", &self.dir, e))?;
        Ok(restored)
    }
}

/// Unique sibling path for a temporary file
fn temp_path_for(target: &Path) -> PathBuf {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let counter = COUNTER.fetch_add(1, Ordering::SeqCst);
    let name = target
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file");
    target.with_file_name(format!(".{}.tmp.{}.{}", name, std::process::id(), counter))
}

/// Write through a temporary sibling and rename it over the target
pub fn write_atomically(target: &Path, contents: &str) -> Result<()> {
    let temp = temp_path_for(target);
    if let Err(e) = fs::write(&temp, contents) {
        let _ = fs::remove_file(&temp);
        return Err(Error::file_system("failed to write temporary file", &temp, e));
    }
    fs::rename(&temp, target).map_err(|e| {
        let _ = fs::remove_file(&temp);
        Error::file_system("failed to replace file", target, e)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogAction {
    Migrate,
    Rollback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedRename {
    pub file: PathBuf,
    pub old_name: String,
    pub new_name: String,
    pub occurrences: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedFailure {
    pub file: PathBuf,
    pub error: String,
}

/// One line of the migration log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub action: LogAction,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub renames: Vec<LoggedRename>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<LoggedFailure>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub restored: Vec<PathBuf>,
}

impl LogEntry {
    pub fn new(action: LogAction) -> Self {
        Self {
            timestamp: Utc::now(),
            action,
            renames: Vec::new(),
            failed: Vec::new(),
            restored: Vec::new(),
        }
    }
}

/// Append an entry to the project's migration log
pub fn append_log(root: &Path, entry: &LogEntry) -> Result<()> {
    let path = root.join(MIGRATION_LOG);
    let line = serde_json::to_string(entry)?;
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| Error::file_system("failed to open migration log", &path, e))?;
    writeln!(file, "{line}")
        .map_err(|e| Error::file_system("failed to write migration log", &path, e))
}

/// Every entry of the migration log; unparsable lines are skipped
pub fn read_log(root: &Path) -> Result<Vec<LogEntry>> {
    let path = root.join(MIGRATION_LOG);
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::file_system("failed to read migration log", &path, e)),
    };
    Ok(contents
        .lines()
        .filter_map(|line| match serde_json::from_str(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Ignoring malformed migration log line: {}", e);
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_first_backup_wins() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("pkg").join("a.py");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, "original").unwrap();

        let store = BackupStore::new(dir.path());
        assert!(store.backup(&file).unwrap());
        fs::write(&file, "changed once").unwrap();
        assert!(!store.backup(&file).unwrap());

        let saved = fs::read_to_string(store.backup_path(&file).unwrap()).unwrap();
        assert_eq!(saved, "original");
    }

    #[test]
    fn test_rollback_restores_and_cleans_up() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.py");
        let b = dir.path().join("src").join("b.js");
        fs::create_dir_all(b.parent().unwrap()).unwrap();
        fs::write(&a, "a = 1\n").unwrap();
        fs::write(&b, "const b = 1;\n").unwrap();

        let store = BackupStore::new(dir.path());
        store.backup(&a).unwrap();
        store.backup(&b).unwrap();
        fs::write(&a, "broken").unwrap();
        fs::write(&b, "broken").unwrap();

        let restored = store.rollback().unwrap();
        assert_eq!(restored, vec![a.clone(), b.clone()]);
        assert_eq!(fs::read_to_string(&a).unwrap(), "a = 1\n");
        assert_eq!(fs::read_to_string(&b).unwrap(), "const b = 1;\n");
        assert!(!store.has_backups());
        assert!(store.rollback().unwrap().is_empty());
    }

    #[test]
    fn test_outside_root_rejected() {
        let dir = TempDir::new().unwrap();
        let store = BackupStore::new(dir.path().join("project"));
        let err = store.backup(&dir.path().join("other.py")).unwrap_err();
        assert!(matches!(err, Error::Migration(_)));
    }

    #[test]
    fn test_write_atomically_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("a.py");
        fs::write(&target, "old").unwrap();
        write_atomically(&target, "new").unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
        let entries = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_log_appends_json_lines() {
        let dir = TempDir::new().unwrap();
        let mut entry = LogEntry::new(LogAction::Migrate);
        entry.renames.push(LoggedRename {
            file: PathBuf::from("a.py"),
            old_name: "userData".to_string(),
            new_name: "get_user_data".to_string(),
            occurrences: 2,
        });
        append_log(dir.path(), &entry).unwrap();
        append_log(dir.path(), &LogEntry::new(LogAction::Rollback)).unwrap();

        let entries = read_log(dir.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], entry);
        assert_eq!(entries[1].action, LogAction::Rollback);
    }
}
