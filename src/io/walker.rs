use crate::core::{Error, Language, Result};
use crate::migrate::backup::BACKUP_DIR;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Directories never descended into
pub const SKIPPED_DIRS: &[&str] = &[
    ".git",
    "__pycache__",
    "node_modules",
    "venv",
    ".venv",
    "migrations",
    "dist",
    "build",
    BACKUP_DIR,
];

/// Collects the source files of a project: gitignore aware, restricted to
/// supported languages, optionally narrowed by glob patterns.
pub struct FileWalker {
    root: PathBuf,
    languages: Vec<Language>,
    patterns: Vec<glob::Pattern>,
    excludes: Vec<String>,
}

impl FileWalker {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            languages: Language::ALL.to_vec(),
            patterns: vec![],
            excludes: vec![],
        }
    }

    /// Only keep files whose path (relative to the root) or file name
    /// matches one of the globs. An invalid glob is a configuration error.
    pub fn with_patterns<I, S>(mut self, patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let compiled = glob::Pattern::new(pattern).map_err(|e| {
                Error::configuration(format!("Invalid file pattern '{pattern}': {e}"))
            })?;
            self.patterns.push(compiled);
        }
        Ok(self)
    }

    /// `paths.exclude` entries: a path is excluded when it contains the
    /// entry or matches it as a glob
    pub fn with_excludes(mut self, excludes: Vec<String>) -> Self {
        self.excludes = excludes;
        self
    }

    /// Matching files, sorted
    pub fn walk(&self) -> Result<Vec<PathBuf>> {
        if self.root.is_file() {
            return Ok(if self.should_process(&self.root) {
                vec![self.root.clone()]
            } else {
                vec![]
            });
        }
        if !self.root.exists() {
            return Err(Error::file_system(
                "Path does not exist",
                &self.root,
                std::io::Error::from(std::io::ErrorKind::NotFound),
            ));
        }

        let mut files = Vec::new();
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .git_ignore(true)
            .require_git(false)
            .filter_entry(|entry| !is_skipped_dir(entry.path(), entry.depth()))
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            if path.is_file() && self.should_process(path) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        log::debug!("Found {} source files under {}", files.len(), self.root.display());
        Ok(files)
    }

    fn should_process(&self, path: &Path) -> bool {
        let Some(language) = Language::from_path(path) else {
            return false;
        };
        if !self.languages.contains(&language) {
            return false;
        }

        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let relative_str = relative.to_string_lossy();
        if self.excludes.iter().any(|exclude| is_excluded(&relative_str, exclude)) {
            return false;
        }

        self.patterns.is_empty()
            || self.patterns.iter().any(|pattern| {
                pattern.matches(&relative_str)
                    || relative
                        .file_name()
                        .is_some_and(|name| pattern.matches(&name.to_string_lossy()))
            })
    }
}

fn is_skipped_dir(path: &Path, depth: usize) -> bool {
    // The walk root itself is always entered
    depth > 0
        && path.is_dir()
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

fn is_excluded(path: &str, exclude: &str) -> bool {
    path.contains(exclude)
        || glob::Pattern::new(exclude)
            .map(|p| p.matches(path))
            .unwrap_or(false)
}

pub fn find_project_files(root: &Path) -> Result<Vec<PathBuf>> {
    FileWalker::new(root.to_path_buf()).walk()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        for file in [
            "app/main.py",
            "app/utils.py",
            "web/index.ts",
            "web/button.jsx",
            "README.md",
            "node_modules/lib/index.js",
            "venv/lib/site.py",
            ".grammar-ops-backup/app/main.py",
            "app/__pycache__/main.py",
            "tests/test_main.py",
        ] {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "x = 1\n").unwrap();
        }
        dir
    }

    fn relative(dir: &TempDir, files: Vec<PathBuf>) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(dir.path()).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_walk_skips_vendor_dirs_and_sorts() {
        let dir = project();
        let files = find_project_files(dir.path()).unwrap();
        assert_eq!(
            relative(&dir, files),
            vec![
                "app/main.py",
                "app/utils.py",
                "tests/test_main.py",
                "web/button.jsx",
                "web/index.ts",
            ]
        );
    }

    #[test]
    fn test_patterns_filter() {
        let dir = project();
        let files = FileWalker::new(dir.path().to_path_buf())
            .with_patterns(["*.py"])
            .unwrap()
            .walk()
            .unwrap();
        assert_eq!(
            relative(&dir, files),
            vec!["app/main.py", "app/utils.py", "tests/test_main.py"]
        );
    }

    #[test]
    fn test_excludes_by_substring_and_glob() {
        let dir = project();
        let files = FileWalker::new(dir.path().to_path_buf())
            .with_excludes(vec!["tests/".to_string(), "web/*.ts".to_string()])
            .walk()
            .unwrap();
        assert_eq!(
            relative(&dir, files),
            vec!["app/main.py", "app/utils.py", "web/button.jsx"]
        );
    }

    #[test]
    fn test_single_file_root() {
        let dir = project();
        let file = dir.path().join("app/main.py");
        assert_eq!(find_project_files(&file).unwrap(), vec![file]);
        assert!(find_project_files(&dir.path().join("README.md")).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_pattern_is_configuration_error() {
        let err = FileWalker::new(PathBuf::from("."))
            .with_patterns(["[unclosed"])
            .err()
            .unwrap();
        assert!(err.is_configuration());
    }
}
