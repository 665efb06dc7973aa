// Test utility module for grammarops integration tests
#![allow(dead_code)]

use grammarops::analysis::{analyze_project, load_sources, AnalysisReport};
use grammarops::config::{build_rule_set, load_config};
use grammarops::core::{CancellationToken, SourceFile};
use grammarops::io::find_project_files;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A throwaway project directory populated from (relative path, content) pairs
pub struct TestProject {
    pub dir: TempDir,
}

impl TestProject {
    pub fn new(files: &[(&str, &str)]) -> Self {
        let project = Self {
            dir: TempDir::new().expect("create temp dir"),
        };
        for (path, content) in files {
            project.write(path, content);
        }
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn write(&self, relative: &str, content: &str) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(path, content).expect("write fixture file");
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative)).expect("read fixture file")
    }

    pub fn sources(&self) -> Vec<SourceFile> {
        let paths = find_project_files(self.root()).expect("walk project");
        load_sources(&paths).0
    }

    /// Full analyze pipeline: discovered config, detection, evaluation
    pub fn analyze(&self) -> AnalysisReport {
        let loaded = load_config(None, self.root()).expect("load config");
        let rules = build_rule_set(&loaded.config).expect("build rules");
        let files = self.sources();
        let profile = loaded.config.resolve_profile(&files).expect("resolve profile");
        analyze_project(&files, profile, &rules, &CancellationToken::new())
    }
}

/// Names of the flagged declarations, in report order
pub fn flagged_names(report: &AnalysisReport) -> Vec<String> {
    let mut names: Vec<String> = report
        .violations
        .iter()
        .map(|v| v.declaration.name.clone())
        .collect();
    names.dedup();
    names
}
