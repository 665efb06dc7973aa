//! CLI command implementations for grammarops operations.
//!
//! Available commands:
//! - **analyze**: report naming violations for a project
//! - **learn**: write a configuration that adopts a project's conventions
//! - **migrate**: apply suggested renames, or roll them back
//! - **detect**: show which frameworks and idioms a project uses

pub mod analyze;
pub mod detect;
pub mod learn;
pub mod migrate;

pub use analyze::{handle_analyze, AnalyzeConfig};
pub use detect::{handle_detect, DetectConfig};
pub use learn::{handle_learn, LearnConfig};
pub use migrate::{handle_migrate, MigrateConfig};

use crate::analysis::{load_sources, FrameworkProfile, SkippedFile};
use crate::config::loader::project_root;
use crate::config::{build_rule_set, load_config};
use crate::core::SourceFile;
use crate::io::FileWalker;
use crate::naming::RuleSet;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Everything a command needs before analysis starts: configuration
/// loaded and validated, files read, frameworks detected
pub(crate) struct PreparedProject {
    pub root: PathBuf,
    pub rules: RuleSet,
    pub files: Vec<SourceFile>,
    pub skipped: Vec<SkippedFile>,
    pub profile: FrameworkProfile,
}

pub(crate) fn prepare_project(
    path: &Path,
    config_path: Option<&Path>,
    patterns: &[String],
) -> Result<PreparedProject> {
    let root = project_root(path);
    let loaded = load_config(config_path, &root).context("Failed to load configuration")?;
    if let Some(source) = &loaded.source {
        log::info!("Using configuration {}", source.display());
    }
    let rules = build_rule_set(&loaded.config).context("Invalid naming rules")?;

    let paths = FileWalker::new(path.to_path_buf())
        .with_patterns(patterns)?
        .with_excludes(loaded.config.paths.exclude.clone())
        .walk()
        .with_context(|| format!("Failed to collect files under {}", path.display()))?;
    log::info!("Analyzing {} files", paths.len());

    let (files, skipped) = load_sources(&paths);
    let profile = loaded
        .config
        .resolve_profile(&files)
        .context("Invalid framework configuration")?;

    Ok(PreparedProject {
        root,
        rules,
        files,
        skipped,
        profile,
    })
}
