use crate::analysis::{load_sources, FrameworkDetector};
use crate::config::loader::project_root;
use crate::core::CancellationToken;
use crate::io::FileWalker;
use crate::learn::{PatternLearner, LEARNED_CONFIG_FILE};
use anyhow::{Context, Result};
use std::path::PathBuf;

pub struct LearnConfig {
    pub path: PathBuf,
    /// Defaults to `.grammarops.learned.json` in the project root
    pub output: Option<PathBuf>,
    pub report: bool,
}

pub fn handle_learn(config: LearnConfig) -> Result<()> {
    let root = project_root(&config.path);
    let paths = FileWalker::new(config.path.clone())
        .walk()
        .with_context(|| format!("Failed to collect files under {}", config.path.display()))?;
    let (files, mut skipped) = load_sources(&paths);
    let profile = FrameworkDetector::new().detect(&files);

    let mut learner = PatternLearner::new();
    if let Some(name) = root
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
    {
        learner = learner.with_project_name(name);
    }
    let mut outcome = learner.learn(&files, profile, &CancellationToken::new());
    outcome.skipped.append(&mut skipped);

    let output = config
        .output
        .unwrap_or_else(|| root.join(LEARNED_CONFIG_FILE));
    outcome
        .learned
        .write(&output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if config.report {
        println!("{}", outcome.report(&root));
        println!();
    }
    println!("Learned configuration written to {}", output.display());
    Ok(())
}
