use crate::analysis::{load_sources, FrameworkDetector, FrameworkProfile};
use crate::io::{FileWalker, OutputFormat};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub struct DetectConfig {
    pub path: PathBuf,
    pub format: OutputFormat,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DetectionJson {
    frameworks: Vec<&'static str>,
    evidence: BTreeMap<&'static str, Vec<String>>,
    idioms: BTreeMap<&'static str, String>,
}

fn to_json(profile: &FrameworkProfile) -> Result<String> {
    let detection = DetectionJson {
        frameworks: profile.frameworks.iter().map(|f| f.key()).collect(),
        evidence: profile
            .evidence
            .iter()
            .map(|(framework, evidence)| (framework.key(), evidence.clone()))
            .collect(),
        idioms: profile.idioms.active().into_iter().collect(),
    };
    Ok(serde_json::to_string_pretty(&detection)?)
}

/// Detection is configuration-free: it shows what auto-detection sees
pub fn handle_detect(config: DetectConfig) -> Result<()> {
    let paths = FileWalker::new(config.path.clone())
        .walk()
        .with_context(|| format!("Failed to collect files under {}", config.path.display()))?;
    let (files, _) = load_sources(&paths);
    let profile = FrameworkDetector::new().detect(&files);

    match config.format {
        OutputFormat::Json => println!("{}", to_json(&profile)?),
        OutputFormat::Terminal => println!("{}", profile.report()),
    }
    Ok(())
}
