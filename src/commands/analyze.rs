use super::prepare_project;
use crate::analysis::analyze_project;
use crate::core::CancellationToken;
use crate::formatting::{FormattingConfig, Styler};
use crate::io::{self, format_report, OutputFormat, ReportOptions};
use anyhow::Result;
use std::path::PathBuf;

pub struct AnalyzeConfig {
    pub path: PathBuf,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub patterns: Vec<String>,
    pub verbose: bool,
    pub max_issues: Option<usize>,
    pub formatting_config: FormattingConfig,
}

/// Run the analysis and print or write the report.
/// Returns whether any violation was found.
pub fn handle_analyze(config: AnalyzeConfig) -> Result<bool> {
    let project = prepare_project(&config.path, config.config.as_deref(), &config.patterns)?;
    log::debug!("Framework profile:\n{}", project.profile.report());

    let mut report = analyze_project(
        &project.files,
        project.profile,
        &project.rules,
        &CancellationToken::new(),
    );
    report.project.skipped.extend(project.skipped);
    report.project.skipped.sort_by(|a, b| a.path.cmp(&b.path));

    // Files never carry colour codes
    let styler = match config.output {
        Some(_) => Styler::plain(),
        None => Styler::new(config.formatting_config),
    };
    let options = ReportOptions {
        root: project.root,
        verbose: config.verbose,
        max_issues: config.max_issues,
    };
    let rendered = format_report(&report, config.format, options, styler)?;

    match &config.output {
        Some(path) => {
            io::write_file(path, &rendered)?;
            log::info!("Report written to {}", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(report.has_violations())
}
