//! Violation reports for the `analyze` command

use crate::analysis::{AnalysisReport, SkippedFile};
use crate::core::{ContextLabel, DeclarationKind, Severity};
use crate::formatting::{Icon, Styler};
use crate::learn::GRADUAL_ADOPTION_THRESHOLD;
use crate::naming::Violation;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    #[default]
    Terminal,
}

/// Presentation knobs for the terminal report
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Paths are printed relative to this root
    pub root: PathBuf,
    pub verbose: bool,
    /// Caps the listed violations; the summary always counts all of them
    pub max_issues: Option<usize>,
}

pub trait OutputWriter {
    fn write_results(&mut self, report: &AnalysisReport) -> anyhow::Result<()>;
}

/// Render a report to a string
pub fn format_report(
    report: &AnalysisReport,
    format: OutputFormat,
    options: ReportOptions,
    styler: Styler,
) -> anyhow::Result<String> {
    let mut buffer = Vec::new();
    match format {
        OutputFormat::Json => JsonWriter::new(&mut buffer, options.root).write_results(report)?,
        OutputFormat::Terminal => {
            TerminalWriter::new(&mut buffer, options, styler).write_results(report)?
        }
    }
    Ok(String::from_utf8(buffer)?)
}

fn display_path(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let shown = relative.to_string_lossy().replace('\\', "/");
    if shown.is_empty() {
        path.to_string_lossy().into_owned()
    } else {
        shown
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonViolation<'a> {
    file: String,
    line: usize,
    declaration_name: &'a str,
    context_label: &'static str,
    rule_violated: &'a str,
    suggested_name: Option<&'a str>,
    severity: Severity,
    message: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSummary {
    total_issues: usize,
    by_context: BTreeMap<&'static str, usize>,
    skipped_files: usize,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    violations: Vec<JsonViolation<'a>>,
    summary: JsonSummary,
}

pub struct JsonWriter<W: Write> {
    writer: W,
    root: PathBuf,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W, root: PathBuf) -> Self {
        Self { writer, root }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_results(&mut self, report: &AnalysisReport) -> anyhow::Result<()> {
        let violations = report
            .violations
            .iter()
            .map(|v| JsonViolation {
                file: display_path(&v.declaration.location.file, &self.root),
                line: v.declaration.location.line,
                declaration_name: &v.declaration.name,
                context_label: v.label.as_str(),
                rule_violated: &v.rule_id,
                suggested_name: v.suggested_name.as_deref(),
                severity: v.severity,
                message: &v.message,
            })
            .collect();
        let summary = JsonSummary {
            total_issues: report.violations.len(),
            by_context: report
                .by_context()
                .into_iter()
                .map(|(label, count)| (label.as_str(), count))
                .collect(),
            skipped_files: report.project.skipped.len(),
        };

        let json = serde_json::to_string_pretty(&JsonReport {
            violations,
            summary,
        })?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        Ok(())
    }
}

pub struct TerminalWriter<W: Write> {
    writer: W,
    options: ReportOptions,
    styler: Styler,
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W, options: ReportOptions, styler: Styler) -> Self {
        Self {
            writer,
            options,
            styler,
        }
    }
}

impl<W: Write> OutputWriter for TerminalWriter<W> {
    fn write_results(&mut self, report: &AnalysisReport) -> anyhow::Result<()> {
        let shown = self
            .options
            .max_issues
            .unwrap_or(report.violations.len())
            .min(report.violations.len());

        for violation in &report.violations[..shown] {
            self.write_violation(violation)?;
        }
        if shown < report.violations.len() {
            writeln!(
                self.writer,
                "{}",
                self.styler.dim(&format!(
                    "... {} more not shown (raise --max-issues to see them)",
                    report.violations.len() - shown
                ))
            )?;
        }

        self.write_summary(report)
    }
}

impl<W: Write> TerminalWriter<W> {
    fn write_violation(&mut self, violation: &Violation) -> anyhow::Result<()> {
        let s = self.styler;
        let decl = &violation.declaration;
        let kind = match decl.kind {
            DeclarationKind::Function => "Function",
            DeclarationKind::Assignment => "Assignment",
        };

        writeln!(
            self.writer,
            "\n{} {}",
            s.icon(Icon::Location),
            s.bold(&format!(
                "{}:{}",
                display_path(&decl.location.file, &self.options.root),
                decl.location.line
            ))
        )?;
        writeln!(self.writer, "  {}: {}", kind, s.bold(&decl.name))?;
        writeln!(self.writer, "  Context: {}", violation.label.description())?;
        writeln!(
            self.writer,
            "  {} {}: {}",
            s.icon(Icon::Issue),
            s.severity(violation.severity, violation.issue()),
            violation.message
        )?;

        match &violation.suggested_name {
            Some(suggestion) => writeln!(
                self.writer,
                "  {} Suggestion: {}",
                s.icon(Icon::Suggestion),
                s.suggestion(suggestion)
            )?,
            None => writeln!(
                self.writer,
                "  {} {}",
                s.icon(Icon::Suggestion),
                s.dim("No automatic suggestion; rename by hand or add an exception")
            )?,
        }

        if self.options.verbose {
            writeln!(
                self.writer,
                "  {} {}",
                s.icon(Icon::Info),
                s.dim(violation.label.explanation())
            )?;
            if !decl.decorators.is_empty() {
                writeln!(
                    self.writer,
                    "  Decorators: {}",
                    s.dim(&decl.decorators.join(", "))
                )?;
            }
            if let Some(pattern) = exception_pattern(violation) {
                writeln!(self.writer, "  Exception pattern: {}", s.dim(&pattern))?;
            }
        }
        Ok(())
    }

    fn write_summary(&mut self, report: &AnalysisReport) -> anyhow::Result<()> {
        let s = self.styler;
        writeln!(self.writer, "\n{}", s.header("Grammar-Ops Analysis Summary"))?;
        writeln!(self.writer, "{}", "=".repeat(50))?;
        writeln!(
            self.writer,
            "Files analyzed: {}",
            report.project.files_analyzed
        )?;

        if report.violations.is_empty() {
            writeln!(
                self.writer,
                "\n{} {}",
                s.icon(Icon::Clean),
                s.success("No naming issues found")
            )?;
        } else {
            writeln!(
                self.writer,
                "\n{} Total issues: {}",
                s.icon(Icon::Summary),
                s.bold(&report.violations.len().to_string())
            )?;
            for (label, count) in report.by_context() {
                writeln!(self.writer, "  - {}: {}", label.description(), count)?;
            }
        }

        if !report.project.skipped.is_empty() {
            self.write_skipped(&report.project.skipped)?;
        }

        let recommendations = recommendations(report);
        if !recommendations.is_empty() {
            writeln!(
                self.writer,
                "\n{} {}",
                s.icon(Icon::Suggestion),
                s.bold("Recommendations:")
            )?;
            for recommendation in recommendations {
                writeln!(self.writer, "  - {recommendation}")?;
            }
        }
        Ok(())
    }

    fn write_skipped(&mut self, skipped: &[SkippedFile]) -> anyhow::Result<()> {
        writeln!(
            self.writer,
            "\n{} Skipped files: {}",
            self.styler.icon(Icon::Info),
            skipped.len()
        )?;
        for skip in skipped {
            writeln!(
                self.writer,
                "  - {} ({})",
                display_path(&skip.path, &self.options.root),
                self.styler.dim(&skip.reason)
            )?;
        }
        Ok(())
    }
}

/// Exception pattern that would accept a framework-bound assignment
fn exception_pattern(violation: &Violation) -> Option<String> {
    let decl = &violation.declaration;
    let name = regex::escape(&decl.name);
    match violation.label {
        ContextLabel::TypeVar => Some(format!(r"^{name} = TypeVar\(")),
        ContextLabel::LoggerInstance => Some(format!(r"^{name} = logging\.getLogger")),
        ContextLabel::Singleton => decl
            .value
            .as_ref()
            .map(|value| format!("^{} = {}", name, regex::escape(&value.text))),
        _ => None,
    }
}

fn recommendations(report: &AnalysisReport) -> Vec<String> {
    let by_context = report.by_context();
    let count = |label: ContextLabel| by_context.get(&label).copied().unwrap_or(0);
    let mut recommendations = Vec::new();

    let cli = count(ContextLabel::CliCommand);
    if cli > 3 {
        recommendations.push(format!(
            "Found {cli} CLI command issues. Consider setting \"cli_commands\": \"rails_style\" \
             under require_verb_prefix.exceptions"
        ));
    }
    for (label, what) in [
        (ContextLabel::Singleton, "singleton instances"),
        (ContextLabel::TypeVar, "TypeVar declarations"),
        (ContextLabel::LoggerInstance, "logger instances"),
    ] {
        let n = count(label);
        if n > 0 {
            recommendations.push(format!(
                "Found {n} {what}. Add them to exceptions.patterns.allow (see --verbose for patterns)"
            ));
        }
    }

    let total = report.violations.len();
    if total > GRADUAL_ADOPTION_THRESHOLD {
        recommendations.push(format!(
            "With {total} issues, consider gradual adoption: run `grammarops learn` to \
             record current conventions"
        ));
    }
    if report.violations.iter().any(|v| v.suggested_name.is_some()) {
        recommendations.push(
            "Preview automatic renames with `grammarops migrate --dry-run`".to_string(),
        );
    }
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{analyze_project, FrameworkProfile};
    use crate::core::{CancellationToken, Language, SourceFile};
    use crate::naming::RuleSet;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn report() -> AnalysisReport {
        let files = vec![SourceFile::new(
            "/project/app/main.py",
            Language::Python,
            indoc! {r#"
                from typing import TypeVar

                T_model = TypeVar("T_model")

                def userData():
                    pass

                def payment():
                    pass
            "#},
        )];
        analyze_project(
            &files,
            FrameworkProfile::empty(),
            &RuleSet::defaults(),
            &CancellationToken::new(),
        )
    }

    fn options() -> ReportOptions {
        ReportOptions {
            root: PathBuf::from("/project"),
            ..ReportOptions::default()
        }
    }

    #[test]
    fn test_json_keys() {
        let report = report();
        let json = format_report(&report, OutputFormat::Json, options(), Styler::plain()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let first = &value["violations"][0];
        assert_eq!(first["file"], "app/main.py");
        assert_eq!(first["declarationName"], report.violations[0].declaration.name);
        assert!(first["contextLabel"].is_string());
        assert!(first["ruleViolated"].is_string());
        assert!(first.get("suggestedName").is_some());
        assert!(first["severity"].is_string());
        assert!(first["message"].is_string());

        assert_eq!(value["summary"]["totalIssues"], report.violations.len());
        assert_eq!(value["summary"]["skippedFiles"], 0);
        assert_eq!(
            value["summary"]["byContext"]["RegularFunction"],
            report.by_context()[&ContextLabel::RegularFunction]
        );
    }

    #[test]
    fn test_terminal_report_lists_and_summarises() {
        let report = report();
        let text =
            format_report(&report, OutputFormat::Terminal, options(), Styler::plain()).unwrap();
        assert!(text.contains("app/main.py:5"));
        assert!(text.contains("Function: userData"));
        assert!(text.contains("Context: Regular Function"));
        assert!(text.contains("[SUGGEST] Suggestion: process_payment"));
        assert!(text.contains(&format!("Total issues: {}", report.violations.len())));
        assert!(text.contains("migrate --dry-run"));
        assert!(!text.contains("Decorators:"));
    }

    #[test]
    fn test_max_issues_caps_listing_not_summary() {
        let report = report();
        let total = report.violations.len();
        assert!(total >= 2);
        let text = format_report(
            &report,
            OutputFormat::Terminal,
            ReportOptions {
                max_issues: Some(1),
                ..options()
            },
            Styler::plain(),
        )
        .unwrap();
        assert_eq!(text.matches("[ISSUE]").count(), 1);
        assert!(text.contains(&format!("{} more not shown", total - 1)));
        assert!(text.contains(&format!("Total issues: {total}")));
    }

    #[test]
    fn test_verbose_adds_explanation() {
        let report = report();
        let text = format_report(
            &report,
            OutputFormat::Terminal,
            ReportOptions {
                verbose: true,
                ..options()
            },
            Styler::plain(),
        )
        .unwrap();
        assert!(text.contains(ContextLabel::RegularFunction.explanation()));
    }

    #[test]
    fn test_clean_report() {
        let report = analyze_project(
            &[SourceFile::new("/project/a.py", Language::Python, "def get_user():\n    pass\n")],
            FrameworkProfile::empty(),
            &RuleSet::defaults(),
            &CancellationToken::new(),
        );
        let text =
            format_report(&report, OutputFormat::Terminal, options(), Styler::plain()).unwrap();
        assert!(text.contains("[OK] No naming issues found"));
        assert!(!text.contains("Recommendations"));
    }
}
