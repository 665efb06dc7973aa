//! Project analysis pipeline
//!
//! Framework detection is a full barrier: every file contributes to the
//! [`FrameworkProfile`] before any declaration is classified. After that,
//! files are extracted and classified independently (in parallel with
//! rayon) and the results are sorted so output never depends on
//! scheduling.

pub mod context;
pub mod framework_patterns;

pub use context::classify;
pub use framework_patterns::{FrameworkDetector, FrameworkProfile};

use crate::analyzers::extract_declarations;
use crate::core::{CancellationToken, ContextLabel, Declaration, Error, SourceFile};
use crate::naming::{evaluate_all, RuleSet, Violation};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A declaration together with its context label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedDeclaration {
    pub declaration: Declaration,
    pub label: ContextLabel,
}

/// A file left out of the analysis and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Declarations found across a project
#[derive(Debug, Clone, Default)]
pub struct ClassifiedProject {
    pub declarations: Vec<ClassifiedDeclaration>,
    pub skipped: Vec<SkippedFile>,
    pub files_analyzed: usize,
    pub cancelled: bool,
}

/// Outcome of one `analyze` run
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub profile: FrameworkProfile,
    pub project: ClassifiedProject,
    pub violations: Vec<Violation>,
}

impl AnalysisReport {
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Violation counts per context label
    pub fn by_context(&self) -> BTreeMap<ContextLabel, usize> {
        let mut counts = BTreeMap::new();
        for violation in &self.violations {
            *counts.entry(violation.label).or_insert(0) += 1;
        }
        counts
    }
}

enum FileOutcome {
    Classified(Vec<ClassifiedDeclaration>),
    Skipped(SkippedFile),
    Cancelled,
}

/// Read files from disk. Unreadable files are skipped with a warning.
pub fn load_sources(paths: &[PathBuf]) -> (Vec<SourceFile>, Vec<SkippedFile>) {
    let results: Vec<_> = paths
        .par_iter()
        .map(|path| SourceFile::read(path).map_err(|e| skipped(path, &e)))
        .collect();

    let mut files = Vec::new();
    let mut skipped_files = Vec::new();
    for result in results {
        match result {
            Ok(file) => files.push(file),
            Err(skip) => skipped_files.push(skip),
        }
    }
    (files, skipped_files)
}

fn skipped(path: &Path, error: &Error) -> SkippedFile {
    log::warn!("Skipping {}: {}", path.display(), error);
    SkippedFile {
        path: path.to_path_buf(),
        reason: error.to_string(),
    }
}

/// Extract and classify every declaration. Cancellation is honoured
/// between files; a file that already started is finished.
pub fn classify_project(
    files: &[SourceFile],
    profile: &FrameworkProfile,
    cancel: &CancellationToken,
) -> ClassifiedProject {
    let outcomes: Vec<FileOutcome> = files
        .par_iter()
        .map(|file| {
            if cancel.is_cancelled() {
                return FileOutcome::Cancelled;
            }
            match extract_declarations(file) {
                Ok(declarations) => FileOutcome::Classified(
                    declarations
                        .into_iter()
                        .map(|declaration| ClassifiedDeclaration {
                            label: classify(&declaration, profile),
                            declaration,
                        })
                        .collect(),
                ),
                Err(e) => FileOutcome::Skipped(skipped(&file.path, &e)),
            }
        })
        .collect();

    let mut project = ClassifiedProject::default();
    for outcome in outcomes {
        match outcome {
            FileOutcome::Classified(declarations) => {
                project.files_analyzed += 1;
                project.declarations.extend(declarations);
            }
            FileOutcome::Skipped(skip) => project.skipped.push(skip),
            FileOutcome::Cancelled => project.cancelled = true,
        }
    }

    project.declarations.sort_by(|a, b| {
        let (a, b) = (&a.declaration, &b.declaration);
        (&a.location.file, a.location.line, &a.name).cmp(&(
            &b.location.file,
            b.location.line,
            &b.name,
        ))
    });
    project.skipped.sort_by(|a, b| a.path.cmp(&b.path));
    log::info!(
        "Classified {} declarations in {} files ({} skipped)",
        project.declarations.len(),
        project.files_analyzed,
        project.skipped.len()
    );
    project
}

/// Evaluate every classified declaration against the rule set
pub fn evaluate_project(project: &ClassifiedProject, rules: &RuleSet) -> Vec<Violation> {
    project
        .declarations
        .iter()
        .flat_map(|c| evaluate_all(&c.declaration, c.label, rules))
        .collect()
}

/// Classify and evaluate a project for a precomputed profile
pub fn analyze_project(
    files: &[SourceFile],
    profile: FrameworkProfile,
    rules: &RuleSet,
    cancel: &CancellationToken,
) -> AnalysisReport {
    let project = classify_project(files, &profile, cancel);
    let violations = evaluate_project(&project, rules);
    AnalysisReport {
        profile,
        project,
        violations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Language;
    use indoc::indoc;

    fn files() -> Vec<SourceFile> {
        vec![
            SourceFile::new(
                "b.py",
                Language::Python,
                indoc! {r#"
                    def userData():
                        pass
                "#},
            ),
            SourceFile::new("a.py", Language::Python, "def get_user():\n    pass\n"),
            SourceFile::new("broken.py", Language::Python, "def broken(:\n"),
        ]
    }

    #[test]
    fn test_classify_project_sorts_and_skips() {
        let project = classify_project(
            &files(),
            &FrameworkProfile::empty(),
            &CancellationToken::new(),
        );
        let names: Vec<_> = project
            .declarations
            .iter()
            .map(|c| c.declaration.name.as_str())
            .collect();
        assert_eq!(names, vec!["get_user", "userData"]);
        assert_eq!(project.files_analyzed, 2);
        assert_eq!(project.skipped.len(), 1);
        assert_eq!(project.skipped[0].path, PathBuf::from("broken.py"));
        assert!(!project.cancelled);
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let project = classify_project(&files(), &FrameworkProfile::empty(), &token);
        assert!(project.cancelled);
        assert!(project.declarations.is_empty());
    }

    #[test]
    fn test_analyze_is_repeatable() {
        let rules = RuleSet::defaults();
        let first = analyze_project(
            &files(),
            FrameworkProfile::empty(),
            &rules,
            &CancellationToken::new(),
        );
        let second = analyze_project(
            &files(),
            FrameworkProfile::empty(),
            &rules,
            &CancellationToken::new(),
        );
        assert_eq!(first.violations, second.violations);
        assert_eq!(first.by_context()[&ContextLabel::RegularFunction], 2);
    }
}
