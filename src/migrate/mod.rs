//! Rename migration.
//!
//! Planning is a pure function from violations to proposed changes.
//! Anything that could break a reference ends up in `manual_review` with
//! the reason. Applying a plan rewrites identifier tokens only, file by
//! file, backing each file up first.

pub mod backup;
pub mod rewrite;

pub use backup::{BackupStore, LogAction, LogEntry, BACKUP_DIR, MIGRATION_LOG};

use crate::analysis::ClassifiedDeclaration;
use crate::analyzers::parse_file;
use crate::core::{ContextLabel, EnclosingScope, Error, Result, SourceFile};
use crate::naming::Violation;
use backup::{append_log, write_atomically, LoggedFailure, LoggedRename};
use rewrite::{apply_edits, contains_word, identifier_ranges, imports_name, string_literals};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

/// Labels whose names are part of a framework or runtime contract
const CONTRACT_LABELS: &[ContextLabel] = &[
    ContextLabel::Singleton,
    ContextLabel::TypeVar,
    ContextLabel::LoggerInstance,
    ContextLabel::FrameworkHandler,
    ContextLabel::CliCommand,
];

/// A rename safe to apply automatically
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameChange {
    pub file: PathBuf,
    pub line: usize,
    pub old_name: String,
    pub new_name: String,
    pub label: ContextLabel,
    pub rule_ids: Vec<String>,
}

/// Why a rename was held back
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ReviewReason {
    NoSuggestion,
    FrameworkContract { label: ContextLabel },
    ClassMember,
    DeclaredTwice,
    NameTaken { name: String },
    StringReference { file: PathBuf },
    ConflictingRenames,
}

impl fmt::Display for ReviewReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewReason::NoSuggestion => write!(f, "no mechanical suggestion"),
            ReviewReason::FrameworkContract { label } => {
                write!(f, "{} names may be part of a framework contract", label.description())
            }
            ReviewReason::ClassMember => write!(f, "methods may be called dynamically"),
            ReviewReason::DeclaredTwice => write!(f, "name is declared more than once in the file"),
            ReviewReason::NameTaken { name } => write!(f, "'{name}' already exists in the file"),
            ReviewReason::StringReference { file } => {
                write!(f, "name appears in a string literal in {}", file.display())
            }
            ReviewReason::ConflictingRenames => write!(f, "conflicts with another rename"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualReview {
    pub file: PathBuf,
    pub line: usize,
    pub name: String,
    pub suggested_name: Option<String>,
    #[serde(flatten)]
    pub reason: ReviewReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationPlan {
    pub changes: Vec<RenameChange>,
    pub manual_review: Vec<ManualReview>,
}

impl MigrationPlan {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.manual_review.is_empty()
    }
}

/// Final name for a declaration: the verb suggestion, written in the
/// casing rule's preferred style
fn combined_suggestion(group: &[&Violation]) -> Option<String> {
    let original = &group[0].declaration.name;
    let verb = group
        .iter()
        .find(|v| v.is_verb_prefix())
        .and_then(|v| v.suggested_name.clone());
    let renamed = match group.iter().find_map(|v| v.target_style) {
        Some(style) => Some(style.convert(verb.as_deref().unwrap_or(original))),
        None => verb,
    };
    renamed.filter(|name| name != original)
}

/// Build a migration plan. Pure: reads nothing but its arguments.
pub fn plan_migration(
    violations: &[Violation],
    declarations: &[ClassifiedDeclaration],
    files: &[SourceFile],
) -> MigrationPlan {
    let sources: HashMap<&Path, &SourceFile> =
        files.iter().map(|f| (f.path.as_path(), f)).collect();

    let mut declared: HashMap<(&Path, &str), usize> = HashMap::new();
    for classified in declarations {
        let decl = &classified.declaration;
        *declared
            .entry((decl.location.file.as_path(), decl.name.as_str()))
            .or_insert(0) += 1;
    }

    let literals: Vec<(&Path, Vec<String>)> = files
        .iter()
        .filter_map(|file| {
            let tree = parse_file(file).ok()?;
            Some((file.path.as_path(), string_literals(&tree, &file.content)))
        })
        .collect();

    let mut groups: BTreeMap<(&Path, usize, &str), Vec<&Violation>> = BTreeMap::new();
    for violation in violations {
        let decl = &violation.declaration;
        groups
            .entry((decl.location.file.as_path(), decl.location.line, decl.name.as_str()))
            .or_default()
            .push(violation);
    }

    let mut plan = MigrationPlan::default();
    let mut candidates = Vec::new();
    for ((file, line, name), group) in groups {
        let decl = &group[0].declaration;
        let label = group[0].label;
        let suggested = combined_suggestion(&group);
        let review = |reason| ManualReview {
            file: file.to_path_buf(),
            line,
            name: name.to_string(),
            suggested_name: suggested.clone(),
            reason,
        };

        if CONTRACT_LABELS.contains(&label) {
            plan.manual_review.push(review(ReviewReason::FrameworkContract { label }));
            continue;
        }
        if decl.scope == EnclosingScope::Class {
            plan.manual_review.push(review(ReviewReason::ClassMember));
            continue;
        }
        let Some(new_name) = suggested.clone() else {
            plan.manual_review.push(review(ReviewReason::NoSuggestion));
            continue;
        };
        if declared.get(&(file, name)).copied().unwrap_or(0) > 1 {
            plan.manual_review.push(review(ReviewReason::DeclaredTwice));
            continue;
        }
        let taken = declared.contains_key(&(file, new_name.as_str()))
            || sources
                .get(file)
                .is_some_and(|source| contains_word(&source.content, &new_name));
        if taken {
            plan.manual_review.push(review(ReviewReason::NameTaken { name: new_name }));
            continue;
        }
        let mentioned = literals
            .iter()
            .find(|(_, strings)| strings.iter().any(|s| contains_word(s, name)));
        if let Some((mentioned_in, _)) = mentioned {
            plan.manual_review.push(review(ReviewReason::StringReference {
                file: mentioned_in.to_path_buf(),
            }));
            continue;
        }

        candidates.push(RenameChange {
            file: file.to_path_buf(),
            line,
            old_name: name.to_string(),
            new_name,
            label,
            rule_ids: group.iter().map(|v| v.rule_id.clone()).collect(),
        });
    }

    let conflicted = conflicting(&candidates);
    for (index, change) in candidates.into_iter().enumerate() {
        if conflicted.contains(&index) {
            plan.manual_review.push(ManualReview {
                file: change.file,
                line: change.line,
                name: change.old_name,
                suggested_name: Some(change.new_name),
                reason: ReviewReason::ConflictingRenames,
            });
        } else {
            plan.changes.push(change);
        }
    }
    plan.manual_review
        .sort_by(|a, b| (&a.file, a.line, &a.name).cmp(&(&b.file, b.line, &b.name)));

    log::info!(
        "Planned {} renames, {} for manual review",
        plan.changes.len(),
        plan.manual_review.len()
    );
    plan
}

/// Indices of candidates that collide: two renames to one new name in a
/// file, one old name renamed two ways, or a rename onto a name that is
/// itself being renamed
fn conflicting(candidates: &[RenameChange]) -> BTreeSet<usize> {
    let mut by_target: HashMap<(&Path, &str), Vec<usize>> = HashMap::new();
    let mut by_source: HashMap<&str, BTreeSet<&str>> = HashMap::new();
    let mut old_names: HashMap<&Path, BTreeSet<&str>> = HashMap::new();
    for (i, change) in candidates.iter().enumerate() {
        by_target
            .entry((change.file.as_path(), change.new_name.as_str()))
            .or_default()
            .push(i);
        by_source
            .entry(change.old_name.as_str())
            .or_default()
            .insert(change.new_name.as_str());
        old_names
            .entry(change.file.as_path())
            .or_default()
            .insert(change.old_name.as_str());
    }

    let mut conflicted = BTreeSet::new();
    for indices in by_target.values().filter(|v| v.len() > 1) {
        conflicted.extend(indices.iter().copied());
    }
    for (i, change) in candidates.iter().enumerate() {
        let renamed_two_ways = by_source
            .get(change.old_name.as_str())
            .is_some_and(|targets| targets.len() > 1);
        let chained = old_names
            .get(change.file.as_path())
            .is_some_and(|names| names.contains(change.new_name.as_str()));
        if renamed_two_ways || chained {
            conflicted.insert(i);
        }
    }
    conflicted
}

/// One line changed by a rewrite
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewLine {
    pub line: usize,
    pub before: String,
    pub after: String,
}

/// Renames applied (or, in a dry run, to be applied) to one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEdit {
    pub file: PathBuf,
    /// (old, new, identifier occurrences)
    pub renames: Vec<(String, String, usize)>,
    pub preview: Vec<PreviewLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFile {
    pub file: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationOutcome {
    pub dry_run: bool,
    pub edits: Vec<FileEdit>,
    pub failed: Vec<FailedFile>,
}

impl MigrationOutcome {
    pub fn renamed_occurrences(&self) -> usize {
        self.edits
            .iter()
            .flat_map(|e| e.renames.iter())
            .map(|(_, _, count)| count)
            .sum()
    }
}

/// Applies migration plans inside one project root
#[derive(Debug, Clone)]
pub struct Migrator {
    root: PathBuf,
    backups: BackupStore,
    dry_run: bool,
}

impl Migrator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            backups: BackupStore::new(&root),
            root,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn backups(&self) -> &BackupStore {
        &self.backups
    }

    /// Renames for each file: the defining file plus every file that
    /// imports the old name from it
    fn renames_by_file(
        changes: &[RenameChange],
        files: &[SourceFile],
    ) -> BTreeMap<PathBuf, Vec<(String, String)>> {
        let trees: Vec<_> = files
            .iter()
            .filter_map(|file| parse_file(file).ok().map(|tree| (file, tree)))
            .collect();

        let mut renames: BTreeMap<PathBuf, Vec<(String, String)>> = BTreeMap::new();
        for change in changes {
            let pair = (change.old_name.clone(), change.new_name.clone());
            renames.entry(change.file.clone()).or_default().push(pair.clone());

            let python = crate::core::Language::from_path(&change.file)
                .is_some_and(|l| l.is_python());
            for (file, tree) in &trees {
                if file.path == change.file || file.language.is_python() != python {
                    continue;
                }
                if imports_name(
                    &file.path,
                    tree,
                    &file.content,
                    &change.old_name,
                    &change.file,
                    python,
                ) {
                    log::debug!(
                        "{} imports {} from {}",
                        file.path.display(),
                        change.old_name,
                        change.file.display()
                    );
                    renames.entry(file.path.clone()).or_default().push(pair.clone());
                }
            }
        }
        for pairs in renames.values_mut() {
            pairs.sort();
            pairs.dedup();
        }
        renames
    }

    /// Rewrite one file's source. Fails if the result no longer parses.
    fn rewrite_file(file: &SourceFile, renames: &[(String, String)]) -> Result<(String, FileEdit)> {
        let tree = parse_file(file)?;
        let mut edits = Vec::new();
        let mut counted = Vec::new();
        for (old, new) in renames {
            let ranges = identifier_ranges(&tree, &file.content, old);
            counted.push((old.clone(), new.clone(), ranges.len()));
            edits.extend(ranges.into_iter().map(|range| (range, new.clone())));
        }
        let rewritten = apply_edits(&file.content, edits);

        let check = SourceFile::new(file.path.clone(), file.language, rewritten.as_str());
        parse_file(&check).map_err(|e| {
            Error::Migration(format!(
                "rewritten {} no longer parses: {}",
                file.path.display(),
                e
            ))
        })?;

        let preview = file
            .content
            .lines()
            .zip(rewritten.lines())
            .enumerate()
            .filter(|(_, (before, after))| before != after)
            .map(|(i, (before, after))| PreviewLine {
                line: i + 1,
                before: before.to_string(),
                after: after.to_string(),
            })
            .collect();

        Ok((
            rewritten,
            FileEdit {
                file: file.path.clone(),
                renames: counted,
                preview,
            },
        ))
    }

    fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        self.backups.backup(path)?;
        if let Err(e) = write_atomically(path, contents) {
            if let Err(restore) = self.backups.restore(path) {
                log::warn!("Could not restore {}: {}", path.display(), restore);
            }
            return Err(e);
        }
        Ok(())
    }

    /// Apply planned renames. A file that fails is restored and reported;
    /// the remaining files are still migrated.
    pub fn apply_plan(&self, changes: &[RenameChange], files: &[SourceFile]) -> MigrationOutcome {
        let sources: HashMap<&Path, &SourceFile> =
            files.iter().map(|f| (f.path.as_path(), f)).collect();
        let mut outcome = MigrationOutcome {
            dry_run: self.dry_run,
            ..MigrationOutcome::default()
        };

        for (path, renames) in Self::renames_by_file(changes, files) {
            let Some(file) = sources.get(path.as_path()) else {
                outcome.failed.push(FailedFile {
                    file: path,
                    error: "file was not loaded".to_string(),
                });
                continue;
            };
            let result = Self::rewrite_file(file, &renames).and_then(|(contents, edit)| {
                if !self.dry_run {
                    self.write_file(&path, &contents)?;
                    log::info!("Migrated {}", path.display());
                }
                Ok(edit)
            });
            match result {
                Ok(edit) => outcome.edits.push(edit),
                Err(e) => {
                    log::warn!("Migration of {} failed: {}", path.display(), e);
                    outcome.failed.push(FailedFile {
                        file: path,
                        error: e.to_string(),
                    });
                }
            }
        }

        if !self.dry_run && !(outcome.edits.is_empty() && outcome.failed.is_empty()) {
            let mut entry = LogEntry::new(LogAction::Migrate);
            entry.renames = outcome
                .edits
                .iter()
                .flat_map(|edit| {
                    edit.renames.iter().map(|(old, new, count)| LoggedRename {
                        file: edit.file.clone(),
                        old_name: old.clone(),
                        new_name: new.clone(),
                        occurrences: *count,
                    })
                })
                .collect();
            entry.failed = outcome
                .failed
                .iter()
                .map(|f| LoggedFailure {
                    file: f.file.clone(),
                    error: f.error.clone(),
                })
                .collect();
            if let Err(e) = append_log(&self.root, &entry) {
                log::warn!("Could not write migration log: {}", e);
            }
        }
        outcome
    }

    /// Restore every backed-up file and delete the backups
    pub fn rollback(&self) -> Result<Vec<PathBuf>> {
        let restored = self.backups.rollback()?;
        if !restored.is_empty() {
            let mut entry = LogEntry::new(LogAction::Rollback);
            entry.restored = restored.clone();
            append_log(&self.root, &entry)?;
        }
        Ok(restored)
    }
}
