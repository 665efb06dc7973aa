use super::prepare_project;
use crate::analysis::analyze_project;
use crate::config::loader::project_root;
use crate::core::CancellationToken;
use crate::migrate::{plan_migration, MigrationOutcome, MigrationPlan, Migrator, RenameChange};
use anyhow::{bail, Context, Result};
use dialoguer::Select;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

pub struct MigrateConfig {
    pub path: PathBuf,
    pub config: Option<PathBuf>,
    pub dry_run: bool,
    pub rollback: bool,
    pub patterns: Vec<String>,
    /// Accept every automatic rename without prompting
    pub yes: bool,
}

enum Choice {
    Accept,
    Skip,
    AcceptAll,
    Quit,
}

pub fn handle_migrate(config: MigrateConfig) -> Result<()> {
    let path = config
        .path
        .canonicalize()
        .with_context(|| format!("Path does not exist: {}", config.path.display()))?;

    if config.rollback {
        return rollback(&project_root(&path));
    }

    let project = prepare_project(&path, config.config.as_deref(), &config.patterns)?;
    let report = analyze_project(
        &project.files,
        project.profile,
        &project.rules,
        &CancellationToken::new(),
    );
    let plan = plan_migration(
        &report.violations,
        &report.project.declarations,
        &project.files,
    );
    print_plan(&plan, &project.root);

    if plan.changes.is_empty() {
        println!("\nNothing to migrate automatically.");
        return Ok(());
    }

    let accepted = if config.yes || config.dry_run {
        plan.changes.clone()
    } else if std::io::stdin().is_terminal() {
        select_changes(&plan.changes, &project.root)?
    } else {
        println!("\nNot running interactively; pass --yes to apply these renames.");
        return Ok(());
    };
    if accepted.is_empty() {
        println!("\nNo renames accepted.");
        return Ok(());
    }

    let migrator = Migrator::new(&project.root).dry_run(config.dry_run);
    let outcome = migrator.apply_plan(&accepted, &project.files);
    print_outcome(&outcome, &project.root);

    if !outcome.failed.is_empty() {
        bail!("{} file(s) could not be migrated", outcome.failed.len());
    }
    Ok(())
}

fn rollback(root: &Path) -> Result<()> {
    let restored = Migrator::new(root)
        .rollback()
        .context("Rollback failed")?;
    if restored.is_empty() {
        println!("No backups found; nothing to roll back.");
    } else {
        println!("Restored {} file(s):", restored.len());
        for file in &restored {
            println!("  - {}", relative(file, root));
        }
    }
    Ok(())
}

fn relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn print_plan(plan: &MigrationPlan, root: &Path) {
    println!("Migration plan");
    println!("{}", "=".repeat(50));
    println!("Automatic renames: {}", plan.changes.len());
    for change in &plan.changes {
        println!(
            "  {}:{}  {} -> {}",
            relative(&change.file, root),
            change.line,
            change.old_name,
            change.new_name
        );
    }

    if !plan.manual_review.is_empty() {
        println!("\nNeeds manual review: {}", plan.manual_review.len());
        for review in &plan.manual_review {
            let suggestion = review
                .suggested_name
                .as_deref()
                .map(|s| format!(" -> {s}"))
                .unwrap_or_default();
            println!(
                "  {}:{}  {}{}  ({})",
                relative(&review.file, root),
                review.line,
                review.name,
                suggestion,
                review.reason
            );
        }
    }
}

fn prompt(change: &RenameChange, root: &Path) -> Result<Choice> {
    let selection = Select::new()
        .with_prompt(format!(
            "{}:{} rename {} -> {}?",
            relative(&change.file, root),
            change.line,
            change.old_name,
            change.new_name
        ))
        .items(&["Accept", "Skip", "Accept all remaining", "Quit"])
        .default(0)
        .interact()?;
    Ok(match selection {
        0 => Choice::Accept,
        1 => Choice::Skip,
        2 => Choice::AcceptAll,
        _ => Choice::Quit,
    })
}

fn select_changes(changes: &[RenameChange], root: &Path) -> Result<Vec<RenameChange>> {
    let mut accepted = Vec::new();
    for (index, change) in changes.iter().enumerate() {
        match prompt(change, root)? {
            Choice::Accept => accepted.push(change.clone()),
            Choice::Skip => {}
            Choice::AcceptAll => {
                accepted.extend_from_slice(&changes[index..]);
                break;
            }
            Choice::Quit => break,
        }
    }
    Ok(accepted)
}

fn print_outcome(outcome: &MigrationOutcome, root: &Path) {
    if outcome.dry_run {
        println!("\nDry run: no files were changed");
        for edit in &outcome.edits {
            println!("\n{}", relative(&edit.file, root));
            for line in &edit.preview {
                println!("  {:>5} - {}", line.line, line.before);
                println!("  {:>5} + {}", line.line, line.after);
            }
        }
    } else {
        println!(
            "\nRenamed {} occurrence(s) in {} file(s)",
            outcome.renamed_occurrences(),
            outcome.edits.len()
        );
        println!("Undo with `grammarops migrate --rollback`");
    }

    for failure in &outcome.failed {
        println!("Failed: {} ({})", relative(&failure.file, root), failure.error);
    }
}
