mod common;

use common::TestProject;
use grammarops::analysis::FrameworkDetector;
use grammarops::config::load_config;
use grammarops::core::CancellationToken;
use grammarops::learn::{learn, LearnedConfig, PatternLearner, LEARNED_CONFIG_FILE};
use indoc::indoc;
use pretty_assertions::assert_eq;

fn legacy_project() -> TestProject {
    TestProject::new(&[
        (
            "app/cli.py",
            indoc! {r#"
                import click

                @click.group()
                def cli():
                    pass

                @cli.command()
                def deploy():
                    pass

                @cli.command()
                def status():
                    pass
            "#},
        ),
        (
            "app/models.py",
            indoc! {r#"
                import logging
                from typing import TypeVar

                logger = logging.getLogger(__name__)
                T = TypeVar("T")
                default_timeout = 30

                def userData():
                    pass

                def get_user():
                    pass

                def sync_accounts():
                    pass
            "#},
        ),
        (
            "web/api.ts",
            indoc! {r#"
                export function fetchUser(id: string) {
                    return id;
                }

                export function userProfile() {
                    return null;
                }
            "#},
        ),
    ])
}

#[test]
fn test_learn_is_byte_identical_across_runs() {
    let project = legacy_project();
    let first = learn(&project.sources()).to_json().unwrap();
    let second = learn(&project.sources()).to_json().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_adopting_learned_config_reports_nothing() {
    let project = legacy_project();
    assert!(project.analyze().has_violations());

    let learned = learn(&project.sources());
    learned.write(&project.path(LEARNED_CONFIG_FILE)).unwrap();

    let loaded = load_config(None, project.root()).unwrap();
    assert_eq!(
        loaded.source.as_deref(),
        Some(project.path(LEARNED_CONFIG_FILE).as_path())
    );
    let report = project.analyze();
    assert!(
        report.violations.is_empty(),
        "unexpected violations: {:?}",
        report
            .violations
            .iter()
            .map(|v| (&v.declaration.name, &v.rule_id))
            .collect::<Vec<_>>()
    );
}

#[test]
fn test_learned_config_round_trips_through_json() {
    let project = legacy_project();
    let learned = learn(&project.sources());
    let parsed: LearnedConfig = serde_json::from_str(&learned.to_json().unwrap()).unwrap();
    assert_eq!(parsed, learned);
}

#[test]
fn test_learned_exceptions_and_frameworks() {
    let project = legacy_project();
    let learned = learn(&project.sources());
    let config = &learned.config;

    assert_eq!(config.frameworks.detected, vec!["click".to_string()]);
    assert!(config.exceptions.functions.contains(&"userData".to_string()));
    assert!(config.exceptions.functions.contains(&"userProfile".to_string()));
    assert!(!config.exceptions.functions.contains(&"get_user".to_string()));
    assert!(config.rules.contains_key("python"));
    assert!(config.rules.contains_key("typescript"));
    assert_eq!(config.project.language.as_deref(), Some("python"));
}

#[test]
fn test_report_mentions_contexts_and_adoption() {
    let project = legacy_project();
    let files = project.sources();
    let profile = FrameworkDetector::new().detect(&files);
    let outcome = PatternLearner::new()
        .with_project_name("legacy")
        .learn(&files, profile, &CancellationToken::new());

    let report = outcome.report(project.root());
    assert!(report.contains("Pattern Learning Report"));
    assert!(report.contains("Files analyzed: 3"));
    assert!(report.contains("Detected Frameworks: Click"));
    assert!(report.contains("CliCommand"));
    assert!(report.contains(".grammarops.config.json"));
    assert_eq!(outcome.learned.config.project.name.as_deref(), Some("legacy"));
}
