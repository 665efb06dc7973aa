// Export modules for library usage
pub mod analysis;
pub mod analyzers;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod formatting;
pub mod io;
pub mod learn;
pub mod migrate;
pub mod naming;

// Re-export commonly used types
pub use crate::core::{
    CancellationToken, ContextLabel, Declaration, DeclarationKind, EnclosingScope, Error,
    Language, Result, Severity, SourceFile, SourceLocation,
};

pub use crate::analysis::{
    analyze_project, classify, classify_project, AnalysisReport, FrameworkDetector,
    FrameworkProfile,
};

pub use crate::analyzers::{extract_declarations, parse_file};

pub use crate::config::{build_rule_set, load_config, GrammarOpsConfig};

pub use crate::learn::{learn, LearnedConfig, PatternLearner};

pub use crate::migrate::{plan_migration, MigrationPlan, Migrator};

pub use crate::naming::{evaluate, evaluate_all, RuleSet, Violation};

pub use crate::io::output::{format_report, OutputFormat};
