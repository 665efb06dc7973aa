use crate::io::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "grammarops")]
#[command(about = "Context-aware naming analyzer for Python, JavaScript and TypeScript", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v: info, -vv: debug). RUST_LOG overrides.
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report naming convention violations
    Analyze {
        /// File or directory to analyze
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file (defaults to discovery in the project root)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Only analyze files matching this glob (repeatable)
        #[arg(long)]
        pattern: Vec<String>,

        /// Explain each context and show decorators
        #[arg(long)]
        verbose: bool,

        /// List at most N violations; the summary still counts all of them
        #[arg(long = "max-issues")]
        max_issues: Option<usize>,

        /// Disable colored output
        #[arg(long = "no-color")]
        no_color: bool,
    },

    /// Learn naming conventions from an existing project
    Learn {
        /// Project directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Where to write the learned configuration
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print a learning report
        #[arg(long)]
        report: bool,
    },

    /// Apply suggested renames across a project
    Migrate {
        /// Project directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Show what would change without writing
        #[arg(short = 'd', long = "dry-run")]
        dry_run: bool,

        /// Restore files from the last migration's backups
        #[arg(long, conflicts_with = "dry_run")]
        rollback: bool,

        /// Only migrate files matching this glob (repeatable)
        #[arg(long)]
        pattern: Vec<String>,

        /// Accept every automatic rename without prompting
        #[arg(short, long)]
        yes: bool,
    },

    /// Show detected frameworks and idioms
    Detect {
        /// Project directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,
    },
}
