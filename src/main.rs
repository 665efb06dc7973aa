use anyhow::Result;
use clap::Parser;
use grammarops::cli::{Cli, Commands};
use grammarops::commands::{
    handle_analyze, handle_detect, handle_learn, handle_migrate, AnalyzeConfig, DetectConfig,
    LearnConfig, MigrateConfig,
};
use grammarops::formatting::FormattingConfig;
use std::process::ExitCode;

const EXIT_VIOLATIONS: u8 = 1;
const EXIT_FATAL: u8 = 2;

fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

/// Ok(true) when the command found something the caller should fail on
fn run(command: Commands) -> Result<bool> {
    match command {
        Commands::Analyze {
            path,
            format,
            output,
            config,
            pattern,
            verbose,
            max_issues,
            no_color,
        } => handle_analyze(AnalyzeConfig {
            path,
            format,
            output,
            config,
            patterns: pattern,
            verbose,
            max_issues,
            formatting_config: FormattingConfig::from_env().with_no_color(no_color),
        }),
        Commands::Learn {
            path,
            output,
            report,
        } => handle_learn(LearnConfig {
            path,
            output,
            report,
        })
        .map(|_| false),
        Commands::Migrate {
            path,
            config,
            dry_run,
            rollback,
            pattern,
            yes,
        } => handle_migrate(MigrateConfig {
            path,
            config,
            dry_run,
            rollback,
            patterns: pattern,
            yes,
        })
        .map(|_| false),
        Commands::Detect { path, format } => {
            handle_detect(DetectConfig { path, format }).map(|_| false)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbosity);

    match run(cli.command) {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::from(EXIT_VIOLATIONS),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}
