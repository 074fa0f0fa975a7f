//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - sets up logging
//! - parses CLI arguments
//! - runs the analysis pipeline or renders the waterfall figures
//! - prints the report

use std::sync::Once;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::cli::{AnalyzeArgs, Command, Scenario, WaterfallArgs};
use crate::domain::AnalysisConfig;
use crate::error::AppError;

pub mod pipeline;

static INIT: Once = Once::new();

/// Log to stderr so the report on stdout stays clean.
///
/// `PIPELINE_LOG` takes `EnvFilter` syntax, e.g. `PIPELINE_LOG=pipeline_impact=debug`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("PIPELINE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .with(filter)
            .init();
    });
}

/// Entry point for the `pipeline-impact` binary.
pub fn run() -> Result<(), AppError> {
    init_tracing();

    // A bare run behaves like `pipeline-impact analyze`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Analyze(args) => handle_analyze(&args),
        Command::Waterfall(args) => handle_waterfall(&args),
        Command::All(args) => {
            handle_analyze(&args)?;
            if args.no_plots {
                return Ok(());
            }
            handle_waterfall(&WaterfallArgs {
                scenario: Scenario::Both,
                out_dir: args.out_dir.clone(),
            })
        }
    }
}

fn handle_analyze(args: &AnalyzeArgs) -> Result<(), AppError> {
    let config = args.to_config();
    let run = pipeline::run_analysis(&config)?;

    println!("{}", crate::report::format_banner("COMPLETE PIPELINE ANALYSIS: DiD + 2SLS + DECLINING INTENSITY"));
    print!("{}", crate::report::format_loaded("Alberta", &run.production.alberta_summary));
    print!("{}", crate::report::format_loaded("Saskatchewan", &run.production.saskatchewan_summary));
    print!("{}", crate::report::format_loaded("Rail", &run.rail.summary));
    println!("Panel: {} observations", run.panel.len());
    println!("Alberta with prices: {} months", run.two_stage.rows.len());
    println!();

    println!("{}", crate::report::format_did(&run.descriptive, &run.regression));
    println!("{}", crate::report::format_two_stage(&run.two_stage, &config));
    println!("{}", crate::report::format_emissions(&run.emissions, &config));
    println!("{}", crate::report::format_summary(&run.descriptive, &run.two_stage, &run.emissions));

    println!("Files written:");
    for path in &run.written {
        println!("  {}", path.display());
    }
    Ok(())
}

fn handle_waterfall(args: &WaterfallArgs) -> Result<(), AppError> {
    let dpi = AnalysisConfig::default().dpi;
    for kind in args.scenario.kinds() {
        let path = crate::plot::render_waterfall(&kind.scenario(), &args.out_dir, dpi)?;
        println!("Saved {}", path.display());
    }
    Ok(())
}

/// Rewrite argv so `pipeline-impact` defaults to `pipeline-impact analyze`.
///
/// Rules:
/// - `pipeline-impact`                     -> `pipeline-impact analyze`
/// - `pipeline-impact --data-dir d ...`    -> `pipeline-impact analyze --data-dir d ...`
/// - `pipeline-impact --help/--version/-h` -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("analyze".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "analyze" | "waterfall" | "all");
    if is_subcommand {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "analyze".to_string());
        return argv;
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_run_becomes_analyze() {
        assert_eq!(rewrite_args(argv(&["pipeline-impact"])), argv(&["pipeline-impact", "analyze"]));
    }

    #[test]
    fn leading_flags_go_to_analyze() {
        assert_eq!(
            rewrite_args(argv(&["pipeline-impact", "--no-plots"])),
            argv(&["pipeline-impact", "analyze", "--no-plots"])
        );
    }

    #[test]
    fn subcommands_and_help_pass_through() {
        for args in [
            argv(&["pipeline-impact", "waterfall", "--scenario", "both"]),
            argv(&["pipeline-impact", "all"]),
            argv(&["pipeline-impact", "--help"]),
            argv(&["pipeline-impact", "-V"]),
        ] {
            assert_eq!(rewrite_args(args.clone()), args);
        }
    }

    #[test]
    fn rewritten_bare_run_parses() {
        let cli = crate::cli::Cli::parse_from(rewrite_args(argv(&["pipeline-impact"])));
        assert!(matches!(cli.command, Command::Analyze(_)));
    }
}
