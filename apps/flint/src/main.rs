//! Flint CLI binary entry point.
//! Resolves configuration, runs the declared linter and prints the report.

use clap::Parser;
use flint::cli::{Cli, Commands};
use flint::config::{self, CliOverrides};
use flint::output;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_env("FLINT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fail_config(err: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", "error:".red().bold(), err);
    std::process::exit(2);
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Lint {
            root,
            config,
            output,
            strict,
            flag_empty_globs,
            no_parallel,
        } => {
            let overrides = CliOverrides {
                root,
                config,
                output,
                strict: strict.then_some(true),
                flag_empty_globs: flag_empty_globs.then_some(true),
                parallel: no_parallel.then_some(false),
            };
            let eff = config::resolve_effective(&overrides).unwrap_or_else(|e| fail_config(e));
            if eff.config_path.is_none() {
                fail_config("No flint.toml found. Pass --config or add flint.toml to the root.");
            }
            if eff.nodes.is_empty() && eff.output != "json" {
                eprintln!(
                    "{} {}",
                    "note:".blue().bold(),
                    "Config declares no [[lint]] entries."
                );
            }
            let linter = eff.build_linter().unwrap_or_else(|e| fail_config(e));
            let report = linter.run(&eff.root);
            output::print_report(&report, &eff.root, &eff.output);
            if !report.passed {
                std::process::exit(1);
            }
        }
    }
}
