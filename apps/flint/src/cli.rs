//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "flint",
    version,
    about = "Flint — declarative file and directory linter",
    long_about = "Flint checks that the files and directories a project declares exist and that their content is well formed (valid JSON, conforming to a JSON Schema).\n\nConfiguration precedence: CLI > flint.toml > defaults.",
    after_help = "Examples:\n  flint lint\n  flint lint --root example_dir --output json\n  flint lint --config ci/flint.toml --strict",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current flint version.")]
    Version,
    /// Lint a directory tree against the configured definition
    #[command(
        about = "Run lint checks",
        long_about = "Resolve every [[lint]] entry from flint.toml against the root and report violations. Exits 1 when any violation is found, 2 on configuration errors.",
        after_help = "Examples:\n  flint lint --root .\n  flint lint --output json"
    )]
    Lint {
        #[arg(long, help = "Directory to lint (default: detected from current dir)")]
        root: Option<String>,
        #[arg(long, help = "Path to flint.toml|yaml (default: discovered in root)")]
        config: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Report root entries no entry lints")]
        strict: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Report globs that match nothing")]
        flag_empty_globs: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Validate targets sequentially")]
        no_parallel: bool,
    },
}
