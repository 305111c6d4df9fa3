//! Flint core library.
//!
//! Flint is a declarative linter for project layouts: callers describe, as a
//! tree of nodes, which files and directories must exist and what their
//! content must look like, then run that tree against a directory to get a
//! report of every violation.
//!
//! ```no_run
//! use flint::{define_linter, directory, file, files, follows_schema_file, json_content};
//!
//! # fn main() -> Result<(), flint::ConfigError> {
//! let linter = define_linter([
//!     file("requirements.txt", [])?,
//!     directory("sample_data", [])?.with_children([files(
//!         "*.json",
//!         [json_content(), follows_schema_file("json_schemas/menu.schema")?],
//!     )?])?,
//! ]);
//! let report = linter.run("example_dir");
//! assert!(report.passed);
//! # Ok(())
//! # }
//! ```
//!
//! High-level modules:
//! - `node`: Linter node constructors and `define_linter` composition.
//! - `selector`: Literal/glob selector resolution.
//! - `validators`: `json_content`, `follows_schema`, `shell_command`.
//! - `schema`: JSON-Schema subset parsing and matching.
//! - `lint`: Execution engine producing a `Report`.
//! - `models`: Violation/report types and the declarative definition file.
//! - `config`: Discovery and effective configuration resolution.
//! - `output`: Human/JSON printers.
//! - `cli`: CLI argument parsing (binary uses this).
pub mod cli;
pub mod config;
pub mod error;
pub mod lint;
pub mod models;
pub mod node;
pub mod output;
pub mod schema;
pub mod selector;
pub mod validators;

pub use error::ConfigError;
pub use lint::LintOptions;
pub use models::{Finding, Report, Summary, Violation, ViolationKind};
pub use node::{
    define_linter, directories, directory, file, files, Lintable, LinterDefinition, LinterNode,
};
pub use schema::Schema;
pub use validators::{follows_schema, follows_schema_file, json_content, shell_command, Validator};
