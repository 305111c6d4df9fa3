//! Configuration discovery and effective settings resolution.
//!
//! Flint reads `flint.toml|yaml|yml` from the lint root (or closest
//! ancestor) and merges it with CLI flags to produce an `Effective` config.
//! Defaults:
//! - `output`: `human`
//! - `strict_directory_contents`: false
//! - `flag_empty_globs`: false
//! - `parallel`: true
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::error::ConfigError;
use crate::lint::LintOptions;
use crate::models::definition::{DefinitionBuilder, NodeSpec};
use crate::node::LinterDefinition;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const CONFIG_NAMES: [&str; 3] = ["flint.toml", "flint.yaml", "flint.yml"];

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `flint.toml|yaml`.
pub struct FlintConfig {
    pub output: Option<String>,
    pub strict_directory_contents: Option<bool>,
    pub flag_empty_globs: Option<bool>,
    pub parallel: Option<bool>,
    #[serde(default)]
    pub lint: Vec<NodeSpec>,
}

/// Values supplied on the command line; `None` defers to the config file.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub root: Option<String>,
    pub config: Option<String>,
    pub output: Option<String>,
    pub strict: Option<bool>,
    pub flag_empty_globs: Option<bool>,
    pub parallel: Option<bool>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub root: PathBuf,
    pub config_path: Option<PathBuf>,
    pub output: String,
    pub options: LintOptions,
    pub nodes: Vec<NodeSpec>,
}

impl Effective {
    /// Build the linter declared in the config file.
    pub fn build_linter(&self) -> Result<LinterDefinition, ConfigError> {
        let base = self
            .config_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        DefinitionBuilder::new(base).build(&self.nodes, self.options)
    }
}

/// Walk upward from `start` to detect the lint root.
///
/// Stops when a `flint.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_NAMES.iter().any(|n| cur.join(n).exists()) || cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// First config file present in `root`, TOML preferred.
pub fn find_config(root: &Path) -> Option<PathBuf> {
    CONFIG_NAMES
        .iter()
        .map(|n| root.join(n))
        .find(|p| p.is_file())
}

/// Parse a config file; YAML by extension, TOML otherwise.
pub fn load_config_file(path: &Path) -> Result<FlintConfig, ConfigError> {
    let parse_err = |reason: String| ConfigError::ConfigParse {
        path: path.to_path_buf(),
        reason,
    };
    let s = fs::read_to_string(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&s).map_err(|e| parse_err(e.to_string())),
        _ => toml::from_str(&s).map_err(|e| parse_err(e.to_string())),
    }
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(cli: &CliOverrides) -> Result<Effective, ConfigError> {
    let start = PathBuf::from(cli.root.as_deref().unwrap_or("."));
    let root = if cli.root.is_some() {
        start
    } else {
        detect_root(&start)
    };

    let config_path = match cli.config.as_deref() {
        Some(p) => Some(PathBuf::from(p)),
        None => find_config(&root),
    };
    let cfg = match config_path.as_deref() {
        Some(p) => {
            debug!(config = %p.display(), "loading config");
            load_config_file(p)?
        }
        None => FlintConfig::default(),
    };

    let defaults = LintOptions::default();
    let options = LintOptions {
        strict_directory_contents: cli
            .strict
            .or(cfg.strict_directory_contents)
            .unwrap_or(defaults.strict_directory_contents),
        flag_empty_globs: cli
            .flag_empty_globs
            .or(cfg.flag_empty_globs)
            .unwrap_or(defaults.flag_empty_globs),
        parallel: cli.parallel.or(cfg.parallel).unwrap_or(defaults.parallel),
    };
    let output = cli
        .output
        .clone()
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());

    Ok(Effective {
        root,
        config_path,
        output,
        options,
        nodes: cfg.lint,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn at(root: &Path) -> CliOverrides {
        CliOverrides {
            root: root.to_str().map(str::to_string),
            ..CliOverrides::default()
        }
    }

    #[test]
    fn test_detect_and_load_toml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("flint.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
output = "json"
strict_directory_contents = true

[[lint]]
file = "config.json"
validators = [{ kind = "json_content" }]
    "#
        )
        .unwrap();

        let eff = resolve_effective(&at(root)).unwrap();
        assert_eq!(eff.output, "json");
        assert!(eff.options.strict_directory_contents);
        assert!(eff.options.parallel);
        assert_eq!(eff.nodes.len(), 1);
        assert_eq!(eff.config_path, Some(root.join("flint.toml")));
    }

    #[test]
    fn test_load_yaml_and_defaults() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("flint.yaml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
lint:
  - files: "*.json"
    validators:
      - kind: json_content
            "#
        )
        .unwrap();

        let eff = resolve_effective(&at(root)).unwrap();
        assert_eq!(eff.output, "human");
        assert!(!eff.options.strict_directory_contents);
        assert!(!eff.options.flag_empty_globs);
        assert_eq!(eff.nodes[0].files.as_deref(), Some("*.json"));
    }

    #[test]
    fn test_cli_overrides_config() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("flint.toml"),
            "output = \"json\"\nstrict_directory_contents = true\nparallel = false\n",
        )
        .unwrap();
        let cli = CliOverrides {
            output: Some("human".into()),
            strict: Some(false),
            ..at(root)
        };
        let eff = resolve_effective(&cli).unwrap();
        assert_eq!(eff.output, "human");
        assert!(!eff.options.strict_directory_contents);
        assert!(!eff.options.parallel);
    }

    #[test]
    fn test_detect_root_walks_upward() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("flint.toml"), "").unwrap();
        let nested = root.join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(detect_root(&nested), root.to_path_buf());
    }

    #[test]
    fn test_malformed_config_is_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("flint.toml"), "[[lint]]\nkind = 3\n").unwrap();
        let err = resolve_effective(&at(dir.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigParse { .. }));
    }

    #[test]
    fn test_build_and_run_from_config() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("schemas")).unwrap();
        fs::write(
            root.join("schemas/menu.schema"),
            include_str!("../fixtures/menu.schema"),
        )
        .unwrap();
        fs::write(
            root.join("flint.toml"),
            r#"
[[lint]]
file = "menu.json"
validators = [
  { kind = "json_content" },
  { kind = "follows_schema", schema = "schemas/menu.schema" },
]
"#,
        )
        .unwrap();
        fs::write(root.join("menu.json"), r#"{"menu":{"header":"H","items":[],"extra":1}}"#)
            .unwrap();

        let eff = resolve_effective(&at(root)).unwrap();
        let report = eff.build_linter().unwrap().run(&eff.root);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].violation.location, "/menu/extra");
    }
}
