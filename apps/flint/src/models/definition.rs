//! Declarative linter definition as written in `flint.toml|yaml`.
//!
//! Each `[[lint]]` entry names exactly one of `file`, `files`, `directory`
//! or `directories`, plus optional validators and nested `children`:
//!
//! ```toml
//! [[lint]]
//! directory = "sample_data"
//! children = [
//!   { files = "*.json", validators = [
//!       { kind = "json_content" },
//!       { kind = "follows_schema", schema = "json_schemas/menu.schema" },
//!   ] },
//! ]
//! ```
//!
//! Schema paths are resolved against the directory holding the config file.

use crate::error::ConfigError;
use crate::lint::LintOptions;
use crate::node::{self, define_linter, Lintable, LinterDefinition, LinterNode};
use crate::schema::Schema;
use crate::validators::{json_content, shell_command, Validator};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
/// One node entry; exactly one selector field must be set.
pub struct NodeSpec {
    pub file: Option<String>,
    pub files: Option<String>,
    pub directory: Option<String>,
    pub directories: Option<String>,
    /// Only meaningful for `file`/`directory`.
    #[serde(default)]
    pub optional: bool,
    pub min_matches: Option<usize>,
    pub max_matches: Option<usize>,
    #[serde(default)]
    pub validators: Vec<ValidatorSpec>,
    #[serde(default)]
    pub children: Vec<NodeSpec>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidatorSpec {
    JsonContent,
    FollowsSchema { schema: String },
    ShellCommand { command: Vec<String> },
}

/// Builds `LinterDefinition`s from specs, loading each schema file once.
pub struct DefinitionBuilder {
    base_dir: PathBuf,
    schema_cache: HashMap<PathBuf, Arc<Schema>>,
}

impl DefinitionBuilder {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        DefinitionBuilder {
            base_dir: base_dir.into(),
            schema_cache: HashMap::new(),
        }
    }

    pub fn build(
        &mut self,
        specs: &[NodeSpec],
        options: LintOptions,
    ) -> Result<LinterDefinition, ConfigError> {
        let nodes = specs
            .iter()
            .map(|s| self.node(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(define_linter(nodes).with_options(options))
    }

    fn node(&mut self, spec: &NodeSpec) -> Result<LinterNode, ConfigError> {
        let validators = spec
            .validators
            .iter()
            .map(|v| self.validator(v))
            .collect::<Result<Vec<_>, _>>()?;

        let selectors = [
            spec.file.as_deref().map(|p| ("file", p)),
            spec.files.as_deref().map(|p| ("files", p)),
            spec.directory.as_deref().map(|p| ("directory", p)),
            spec.directories.as_deref().map(|p| ("directories", p)),
        ];
        let mut chosen = selectors.into_iter().flatten();
        let (which, pattern) = chosen.next().ok_or_else(|| ConfigError::InvalidNode {
            reason: "entry needs one of file, files, directory or directories".into(),
        })?;
        if let Some((other, _)) = chosen.next() {
            return Err(ConfigError::InvalidNode {
                reason: format!("entry sets both '{}' and '{}'", which, other),
            });
        }

        let mut built = match which {
            "file" => node::file(pattern, validators)?,
            "files" => node::files(pattern, validators)?,
            "directory" => node::directory(pattern, validators)?,
            _ => node::directories(pattern, validators)?,
        };
        if spec.optional {
            built = built.optional();
        }
        if let Some(n) = spec.min_matches {
            built = built.min_matches(n)?;
        }
        if let Some(n) = spec.max_matches {
            built = built.max_matches(n)?;
        }
        if !spec.children.is_empty() {
            let children = spec
                .children
                .iter()
                .map(|c| self.node(c).map(Lintable::from))
                .collect::<Result<Vec<_>, _>>()?;
            built = built.with_children(children)?;
        }
        Ok(built)
    }

    fn validator(&mut self, spec: &ValidatorSpec) -> Result<Validator, ConfigError> {
        match spec {
            ValidatorSpec::JsonContent => Ok(json_content()),
            ValidatorSpec::FollowsSchema { schema } => {
                Ok(Validator::FollowsSchema(self.schema(Path::new(schema))?))
            }
            ValidatorSpec::ShellCommand { command } => shell_command(command.iter().cloned()),
        }
    }

    fn schema(&mut self, rel: &Path) -> Result<Arc<Schema>, ConfigError> {
        let path = self.base_dir.join(rel);
        if let Some(s) = self.schema_cache.get(&path) {
            return Ok(Arc::clone(s));
        }
        let schema = Arc::new(Schema::from_file(&path)?);
        self.schema_cache.insert(path, Arc::clone(&schema));
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn parse(toml_src: &str) -> Vec<NodeSpec> {
        #[derive(Deserialize)]
        struct Doc {
            lint: Vec<NodeSpec>,
        }
        toml::from_str::<Doc>(toml_src).unwrap().lint
    }

    #[test]
    fn test_build_nested_definition() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("schemas")).unwrap();
        fs::write(
            root.join("schemas/menu.schema"),
            include_str!("../../fixtures/menu.schema"),
        )
        .unwrap();
        let specs = parse(
            r#"
[[lint]]
directory = "sample_data"
children = [
  { files = "*.json", validators = [
      { kind = "json_content" },
      { kind = "follows_schema", schema = "schemas/menu.schema" },
  ] },
]

[[lint]]
directories = "sample_data/subdir_*"
min_matches = 1
max_matches = 3

[[lint]]
file = "optional.txt"
optional = true
"#,
        );
        let def = DefinitionBuilder::new(root)
            .build(&specs, LintOptions::default())
            .unwrap();
        let nodes = def.flatten();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].children().len(), 1);
        assert_eq!(nodes[1].limits(), (Some(1), Some(3)));
        assert!(nodes[2].is_optional());
    }

    #[test]
    fn test_schema_file_loaded_once() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("s.json"), r#"{"type": "object"}"#).unwrap();
        let specs = parse(
            r#"
[[lint]]
file = "a.json"
validators = [{ kind = "json_content" }, { kind = "follows_schema", schema = "s.json" }]

[[lint]]
file = "b.json"
validators = [{ kind = "json_content" }, { kind = "follows_schema", schema = "s.json" }]
"#,
        );
        let def = DefinitionBuilder::new(dir.path())
            .build(&specs, LintOptions::default())
            .unwrap();
        let nodes = def.flatten();
        match (&nodes[0].validators()[1], &nodes[1].validators()[1]) {
            (Validator::FollowsSchema(a), Validator::FollowsSchema(b)) => {
                assert!(Arc::ptr_eq(a, b))
            }
            other => panic!("unexpected validators: {other:?}"),
        }
    }

    #[test]
    fn test_entry_needs_exactly_one_selector() {
        let none = parse("[[lint]]\noptional = true\n");
        let both = parse("[[lint]]\nfile = \"a\"\nfiles = \"*.b\"\n");
        let mut builder = DefinitionBuilder::new(".");
        assert!(matches!(
            builder.build(&none, LintOptions::default()),
            Err(ConfigError::InvalidNode { .. })
        ));
        assert!(matches!(
            builder.build(&both, LintOptions::default()),
            Err(ConfigError::InvalidNode { .. })
        ));
    }

    #[test]
    fn test_bad_chain_in_file_is_configuration_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("s.json"), "{}").unwrap();
        let specs = parse(
            "[[lint]]\nfile = \"a.json\"\nvalidators = [{ kind = \"follows_schema\", schema = \"s.json\" }]\n",
        );
        let err = DefinitionBuilder::new(dir.path())
            .build(&specs, LintOptions::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::ChainMismatch { .. }));
    }

    #[test]
    fn test_missing_schema_file() {
        let specs = parse(
            "[[lint]]\nfile = \"a.json\"\nvalidators = [{ kind = \"json_content\" }, { kind = \"follows_schema\", schema = \"nope.json\" }]\n",
        );
        let dir = tempdir().unwrap();
        let err = DefinitionBuilder::new(dir.path())
            .build(&specs, LintOptions::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::SchemaLoad { .. }));
    }
}
