//! Linter nodes and their composition into a runnable definition.
//!
//! Nothing here touches the filesystem. Constructors validate patterns and
//! validator chains up front so that a built `LinterDefinition` can only fail
//! a run through lint findings.

use crate::error::ConfigError;
use crate::lint::LintOptions;
use crate::selector::{Selector, TargetKind};
use crate::validators::{check_chain, ArtifactKind, Validator};

#[derive(Debug, Clone)]
/// A selector plus the ordered validator chain applied to each target.
pub struct LinterNode {
    selector: Selector,
    validators: Vec<Validator>,
    optional: bool,
    min_matches: Option<usize>,
    max_matches: Option<usize>,
    children: Vec<Lintable>,
}

#[derive(Debug, Clone)]
/// Anything `define_linter` accepts: a node or a nested definition.
pub enum Lintable {
    Node(LinterNode),
    Group(LinterDefinition),
}

impl From<LinterNode> for Lintable {
    fn from(node: LinterNode) -> Self {
        Lintable::Node(node)
    }
}

impl From<LinterDefinition> for Lintable {
    fn from(def: LinterDefinition) -> Self {
        Lintable::Group(def)
    }
}

#[derive(Debug, Clone, Default)]
/// Top-level runnable linter. Immutable once built; `run` may be called
/// any number of times against different roots.
pub struct LinterDefinition {
    children: Vec<Lintable>,
    options: LintOptions,
}

impl LinterDefinition {
    /// Set run-wide options. Only the options of the definition that is
    /// actually run take effect; a definition nested through
    /// `define_linter` contributes its nodes but not its options.
    pub fn with_options(mut self, options: LintOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &LintOptions {
        &self.options
    }

    pub fn children(&self) -> &[Lintable] {
        &self.children
    }

    /// Nodes in execution order, with nested definitions inlined.
    pub fn flatten(&self) -> Vec<&LinterNode> {
        let mut out = Vec::new();
        flatten_into(&self.children, &mut out);
        out
    }
}

pub(crate) fn flatten_into<'a>(children: &'a [Lintable], out: &mut Vec<&'a LinterNode>) {
    for child in children {
        match child {
            Lintable::Node(n) => out.push(n),
            Lintable::Group(g) => flatten_into(&g.children, out),
        }
    }
}

/// Assemble nodes and nested definitions into one linter.
pub fn define_linter<I, L>(children: I) -> LinterDefinition
where
    I: IntoIterator<Item = L>,
    L: Into<Lintable>,
{
    LinterDefinition {
        children: children.into_iter().map(Into::into).collect(),
        options: LintOptions::default(),
    }
}

/// A single file at a literal path.
pub fn file<V>(path: &str, validators: V) -> Result<LinterNode, ConfigError>
where
    V: IntoIterator<Item = Validator>,
{
    LinterNode::build(Selector::literal(path, TargetKind::File)?, validators)
}

/// Every file matching a glob.
pub fn files<V>(glob: &str, validators: V) -> Result<LinterNode, ConfigError>
where
    V: IntoIterator<Item = Validator>,
{
    LinterNode::build(Selector::glob(glob, TargetKind::File)?, validators)
}

/// A single directory at a literal path.
pub fn directory<V>(path: &str, validators: V) -> Result<LinterNode, ConfigError>
where
    V: IntoIterator<Item = Validator>,
{
    LinterNode::build(Selector::literal(path, TargetKind::Directory)?, validators)
}

/// Every directory matching a glob.
pub fn directories<V>(glob: &str, validators: V) -> Result<LinterNode, ConfigError>
where
    V: IntoIterator<Item = Validator>,
{
    LinterNode::build(Selector::glob(glob, TargetKind::Directory)?, validators)
}

impl LinterNode {
    fn build<V>(selector: Selector, validators: V) -> Result<Self, ConfigError>
    where
        V: IntoIterator<Item = Validator>,
    {
        let validators: Vec<Validator> = validators.into_iter().collect();
        check_chain(initial_artifact(selector.target()), &validators)?;
        Ok(LinterNode {
            selector,
            validators,
            optional: false,
            min_matches: None,
            max_matches: None,
            children: Vec::new(),
        })
    }

    /// Do not report a missing target. Only literal selectors can be missing,
    /// so this has no effect on glob nodes.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Require at least `n` glob matches.
    pub fn min_matches(mut self, n: usize) -> Result<Self, ConfigError> {
        self.require_glob("min_matches")?;
        self.min_matches = Some(n);
        self.check_limits()?;
        Ok(self)
    }

    /// Allow at most `n` glob matches.
    pub fn max_matches(mut self, n: usize) -> Result<Self, ConfigError> {
        self.require_glob("max_matches")?;
        self.max_matches = Some(n);
        self.check_limits()?;
        Ok(self)
    }

    /// Lint `children` inside every directory this node resolves to.
    pub fn with_children<I, L>(mut self, children: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = L>,
        L: Into<Lintable>,
    {
        if self.selector.target() != TargetKind::Directory {
            return Err(ConfigError::InvalidNode {
                reason: format!(
                    "'{}' selects files; only directory nodes take children",
                    self.selector.pattern()
                ),
            });
        }
        self.children.extend(children.into_iter().map(Into::into));
        Ok(self)
    }

    fn require_glob(&self, what: &str) -> Result<(), ConfigError> {
        if self.selector.is_literal() {
            return Err(ConfigError::InvalidNode {
                reason: format!(
                    "{} needs a glob selector, '{}' is a literal path",
                    what,
                    self.selector.pattern()
                ),
            });
        }
        Ok(())
    }

    fn check_limits(&self) -> Result<(), ConfigError> {
        if let (Some(min), Some(max)) = (self.min_matches, self.max_matches) {
            if min > max {
                return Err(ConfigError::InvalidNode {
                    reason: format!(
                        "'{}': min_matches ({}) exceeds max_matches ({})",
                        self.selector.pattern(),
                        min,
                        max
                    ),
                });
            }
        }
        Ok(())
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn limits(&self) -> (Option<usize>, Option<usize>) {
        (self.min_matches, self.max_matches)
    }

    pub fn children(&self) -> &[Lintable] {
        &self.children
    }
}

/// What a target of `kind` feeds into the first validator.
pub fn initial_artifact(kind: TargetKind) -> ArtifactKind {
    match kind {
        TargetKind::File => ArtifactKind::Bytes,
        TargetKind::Directory => ArtifactKind::Directory,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::SelectorKind;
    use crate::validators::{follows_schema, json_content};
    use serde_json::json;

    #[test]
    fn test_constructors_pick_selector_kind() {
        let f = file("a.json", []).unwrap();
        assert_eq!(f.selector().kind(), SelectorKind::Literal);
        assert_eq!(f.selector().target(), TargetKind::File);
        let fs = files("*.json", []).unwrap();
        assert_eq!(fs.selector().kind(), SelectorKind::Glob);
        let d = directory("src", []).unwrap();
        assert_eq!(d.selector().target(), TargetKind::Directory);
        let ds = directories("crates/*", []).unwrap();
        assert_eq!(ds.selector().kind(), SelectorKind::Glob);
        assert_eq!(ds.selector().target(), TargetKind::Directory);
    }

    #[test]
    fn test_empty_pattern_is_configuration_error() {
        assert!(matches!(file("", []), Err(ConfigError::EmptyPattern)));
        assert!(matches!(directories("", []), Err(ConfigError::EmptyPattern)));
    }

    #[test]
    fn test_patterns_outside_root_are_rejected() {
        assert!(matches!(
            files("/tmp/*.json", [json_content()]),
            Err(ConfigError::InvalidPattern { .. })
        ));
        assert!(matches!(
            file("/etc/hosts", []),
            Err(ConfigError::InvalidPattern { .. })
        ));
        assert!(matches!(
            directories("../*", []),
            Err(ConfigError::InvalidPattern { .. })
        ));
        assert!(matches!(
            directory("data/../..", []),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_empty_shell_command_rejected_at_construction() {
        assert!(matches!(
            directory("d", [Validator::ShellCommand(Vec::new())]),
            Err(ConfigError::EmptyCommand)
        ));
    }

    #[test]
    fn test_chain_checked_at_construction() {
        let schema = follows_schema(&json!({"type": "object"})).unwrap();
        assert!(matches!(
            file("a.json", [schema.clone()]),
            Err(ConfigError::ChainMismatch { .. })
        ));
        assert!(file("a.json", [json_content(), schema]).is_ok());
        assert!(matches!(
            directory("data", [json_content()]),
            Err(ConfigError::ChainMismatch { .. })
        ));
    }

    #[test]
    fn test_match_limits_need_glob_and_order() {
        assert!(file("a.json", []).unwrap().min_matches(1).is_err());
        let node = files("*.json", []).unwrap().min_matches(1).unwrap();
        assert!(node.clone().max_matches(0).is_err());
        let node = node.max_matches(3).unwrap();
        assert_eq!(node.limits(), (Some(1), Some(3)));
    }

    #[test]
    fn test_children_only_on_directories() {
        let child = files("*.json", []).unwrap();
        assert!(file("a.json", []).unwrap().with_children([child.clone()]).is_err());
        let dir = directory("data", []).unwrap().with_children([child]).unwrap();
        assert_eq!(dir.children().len(), 1);
    }

    #[test]
    fn test_nested_definitions_flatten_in_order() {
        let inner = define_linter([file("b", []).unwrap(), file("c", []).unwrap()]);
        let outer = define_linter(vec![
            Lintable::from(file("a", []).unwrap()),
            inner.into(),
            file("d", []).unwrap().into(),
        ]);
        let patterns: Vec<&str> = outer
            .flatten()
            .iter()
            .map(|n| n.selector().pattern())
            .collect();
        assert_eq!(patterns, vec!["a", "b", "c", "d"]);
    }
}
