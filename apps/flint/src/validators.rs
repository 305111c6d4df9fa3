//! Content validators and the artifacts they pass along a chain.
//!
//! Each validator declares which artifact kind it accepts and which it
//! produces. Chains are checked when a node is built, so a `follows_schema`
//! that is not preceded by `json_content` is a configuration error rather
//! than a run-time surprise.

use crate::error::ConfigError;
use crate::models::{TextPosition, Violation, ViolationKind};
use crate::schema::Schema;
use serde_json::Value as Json;
use std::fmt;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Tag of the value flowing between validators.
pub enum ArtifactKind {
    Bytes,
    Document,
    Directory,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Bytes => f.write_str("file bytes"),
            ArtifactKind::Document => f.write_str("a parsed document"),
            ArtifactKind::Directory => f.write_str("a directory"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    Bytes(Vec<u8>),
    Document(Json),
    Directory,
}

impl Artifact {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Artifact::Bytes(_) => ArtifactKind::Bytes,
            Artifact::Document(_) => ArtifactKind::Document,
            Artifact::Directory => ArtifactKind::Directory,
        }
    }
}

/// Result of one validator: the artifact for the next step, or the
/// violations that end this target's chain.
pub type Outcome = Result<Artifact, Vec<Violation>>;

#[derive(Debug, Clone)]
pub enum Validator {
    /// Parse file bytes as JSON.
    JsonContent,
    /// Check a parsed document against a schema.
    FollowsSchema(Arc<Schema>),
    /// Run an external command; `%s` in any argument becomes the target path.
    ShellCommand(Vec<String>),
}

impl Validator {
    pub fn name(&self) -> &'static str {
        match self {
            Validator::JsonContent => "json_content",
            Validator::FollowsSchema(_) => "follows_schema",
            Validator::ShellCommand(_) => "shell_command",
        }
    }

    pub fn accepts(&self, kind: ArtifactKind) -> bool {
        match self {
            Validator::JsonContent => kind == ArtifactKind::Bytes,
            Validator::FollowsSchema(_) => kind == ArtifactKind::Document,
            Validator::ShellCommand(_) => {
                matches!(kind, ArtifactKind::Bytes | ArtifactKind::Directory)
            }
        }
    }

    /// Artifact kind handed to the next validator, given the accepted input.
    pub fn produces(&self, input: ArtifactKind) -> ArtifactKind {
        match self {
            Validator::JsonContent => ArtifactKind::Document,
            Validator::FollowsSchema(_) | Validator::ShellCommand(_) => input,
        }
    }

    fn expects(&self) -> &'static str {
        match self {
            Validator::JsonContent => "file bytes",
            Validator::FollowsSchema(_) => "a parsed document (add json_content first)",
            Validator::ShellCommand(_) => "a file or a directory",
        }
    }

    pub(crate) fn validate(&self, target: &Path, artifact: Artifact) -> Outcome {
        match (self, artifact) {
            (Validator::JsonContent, Artifact::Bytes(bytes)) => parse_json(&bytes),
            (Validator::FollowsSchema(schema), Artifact::Document(doc)) => {
                let found = schema.check(&doc, "");
                if found.is_empty() {
                    Ok(Artifact::Document(doc))
                } else {
                    Err(found)
                }
            }
            (Validator::ShellCommand(argv), artifact) => {
                run_command(argv, target)?;
                Ok(artifact)
            }
            (v, a) => Err(vec![Violation::whole(
                ViolationKind::TypeMismatch,
                format!("{} cannot check {}", v.name(), a.kind()),
            )]),
        }
    }
}

/// Verify that every validator accepts what its predecessor produces.
pub fn check_chain(initial: ArtifactKind, validators: &[Validator]) -> Result<(), ConfigError> {
    let mut current = initial;
    for v in validators {
        if let Validator::ShellCommand(argv) = v {
            if argv.first().map_or(true, |p| p.is_empty()) {
                return Err(ConfigError::EmptyCommand);
            }
        }
        if !v.accepts(current) {
            return Err(ConfigError::ChainMismatch {
                validator: v.name(),
                expected: v.expects().to_string(),
                found: current,
            });
        }
        current = v.produces(current);
    }
    Ok(())
}

fn parse_json(bytes: &[u8]) -> Outcome {
    match serde_json::from_slice::<Json>(bytes) {
        Ok(doc) => Ok(Artifact::Document(doc)),
        Err(e) => {
            let mut v = Violation::whole(ViolationKind::InvalidJson, e.to_string());
            if e.line() > 0 {
                v = v.at_position(TextPosition {
                    line: e.line(),
                    column: e.column(),
                });
            }
            Err(vec![v])
        }
    }
}

fn run_command(argv: &[String], target: &Path) -> Result<(), Vec<Violation>> {
    let target = target.to_string_lossy();
    let args: Vec<String> = argv.iter().map(|a| a.replace("%s", &target)).collect();
    let shown = args.join(" ");
    let Some((program, rest)) = args.split_first() else {
        return Err(vec![Violation::whole(
            ViolationKind::CommandFailed,
            "shell command names no program".to_string(),
        )]);
    };
    let output = Command::new(program).args(rest).output();
    match output {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let code = out
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            Err(vec![Violation::whole(
                ViolationKind::CommandFailed,
                format!(
                    "non-zero return code ({}) returned from '{}'. Output: {}",
                    code,
                    shown,
                    String::from_utf8_lossy(&out.stderr).trim_end()
                ),
            )])
        }
        Err(e) => Err(vec![Violation::whole(
            ViolationKind::CommandFailed,
            format!("error running '{}': {}", shown, e),
        )]),
    }
}

/// Parse file bytes as JSON, producing a document for later validators.
pub fn json_content() -> Validator {
    Validator::JsonContent
}

/// Validate a parsed document against a JSON-Schema subset document.
pub fn follows_schema(schema: &Json) -> Result<Validator, ConfigError> {
    Ok(Validator::FollowsSchema(Arc::new(Schema::from_json(schema)?)))
}

/// Like `follows_schema`, loading the schema from a JSON or YAML file.
pub fn follows_schema_file(path: impl AsRef<Path>) -> Result<Validator, ConfigError> {
    Ok(Validator::FollowsSchema(Arc::new(Schema::from_file(
        path.as_ref(),
    )?)))
}

/// Run an external command against each target.
pub fn shell_command<I, S>(argv: I) -> Result<Validator, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
    if argv.first().map_or(true, |p| p.is_empty()) {
        return Err(ConfigError::EmptyCommand);
    }
    Ok(Validator::ShellCommand(argv))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Json {
        json!({"type": "object", "required": ["name"]})
    }

    #[test]
    fn test_json_content_parses_bytes() {
        let out = json_content()
            .validate(Path::new("a.json"), Artifact::Bytes(br#"{"a": 1}"#.to_vec()))
            .unwrap();
        assert_eq!(out, Artifact::Document(json!({"a": 1})));
    }

    #[test]
    fn test_json_content_reports_position() {
        let err = json_content()
            .validate(Path::new("a.json"), Artifact::Bytes(b"{\n  \"a\": }".to_vec()))
            .unwrap_err();
        assert_eq!(err.len(), 1);
        assert_eq!(err[0].kind, ViolationKind::InvalidJson);
        assert_eq!(err[0].position.map(|p| p.line), Some(2));
    }

    #[test]
    fn test_follows_schema_passes_document_through() {
        let v = follows_schema(&schema()).unwrap();
        let doc = json!({"name": "x"});
        let out = v
            .validate(Path::new("a.json"), Artifact::Document(doc.clone()))
            .unwrap();
        assert_eq!(out, Artifact::Document(doc));

        let err = v
            .validate(Path::new("a.json"), Artifact::Document(json!({})))
            .unwrap_err();
        assert_eq!(err[0].kind, ViolationKind::MissingRequiredProperty);
        assert_eq!(err[0].location, "/name");
    }

    #[test]
    fn test_follows_schema_rejects_malformed_schema() {
        assert!(matches!(
            follows_schema(&json!({"type": 7})),
            Err(ConfigError::MalformedSchema { .. })
        ));
    }

    #[test]
    fn test_chain_requires_document_before_schema() {
        let chain = [follows_schema(&schema()).unwrap()];
        let err = check_chain(ArtifactKind::Bytes, &chain).unwrap_err();
        match err {
            ConfigError::ChainMismatch {
                validator, found, ..
            } => {
                assert_eq!(validator, "follows_schema");
                assert_eq!(found, ArtifactKind::Bytes);
            }
            other => panic!("unexpected error: {other}"),
        }
        let ok = [json_content(), follows_schema(&schema()).unwrap()];
        assert!(check_chain(ArtifactKind::Bytes, &ok).is_ok());
    }

    #[test]
    fn test_chain_rejects_json_on_directory() {
        let err = check_chain(ArtifactKind::Directory, &[json_content()]).unwrap_err();
        assert!(matches!(err, ConfigError::ChainMismatch { .. }));
        let cmd = shell_command(["true"]).unwrap();
        assert!(check_chain(ArtifactKind::Directory, &[cmd]).is_ok());
    }

    #[test]
    fn test_shell_command_requires_program() {
        assert!(matches!(
            shell_command(Vec::<String>::new()),
            Err(ConfigError::EmptyCommand)
        ));
        assert!(matches!(shell_command([""]), Err(ConfigError::EmptyCommand)));
    }

    #[test]
    fn test_chain_rejects_hand_built_empty_command() {
        let bare = Validator::ShellCommand(Vec::new());
        assert!(matches!(
            check_chain(ArtifactKind::Directory, &[bare.clone()]),
            Err(ConfigError::EmptyCommand)
        ));
        let err = bare
            .validate(Path::new("."), Artifact::Directory)
            .unwrap_err();
        assert_eq!(err[0].kind, ViolationKind::CommandFailed);
    }

    #[test]
    fn test_mismatched_artifact_is_reported_not_fatal() {
        let err = json_content()
            .validate(Path::new("data"), Artifact::Directory)
            .unwrap_err();
        assert_eq!(err[0].kind, ViolationKind::TypeMismatch);
        assert_eq!(err[0].message, "json_content cannot check a directory");
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_command_reports_failure() {
        let ok = shell_command(["test", "-f", "%s"]).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("x.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(ok.validate(&file, Artifact::Bytes(Vec::new())).is_ok());

        let missing = dir.path().join("missing.txt");
        let err = ok
            .validate(&missing, Artifact::Bytes(Vec::new()))
            .unwrap_err();
        assert_eq!(err[0].kind, ViolationKind::CommandFailed);
        assert!(err[0].message.contains("missing.txt"));
    }

    #[test]
    fn test_shell_command_spawn_failure() {
        let v = shell_command(["flint-no-such-program-xyz"]).unwrap();
        let err = v
            .validate(Path::new("."), Artifact::Directory)
            .unwrap_err();
        assert_eq!(err[0].kind, ViolationKind::CommandFailed);
        assert!(err[0].message.starts_with("error running"));
    }
}
