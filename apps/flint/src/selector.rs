//! Selector resolution: turns a literal path or glob into concrete targets.
//!
//! Resolution is deferred to run time; constructing a `Selector` only checks
//! that the pattern is usable. Literal selectors always resolve to exactly
//! one path, whether or not it exists. Glob selectors resolve to the sorted
//! entries below the root that match both the pattern and the target kind.

use crate::error::ConfigError;
use glob::{glob_with, MatchOptions, Pattern};
use serde::Serialize;
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorKind {
    Literal,
    Glob,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    File,
    Directory,
}

impl TargetKind {
    /// Whether `path` currently exists as this kind of entry.
    pub fn matches(self, path: &Path) -> bool {
        match self {
            TargetKind::File => path.is_file(),
            TargetKind::Directory => path.is_dir(),
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::File => f.write_str("file"),
            TargetKind::Directory => f.write_str("directory"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Which filesystem path(s) a linter node targets.
pub struct Selector {
    kind: SelectorKind,
    pattern: String,
    target: TargetKind,
}

/// Output of resolving a glob: matched paths plus entries the walker could
/// not read.
#[derive(Debug, Default)]
pub struct Resolved {
    pub paths: Vec<PathBuf>,
    pub errors: Vec<(PathBuf, io::Error)>,
}

/// Patterns are resolved under the run root; anything that could leave it
/// is refused.
fn check_relative(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::EmptyPattern);
    }
    let path = Path::new(pattern);
    let escapes = path.is_absolute()
        || path.components().any(|c| {
            matches!(
                c,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
    if escapes {
        return Err(ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: "pattern must be relative and stay under the root".to_string(),
        });
    }
    Ok(())
}

impl Selector {
    pub fn literal(pattern: &str, target: TargetKind) -> Result<Self, ConfigError> {
        check_relative(pattern)?;
        Ok(Selector {
            kind: SelectorKind::Literal,
            pattern: pattern.to_string(),
            target,
        })
    }

    pub fn glob(pattern: &str, target: TargetKind) -> Result<Self, ConfigError> {
        check_relative(pattern)?;
        Pattern::new(pattern).map_err(|e| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.msg.to_string(),
        })?;
        Ok(Selector {
            kind: SelectorKind::Glob,
            pattern: pattern.to_string(),
            target,
        })
    }

    pub fn kind(&self) -> SelectorKind {
        self.kind
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn target(&self) -> TargetKind {
        self.target
    }

    pub fn is_literal(&self) -> bool {
        self.kind == SelectorKind::Literal
    }

    /// Resolve against `root`.
    ///
    /// Never fails for "no matches"; unreadable entries met while walking are
    /// returned in `Resolved::errors` so the caller can report them.
    pub fn resolve(&self, root: &Path) -> Resolved {
        match self.kind {
            SelectorKind::Literal => Resolved {
                paths: vec![root.join(&self.pattern)],
                errors: Vec::new(),
            },
            SelectorKind::Glob => list_entries(root, &self.pattern, self.target),
        }
    }
}

/// Walk `root` for entries matching `pattern` and `kind`.
///
/// Matches are sorted by `Path` ordering, which compares component by
/// component: `a/x.json` comes before `a-b/x.json` even though a plain
/// string sort would put them the other way round.
pub fn list_entries(root: &Path, pattern: &str, kind: TargetKind) -> Resolved {
    // Escape the root so metacharacters in directory names match literally.
    let escaped_root = Pattern::escape(&root.to_string_lossy());
    let full = Path::new(&escaped_root).join(pattern);
    let full = full.to_string_lossy();
    let mut out = Resolved::default();
    let entries = match glob_with(&full, MatchOptions::new()) {
        Ok(entries) => entries,
        // Patterns are checked at construction; a failure here means the
        // joined root produced something glob cannot parse.
        Err(e) => {
            out.errors.push((
                root.to_path_buf(),
                io::Error::new(io::ErrorKind::InvalidInput, e.msg),
            ));
            return out;
        }
    };
    for entry in entries {
        match entry {
            Ok(p) => {
                if kind.matches(&p) {
                    out.paths.push(p);
                }
            }
            Err(e) => {
                let path = e.path().to_path_buf();
                out.errors.push((path, e.into_error()));
            }
        }
    }
    out.paths.sort();
    out
}
