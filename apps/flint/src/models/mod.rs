//! Shared data models for lint outputs and the declarative definition file.

pub mod definition;

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
/// Category of a lint finding.
pub enum ViolationKind {
    MissingTarget,
    InvalidJson,
    TypeMismatch,
    MissingRequiredProperty,
    DisallowedProperty,
    IoError,
    MatchCount,
    UnexpectedEntry,
    CommandFailed,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ViolationKind::MissingTarget => "missing-target",
            ViolationKind::InvalidJson => "invalid-json",
            ViolationKind::TypeMismatch => "type-mismatch",
            ViolationKind::MissingRequiredProperty => "missing-required",
            ViolationKind::DisallowedProperty => "disallowed-property",
            ViolationKind::IoError => "io-error",
            ViolationKind::MatchCount => "match-count",
            ViolationKind::UnexpectedEntry => "unexpected-entry",
            ViolationKind::CommandFailed => "command-failed",
        };
        f.write_str(s)
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
/// 1-based line/column reported by the JSON parser.
pub struct TextPosition {
    pub line: usize,
    pub column: usize,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
/// A single lint finding with its JSON-pointer location.
///
/// `location` is empty for findings about the target as a whole.
pub struct Violation {
    pub location: String,
    pub message: String,
    pub kind: ViolationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<TextPosition>,
}

impl Violation {
    pub fn new(kind: ViolationKind, location: impl Into<String>, message: impl Into<String>) -> Self {
        Violation {
            location: location.into(),
            message: message.into(),
            kind,
            position: None,
        }
    }

    /// Finding about the target itself rather than a location inside it.
    pub fn whole(kind: ViolationKind, message: impl Into<String>) -> Self {
        Violation::new(kind, "", message)
    }

    pub fn at_position(mut self, position: TextPosition) -> Self {
        self.position = Some(position);
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.location.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.location, self.message)
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
/// A violation tagged with the filesystem target it was found on.
pub struct Finding {
    pub target: PathBuf,
    #[serde(flatten)]
    pub violation: Violation,
}

#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Aggregated run summary used by printers.
pub struct Summary {
    pub violations: usize,
    pub files: usize,
    pub directories: usize,
}

#[derive(Serialize, Debug, Clone)]
/// Result of one `run`: pass/fail plus the ordered findings.
pub struct Report {
    pub passed: bool,
    pub violations: Vec<Finding>,
    pub summary: Summary,
}

impl Report {
    pub(crate) fn new(violations: Vec<Finding>, files: usize, directories: usize) -> Self {
        Report {
            passed: violations.is_empty(),
            summary: Summary {
                violations: violations.len(),
                files,
                directories,
            },
            violations,
        }
    }

    /// Findings of one kind, in report order.
    pub fn of_kind(&self, kind: ViolationKind) -> impl Iterator<Item = &Finding> {
        self.violations
            .iter()
            .filter(move |f| f.violation.kind == kind)
    }

    /// Findings attributed to `target`, in report order.
    pub fn for_target<'a>(&'a self, target: &'a Path) -> impl Iterator<Item = &'a Finding> {
        self.violations.iter().filter(move |f| f.target == target)
    }
}
