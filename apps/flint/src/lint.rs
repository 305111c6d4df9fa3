//! Execution engine: resolves every node against a root and runs its
//! validator chain on each target.
//!
//! Findings are ordered by node declaration order, then by resolved path,
//! with a directory's own findings ahead of its children's. Per-target work
//! may run on the rayon pool; results are collected in input order so the
//! report is identical either way.

use crate::models::{Finding, Report, Violation, ViolationKind};
use crate::node::{flatten_into, Lintable, LinterDefinition, LinterNode};
use crate::selector::TargetKind;
use crate::validators::{Artifact, Validator};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Run-wide switches for a `LinterDefinition`.
pub struct LintOptions {
    /// Report direct entries of the root that no node linted.
    pub strict_directory_contents: bool,
    /// Report glob selectors that match nothing.
    pub flag_empty_globs: bool,
    /// Validate targets of one node on the rayon pool.
    pub parallel: bool,
}

impl Default for LintOptions {
    fn default() -> Self {
        LintOptions {
            strict_directory_contents: false,
            flag_empty_globs: false,
            parallel: true,
        }
    }
}

impl LinterDefinition {
    /// Lint `root`, collecting every finding into a fresh report.
    pub fn run(&self, root: impl AsRef<Path>) -> Report {
        run(self, root.as_ref())
    }
}

/// Findings and counters gathered for one subtree.
#[derive(Default)]
struct Tally {
    findings: Vec<Finding>,
    linted: Vec<PathBuf>,
    files: usize,
    directories: usize,
}

impl Tally {
    fn push(&mut self, target: &Path, violation: Violation) {
        self.findings.push(Finding {
            target: target.to_path_buf(),
            violation,
        });
    }

    fn merge(&mut self, other: Tally) {
        self.findings.extend(other.findings);
        self.linted.extend(other.linted);
        self.files += other.files;
        self.directories += other.directories;
    }
}

pub fn run(def: &LinterDefinition, root: &Path) -> Report {
    let opts = def.options();
    debug!(root = %root.display(), "starting lint run");
    let mut tally = Tally::default();
    lint_children(def.children(), root, opts, &mut tally);
    if opts.strict_directory_contents {
        report_unexpected(root, &mut tally);
    }
    debug!(
        violations = tally.findings.len(),
        files = tally.files,
        directories = tally.directories,
        "lint run finished"
    );
    Report::new(tally.findings, tally.files, tally.directories)
}

fn lint_children(children: &[Lintable], cwd: &Path, opts: &LintOptions, tally: &mut Tally) {
    let mut nodes = Vec::new();
    flatten_into(children, &mut nodes);
    for node in nodes {
        lint_node(node, cwd, opts, tally);
    }
}

/// Lint a single node against its targets, collecting findings.
fn lint_node(node: &LinterNode, cwd: &Path, opts: &LintOptions, tally: &mut Tally) {
    let selector = node.selector();
    let kind = selector.target();
    debug!(pattern = selector.pattern(), cwd = %cwd.display(), "resolving selector");
    let resolved = selector.resolve(cwd);

    for (path, err) in resolved.errors {
        warn!(path = %path.display(), error = %err, "could not read while resolving");
        tally.push(
            &path,
            Violation::whole(
                ViolationKind::IoError,
                format!("could not read '{}': {}", path.display(), err),
            ),
        );
    }

    let targets = resolved.paths;
    if selector.is_literal() {
        let Some(path) = targets.first() else {
            return;
        };
        let message = match fs::metadata(path) {
            Ok(meta) if is_kind(&meta, kind) => None,
            Ok(_) => Some(format!("'{}' is not a {}", selector.pattern(), kind)),
            Err(e) if is_absent(&e, path) => Some(format!(
                "required {} '{}' does not exist",
                kind,
                selector.pattern()
            )),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not stat target");
                tally.push(
                    path,
                    Violation::whole(
                        ViolationKind::IoError,
                        format!("could not read '{}': {}", path.display(), e),
                    ),
                );
                return;
            }
        };
        if let Some(message) = message {
            if !node.is_optional() {
                tally.push(path, Violation::whole(ViolationKind::MissingTarget, message));
            }
            return;
        }
    } else {
        check_match_count(node, cwd, targets.len(), opts, tally);
    }

    let per_target: Vec<Tally> = if opts.parallel && targets.len() > 1 {
        targets
            .par_iter()
            .map(|path| lint_target(node, path, opts))
            .collect()
    } else {
        targets
            .iter()
            .map(|path| lint_target(node, path, opts))
            .collect()
    };
    for t in per_target {
        tally.merge(t);
    }
}

fn is_kind(meta: &fs::Metadata, kind: TargetKind) -> bool {
    match kind {
        TargetKind::File => meta.is_file(),
        TargetKind::Directory => meta.is_dir(),
    }
}

/// A stat failure means "missing" when nothing is there, including when an
/// ancestor on the way is a plain file.
fn is_absent(err: &io::Error, path: &Path) -> bool {
    err.kind() == io::ErrorKind::NotFound || path.ancestors().skip(1).any(Path::is_file)
}

fn check_match_count(
    node: &LinterNode,
    cwd: &Path,
    count: usize,
    opts: &LintOptions,
    tally: &mut Tally,
) {
    let pattern = node.selector().pattern();
    let (min, max) = node.limits();
    if let Some(min) = min {
        if count < min {
            tally.push(
                cwd,
                Violation::whole(
                    ViolationKind::MatchCount,
                    format!(
                        "'{}' should have had at least {} matches but it only had {} matches",
                        pattern, min, count
                    ),
                ),
            );
        }
    } else if count == 0 && opts.flag_empty_globs {
        tally.push(
            cwd,
            Violation::whole(
                ViolationKind::MatchCount,
                format!("'{}' did not match any {}", pattern, node.selector().target()),
            ),
        );
    }
    if let Some(max) = max {
        if count > max {
            tally.push(
                cwd,
                Violation::whole(
                    ViolationKind::MatchCount,
                    format!(
                        "'{}' should have had at most {} matches but it had {} matches",
                        pattern, max, count
                    ),
                ),
            );
        }
    }
}

fn lint_target(node: &LinterNode, path: &Path, opts: &LintOptions) -> Tally {
    let mut tally = Tally::default();
    let kind = node.selector().target();
    tally.linted.push(path.to_path_buf());
    match kind {
        TargetKind::File => tally.files += 1,
        TargetKind::Directory => tally.directories += 1,
    }
    debug!(path = %path.display(), "linting target");
    for v in run_chain(node.validators(), path, kind) {
        tally.push(path, v);
    }
    if !node.children().is_empty() {
        lint_children(node.children(), path, opts, &mut tally);
    }
    tally
}

/// Run validators in order, stopping at the first one that reports.
fn run_chain(validators: &[Validator], path: &Path, kind: TargetKind) -> Vec<Violation> {
    if validators.is_empty() {
        return Vec::new();
    }
    let mut artifact = match kind {
        TargetKind::File => match fs::read(path) {
            Ok(bytes) => Artifact::Bytes(bytes),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read target");
                return vec![Violation::whole(
                    ViolationKind::IoError,
                    format!("could not read '{}': {}", path.display(), e),
                )];
            }
        },
        TargetKind::Directory => Artifact::Directory,
    };
    for v in validators {
        match v.validate(path, artifact) {
            Ok(next) => artifact = next,
            Err(found) => {
                debug!(
                    path = %path.display(),
                    validator = v.name(),
                    count = found.len(),
                    "chain stopped"
                );
                return found;
            }
        }
    }
    Vec::new()
}

/// Flag direct entries of `root` that were neither linted nor lie above a
/// linted path.
fn report_unexpected(root: &Path, tally: &mut Tally) {
    let entries = match fs::read_dir(root) {
        Ok(rd) => rd,
        Err(e) => {
            warn!(root = %root.display(), error = %e, "could not list root");
            tally.push(
                root,
                Violation::whole(
                    ViolationKind::IoError,
                    format!("could not list '{}': {}", root.display(), e),
                ),
            );
            return;
        }
    };
    let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
    paths.sort();
    let linted: Vec<PathBuf> = tally.linted.iter().map(|p| normalize(p)).collect();
    for entry in paths {
        let norm = normalize(&entry);
        if linted.iter().any(|l| l.starts_with(&norm)) {
            continue;
        }
        let what = if entry.is_dir() { "directory" } else { "file" };
        let name = entry
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        tally.push(
            &entry,
            Violation::whole(
                ViolationKind::UnexpectedEntry,
                format!("unexpected {} '{}'", what, name),
            ),
        );
    }
}

fn normalize(p: &Path) -> PathBuf {
    p.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
