//! Output rendering for lint reports.
//!
//! Supports `human` (default) and `json` outputs. The JSON form is the
//! serialized `Report` with target paths shown relative to the lint root.

use crate::models::{Finding, Report};
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;
use std::path::Path;

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

/// Target path relative to `root` when possible.
fn display_target(target: &Path, root: &Path) -> String {
    pathdiff::diff_paths(target, root)
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| target.to_path_buf())
        .to_string_lossy()
        .to_string()
}

/// One human-readable line per finding.
pub fn render_finding(f: &Finding, root: &Path, color: bool) -> String {
    let file = display_target(&f.target, root);
    let location = if f.violation.location.is_empty() {
        String::new()
    } else {
        format!(" {}", f.violation.location)
    };
    let position = f
        .violation
        .position
        .map(|p| format!(":{}:{}", p.line, p.column))
        .unwrap_or_default();
    if color {
        format!(
            "{} {}{}{} ❲{}❳ — {}",
            "✖".red(),
            file.bold(),
            position,
            location.cyan(),
            f.violation.kind,
            f.violation.message
        )
    } else {
        format!(
            "✖ {}{}{} ❲{}❳ — {}",
            file, position, location, f.violation.kind, f.violation.message
        )
    }
}

/// Print a report in the requested format.
pub fn print_report(report: &Report, root: &Path, output: &str) {
    match output {
        "json" => match serde_json::to_string_pretty(&compose_report_json(report, root)) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("could not serialize report: {}", e),
        },
        _ => {
            let color = use_colors(output);
            for f in &report.violations {
                println!("{}", render_finding(f, root, color));
            }
            let passed = if report.passed { "yes" } else { "no" };
            let summary = format!(
                "— Summary — violations={} files={} directories={} passed={}",
                report.summary.violations,
                report.summary.files,
                report.summary.directories,
                passed
            );
            if color {
                if report.passed {
                    println!("{}", summary.green().bold());
                } else {
                    println!("{}", summary.red().bold());
                }
            } else {
                println!("{}", summary);
            }
        }
    }
}

/// Compose report JSON object (pure) for testing/snapshot purposes.
pub fn compose_report_json(report: &Report, root: &Path) -> JsonVal {
    let violations: Vec<JsonVal> = report
        .violations
        .iter()
        .map(|f| {
            let mut item = json!({
                "target": display_target(&f.target, root),
                "kind": f.violation.kind,
                "location": f.violation.location,
                "message": f.violation.message,
            });
            if let Some(p) = f.violation.position {
                item["position"] = json!(p);
            }
            item
        })
        .collect();
    json!({
        "passed": report.passed,
        "violations": violations,
        "summary": report.summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TextPosition, Violation, ViolationKind};

    fn sample(root: &Path) -> Report {
        Report::new(
            vec![
                Finding {
                    target: root.join("menu.json"),
                    violation: Violation::new(
                        ViolationKind::MissingRequiredProperty,
                        "/menu/header",
                        "missing required property 'header'",
                    ),
                },
                Finding {
                    target: root.join("broken.json"),
                    violation: Violation::whole(ViolationKind::InvalidJson, "EOF while parsing")
                        .at_position(TextPosition { line: 1, column: 2 }),
                },
            ],
            2,
            0,
        )
    }

    #[test]
    fn test_compose_report_json_shape() {
        let root = Path::new("/repo");
        let out = compose_report_json(&sample(root), root);
        assert_eq!(out["passed"], false);
        assert_eq!(out["summary"]["violations"], 2);
        assert_eq!(out["violations"][0]["target"], "menu.json");
        assert_eq!(out["violations"][0]["kind"], "missing_required_property");
        assert_eq!(out["violations"][0]["location"], "/menu/header");
        assert!(out["violations"][0].get("position").is_none());
        assert_eq!(out["violations"][1]["position"]["line"], 1);
    }

    #[test]
    fn test_render_finding_plain() {
        let root = Path::new("/repo");
        let report = sample(root);
        assert_eq!(
            render_finding(&report.violations[0], root, false),
            "✖ menu.json /menu/header ❲missing-required❳ — missing required property 'header'"
        );
        assert_eq!(
            render_finding(&report.violations[1], root, false),
            "✖ broken.json:1:2 ❲invalid-json❳ — EOF while parsing"
        );
    }

    #[test]
    fn test_root_target_keeps_full_path() {
        let root = Path::new("/repo");
        assert_eq!(display_target(root, root), "/repo");
    }
}
