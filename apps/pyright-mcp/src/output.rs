//! Output rendering for check, version and config results.
//!
//! `json` (default) prints one canonical object: compact, keys sorted at
//! every level. `human` prints one line per diagnostic plus a summary.

use crate::models::{CheckResult, Severity};
use crate::utils::{colors_enabled, rel_to_wd};
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::Value as JsonVal;
use std::path::Path;

/// Serialize `value` canonically.
///
/// Going through `Value` sorts object keys, since `serde_json` maps are
/// ordered by key.
pub fn to_canonical_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let v: JsonVal = serde_json::to_value(value)?;
    serde_json::to_string(&v)
}

/// Render a check result for the requested output mode.
pub fn render_check(res: &CheckResult, output: &str) -> serde_json::Result<String> {
    match output {
        "human" => Ok(render_human(res, colors_enabled())),
        _ => to_canonical_json(res),
    }
}

fn render_human(res: &CheckResult, color: bool) -> String {
    let mut lines: Vec<String> = Vec::new();
    for d in &res.diagnostics {
        let sev = match (d.severity, color) {
            (Severity::Error, true) => "error".red().bold().to_string(),
            (Severity::Warning, true) => "warning".yellow().bold().to_string(),
            (Severity::Information, true) => "information".blue().bold().to_string(),
            (s, false) => s.as_str().to_string(),
        };
        let loc = format!(
            "{}:{}:{}",
            rel_to_wd(Path::new(&d.file)),
            d.range.start.line + 1,
            d.range.start.character + 1
        );
        let loc = if color { loc.bold().to_string() } else { loc };
        let rule = d
            .rule
            .as_deref()
            .map(|r| format!(" [{}]", r))
            .unwrap_or_default();
        lines.push(format!("{} {}{} {}", loc, sev, rule, d.message));
    }
    let s = &res.summary;
    let summary = format!(
        "— Summary — errors={} warnings={} informations={} files={} time={:.2}s",
        s.error_count, s.warning_count, s.information_count, s.files_analyzed, s.time_sec
    );
    lines.push(if color { summary.bold().to_string() } else { summary });
    if let Some(reason) = &res.fail_reason {
        let verdict = format!("not ok (exit_code={}): {}", res.exit_code, reason);
        lines.push(if color { verdict.red().to_string() } else { verdict });
    } else {
        let verdict = "ok".to_string();
        lines.push(if color { verdict.green().to_string() } else { verdict });
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Diagnostic, Position, Range, Summary};

    fn sample() -> CheckResult {
        CheckResult {
            ok: false,
            fail_reason: Some("fail_on_severity 'error' breached (max_severity_level=3).".into()),
            command: vec!["pyright".into(), "--outputjson".into(), "/p".into()],
            exit_code: 1,
            summary: Summary {
                files_analyzed: 1,
                error_count: 1,
                warning_count: 0,
                information_count: 0,
                time_sec: 0.5,
            },
            diagnostics: vec![Diagnostic {
                file: "/p/bad.py".into(),
                range: Range {
                    start: Position { line: 1, character: 11 },
                    end: Position { line: 1, character: 17 },
                },
                severity: Severity::Error,
                rule: Some("reportReturnType".into()),
                message: "Type \"str\" is not assignable".into(),
            }],
            pyright_version: "1.1.405".into(),
            analyzed_root: "/p".into(),
            checked_paths: vec!["/p".into()],
            venv_path: "/venv".into(),
        }
    }

    #[test]
    fn test_canonical_json_sorts_keys_and_is_compact() {
        let out = to_canonical_json(&sample()).unwrap();
        assert!(!out.contains('\n'));
        let keys = [
            "\"analyzed_root\"",
            "\"checked_paths\"",
            "\"command\"",
            "\"diagnostics\"",
            "\"exit_code\"",
            "\"fail_reason\"",
            "\"ok\"",
            "\"pyright_version\"",
            "\"summary\"",
            "\"venv_path\"",
        ];
        let positions: Vec<usize> = keys
            .iter()
            .map(|k| out.find(k).unwrap_or_else(|| panic!("missing {}", k)))
            .collect();
        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted);
        assert!(out.contains(r#"{"code":"reportReturnType","file":"/p/bad.py","message":"#));
        assert!(out.contains(r#""severity":"error","severity_level":3"#));
    }

    #[test]
    fn test_canonical_json_is_byte_stable() {
        let a = to_canonical_json(&sample()).unwrap();
        let b = to_canonical_json(&sample()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_render_human_lists_diagnostics_and_verdict() {
        let out = render_human(&sample(), false);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with(":2:12 error [reportReturnType] Type \"str\" is not assignable"));
        assert!(lines[1].contains("errors=1"));
        assert!(lines[2].starts_with("not ok (exit_code=1)"));
    }
}
