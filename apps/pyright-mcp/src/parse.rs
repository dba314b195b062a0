//! Parsing and normalization of the checker's `--outputjson` document.
//!
//! Expected shape:
//!
//! ```json
//! {
//!   "version": "1.1.405",
//!   "generalDiagnostics": [ { "file": "...", "severity": "error", "message": "...",
//!                             "range": { "start": {"line": 0, "character": 0},
//!                                        "end":   {"line": 0, "character": 5} },
//!                             "rule": "reportAssignmentType" } ],
//!   "summary": { "filesAnalyzed": 1, "errorCount": 1, "warningCount": 0,
//!                "informationCount": 0, "timeInSec": 0.4 }
//! }
//! ```
//!
//! Normalization is lenient: missing or mistyped fields fall back to defaults.

use crate::models::{Diagnostic, Position, Range, Severity, Summary};
use crate::utils::{path_string, resolve_under};
use serde_json::{Map, Value as Json};
use std::path::Path;

const SUMMARY_KEY: &str = "summary";
const DIAGNOSTICS_KEY: &str = "generalDiagnostics";

#[derive(Debug, Clone, PartialEq)]
/// A structurally valid report, not yet normalized.
pub struct RawReport {
    pub version: Option<String>,
    pub summary: Json,
    pub diagnostics: Vec<Json>,
}

/// Parse checker output. `None` when the text is not a JSON object carrying
/// both the summary and diagnostics fields.
pub fn parse_report(text: &str) -> Option<RawReport> {
    let value: Json = serde_json::from_str(text).ok()?;
    let mut obj = match value {
        Json::Object(obj) => obj,
        _ => return None,
    };
    if !obj.contains_key(SUMMARY_KEY) || !obj.contains_key(DIAGNOSTICS_KEY) {
        return None;
    }
    let version = obj
        .get("version")
        .and_then(Json::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    let summary = obj.remove(SUMMARY_KEY).unwrap_or(Json::Null);
    let diagnostics = match obj.remove(DIAGNOSTICS_KEY) {
        Some(Json::Array(items)) => items,
        _ => Vec::new(),
    };
    Some(RawReport {
        version,
        summary,
        diagnostics,
    })
}

/// Normalize every object entry, then sort. Non-object entries are skipped.
pub fn normalize_diagnostics(raw: &[Json], base: &Path) -> Vec<Diagnostic> {
    let mut out: Vec<Diagnostic> = raw
        .iter()
        .filter_map(Json::as_object)
        .map(|d| normalize_diagnostic(d, base))
        .collect();
    sort_diagnostics(&mut out);
    out
}

/// Normalize one raw diagnostic. Relative file paths resolve under `base`.
pub fn normalize_diagnostic(raw: &Map<String, Json>, base: &Path) -> Diagnostic {
    let file = raw.get("file").map(json_to_string).unwrap_or_default();
    let severity = raw
        .get("severity")
        .and_then(Json::as_str)
        .and_then(Severity::from_raw)
        .unwrap_or(Severity::Information);
    let range = raw.get("range").and_then(Json::as_object);
    let rule = raw
        .get("rule")
        .and_then(Json::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    Diagnostic {
        file: path_string(&resolve_under(base, Path::new(&file))),
        range: Range {
            start: position(range.and_then(|r| r.get("start"))),
            end: position(range.and_then(|r| r.get("end"))),
        },
        severity,
        rule,
        message: raw.get("message").map(json_to_string).unwrap_or_default(),
    }
}

/// Copy the four counters and elapsed time; never recomputed from diagnostics.
pub fn normalize_summary(raw: &Json) -> Summary {
    let get = |key: &str| raw.get(key).map(as_count).unwrap_or(0);
    Summary {
        files_analyzed: get("filesAnalyzed"),
        error_count: get("errorCount"),
        warning_count: get("warningCount"),
        information_count: get("informationCount"),
        time_sec: raw
            .get("timeInSec")
            .and_then(Json::as_f64)
            .filter(|t| t.is_finite())
            .unwrap_or(0.0),
    }
}

/// Ascending by (file, start line, start character); stable otherwise.
pub fn sort_diagnostics(diags: &mut [Diagnostic]) {
    diags.sort_by(|a, b| {
        a.file
            .cmp(&b.file)
            .then(a.range.start.line.cmp(&b.range.start.line))
            .then(a.range.start.character.cmp(&b.range.start.character))
    });
}

fn position(raw: Option<&Json>) -> Position {
    let obj = raw.and_then(Json::as_object);
    let get = |key: &str| obj.and_then(|o| o.get(key)).map(as_count).unwrap_or(0);
    Position {
        line: get("line"),
        character: get("character"),
    }
}

/// Non-negative integers pass through; finite floats truncate; anything else is 0.
fn as_count(v: &Json) -> u64 {
    if let Some(n) = v.as_u64() {
        return n;
    }
    match v.as_f64() {
        Some(f) if f.is_finite() && f >= 0.0 => f as u64,
        _ => 0,
    }
}

fn json_to_string(v: &Json) -> String {
    match v {
        Json::String(s) => s.clone(),
        Json::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn base() -> &'static Path {
        Path::new("/project")
    }

    #[test]
    fn test_parse_report_rejects_non_json_and_wrong_shapes() {
        assert!(parse_report("not-json").is_none());
        assert!(parse_report("").is_none());
        assert!(parse_report("[1, 2]").is_none());
        assert!(parse_report(r#"{"summary": {}}"#).is_none());
        assert!(parse_report(r#"{"generalDiagnostics": []}"#).is_none());
    }

    #[test]
    fn test_parse_report_accepts_minimal_document() {
        let r = parse_report(r#"{"version":"1.1.405","summary":{},"generalDiagnostics":[]}"#)
            .unwrap();
        assert_eq!(r.version.as_deref(), Some("1.1.405"));
        assert!(r.diagnostics.is_empty());

        let r = parse_report(r#"{"summary":null,"generalDiagnostics":null}"#).unwrap();
        assert_eq!(r.version, None);
        assert!(r.diagnostics.is_empty());
        assert_eq!(normalize_summary(&r.summary), Summary::default());
    }

    #[test]
    fn test_normalize_diagnostic_defaults() {
        let raw = json!({"file": "/project/a.py", "severity": "fatal", "message": "m"});
        let d = normalize_diagnostic(raw.as_object().unwrap(), base());
        assert_eq!(d.severity, Severity::Information);
        assert_eq!(d.severity_level(), 1);
        assert_eq!(d.range, Range::default());
        assert_eq!(d.rule, None);
        assert!(Path::new(&d.file).is_absolute());

        let raw = json!({
            "file": "/project/a.py",
            "severity": "error",
            "message": "bad",
            "rule": "",
            "range": {"start": {"line": "x", "character": 4.0}, "end": {"line": 2}}
        });
        let d = normalize_diagnostic(raw.as_object().unwrap(), base());
        assert_eq!(d.severity_level(), 3);
        assert_eq!(d.range.start, Position { line: 0, character: 4 });
        assert_eq!(d.range.end, Position { line: 2, character: 0 });
        assert_eq!(d.rule, None);
    }

    #[test]
    fn test_normalize_diagnostic_keeps_string_rule_only() {
        let raw = json!({"file": "/project/a.py", "rule": "reportGeneralTypeIssues"});
        let d = normalize_diagnostic(raw.as_object().unwrap(), base());
        assert_eq!(d.rule.as_deref(), Some("reportGeneralTypeIssues"));

        let raw = json!({"file": "/project/a.py", "rule": 7});
        let d = normalize_diagnostic(raw.as_object().unwrap(), base());
        assert_eq!(d.rule, None);
    }

    #[test]
    fn test_relative_file_resolves_under_base() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("rel.py"), "").unwrap();
        let raw = json!({"file": "rel.py"});
        let d = normalize_diagnostic(raw.as_object().unwrap(), dir.path());
        assert_eq!(
            Path::new(&d.file),
            dir.path().join("rel.py").canonicalize().unwrap()
        );
    }

    #[test]
    fn test_summary_is_copied_not_recomputed() {
        let text = r#"{
            "summary": {"filesAnalyzed": 3, "errorCount": 1, "warningCount": 0,
                        "informationCount": 2, "timeInSec": 0.25},
            "generalDiagnostics": [
                {"file": "/project/a.py", "severity": "error", "message": "x"},
                {"file": "/project/b.py", "severity": "error", "message": "y"},
                {"file": "/project/c.py", "severity": "error", "message": "z"}
            ]
        }"#;
        let r = parse_report(text).unwrap();
        let s = normalize_summary(&r.summary);
        assert_eq!(s.error_count, 1);
        assert_eq!(s.files_analyzed, 3);
        assert_eq!(s.information_count, 2);
        assert_eq!(s.time_sec, 0.25);
        let diags = normalize_diagnostics(&r.diagnostics, base());
        assert_eq!(diags.iter().filter(|d| d.severity == Severity::Error).count(), 3);
    }

    #[test]
    fn test_normalize_summary_defaults_non_numeric() {
        let s = normalize_summary(&json!({"errorCount": "1", "timeInSec": "fast"}));
        assert_eq!(s, Summary::default());
    }

    #[test]
    fn test_diagnostics_sorted_by_file_line_character() {
        let raw = vec![
            json!({"file": "/project/b.py", "range": {"start": {"line": 0, "character": 0}}}),
            json!({"file": "/project/a.py", "range": {"start": {"line": 5, "character": 1}}}),
            json!({"file": "/project/a.py", "range": {"start": {"line": 5, "character": 0}}}),
            json!({"file": "/project/a.py", "range": {"start": {"line": 1, "character": 9}}}),
            json!("not an object"),
        ];
        let diags = normalize_diagnostics(&raw, base());
        let keys: Vec<(String, u64, u64)> = diags
            .iter()
            .map(|d| (d.file.clone(), d.range.start.line, d.range.start.character))
            .collect();
        let mut resorted = keys.clone();
        resorted.sort();
        assert_eq!(keys, resorted);
        assert_eq!(diags.len(), 4);
        assert!(keys[0].0.ends_with("a.py"));
        assert_eq!((keys[0].1, keys[0].2), (1, 9));
        assert!(keys[3].0.ends_with("b.py"));
    }
}
