//! Shared data models for check results, version probes, and config discovery.
//!
//! Every public operation returns one of these by value. Field names are the
//! serialized contract consumed by the CLI and the tool-protocol server.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Diagnostic severity as reported by the checker.
pub enum Severity {
    Information,
    Warning,
    Error,
}

impl Severity {
    /// Numeric level used for every severity comparison.
    pub const fn level(self) -> u8 {
        match self {
            Severity::Information => 1,
            Severity::Warning => 2,
            Severity::Error => 3,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::Information => "information",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }

    /// Parse a raw severity token; unknown values yield `None`.
    pub fn from_raw(raw: &str) -> Option<Self> {
        match raw {
            "information" => Some(Severity::Information),
            "warning" => Some(Severity::Warning),
            "error" => Some(Severity::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Minimum severity that flips the verdict to not-ok.
pub enum FailOn {
    #[default]
    None,
    Information,
    Warning,
    Error,
}

impl FailOn {
    pub const fn as_str(self) -> &'static str {
        match self {
            FailOn::None => "none",
            FailOn::Information => "information",
            FailOn::Warning => "warning",
            FailOn::Error => "error",
        }
    }

    /// Level a diagnostic must reach to breach the threshold. `None` never breaches.
    pub const fn threshold_level(self) -> Option<u8> {
        match self {
            FailOn::None => None,
            FailOn::Information => Some(Severity::Information.level()),
            FailOn::Warning => Some(Severity::Warning.level()),
            FailOn::Error => Some(Severity::Error.level()),
        }
    }
}

impl fmt::Display for FailOn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailOn {
    type Err = String;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(FailOn::None),
            "information" => Ok(FailOn::Information),
            "warning" => Ok(FailOn::Warning),
            "error" => Ok(FailOn::Error),
            other => Err(format!(
                "invalid severity '{}' (expected none|information|warning|error)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
/// Zero-based line/character position.
pub struct Position {
    pub line: u64,
    pub character: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

#[derive(Debug, Clone, PartialEq)]
/// A single normalized diagnostic.
///
/// The serialized `severity_level` is always computed from `severity`, so the
/// two cannot diverge. `code` mirrors `rule` on the wire.
pub struct Diagnostic {
    pub file: String,
    pub range: Range,
    pub severity: Severity,
    pub rule: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn severity_level(&self) -> u8 {
        self.severity.level()
    }
}

#[derive(Serialize)]
struct DiagnosticWire<'a> {
    file: &'a str,
    range: &'a Range,
    severity: Severity,
    severity_level: u8,
    code: Option<&'a str>,
    rule: Option<&'a str>,
    message: &'a str,
}

impl Serialize for Diagnostic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        DiagnosticWire {
            file: &self.file,
            range: &self.range,
            severity: self.severity,
            severity_level: self.severity.level(),
            code: self.rule.as_deref(),
            rule: self.rule.as_deref(),
            message: &self.message,
        }
        .serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
/// Counters copied verbatim from the checker's own summary.
pub struct Summary {
    pub files_analyzed: u64,
    pub error_count: u64,
    pub warning_count: u64,
    pub information_count: u64,
    pub time_sec: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
/// Result of one check. Every code path returns this same shape.
pub struct CheckResult {
    pub ok: bool,
    pub fail_reason: Option<String>,
    pub command: Vec<String>,
    pub exit_code: i32,
    pub summary: Summary,
    pub diagnostics: Vec<Diagnostic>,
    pub pyright_version: String,
    pub analyzed_root: String,
    pub checked_paths: Vec<String>,
    pub venv_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
/// Version probe result.
pub struct VersionInfo {
    pub version: String,
    pub executable_path: String,
    pub supports_outputjson: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
/// Which kind of file carried the checker configuration.
pub enum ConfigKind {
    #[serde(rename = "pyrightconfig.json")]
    PyrightConfig,
    #[serde(rename = "pyproject.toml")]
    Pyproject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Outcome of walking upward for checker configuration.
pub struct ConfigLocation {
    pub found: bool,
    pub config_path: Option<String>,
    pub kind: Option<ConfigKind>,
    pub resolve_dir: String,
    pub searched_from: String,
}
