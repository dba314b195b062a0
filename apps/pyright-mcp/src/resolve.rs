//! Locating the checker executable and probing its version.
//!
//! Search order:
//! 1. A `pyright` executable on `PATH`.
//! 2. `python -m pyright` through the first Python interpreter on `PATH`,
//!    accepted only if a `--version` call succeeds within the probe timeout.
//!
//! Absence is an ordinary value (an empty [`Invocation`]), never an error.

use crate::models::VersionInfo;
use crate::process;
use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const EXECUTABLE: &str = "pyright";
const PYTHON_CANDIDATES: [&str; 2] = ["python3", "python"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// How to invoke the checker: an argv prefix plus a display name.
pub struct Invocation {
    pub argv: Vec<String>,
    pub display: String,
}

impl Invocation {
    pub fn new(argv: Vec<String>, display: impl Into<String>) -> Self {
        Self {
            argv,
            display: display.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        !self.argv.is_empty()
    }
}

/// Resolve the checker invocation.
pub fn resolve() -> Invocation {
    if let Ok(exe) = which::which(EXECUTABLE) {
        let exe = exe.to_string_lossy().to_string();
        debug!(%exe, "found pyright on PATH");
        return Invocation::new(vec![exe.clone()], exe);
    }
    if let Some(python) = find_python() {
        let python = python.to_string_lossy().to_string();
        let argv = vec![python.clone(), "-m".to_string(), EXECUTABLE.to_string()];
        let mut probe = argv.clone();
        probe.push("--version".to_string());
        match process::run(&probe, None, PROBE_TIMEOUT) {
            Ok(out) if out.success() && !out.stdout.trim().is_empty() => {
                debug!(%python, "using python module invocation");
                return Invocation::new(argv, format!("{} -m {}", python, EXECUTABLE));
            }
            Ok(out) => debug!(exit_code = out.exit_code, "python -m pyright probe failed"),
            Err(e) => debug!(error = %e, "python -m pyright probe failed"),
        }
    }
    debug!("pyright not resolvable");
    Invocation::default()
}

/// First Python interpreter on `PATH`.
pub fn find_python() -> Option<PathBuf> {
    PYTHON_CANDIDATES
        .iter()
        .find_map(|name| which::which(name).ok())
}

/// Resolve, then probe the version.
pub fn get_version() -> VersionInfo {
    version_for(&resolve())
}

/// Probe the version of an already-resolved invocation.
///
/// Any failure to run the probe yields an all-empty `VersionInfo`.
pub fn version_for(inv: &Invocation) -> VersionInfo {
    if !inv.is_available() {
        return VersionInfo::default();
    }
    let mut argv = inv.argv.clone();
    argv.push("--version".to_string());
    match process::run(&argv, None, PROBE_TIMEOUT) {
        Ok(out) => {
            let combined = format!("{}{}", out.stdout, out.stderr);
            let version = parse_version_string(&combined);
            VersionInfo {
                supports_outputjson: supports_outputjson(&version),
                version,
                executable_path: if inv.display.is_empty() {
                    inv.argv[0].clone()
                } else {
                    inv.display.clone()
                },
            }
        }
        Err(e) => {
            debug!(error = %e, "version probe failed");
            VersionInfo::default()
        }
    }
}

fn semver_search() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(\d+\.\d+\.\d+)\b").expect("valid regex"))
}

fn semver_exact() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.\d+\.\d+$").expect("valid regex"))
}

/// Extract `X.Y.Z` from version output; otherwise the trimmed raw text.
pub fn parse_version_string(s: &str) -> String {
    semver_search()
        .captures(s)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| s.trim().to_string())
}

/// Heuristic: a clean `X.Y.Z` token means `--outputjson` is available.
pub fn supports_outputjson(version: &str) -> bool {
    semver_exact().is_match(version)
}
