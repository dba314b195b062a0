//! Settings discovery and effective check parameters.
//!
//! `pyright-mcp.toml|yaml|yml` is looked up from the check's working
//! directory (or the target's directory) upward, stopping at the first
//! directory holding a settings file or a `.git` entry. Defaults:
//! - `timeout_sec`: 60
//! - `fail_on_severity`: `none`
//! - `include` / `exclude` / `extra_args`: empty
//! - `output`: `json`
//!
//! Overrides precedence: CLI / tool arguments > settings file > defaults.

use crate::models::FailOn;
use crate::runner::{CheckRequest, DEFAULT_TIMEOUT_SEC};
use crate::utils::resolve_path;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

pub const SETTINGS_FILES: [&str; 3] = ["pyright-mcp.toml", "pyright-mcp.yaml", "pyright-mcp.yml"];

#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
/// Root settings loaded from `pyright-mcp.toml|yaml`.
pub struct Settings {
    pub timeout_sec: Option<u64>,
    pub fail_on_severity: Option<String>,
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub extra_args: Option<Vec<String>>,
    /// json|human, CLI only.
    pub output: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq)]
/// Values supplied explicitly by a caller. `None` means "not given".
pub struct Overrides {
    pub timeout_sec: Option<u64>,
    pub fail_on_severity: Option<FailOn>,
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub extra_args: Option<Vec<String>>,
    pub output: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
/// Fully-resolved parameters after applying precedence.
pub struct Effective {
    /// Settings file that contributed, if any.
    pub settings_path: Option<PathBuf>,
    pub timeout_sec: u64,
    pub fail_on_severity: FailOn,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub extra_args: Vec<String>,
    pub output: String,
}

impl Effective {
    pub fn to_request(&self, target: impl Into<PathBuf>, cwd: Option<PathBuf>) -> CheckRequest {
        CheckRequest {
            target: target.into(),
            cwd,
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            extra_args: self.extra_args.clone(),
            timeout: Duration::from_secs(self.timeout_sec),
            fail_on_severity: self.fail_on_severity,
        }
    }
}

/// Directory where settings lookup starts for a given target and cwd.
pub fn search_start(target: &Path, cwd: Option<&Path>) -> PathBuf {
    if let Some(cwd) = cwd {
        return resolve_path(cwd);
    }
    let t = resolve_path(target);
    if t.is_dir() {
        t
    } else {
        t.parent().map(Path::to_path_buf).unwrap_or(t)
    }
}

/// Walk upward from `start` to the nearest settings file.
///
/// Stops without a match at the first directory containing `.git`.
pub fn find_settings(start: &Path) -> Option<PathBuf> {
    let mut cur = Some(start);
    while let Some(dir) = cur {
        for name in SETTINGS_FILES {
            let p = dir.join(name);
            if p.is_file() {
                return Some(p);
            }
        }
        if dir.join(".git").exists() {
            return None;
        }
        cur = dir.parent();
    }
    None
}

/// Load settings from `path`. Unreadable or invalid files yield `None`.
pub fn load_settings(path: &Path) -> Option<Settings> {
    let s = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read settings file");
            return None;
        }
    };
    let is_yaml = path
        .extension()
        .is_some_and(|ext| ext == "yaml" || ext == "yml");
    let parsed = if is_yaml {
        serde_yaml::from_str::<Settings>(&s).map_err(|e| e.to_string())
    } else {
        toml::from_str::<Settings>(&s).map_err(|e| e.to_string())
    };
    match parsed {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring invalid settings file");
            None
        }
    }
}

/// Merge caller overrides, the discovered settings file, and defaults.
pub fn resolve_effective(start: &Path, cli: Overrides) -> Effective {
    let settings_path = find_settings(start);
    let cfg = settings_path
        .as_deref()
        .and_then(load_settings)
        .unwrap_or_default();
    if let Some(p) = settings_path.as_ref() {
        debug!(path = %p.display(), "loaded settings");
    }

    let fail_on_severity = cli
        .fail_on_severity
        .or_else(|| {
            cfg.fail_on_severity.as_deref().and_then(|s| match s.parse::<FailOn>() {
                Ok(f) => Some(f),
                Err(e) => {
                    warn!(error = %e, "ignoring fail_on_severity from settings");
                    None
                }
            })
        })
        .unwrap_or_default();

    Effective {
        settings_path,
        timeout_sec: cli
            .timeout_sec
            .or(cfg.timeout_sec)
            .unwrap_or(DEFAULT_TIMEOUT_SEC),
        fail_on_severity,
        include: cli.include.or(cfg.include).unwrap_or_default(),
        exclude: cli.exclude.or(cfg.exclude).unwrap_or_default(),
        extra_args: cli.extra_args.or(cfg.extra_args).unwrap_or_default(),
        output: cli
            .output
            .or(cfg.output)
            .unwrap_or_else(|| "json".to_string()),
    }
}
