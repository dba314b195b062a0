//! Upward discovery of the checker's own configuration file.
//!
//! In each directory `pyrightconfig.json` wins over a `pyproject.toml`
//! carrying a `[tool.pyright]` table. The walk stops at the filesystem root.

use crate::models::{ConfigKind, ConfigLocation};
use crate::utils::{path_string, resolve_path};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const PYRIGHT_CONFIG: &str = "pyrightconfig.json";
const PYPROJECT: &str = "pyproject.toml";

/// Search upward from `start_dir` (current directory when `None`).
pub fn find_pyright_config(start_dir: Option<&Path>) -> ConfigLocation {
    let start = match start_dir {
        Some(p) => resolve_path(p),
        None => resolve_path(&std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))),
    };
    let searched_from = path_string(&start);

    let mut cur: Option<&Path> = Some(start.as_path());
    while let Some(dir) = cur {
        let json = dir.join(PYRIGHT_CONFIG);
        if json.is_file() {
            return found(&json, ConfigKind::PyrightConfig, dir, &searched_from);
        }
        let pyproject = dir.join(PYPROJECT);
        if pyproject.is_file() && has_pyright_section(&pyproject) {
            return found(&pyproject, ConfigKind::Pyproject, dir, &searched_from);
        }
        cur = dir.parent();
    }

    debug!(start = %searched_from, "no pyright configuration found");
    ConfigLocation {
        found: false,
        config_path: None,
        kind: None,
        resolve_dir: searched_from.clone(),
        searched_from,
    }
}

fn found(path: &Path, kind: ConfigKind, dir: &Path, searched_from: &str) -> ConfigLocation {
    debug!(path = %path.display(), "found pyright configuration");
    ConfigLocation {
        found: true,
        config_path: Some(path_string(path)),
        kind: Some(kind),
        resolve_dir: path_string(dir),
        searched_from: searched_from.to_string(),
    }
}

/// True when `pyproject.toml` declares `[tool.pyright]`.
///
/// Falls back to a header scan when the file is not valid TOML.
fn has_pyright_section(path: &Path) -> bool {
    let Ok(bytes) = fs::read(path) else {
        return false;
    };
    let text = String::from_utf8_lossy(&bytes);
    match toml::from_str::<toml::Table>(&text) {
        Ok(table) => table
            .get("tool")
            .and_then(|t| t.as_table())
            .is_some_and(|tool| tool.contains_key("pyright")),
        Err(_) => Regex::new(r"(?m)^\s*\[tool\.pyright\]\s*$")
            .map(|re| re.is_match(&text))
            .unwrap_or(false),
    }
}
