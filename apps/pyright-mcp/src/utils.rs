//! Supporting helpers: path resolution, logging setup, and stderr prefixes.

use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};

/// Resolve `p` to an absolute path without requiring it to exist.
///
/// Existing paths are canonicalized (symlinks resolved); missing ones are made
/// absolute against the current directory.
pub fn resolve_path(p: &Path) -> PathBuf {
    if let Ok(c) = p.canonicalize() {
        return c;
    }
    std::path::absolute(p).unwrap_or_else(|_| p.to_path_buf())
}

/// Resolve `p` relative to `base` when it is not already absolute.
pub fn resolve_under(base: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        resolve_path(p)
    } else {
        resolve_path(&base.join(p))
    }
}

pub fn path_string(p: &Path) -> String {
    p.to_string_lossy().to_string()
}

/// Render `p` relative to the working directory when possible.
pub fn rel_to_wd(p: &Path) -> String {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    match pathdiff::diff_paths(p, &cwd) {
        Some(rel) if !rel.as_os_str().is_empty() && !rel.starts_with("..") => {
            rel.to_string_lossy().replace('\\', "/")
        }
        _ => p.to_string_lossy().to_string(),
    }
}

/// Initialize tracing on stderr. `RUST_LOG` wins over the flags.
pub fn init_logging(verbose: bool, debug: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
    tracing::debug!("logging initialized at level {}", level);
}

pub fn colors_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

pub fn error_prefix() -> String {
    if colors_enabled() {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

pub fn note_prefix() -> String {
    if colors_enabled() {
        "note:".cyan().bold().to_string()
    } else {
        "note:".to_string()
    }
}
