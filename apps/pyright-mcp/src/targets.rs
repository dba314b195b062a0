//! Expansion of include/exclude globs into the concrete set of paths to check.
//!
//! Without include globs the root itself is returned unexpanded and exclude
//! globs are not consulted; the checker walks directories on its own.

use crate::utils::resolve_path;
use glob::{glob, Pattern};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Expand `include` under `root`, then drop anything matching `exclude`.
///
/// Output is deduplicated by resolved absolute path and sorted by its string form.
pub fn expand(root: &Path, include: &[String], exclude: &[String]) -> Vec<PathBuf> {
    if include.is_empty() {
        return vec![resolve_path(root)];
    }
    let root = resolve_path(root);
    let escaped_root = Pattern::escape(&root.to_string_lossy());

    let mut found: BTreeSet<String> = BTreeSet::new();
    for pat in include {
        let full = format!("{}/{}", escaped_root, pat.trim_start_matches('/'));
        let entries = match glob(&full) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(pattern = %pat, error = %e, "ignoring invalid include pattern");
                continue;
            }
        };
        for p in entries.flatten() {
            if p.is_file() {
                found.insert(resolve_path(&p).to_string_lossy().to_string());
            } else if p.is_dir() {
                for f in walk_files(&p) {
                    found.insert(f.to_string_lossy().to_string());
                }
            }
        }
    }

    let excludes = compile_excludes(exclude);
    let kept: Vec<PathBuf> = found
        .into_iter()
        .map(PathBuf::from)
        .filter(|p| !is_excluded(&root, p, &excludes))
        .collect();
    debug!(count = kept.len(), "expanded include globs");
    kept
}

fn walk_files(dir: &Path) -> Vec<PathBuf> {
    let pattern = format!("{}/**/*", Pattern::escape(&dir.to_string_lossy()));
    match glob(&pattern) {
        Ok(entries) => entries
            .flatten()
            .filter(|p| p.is_file())
            .map(|p| resolve_path(&p))
            .collect(),
        Err(_) => Vec::new(),
    }
}

fn compile_excludes(exclude: &[String]) -> Vec<Pattern> {
    exclude
        .iter()
        .filter_map(|ex| match Pattern::new(ex) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(pattern = %ex, error = %e, "ignoring invalid exclude pattern");
                None
            }
        })
        .collect()
}

/// A path is excluded when its root-relative posix path or its file name matches.
///
/// Patterns use `glob::Pattern` syntax: `*` crosses `/`, a leading `**/` also
/// matches root-level entries, and `**` not forming a whole path component is
/// invalid, so the pattern is skipped with a warning.
fn is_excluded(root: &Path, p: &Path, excludes: &[Pattern]) -> bool {
    if excludes.is_empty() {
        return false;
    }
    let name = p
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let rel = match p.strip_prefix(root) {
        Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
        Err(_) => name.clone(),
    };
    excludes.iter().any(|ex| ex.matches(&rel) || ex.matches(&name))
}
