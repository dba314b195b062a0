//! Best-effort detection of the Python environment the checker resolves
//! libraries from. Informational only; never affects a verdict.

use crate::process;
use crate::resolve::{find_python, PROBE_TIMEOUT};
use crate::utils::{path_string, resolve_path};
use std::path::{Path, PathBuf};
use tracing::debug;

const PREFIX_PROBE: &str = "import sys; print(sys.prefix); print(sys.base_prefix)";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Explicit inputs for [`detect_environment_path`].
pub struct EnvSnapshot {
    /// `$VIRTUAL_ENV`.
    pub virtual_env: Option<String>,
    /// Interpreter `sys.prefix`.
    pub prefix: Option<String>,
    /// Interpreter `sys.base_prefix`.
    pub base_prefix: Option<String>,
    pub cwd: PathBuf,
}

impl EnvSnapshot {
    /// Capture from the current process. The interpreter is only probed when
    /// `$VIRTUAL_ENV` is unset.
    pub fn capture() -> Self {
        let virtual_env = std::env::var("VIRTUAL_ENV").ok().filter(|s| !s.is_empty());
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let (prefix, base_prefix) = if virtual_env.is_some() {
            (None, None)
        } else {
            probe_prefixes()
        };
        Self {
            virtual_env,
            prefix,
            base_prefix,
            cwd,
        }
    }
}

fn probe_prefixes() -> (Option<String>, Option<String>) {
    let Some(python) = find_python() else {
        return (None, None);
    };
    let argv = vec![
        path_string(&python),
        "-c".to_string(),
        PREFIX_PROBE.to_string(),
    ];
    match process::run(&argv, None, PROBE_TIMEOUT) {
        Ok(out) if out.success() => {
            let mut lines = out.stdout.lines().map(str::trim).filter(|l| !l.is_empty());
            let prefix = lines.next().map(str::to_string);
            let base = lines.next().map(str::to_string);
            (prefix, base)
        }
        Ok(out) => {
            debug!(exit_code = out.exit_code, "interpreter prefix probe failed");
            (None, None)
        }
        Err(e) => {
            debug!(error = %e, "interpreter prefix probe failed");
            (None, None)
        }
    }
}

/// Priority: `$VIRTUAL_ENV`, then `prefix` when it differs from `base_prefix`,
/// then the interpreter prefix, then the working directory.
pub fn detect_environment_path(env: &EnvSnapshot) -> String {
    let resolved = |s: &str| path_string(&resolve_path(Path::new(s)));
    if let Some(venv) = env.virtual_env.as_deref().filter(|s| !s.is_empty()) {
        return resolved(venv);
    }
    match (env.prefix.as_deref(), env.base_prefix.as_deref()) {
        (Some(p), Some(b)) if p != b => resolved(p),
        (Some(p), _) => resolved(p),
        (None, Some(b)) => resolved(b),
        (None, None) => path_string(&env.cwd),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_virtual_env_wins() {
        let dir = tempdir().unwrap();
        let env = EnvSnapshot {
            virtual_env: Some(path_string(dir.path())),
            prefix: Some("/usr".into()),
            base_prefix: Some("/usr".into()),
            cwd: PathBuf::from("/work"),
        };
        assert_eq!(
            detect_environment_path(&env),
            path_string(&dir.path().canonicalize().unwrap())
        );
    }

    #[test]
    fn test_isolated_prefix_then_base_then_cwd() {
        let isolated = EnvSnapshot {
            virtual_env: None,
            prefix: Some("/opt/venvs/a".into()),
            base_prefix: Some("/usr".into()),
            cwd: PathBuf::from("/work"),
        };
        assert_eq!(detect_environment_path(&isolated), "/opt/venvs/a");

        let base = EnvSnapshot {
            prefix: Some("/opt/python".into()),
            base_prefix: Some("/opt/python".into()),
            ..isolated.clone()
        };
        assert_eq!(detect_environment_path(&base), "/opt/python");

        let nothing = EnvSnapshot {
            virtual_env: Some(String::new()),
            prefix: None,
            base_prefix: None,
            cwd: PathBuf::from("/work"),
        };
        assert_eq!(detect_environment_path(&nothing), "/work");
    }
}
