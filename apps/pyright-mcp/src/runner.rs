//! Check orchestration: one request in, one fully-shaped [`CheckResult`] out.
//!
//! The run stops at the first terminal branch, in order: missing target,
//! checker unavailable, spawn failure, timeout (or cancellation), malformed
//! output, parsed report. Each branch still fills in the analysis root,
//! environment path and, where computable, the checked paths.

use crate::env::{detect_environment_path, EnvSnapshot};
use crate::models::{CheckResult, FailOn, Summary};
use crate::parse::{normalize_diagnostics, normalize_summary, parse_report, RawReport};
use crate::process::{self, CancelToken, RunError};
use crate::resolve::{self, Invocation};
use crate::targets;
use crate::threshold;
use crate::utils::{path_string, resolve_path};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_TIMEOUT_SEC: u64 = 60;
const OUTPUT_TAIL_CHARS: usize = 1000;
const MISSING_TARGET_EXIT: i32 = 4;
const INFRA_EXIT: i32 = -1;

#[derive(Debug, Clone, PartialEq)]
/// Input parameters for one checker invocation.
pub struct CheckRequest {
    /// File or directory to analyze.
    pub target: PathBuf,
    /// Working directory; defaults to the target (or its parent for files).
    pub cwd: Option<PathBuf>,
    pub include: Vec<String>,
    /// Only consulted when `include` is non-empty. Matched with `glob::Pattern`
    /// against the root-relative path and the file name.
    pub exclude: Vec<String>,
    /// Passed through to the checker before the path arguments.
    pub extra_args: Vec<String>,
    pub timeout: Duration,
    pub fail_on_severity: FailOn,
}

impl Default for CheckRequest {
    fn default() -> Self {
        Self {
            target: PathBuf::from("."),
            cwd: None,
            include: Vec::new(),
            exclude: Vec::new(),
            extra_args: Vec::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SEC),
            fail_on_severity: FailOn::None,
        }
    }
}

impl CheckRequest {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            ..Default::default()
        }
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_include(mut self, include: Vec<String>) -> Self {
        self.include = include;
        self
    }

    pub fn with_exclude(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn with_extra_args(mut self, extra_args: Vec<String>) -> Self {
        self.extra_args = extra_args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_fail_on_severity(mut self, fail_on: FailOn) -> Self {
        self.fail_on_severity = fail_on;
        self
    }
}

/// Terminal branch of a run.
enum Outcome {
    MissingTarget(PathBuf),
    ToolUnavailable,
    SpawnFailure(RunError),
    Timeout(Duration),
    Cancelled,
    MalformedOutput { exit_code: i32, tail: String },
    Parsed { exit_code: i32, report: RawReport },
}

/// Fields shared by every branch.
struct RunContext {
    command: Vec<String>,
    version: String,
    analyzed_root: PathBuf,
    checked_paths: Vec<String>,
    venv_path: String,
    fail_on: FailOn,
}

#[derive(Debug, Clone, Default)]
/// Executes the checker and normalizes its report.
///
/// By default the executable and environment are resolved per call; both can
/// be pinned for embedding or tests.
pub struct PyrightRunner {
    invocation: Option<Invocation>,
    env: Option<EnvSnapshot>,
    cancel: Option<CancelToken>,
}

impl PyrightRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed invocation instead of searching `PATH`.
    pub fn with_invocation(mut self, invocation: Invocation) -> Self {
        self.invocation = Some(invocation);
        self
    }

    /// Use a fixed environment snapshot instead of inspecting the process.
    pub fn with_env(mut self, env: EnvSnapshot) -> Self {
        self.env = Some(env);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn run_check(&self, req: CheckRequest) -> CheckResult {
        let env = self.env.clone().unwrap_or_else(EnvSnapshot::capture);
        let venv_path = detect_environment_path(&env);
        let invocation = self.invocation.clone().unwrap_or_else(resolve::resolve);
        let target = req.target.as_path();

        if !target.exists() {
            let root = req
                .cwd
                .clone()
                .unwrap_or_else(|| parent_dir(target).to_path_buf());
            let ctx = RunContext {
                command: Vec::new(),
                version: resolve::version_for(&invocation).version,
                analyzed_root: resolve_path(&root),
                checked_paths: Vec::new(),
                venv_path,
                fail_on: req.fail_on_severity,
            };
            return finish(Outcome::MissingTarget(target.to_path_buf()), ctx);
        }

        let glob_root = if target.is_dir() {
            resolve_path(target)
        } else {
            resolve_path(parent_dir(target))
        };
        let analyzed_root = match req.cwd.as_deref() {
            Some(cwd) => resolve_path(cwd),
            None => glob_root.clone(),
        };
        let path_args: Vec<String> = if req.include.is_empty() {
            vec![path_string(&resolve_path(target))]
        } else {
            targets::expand(&glob_root, &req.include, &req.exclude)
                .iter()
                .map(|p| path_string(p))
                .collect()
        };

        let mut ctx = RunContext {
            command: Vec::new(),
            version: String::new(),
            analyzed_root,
            checked_paths: path_args.clone(),
            venv_path,
            fail_on: req.fail_on_severity,
        };
        if !invocation.is_available() {
            return finish(Outcome::ToolUnavailable, ctx);
        }
        ctx.version = resolve::version_for(&invocation).version;

        let mut cmd = invocation.argv.clone();
        cmd.push("--outputjson".to_string());
        cmd.extend(req.extra_args.iter().cloned());
        cmd.extend(path_args);
        ctx.command = cmd;

        info!(command = ?ctx.command, root = %ctx.analyzed_root.display(), "running pyright");
        let run = process::run_with_cancel(
            &ctx.command,
            Some(&ctx.analyzed_root),
            req.timeout,
            self.cancel.as_ref(),
        );
        let outcome = match run {
            Err(RunError::Timeout(t)) => Outcome::Timeout(t),
            Err(RunError::Cancelled) => Outcome::Cancelled,
            Err(e) => Outcome::SpawnFailure(e),
            Ok(out) => match parse_report(&out.stdout) {
                Some(report) => Outcome::Parsed {
                    exit_code: out.exit_code,
                    report,
                },
                None => Outcome::MalformedOutput {
                    exit_code: out.exit_code,
                    tail: output_tail(&out.stdout, &out.stderr),
                },
            },
        };
        finish(outcome, ctx)
    }
}

fn finish(outcome: Outcome, ctx: RunContext) -> CheckResult {
    let mut result = CheckResult {
        ok: false,
        fail_reason: None,
        command: ctx.command,
        exit_code: INFRA_EXIT,
        summary: Summary::default(),
        diagnostics: Vec::new(),
        pyright_version: ctx.version,
        analyzed_root: path_string(&ctx.analyzed_root),
        checked_paths: ctx.checked_paths,
        venv_path: ctx.venv_path,
    };
    match outcome {
        Outcome::MissingTarget(target) => {
            result.exit_code = MISSING_TARGET_EXIT;
            result.fail_reason = Some(format!("Target path not found: {}", target.display()));
        }
        Outcome::ToolUnavailable => {
            warn!("pyright is not available");
            result.pyright_version.clear();
            result.fail_reason = Some(
                "Pyright not available (neither 'pyright' executable nor 'python -m pyright'). \
                 Install it with 'pip install pyright' or 'npm install -g pyright', \
                 or add pyright to your environment."
                    .to_string(),
            );
        }
        Outcome::SpawnFailure(e) => {
            warn!(error = %e, "failed to execute pyright");
            result.fail_reason = Some(format!(
                "Failed to execute Pyright ({}). Ensure 'pyright' is installed and on PATH.",
                e
            ));
        }
        Outcome::Timeout(t) => {
            result.fail_reason = Some(format!(
                "Timeout after {}s while running Pyright. \
                 Try increasing timeout_sec, reducing include scope, or enabling Pyright caching.",
                t.as_secs_f64()
            ));
        }
        Outcome::Cancelled => {
            result.fail_reason = Some("Pyright run was cancelled before completion.".to_string());
        }
        Outcome::MalformedOutput { exit_code, tail } => {
            warn!(exit_code, "pyright output is not a valid JSON report");
            result.exit_code = exit_code;
            result.fail_reason = Some(format!(
                "Failed to parse Pyright JSON output. Consider upgrading Pyright or \
                 checking CLI arguments. Output tail:\n{}",
                tail
            ));
        }
        Outcome::Parsed { exit_code, report } => {
            let diagnostics = normalize_diagnostics(&report.diagnostics, &ctx.analyzed_root);
            let (ok, reason) = threshold::evaluate(&diagnostics, ctx.fail_on);
            debug!(exit_code, count = diagnostics.len(), ok, "pyright report normalized");
            result.ok = ok;
            result.fail_reason = reason;
            result.exit_code = exit_code;
            result.summary = normalize_summary(&report.summary);
            result.diagnostics = diagnostics;
            if let Some(v) = report.version {
                result.pyright_version = v;
            }
        }
    }
    result
}

fn parent_dir(p: &Path) -> &Path {
    match p.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Last characters of the combined output, for debugging parse failures.
fn output_tail(stdout: &str, stderr: &str) -> String {
    let combined = format!("{}\n{}", stdout, stderr);
    let trimmed = combined.trim();
    match trimmed.char_indices().rev().nth(OUTPUT_TAIL_CHARS - 1) {
        Some((i, _)) => trimmed[i..].to_string(),
        None => trimmed.to_string(),
    }
}
