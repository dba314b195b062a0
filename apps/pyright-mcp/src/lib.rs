//! pyright-mcp core library.
//!
//! Runs the Pyright type checker as a bounded subprocess and republishes its
//! `--outputjson` report as a normalized, deterministically ordered result.
//!
//! High-level modules:
//! - `runner`: Check orchestration (`PyrightRunner::run_check`).
//! - `resolve`: Locating the checker and probing its version.
//! - `targets`: Include/exclude glob expansion.
//! - `process`: Subprocess execution with timeout and cancellation.
//! - `parse`: Report parsing, normalization, and ordering.
//! - `threshold`: Severity threshold verdicts.
//! - `env`: Python environment path detection.
//! - `discovery`: Upward search for `pyrightconfig.json` / `pyproject.toml`.
//! - `config`: Settings file discovery and precedence with CLI flags.
//! - `models`: Result, diagnostic, and version data models.
//! - `output`: Canonical JSON and human printers.
//! - `server`: Tool-protocol server over stdio.
//! - `cli`: CLI argument parsing (binary uses this).
//! - `utils`: Supporting helpers.
pub mod cli;
pub mod config;
pub mod discovery;
pub mod env;
pub mod models;
pub mod output;
pub mod parse;
pub mod process;
pub mod resolve;
pub mod runner;
pub mod server;
pub mod targets;
pub mod threshold;
pub mod utils;

pub use models::{CheckResult, ConfigLocation, Diagnostic, FailOn, Severity, Summary, VersionInfo};
pub use runner::{CheckRequest, PyrightRunner};
