//! `pyright-mcp` CLI entry point.
//! Resolves settings, runs one check, and prints the result.

use anyhow::{Context, Result};
use clap::Parser;
use pyright_mcp::cli::Cli;
use pyright_mcp::config::{self, Overrides};
use pyright_mcp::output;
use pyright_mcp::runner::PyrightRunner;
use pyright_mcp::utils;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Repeatable flags left empty defer to the settings file.
fn given(v: &[String]) -> Option<Vec<String>> {
    (!v.is_empty()).then(|| v.to_vec())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    utils::init_logging(cli.verbose, cli.debug);

    if let Some(cwd) = cli.cwd.as_deref() {
        if !Path::new(cwd).is_dir() {
            eprintln!(
                "{} working directory does not exist: {}",
                utils::error_prefix(),
                cwd
            );
            std::process::exit(2);
        }
    }

    let target = PathBuf::from(&cli.target);
    let cwd = cli.cwd.as_ref().map(PathBuf::from);
    let start = config::search_start(&target, cwd.as_deref());
    let eff = config::resolve_effective(
        &start,
        Overrides {
            timeout_sec: cli.timeout_sec,
            fail_on_severity: cli.fail_on_severity,
            include: given(&cli.include),
            exclude: given(&cli.exclude),
            extra_args: given(&cli.extra_args),
            output: cli.output.clone(),
        },
    );
    if let Some(p) = eff.settings_path.as_ref() {
        if cli.verbose || cli.debug {
            eprintln!("{} using settings from {}", utils::note_prefix(), p.display());
        }
    }

    let result = PyrightRunner::new().run_check(eff.to_request(target, cwd));
    let rendered = output::render_check(&result, &eff.output).context("serialize result")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", rendered).context("write result")?;
    out.flush().context("flush stdout")?;
    drop(out);

    std::process::exit(if result.ok { 0 } else { 1 });
}
