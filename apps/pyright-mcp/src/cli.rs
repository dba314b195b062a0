//! CLI argument parsing via `clap`.

use crate::models::FailOn;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "pyright-mcp",
    version,
    about = "Run Pyright and print normalized JSON diagnostics",
    long_about = "Run Pyright with --outputjson and print one canonical JSON result to stdout.\n\nExit code: 0 if ok=true, 1 if ok=false (threshold breach or infrastructure failure).\n\nConfiguration precedence: CLI > pyright-mcp.toml > defaults.",
    after_help = "Examples:\n  pyright-mcp src\n  pyright-mcp . --include 'src/**/*.py' --exclude 'tests/*' --fail-on-severity error\n  pyright-mcp . --extra-arg --pythonversion --extra-arg 3.12"
)]
/// Command-line options for a single check.
pub struct Cli {
    #[arg(default_value = ".", help = "File or directory to analyze")]
    pub target: String,
    #[arg(long, help = "Working directory to run from")]
    pub cwd: Option<String>,
    #[arg(long = "include", value_name = "GLOB", help = "Glob to include (repeatable). Resolved under the target root")]
    pub include: Vec<String>,
    #[arg(long = "exclude", value_name = "GLOB", help = "Glob to exclude (repeatable). Filters the include set")]
    pub exclude: Vec<String>,
    #[arg(
        long = "extra-arg",
        value_name = "ARG",
        allow_hyphen_values = true,
        help = "Pass-through CLI arg to Pyright (repeatable), e.g. --extra-arg --pythonversion --extra-arg 3.12"
    )]
    pub extra_args: Vec<String>,
    #[arg(long, value_name = "SECONDS", help = "Timeout in seconds for the Pyright subprocess (default: 60)")]
    pub timeout_sec: Option<u64>,
    #[arg(
        long,
        value_name = "LEVEL",
        value_parser = parse_fail_on,
        help = "Exit 1 if any diagnostic meets/exceeds this level: none|information|warning|error (default: none)"
    )]
    pub fail_on_severity: Option<FailOn>,
    #[arg(long, value_parser = ["json", "human"], help = "Output mode: json|human (default: json)")]
    pub output: Option<String>,
    #[arg(short, long, help = "Log progress to stderr")]
    pub verbose: bool,
    #[arg(long, help = "Log debug details to stderr")]
    pub debug: bool,
}

fn parse_fail_on(s: &str) -> Result<FailOn, String> {
    s.parse()
}
