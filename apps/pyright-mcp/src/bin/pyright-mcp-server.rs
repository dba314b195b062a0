//! `pyright-mcp-server`: tool-protocol server over stdio.

use anyhow::Result;
use clap::Parser;
use pyright_mcp::{server, utils};

#[derive(Parser)]
#[command(
    name = "pyright-mcp-server",
    version,
    about = "Serve pyright_check, pyright_version and find_pyright_config over stdio"
)]
struct Args {
    #[arg(short, long, help = "Log progress to stderr")]
    verbose: bool,
    #[arg(long, help = "Log debug details to stderr")]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    utils::init_logging(args.verbose, args.debug);
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    server::serve(stdin.lock(), stdout.lock())
}
