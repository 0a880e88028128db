//! substrscan - recursive whitespace-token substring search
//!
//! substrscan provides:
//! - Recursive file walking under a root directory
//! - Whitespace tokenization with best-effort UTF-8 decoding
//! - Literal substring filtering with optional per-file deduplication
//! - Streaming output to stdout or to a file

use anyhow::Result;
use clap::Parser;

mod backends;
mod cli;
mod core;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::run(cli)
}
