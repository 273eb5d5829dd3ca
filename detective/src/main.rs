//! Data detective command-line tool.
//!
//! Connects the sources given with `--source`, then runs one tool and
//! prints its JSON report, or serves JSON tool calls from stdin.
//!
//! # Guarantees
//! - Sources are only read; SQLite databases are attached read-only
//! - Results go to stdout, logs to stderr
//! - Any failure is reported as a JSON error document with exit code 1

use anyhow::Context;
use clap::Parser;
use detective::output::{self, EXIT_FAILURE};
use detective::{Cli, Command, Session};
use detective_core::logging::init_logging;
use std::io;
use tracing::info;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)?;

    let mut session = Session::new(cli.query_limit)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Err(err) = session.connect_all(&cli.sources) {
        output::emit(&mut out, Err(err)).context("Failed to write error report")?;
        std::process::exit(EXIT_FAILURE);
    }
    info!(
        sources = session.registry().source_count(),
        query_limit = session.query_limit(),
        "Session ready"
    );

    match cli.command {
        Command::Tool(call) => {
            let code = output::emit(&mut out, session.dispatch(&call))
                .context("Failed to write tool report")?;
            if code != 0 {
                std::process::exit(code);
            }
        }
        Command::Serve => {
            let stdin = io::stdin();
            output::serve(&mut session, stdin.lock(), &mut out)
                .context("Serve loop failed")?;
        }
    }

    Ok(())
}
