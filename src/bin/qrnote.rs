//! Interactive QR message generator.
//!
//! Thin shim over the library: sets up logging, runs the prompt session on standard
//! input/output, and turns interrupts and errors into a final message. Only Ctrl-C counts as
//! an interrupt; input that ends early is an error like any other.

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use qrnote::session::Session;
use qrnote::SessionConfig;
use tracing_subscriber::EnvFilter;

const FAREWELL: &str = "\n\nProgram terminated by user.";

/// Write a message as an HTML card and get a QR code that opens it.
///
/// All input is asked for interactively.
#[derive(Parser, Debug)]
#[command(name = "qrnote", version, about)]
struct Cli {
    /// Log more details to stderr (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

enum Outcome {
    Finished,
    Interrupted,
}

/// Logs go to stderr so they never interleave with the prompts on stdout.
fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> Result<Outcome> {
    let session = tokio::task::spawn_blocking(|| {
        let config = SessionConfig::default();
        let mut session = Session::new(config, io::stdin().lock(), io::stdout());
        session.run()
    });

    tokio::select! {
        joined = session => {
            joined.context("prompt session stopped unexpectedly")??;
            Ok(Outcome::Finished)
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for ctrl-c")?;
            Ok(Outcome::Interrupted)
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match run().await {
        Ok(Outcome::Finished) => 0,
        Ok(Outcome::Interrupted) => {
            println!("{FAREWELL}");
            0
        }
        Err(e) => {
            tracing::debug!(error = ?e, "session failed");
            println!("\nAn error occurred: {e}");
            1
        }
    };
    let _ = io::stdout().flush();

    // The prompt thread may still be blocked on stdin, which would keep the runtime from
    // shutting down; leave without waiting for it.
    std::process::exit(code)
}
