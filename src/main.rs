use std::io::{self, IsTerminal};

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    cli::{Cli, Command},
    report::Report,
    resolver::Session,
};

mod authors;
mod cache;
mod cli;
mod config;
mod entry;
mod error;
mod extract;
mod fetch;
mod identifier;
mod metadata;
mod page;
mod report;
mod resolver;
mod translit;

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let color = std::env::var_os("NO_COLOR").is_none() && io::stderr().is_terminal();
    init_logging(args.verbose, color);

    let mut config = config::load(args.config.as_deref())?;
    args.apply(&mut config);
    tracing::debug!(?config, "configuration");

    let session = Session::new(config, args.format, args.with_abstract);
    if session.fetcher().cache().is_enabled() {
        tracing::debug!(dir = %session.fetcher().cache().dir().display(), "page cache");
    }

    let mut report = Report::new(color);
    match &args.command {
        Command::Fetch { from } => {
            for src in from {
                resolver::resolve_source(src, &session, &mut report);
            }
        }
        Command::Author { from } => {
            for src in from {
                resolver::resolve_author(src, &session, &mut report);
            }
        }
    }

    tracing::info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        "run finished"
    );
    report.write_entries(&mut io::stdout().lock())?;
    report.write_summary(&mut io::stderr().lock())?;
    Ok(())
}

fn init_logging(verbose: u8, color: bool) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| format!("elibib={level}"));
    tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .with_ansi(color),
        )
        .init();
}
