//! turbojpeg-harness - smoke tests for the linked libjpeg-turbo
//!
//! `report` lists the JPEG scaling factors the library supports on the diagnostic
//! sink; `probe` checks a JPEG file against them.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

mod geometry;
mod probe;
mod report;
mod scaling;

use probe::ProbeOptions;
use report::{report_scaling_factors, SinkKind, DIAG_TARGET};
use scaling::TurboJpegTable;

/// Query libjpeg-turbo for its supported scaling factors
#[derive(Parser, Debug)]
#[command(name = "turbojpeg-harness")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Where diagnostic lines go
    #[arg(long, global = true, value_enum, default_value = "trace")]
    sink: SinkKind,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every supported scaling factor (the default)
    Report,

    /// Show how a JPEG file scales at every supported factor
    Probe {
        /// JPEG file to inspect
        file: PathBuf,

        /// Smallest acceptable short side, in pixels, after scaling
        #[arg(short, long)]
        target: Option<usize>,

        /// Decode at the chosen factor
        #[arg(long)]
        decode: bool,
    },
}

/// Log filter: `base` plus a level from the `-v` count, with the diagnostic target
/// always enabled at debug.
fn log_filter(base: EnvFilter, verbose: u8) -> EnvFilter {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let mut filter = base.add_directive(level.into());
    match format!("{}=debug", DIAG_TARGET).parse::<Directive>() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(e) => eprintln!("Invalid diagnostic filter directive: {}", e),
    }
    filter
}

fn init_tracing(verbose: u8) {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(EnvFilter::from_default_env(), verbose))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command.unwrap_or(Command::Report) {
        Command::Report => {
            let mut sink = cli.sink.open();
            report_scaling_factors(&TurboJpegTable, sink.as_mut());
            info!("Scaling factor report complete");
        }
        Command::Probe {
            file,
            target,
            decode,
        } => {
            let report = probe::probe(&file, &TurboJpegTable, ProbeOptions { target, decode })?;
            for line in report.lines() {
                println!("{}", line);
            }
        }
    }

    Ok(())
}
