use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use oscbatch_core::{Relay, RelayConfig, UdpTransport, build_layout_report, build_relay_report};

/// Read timeout on the relay socket so the flush budget is checked even
/// while the inbound stream is idle.
const RECV_TIMEOUT: Duration = Duration::from_millis(250);

#[derive(Parser, Debug)]
#[command(name = "oscbatch")]
#[command(version)]
#[command(long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (", env!("OSCBATCH_BUILD_COMMIT"), " ", env!("OSCBATCH_BUILD_DATE"), ")"
))]
#[command(
    about = "Batching relay for fixed-shape OSC sensor streams over UDP.",
    long_about = None,
    after_help = "Examples:\n  oscbatch relay check relay.json --pretty\n  oscbatch relay run relay.json\n  oscbatch relay run relay.json --max-blobs 100 -o report.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Operations on a batching relay configuration.
    Relay {
        #[command(subcommand)]
        command: RelayCommands,
    },
}

#[derive(Subcommand, Debug)]
enum RelayCommands {
    /// Validate a configuration and print the computed packet layout as JSON.
    Check {
        /// Path to a JSON configuration file
        config: PathBuf,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Run the relay loop, then emit a traffic report.
    Run {
        /// Path to a JSON configuration file
        config: PathBuf,

        /// Stop after this many flushes (default: run until terminated)
        #[arg(long)]
        max_blobs: Option<u64>,

        /// Traffic report path (JSON)
        #[arg(short = 'o', long)]
        report: Option<PathBuf>,

        /// Write the traffic report to stdout
        #[arg(long, conflicts_with = "report")]
        stdout: bool,

        /// Pretty-print JSON output
        #[arg(long, conflicts_with = "compact")]
        pretty: bool,

        /// Compact JSON output (default)
        #[arg(long)]
        compact: bool,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Relay { command } => match command {
            RelayCommands::Check { config, pretty } => cmd_relay_check(config, pretty),
            RelayCommands::Run {
                config,
                max_blobs,
                report,
                stdout,
                pretty,
                compact,
                quiet,
            } => cmd_relay_run(config, max_blobs, report, stdout, pretty, compact, quiet),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(err.to_string(), None)
    }
}

fn cmd_relay_check(config_path: PathBuf, pretty: bool) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let layout = config.validate().map_err(|err| {
        CliError::new(
            format!("invalid configuration: {}", err),
            Some("adjust the configuration before starting the relay".to_string()),
        )
    })?;

    let report = build_layout_report(&config, &layout);
    let json = serialize_report(&report, pretty, false)?;
    println!("{}", json);
    Ok(())
}

fn cmd_relay_run(
    config_path: PathBuf,
    max_blobs: Option<u64>,
    report: Option<PathBuf>,
    stdout: bool,
    pretty: bool,
    compact: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let config = load_config(&config_path)?;
    let mut relay = Relay::new(&config).map_err(|err| {
        CliError::new(
            format!("invalid configuration: {}", err),
            Some("run `oscbatch relay check` to inspect the configuration".to_string()),
        )
    })?;

    let listen = config
        .listen_addr()
        .map_err(|err| CliError::new(err.to_string(), None))?;
    let destination = config
        .destination_addr()
        .map_err(|err| CliError::new(err.to_string(), None))?;
    let mut transport = UdpTransport::bind(listen, destination, Some(RECV_TIMEOUT))
        .map_err(|err| {
            CliError::new(
                err.to_string(),
                Some("check that the listen port is free".to_string()),
            )
        })?;

    if !quiet {
        eprintln!(
            "OK: relaying {} -> {} ({} x {} floats per blob)",
            listen, destination, config.msgs_per_blob, config.floats_per_msg
        );
    }

    let stop = AtomicBool::new(false);
    relay.run(&mut transport, &stop, max_blobs);

    let traffic_report = build_relay_report(&config, relay.stats());
    let json = serialize_report(&traffic_report, pretty, compact)?;

    if stdout {
        print!("{}", json);
        return Ok(());
    }

    if let Some(report_path) = report {
        if let Some(parent) = report_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create output directory: {}", parent.display())
                })?;
            }
        }
        fs::write(&report_path, json)
            .with_context(|| format!("Failed to write report: {}", report_path.display()))?;
        if !quiet {
            eprintln!("OK: report written -> {}", report_path.display());
        }
    } else if !quiet {
        eprintln!(
            "OK: {} blobs sent, {} datagrams received",
            traffic_report.traffic.blobs_sent, traffic_report.traffic.datagrams_received
        );
    }
    Ok(())
}

fn load_config(path: &PathBuf) -> Result<RelayConfig, CliError> {
    if !path.exists() {
        return Err(CliError::new(
            format!("configuration file not found: {}", path.display()),
            Some("pass the path to a JSON relay configuration".to_string()),
        ));
    }
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration: {}", path.display()))?;
    RelayConfig::from_json_str(&json).map_err(|err| {
        CliError::new(
            format!("invalid configuration '{}': {}", path.display(), err),
            Some("expected fields: listen, destination, in_address, floats_per_msg, msgs_per_blob".to_string()),
        )
    })
}

fn serialize_report<T: Serialize>(
    report: &T,
    pretty: bool,
    compact: bool,
) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if pretty {
        serde_json::to_string_pretty(report)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(report)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}
