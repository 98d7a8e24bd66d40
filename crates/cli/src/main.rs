use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use qrlink_infra_common::{log_welcome, parse_log_level, setup_logging, LoggingConfig};
use qrlink_sdp_core::SdpKind;

mod commands;

/// Reduce, encode, decode and inspect qrlink codes by hand
#[derive(Parser, Debug)]
#[command(name = "qrlink", author, version, about, long_about = None)]
struct Args {
    /// Log level written to stderr (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn", env = "QRLINK_LOG_LEVEL")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Include source file and line in log records
    #[arg(long, global = true)]
    log_file_info: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Strip a negotiation document down to what fits a code
    Reduce {
        /// Document file, or `-` for stdin
        file: Option<PathBuf>,
    },

    /// Turn a negotiation document into a token
    Encode {
        /// Whether the document is an offer or an answer
        #[arg(short, long, default_value = "offer")]
        kind: SdpKind,

        /// Document file, or `-` for stdin
        file: Option<PathBuf>,
    },

    /// Print the document carried by a token
    Decode {
        /// The token, or `-` for stdin
        token: Option<String>,
    },

    /// Describe a token: kind, media sections, candidates and sizes
    Inspect {
        /// The token, or `-` for stdin
        token: Option<String>,
    },

    /// Print the effective controller configuration as TOML
    Config {
        /// `.toml` or `.json` file to load before environment overrides
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut logging = LoggingConfig::new(parse_log_level(&args.log_level)?, "qrlink");
    if args.json_logs {
        logging = logging.with_json();
    }
    if args.log_file_info {
        logging = logging.with_file_info();
    }
    setup_logging(logging)?;
    log_welcome("qrlink", env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Reduce { file } => {
            let reduced = commands::reduce_document(&read_document(file)?);
            info!(
                "Kept {} of {} lines ({} dropped), {} of {} candidates",
                reduced.report.lines_out,
                reduced.report.lines_in,
                reduced.report.lines_dropped(),
                reduced.report.candidates_kept,
                reduced.report.candidates_seen
            );
            print!("{}", reduced.text);
        }
        Command::Encode { kind, file } => {
            let envelope = commands::encode_document(kind, &read_document(file)?)?;
            info!(
                "Record {} bytes, token {} chars",
                envelope.record_len,
                envelope.token.len()
            );
            println!("{}", envelope.token);
        }
        Command::Decode { token } => {
            let description = commands::decode_token(&read_token(token)?)?;
            print!("{}", description.text);
        }
        Command::Inspect { token } => {
            print!("{}", commands::inspect_token(&read_token(token)?)?);
        }
        Command::Config { file } => {
            let config = commands::effective_config(file.as_deref())?;
            print!("{}", commands::render_config(&config)?);
        }
    }

    Ok(())
}

/// Read a document from a file, or stdin for `-` or no argument
fn read_document(file: Option<PathBuf>) -> Result<String> {
    match file {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display())),
        _ => read_stdin(),
    }
}

/// Take a token from the argument, or stdin for `-` or no argument
fn read_token(token: Option<String>) -> Result<String> {
    match token {
        Some(token) if token != "-" => Ok(token),
        _ => read_stdin(),
    }
}

fn read_stdin() -> Result<String> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read stdin")?;
    debug!("Read {} bytes from stdin", input.len());
    Ok(input)
}
