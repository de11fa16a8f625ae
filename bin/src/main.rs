//! mqhist CLI - decode and download monthly history archives.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;

use mqhist_lib::{ArchiveMonth, OutputFormat};

#[derive(Parser)]
#[command(name = "mqhist")]
#[command(about = "Decode encrypted monthly history archives into one-minute OHLCV bars", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress progress output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a single <md5>.dat archive
    Decode {
        /// Archive path; the file name must carry the MD5 digest
        input: PathBuf,

        /// Output file path. Defaults to stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Month the archive covers (YYYY-MM). Inferred from a .../YEAR/MM/ path if omitted
        #[arg(short, long)]
        month: Option<String>,

        /// Disable the month validity window
        #[arg(long, conflicts_with = "month")]
        no_window: bool,

        /// Offset added to timestamps, in +/-HHMM format
        #[arg(short, long, allow_hyphen_values = true)]
        time_offset: Option<String>,

        /// Output format: csv, json or ndjson
        #[arg(short, long, default_value = "csv")]
        format: OutputFormat,

        /// Write a CSV header row
        #[arg(long)]
        header: bool,

        /// Write the decrypted body without decompressing it
        #[arg(short = 'n', long)]
        no_decompress: bool,

        /// Report bars with inconsistent OHLC values
        #[arg(long)]
        report_anomalies: bool,
    },

    /// Write the decompressed block stream of an archive
    Dump {
        /// Archive path; the file name must carry the MD5 digest
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Decode every archive under a history directory
    ConvertAll {
        /// Root of a <PAIR>/<YEAR>/<MM>/ directory tree
        dir: PathBuf,

        /// Month every archive covers (YYYY-MM). Inferred from each .../YEAR/MM/ path if omitted
        #[arg(short, long)]
        month: Option<ArchiveMonth>,

        /// Disable the month validity window
        #[arg(long, conflicts_with = "month")]
        no_window: bool,

        /// Output format: csv, json or ndjson
        #[arg(short, long, default_value = "csv")]
        format: OutputFormat,

        /// Offset added to timestamps, in +/-HHMM format
        #[arg(short, long, allow_hyphen_values = true)]
        time_offset: Option<String>,

        /// Write a CSV header row
        #[arg(long)]
        header: bool,

        /// Report bars with inconsistent OHLC values
        #[arg(long)]
        report_anomalies: bool,

        /// Maximum archives decoded concurrently
        #[arg(long, default_value = "4")]
        concurrency: usize,
    },

    /// Download archives from the history server
    Download {
        /// Pairs to download, comma separated, or "all"
        #[arg(short, long, default_value = "all")]
        pairs: String,

        /// Years to download, comma separated, or "all"
        #[arg(short, long, default_value = "all")]
        years: String,

        /// Months to download, comma separated, or "all"
        #[arg(short, long, default_value = "all")]
        months: String,

        /// Directory to download archives into
        #[arg(short, long, default_value = "download/metaquotes")]
        destination: PathBuf,

        /// Convert each archive after download
        #[arg(short, long)]
        convert: bool,

        /// Offset added to timestamps when converting, in +/-HHMM format
        #[arg(short, long, allow_hyphen_values = true)]
        time_offset: Option<String>,

        /// Maximum concurrent downloads
        #[arg(long, default_value = "4")]
        concurrency: usize,
    },
}

/// Install the global subscriber; `RUST_LOG` overrides the verbosity flags.
fn init_tracing(verbose: u8, quiet: bool) {
    let default_level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    // Show help if no command provided
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Decode {
            input,
            output,
            month,
            no_window,
            time_offset,
            format,
            header,
            no_decompress,
            report_anomalies,
        } => commands::decode::decode(&commands::decode::DecodeArgs {
            input,
            output,
            month,
            no_window,
            time_offset,
            format,
            header,
            no_decompress,
            report_anomalies,
            quiet: cli.quiet,
        }),
        Commands::Dump { input, output } => commands::dump::dump(&input, &output, cli.quiet),
        Commands::ConvertAll {
            dir,
            month,
            no_window,
            format,
            time_offset,
            header,
            report_anomalies,
            concurrency,
        } => {
            commands::convert_all::convert_all(&commands::convert_all::ConvertAllArgs {
                dir,
                format,
                month,
                no_window,
                time_offset,
                header,
                report_anomalies,
                concurrency,
                quiet: cli.quiet,
            })
            .await
        }
        Commands::Download {
            pairs,
            years,
            months,
            destination,
            convert,
            time_offset,
            concurrency,
        } => {
            commands::download::download(&commands::download::DownloadArgs {
                pairs,
                years,
                months,
                destination,
                convert,
                time_offset,
                concurrency,
                quiet: cli.quiet,
            })
            .await
        }
    }
}
