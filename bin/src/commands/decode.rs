//! Decode command implementation.
//!
//! Decodes one archive and writes its bars, or its decrypted body in raw mode.

use crate::display::{OutputSettings, open_output, parse_time_offset, write_bars};
use anyhow::{Context, Result};
use mqhist_lib::prelude::*;
use std::io::Write as _;
use std::path::PathBuf;
use tracing::{info, warn};

/// Arguments of the decode command.
pub(crate) struct DecodeArgs {
    pub(crate) input: PathBuf,
    pub(crate) output: Option<PathBuf>,
    pub(crate) month: Option<String>,
    pub(crate) no_window: bool,
    pub(crate) time_offset: Option<String>,
    pub(crate) format: OutputFormat,
    pub(crate) header: bool,
    pub(crate) no_decompress: bool,
    pub(crate) report_anomalies: bool,
    pub(crate) quiet: bool,
}

/// Resolve the validity window month from the flag or the archive path.
fn resolve_month(args: &DecodeArgs) -> Result<Option<ArchiveMonth>> {
    if args.no_window {
        return Ok(None);
    }
    if let Some(s) = &args.month {
        let month = s
            .parse::<ArchiveMonth>()
            .with_context(|| format!("Invalid month: {s}"))?;
        return Ok(Some(month));
    }
    let inferred = month_from_path(&args.input);
    if inferred.is_none() {
        warn!(
            path = %args.input.display(),
            "cannot infer month from path, validity window disabled"
        );
    }
    Ok(inferred)
}

/// Decode a single archive.
pub(crate) fn decode(args: &DecodeArgs) -> Result<()> {
    let offset = parse_time_offset(args.time_offset.as_deref())?;
    let month = resolve_month(args)?;

    let mut options = DecodeOptions::new()
        .with_decompress(!args.no_decompress)
        .with_anomalies(args.report_anomalies);
    if let Some(month) = month {
        options = options.with_month(month);
    }

    let decoded = decode_archive_file(&args.input, &options)
        .with_context(|| format!("Failed to decode {}", args.input.display()))?;

    let mut writer = open_output(args.output.as_deref())?;
    match &decoded.contents {
        ArchiveContents::Raw(body) => {
            writer.write_all(body)?;
            info!(bytes = body.len(), "wrote decrypted body");
        }
        ArchiveContents::Bars {
            bars,
            anomalies,
            stats,
        } => {
            let settings = OutputSettings {
                format: args.format,
                offset,
                header: args.header,
            };
            write_bars(bars, &mut writer, &settings)?;
            info!(
                bars = bars.len(),
                suppressed = stats.suppressed,
                anomalies = anomalies.len(),
                "decoded archive"
            );
            if !args.quiet && args.report_anomalies {
                for anomaly in anomalies {
                    eprintln!("{anomaly}");
                }
            }
        }
    }
    writer.flush()?;

    if !args.quiet
        && let Some(output) = &args.output
    {
        println!("Output written to: {}", output.display());
    }

    Ok(())
}
