//! Display utilities and output formatting for the mqhist CLI.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use mqhist_lib::prelude::*;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// How decoded bars are rendered.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OutputSettings {
    pub(crate) format: OutputFormat,
    pub(crate) offset: TimeOffset,
    pub(crate) header: bool,
}

/// Write bars in the configured format.
pub(crate) fn write_bars<W: Write + Send>(
    bars: &[Bar],
    writer: W,
    settings: &OutputSettings,
) -> Result<()> {
    match settings.format {
        OutputFormat::Csv => CsvFormatter::new()
            .with_offset(settings.offset)
            .with_header(settings.header)
            .write_bars(bars, writer)?,
        OutputFormat::Json => JsonFormatter::new()
            .with_offset(settings.offset)
            .write_bars(bars, writer)?,
        OutputFormat::Ndjson => JsonFormatter::ndjson()
            .with_offset(settings.offset)
            .write_bars(bars, writer)?,
    }
    Ok(())
}

/// Open a buffered writer on `path`, or on stdout when no path is given.
pub(crate) fn open_output(path: Option<&Path>) -> Result<Box<dyn Write + Send>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(std::io::stdout()))),
    }
}

/// Parse an optional `±HHMM` time offset.
pub(crate) fn parse_time_offset(value: Option<&str>) -> Result<TimeOffset> {
    value.map_or(Ok(TimeOffset::ZERO), |s| {
        s.parse::<TimeOffset>()
            .with_context(|| format!("Invalid time offset: {s}"))
    })
}

/// File name of the bars converted from the archive of `month`: `YEAR-MM.<ext>`.
pub(crate) fn output_file_name(month: &ArchiveMonth, format: OutputFormat) -> String {
    format!("{}.{}", month, format.extension())
}

/// Create a progress bar over `len` items, hidden in quiet mode.
pub(crate) fn progress_bar(len: u64, unit: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {unit} {{msg}}"
            ))
            .expect("Invalid progress template")
            .progress_chars("=>-"),
    );
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_file_name() {
        let month = ArchiveMonth::new(2020, 9).unwrap();
        assert_eq!(output_file_name(&month, OutputFormat::Csv), "2020-09.csv");
        assert_eq!(output_file_name(&month, OutputFormat::Ndjson), "2020-09.ndjson");
    }

    #[test]
    fn test_json_output_applies_offset() {
        let bar = Bar::new(
            ArchiveMonth::new(2020, 9).unwrap().start(),
            117_000,
            117_010,
            116_995,
            117_003,
            8,
            BlockType::Absolute,
            1,
        );
        let settings = OutputSettings {
            format: OutputFormat::Ndjson,
            offset: parse_time_offset(Some("+0200")).unwrap(),
            header: false,
        };
        let mut output = Vec::new();
        write_bars(&[bar], &mut output, &settings).unwrap();

        let line = String::from_utf8(output).unwrap();
        assert!(line.starts_with("{\"time\":\"2020-09-01 02:00:00\",\"open\":1.17,"));
    }

    #[test]
    fn test_parse_time_offset() {
        assert_eq!(parse_time_offset(None).unwrap(), TimeOffset::ZERO);
        assert_eq!(parse_time_offset(Some("-0130")).unwrap().minutes(), -90);
        assert!(parse_time_offset(Some("2:00")).is_err());
    }
}
