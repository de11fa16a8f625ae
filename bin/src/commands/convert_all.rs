//! Batch conversion command.
//!
//! Finds every archive under a `<PAIR>/<YEAR>/<MM>/` tree and writes the
//! decoded bars next to each one as `<YEAR>-<MM>.<ext>`.

use crate::display::{
    OutputSettings, open_output, output_file_name, parse_time_offset, progress_bar, write_bars,
};
use anyhow::{Context, Result, bail};
use futures::stream::{self, StreamExt};
use mqhist_lib::prelude::*;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Arguments of the convert-all command.
pub(crate) struct ConvertAllArgs {
    pub(crate) dir: PathBuf,
    pub(crate) format: OutputFormat,
    pub(crate) month: Option<ArchiveMonth>,
    pub(crate) no_window: bool,
    pub(crate) time_offset: Option<String>,
    pub(crate) header: bool,
    pub(crate) report_anomalies: bool,
    pub(crate) concurrency: usize,
    pub(crate) quiet: bool,
}

/// Settings shared by every archive of a batch.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ConvertSettings {
    pub(crate) output: OutputSettings,
    pub(crate) report_anomalies: bool,
    /// Month applied to every archive instead of the one in its path.
    pub(crate) month: Option<ArchiveMonth>,
    /// Suppress absolute records outside the archive month.
    pub(crate) window: bool,
}

/// Outcome of converting one archive.
#[derive(Debug)]
pub(crate) struct Converted {
    pub(crate) output: PathBuf,
    pub(crate) bars: usize,
    pub(crate) anomalies: usize,
}

/// Recursively collect `*.dat` files under `dir`, sorted by path.
///
/// Symlinked directories are not followed.
pub(crate) fn discover_archives(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let entries = std::fs::read_dir(&current)
            .with_context(|| format!("Failed to read directory {}", current.display()))?;
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "dat") {
                found.push(path);
            }
        }
    }

    found.sort();
    Ok(found)
}

/// Decode one archive and write its bars beside it.
///
/// The output is named `<YEAR>-<MM>.<ext>` when the month is known and
/// `<stem>.<ext>` otherwise.
pub(crate) fn convert_archive(
    path: &Path,
    month: Option<ArchiveMonth>,
    settings: &ConvertSettings,
) -> Result<Converted> {
    let mut options = DecodeOptions::new().with_anomalies(settings.report_anomalies);
    if settings.window
        && let Some(month) = month
    {
        options = options.with_month(month);
    }
    let decoded = decode_archive_file(path, &options)
        .with_context(|| format!("Failed to decode {}", path.display()))?;

    let format = settings.output.format;
    let output = month.map_or_else(
        || path.with_extension(format.extension()),
        |month| path.with_file_name(output_file_name(&month, format)),
    );
    let mut writer = open_output(Some(output.as_path()))?;
    write_bars(decoded.bars(), &mut writer, &settings.output)?;
    writer.flush()?;

    debug!(archive = %path.display(), output = %output.display(), bars = decoded.bars().len(), "converted");
    Ok(Converted {
        output,
        bars: decoded.bars().len(),
        anomalies: decoded.anomalies().len(),
    })
}

/// Convert a discovered archive, taking its month from the settings or from
/// its `YEAR/MM` path components.
fn convert_discovered(path: &Path, settings: &ConvertSettings) -> Result<Converted> {
    let month = settings.month.or_else(|| month_from_path(path));
    if month.is_none() && settings.window {
        bail!(
            "Cannot infer month from path {}; pass --month or --no-window",
            path.display()
        );
    }
    convert_archive(path, month, settings)
}

/// Execute the convert-all command.
pub(crate) async fn convert_all(args: &ConvertAllArgs) -> Result<()> {
    let settings = ConvertSettings {
        output: OutputSettings {
            format: args.format,
            offset: parse_time_offset(args.time_offset.as_deref())?,
            header: args.header,
        },
        report_anomalies: args.report_anomalies,
        month: args.month,
        window: !args.no_window,
    };
    let dir = args.dir.as_path();
    let quiet = args.quiet;

    let archives = discover_archives(dir)?;
    if archives.is_empty() {
        bail!("No archives found under {}", dir.display());
    }
    info!(count = archives.len(), dir = %dir.display(), "discovered archives");

    let progress = progress_bar(archives.len() as u64, "archives", quiet);

    let results: Vec<(PathBuf, Result<Converted>)> = stream::iter(archives)
        .map(move |path| async move {
            let task_path = path.clone();
            let result =
                tokio::task::spawn_blocking(move || convert_discovered(&task_path, &settings))
                    .await
                    .context("Conversion task panicked")
                    .and_then(|r| r);
            (path, result)
        })
        .buffer_unordered(args.concurrency.max(1))
        .inspect(|_| progress.inc(1))
        .collect()
        .await;

    let (successes, failures): (Vec<_>, Vec<_>) =
        results.into_iter().partition(|(_, r)| r.is_ok());
    let total_bars: usize = successes
        .iter()
        .filter_map(|(_, r)| r.as_ref().ok())
        .map(|c| c.bars)
        .sum();
    let total_anomalies: usize = successes
        .iter()
        .filter_map(|(_, r)| r.as_ref().ok())
        .map(|c| c.anomalies)
        .sum();
    progress.finish_with_message(format!("{total_bars} bars"));

    if !quiet {
        println!("\nConversion complete:");
        println!("  Successful: {}", successes.len());
        println!("  Bars: {total_bars}");
        if args.report_anomalies {
            println!("  Anomalies: {total_anomalies}");
        }
        if !failures.is_empty() {
            println!("  Failed: {}", failures.len());
            for (path, result) in &failures {
                if let Err(e) = result {
                    println!("    {}: {e:#}", path.display());
                }
            }
        }
    }

    if !failures.is_empty() {
        bail!(
            "{} out of {} archives failed",
            failures.len(),
            successes.len() + failures.len()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mqhist_lib::{AbsoluteRecord, ArchiveBuilder, BlockWriter, BuiltArchive};

    fn sample_archive() -> BuiltArchive {
        let record = AbsoluteRecord {
            timestamp: 1_598_918_400, // 2020-09-01 00:00:00 UTC
            open: 117_000,
            high_offset: 10,
            low_offset: 5,
            close_offset: 3,
            volume: 8,
        };
        ArchiveBuilder::new(BlockWriter::new().absolute(&[record]).finish())
            .build()
            .unwrap()
    }

    fn csv_settings() -> ConvertSettings {
        ConvertSettings {
            output: OutputSettings {
                format: OutputFormat::Csv,
                offset: TimeOffset::ZERO,
                header: false,
            },
            report_anomalies: false,
            month: None,
            window: true,
        }
    }

    const SAMPLE_CSV: &str = "2020-09-01 00:00:00,1.17000,1.17010,1.16995,1.17003,8\n";

    #[test]
    fn test_discover_archives() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("EURUSD/2020/09");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("a.dat"), b"").unwrap();
        std::fs::write(nested.join("2020-09.csv"), b"").unwrap();
        std::fs::write(dir.path().join("b.dat"), b"").unwrap();

        let found = discover_archives(dir.path()).unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| p.extension().unwrap() == "dat"));
    }

    #[test]
    fn test_convert_writes_beside_archive() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("EURUSD/2020/09");
        std::fs::create_dir_all(&nested).unwrap();
        let path = sample_archive().write_to(&nested).unwrap();

        let converted = convert_discovered(&path, &csv_settings()).unwrap();

        assert_eq!(converted.output, nested.join("2020-09.csv"));
        assert_eq!(converted.bars, 1);
        let csv = std::fs::read_to_string(&converted.output).unwrap();
        assert_eq!(csv, SAMPLE_CSV);
    }

    #[test]
    fn test_convert_outside_month_emits_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("EURUSD/2020/10");
        std::fs::create_dir_all(&nested).unwrap();
        let path = sample_archive().write_to(&nested).unwrap();

        let converted = convert_discovered(&path, &csv_settings()).unwrap();
        assert_eq!(converted.bars, 0);
        assert_eq!(std::fs::read_to_string(&converted.output).unwrap(), "");
    }

    #[test]
    fn test_convert_requires_month_in_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample_archive().write_to(dir.path()).unwrap();
        assert!(convert_discovered(&path, &csv_settings()).is_err());
    }

    #[test]
    fn test_month_flag_overrides_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample_archive().write_to(dir.path()).unwrap();
        let settings = ConvertSettings {
            month: Some(ArchiveMonth::new(2020, 9).unwrap()),
            ..csv_settings()
        };

        let converted = convert_discovered(&path, &settings).unwrap();
        assert_eq!(converted.output, dir.path().join("2020-09.csv"));
        assert_eq!(std::fs::read_to_string(&converted.output).unwrap(), SAMPLE_CSV);
    }

    #[test]
    fn test_month_flag_applies_window() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("EURUSD/2020/09");
        std::fs::create_dir_all(&nested).unwrap();
        let path = sample_archive().write_to(&nested).unwrap();
        let settings = ConvertSettings {
            month: Some(ArchiveMonth::new(2020, 10).unwrap()),
            ..csv_settings()
        };

        let converted = convert_discovered(&path, &settings).unwrap();
        assert_eq!(converted.output, nested.join("2020-10.csv"));
        assert_eq!(converted.bars, 0);
    }

    #[test]
    fn test_no_window_without_month() {
        let dir = tempfile::tempdir().unwrap();
        let archive = sample_archive();
        let path = archive.write_to(dir.path()).unwrap();
        let settings = ConvertSettings {
            window: false,
            ..csv_settings()
        };

        let converted = convert_discovered(&path, &settings).unwrap();
        assert_eq!(
            converted.output,
            dir.path().join(format!("{}.csv", archive.digest))
        );
        assert_eq!(converted.bars, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_skips_symlinked_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("EURUSD/2020/09");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("a.dat"), b"").unwrap();
        std::os::unix::fs::symlink(dir.path(), nested.join("loop")).unwrap();

        let found = discover_archives(dir.path()).unwrap();
        assert_eq!(found, vec![nested.join("a.dat")]);
    }

    #[tokio::test]
    async fn test_batch_continues_past_failed_archive() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("EURUSD/2020/09");
        std::fs::create_dir_all(&nested).unwrap();
        sample_archive().write_to(&nested).unwrap();
        std::fs::write(nested.join(format!("{}.dat", "0".repeat(32))), b"not an archive").unwrap();

        let args = ConvertAllArgs {
            dir: dir.path().to_path_buf(),
            format: OutputFormat::Csv,
            month: None,
            no_window: false,
            time_offset: None,
            header: false,
            report_anomalies: false,
            concurrency: 2,
            quiet: true,
        };

        let err = convert_all(&args).await.unwrap_err();
        assert!(err.to_string().contains("1 out of 2 archives failed"));
        let csv = std::fs::read_to_string(nested.join("2020-09.csv")).unwrap();
        assert_eq!(csv, SAMPLE_CSV);
    }
}
