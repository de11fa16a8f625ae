//! Download command implementation.
//!
//! Fetches each pair's list file, downloads the archives of the requested
//! months into `<destination>/<PAIR>/<YEAR>/<MM>/` and optionally converts
//! them right away.

use crate::commands::convert_all::{ConvertSettings, convert_archive};
use crate::display::{OutputSettings, parse_time_offset, progress_bar};
use anyhow::{Context, Result, bail};
use chrono::Datelike;
use futures::stream::{self, StreamExt};
use mqhist_lib::prelude::*;
use mqhist_lib::is_known_pair;
use std::path::PathBuf;
use tracing::{info, warn};

/// First year the history server could hold archives for.
const FIRST_YEAR: i32 = 1970;

/// Arguments of the download command.
pub(crate) struct DownloadArgs {
    pub(crate) pairs: String,
    pub(crate) years: String,
    pub(crate) months: String,
    pub(crate) destination: PathBuf,
    pub(crate) convert: bool,
    pub(crate) time_offset: Option<String>,
    pub(crate) concurrency: usize,
    pub(crate) quiet: bool,
}

/// Parse a comma separated pair list, or `all`.
fn parse_pairs(value: &str) -> Vec<String> {
    if value.eq_ignore_ascii_case("all") {
        return DEFAULT_PAIRS.iter().map(|p| (*p).to_string()).collect();
    }
    value
        .split(',')
        .map(|p| p.trim().to_uppercase())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Parse a comma separated year list, or `all` (1970 through the current year).
fn parse_years(value: &str) -> Result<Vec<i32>> {
    if value.eq_ignore_ascii_case("all") {
        return Ok((FIRST_YEAR..=chrono::Utc::now().year()).collect());
    }
    value
        .split(',')
        .map(|y| {
            y.trim()
                .parse::<i32>()
                .with_context(|| format!("Invalid year: {y}"))
        })
        .collect()
}

/// Parse a comma separated month list, or `all`.
fn parse_months(value: &str) -> Result<Vec<u32>> {
    if value.eq_ignore_ascii_case("all") {
        return Ok((1..=12).collect());
    }
    value
        .split(',')
        .map(|m| {
            let month = m
                .trim()
                .parse::<u32>()
                .with_context(|| format!("Invalid month: {m}"))?;
            if !(1..=12).contains(&month) {
                bail!("Invalid month: {m}");
            }
            Ok(month)
        })
        .collect()
}

/// Counters reported at the end of a download run.
#[derive(Debug, Default)]
struct Summary {
    downloaded: usize,
    skipped: usize,
    missing: usize,
    converted: usize,
    failures: Vec<String>,
}

/// Download (and optionally convert) one archive.
async fn fetch_archive(
    client: &DownloadClient,
    destination: &std::path::Path,
    pair: &str,
    month: ArchiveMonth,
    file: &str,
    convert: Option<ConvertSettings>,
) -> Result<(DownloadOutcome, bool)> {
    let path = history_path(destination, pair, month.year(), month.month(), file);
    let url = client.file_url(pair, file);
    let outcome = client
        .download_to(&url, &path)
        .await
        .with_context(|| format!("Failed to download {url}"))?;

    let Some(settings) = convert else {
        return Ok((outcome, false));
    };
    if outcome == DownloadOutcome::Missing {
        return Ok((outcome, false));
    }

    tokio::task::spawn_blocking(move || convert_archive(&path, Some(month), &settings))
        .await
        .context("Conversion task panicked")??;
    Ok((outcome, true))
}

/// Execute the download command.
pub(crate) async fn download(args: &DownloadArgs) -> Result<()> {
    let pairs = parse_pairs(&args.pairs);
    let years = parse_years(&args.years)?;
    let months = parse_months(&args.months)?;
    let convert = if args.convert {
        Some(ConvertSettings {
            output: OutputSettings {
                format: OutputFormat::Csv,
                offset: parse_time_offset(args.time_offset.as_deref())?,
                header: false,
            },
            report_anomalies: false,
            month: None,
            window: true,
        })
    } else {
        None
    };

    let config = ClientConfig {
        concurrency: args.concurrency.max(1),
        ..Default::default()
    };
    let client = DownloadClient::new(config)?;
    let mut summary = Summary::default();

    for pair in &pairs {
        if !is_known_pair(pair) {
            warn!(pair = %pair, "pair is not in the default list, trying anyway");
        }

        let list = match client.fetch_list(pair).await {
            Ok(list) => list,
            Err(e) => {
                summary.failures.push(format!("{pair}: {e}"));
                continue;
            }
        };

        let mut wanted = Vec::new();
        for &year in &years {
            for &month in &months {
                if let Some(file) = find_history_file(&list, pair, year, month) {
                    wanted.push((ArchiveMonth::new(year, month)?, file.to_string()));
                }
            }
        }
        info!(pair = %pair, available = list.len(), selected = wanted.len(), "resolved archives");
        if wanted.is_empty() {
            continue;
        }

        let progress = progress_bar(wanted.len() as u64, "archives", args.quiet);
        progress.set_message(pair.clone());

        let results: Vec<_> = stream::iter(wanted)
            .map(|(month, file)| {
                let client = &client;
                async move {
                    let result =
                        fetch_archive(client, &args.destination, pair, month, &file, convert)
                            .await;
                    (month, result)
                }
            })
            .buffer_unordered(args.concurrency.max(1))
            .inspect(|_| progress.inc(1))
            .collect()
            .await;
        progress.finish_and_clear();

        for (month, result) in results {
            match result {
                Ok((outcome, converted)) => {
                    match outcome {
                        DownloadOutcome::Downloaded(_) => summary.downloaded += 1,
                        DownloadOutcome::Skipped => summary.skipped += 1,
                        DownloadOutcome::Missing => summary.missing += 1,
                    }
                    if converted {
                        summary.converted += 1;
                    }
                }
                Err(e) => summary.failures.push(format!("{pair} {month}: {e:#}")),
            }
        }
    }

    if !args.quiet {
        println!("\nDownload complete:");
        println!("  Downloaded: {}", summary.downloaded);
        println!("  Already present: {}", summary.skipped);
        if summary.missing > 0 {
            println!("  Missing on server: {}", summary.missing);
        }
        if args.convert {
            println!("  Converted: {}", summary.converted);
        }
        if !summary.failures.is_empty() {
            println!("  Failed: {}", summary.failures.len());
            for (i, failure) in summary.failures.iter().enumerate() {
                println!("    {}: {failure}", i + 1);
            }
        }
    }

    if !summary.failures.is_empty() {
        bail!("{} downloads failed", summary.failures.len());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs() {
        assert_eq!(parse_pairs("all").len(), 35);
        assert_eq!(parse_pairs("eurusd, gbpjpy,"), vec!["EURUSD", "GBPJPY"]);
    }

    #[test]
    fn test_parse_years() {
        assert_eq!(parse_years("2019,2020").unwrap(), vec![2019, 2020]);
        let all = parse_years("all").unwrap();
        assert_eq!(all[0], 1970);
        assert!(parse_years("20x0").is_err());
    }

    #[test]
    fn test_parse_months() {
        assert_eq!(parse_months("all").unwrap().len(), 12);
        assert_eq!(parse_months("1, 09,12").unwrap(), vec![1, 9, 12]);
        assert!(parse_months("13").is_err());
        assert!(parse_months("0").is_err());
    }
}
