//! List files and local storage layout.

use std::path::{Path, PathBuf};

/// Splits a list file into its non-empty entries.
#[must_use]
pub fn parse_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Returns the first list entry for the given month.
///
/// Entries are matched by the prefix `<PAIR>_<YEAR>_<MM>`.
#[must_use]
pub fn find_history_file<'a>(
    list: &'a [String],
    pair: &str,
    year: i32,
    month: u32,
) -> Option<&'a str> {
    let prefix = format!("{}_{year}_{month:02}", pair.to_uppercase());
    list.iter()
        .map(String::as_str)
        .find(|entry| entry.starts_with(&prefix))
}

/// Returns the local path of an archive: `<dest>/<PAIR>/<YEAR>/<MM>/<file>`.
#[must_use]
pub fn history_path(
    dest: impl AsRef<Path>,
    pair: &str,
    year: i32,
    month: u32,
    file: &str,
) -> PathBuf {
    dest.as_ref()
        .join(pair.to_uppercase())
        .join(year.to_string())
        .join(format!("{month:02}"))
        .join(file)
}
