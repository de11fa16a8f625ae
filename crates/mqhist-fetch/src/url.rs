//! History server URL construction.

/// Base URL of the public history server.
pub const BASE_URL: &str = "http://history.metaquotes.net/symbols";

/// Builds the URL of a symbol's list file.
///
/// URL format: `{base}/{PAIR}/list.txt`
///
/// # Example
///
/// ```
/// use mqhist_fetch::url::{BASE_URL, list_url};
///
/// let url = list_url(BASE_URL, "eurusd");
/// assert_eq!(url, "http://history.metaquotes.net/symbols/EURUSD/list.txt");
/// ```
#[must_use]
pub fn list_url(base: &str, pair: &str) -> String {
    format!("{}/{}/list.txt", base.trim_end_matches('/'), pair.to_uppercase())
}

/// Builds the URL of one archive listed in a symbol's list file.
///
/// URL format: `{base}/{PAIR}/{file}`
#[must_use]
pub fn file_url(base: &str, pair: &str, file: &str) -> String {
    format!("{}/{}/{}", base.trim_end_matches('/'), pair.to_uppercase(), file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_url() {
        assert_eq!(
            list_url(BASE_URL, "XAUUSD"),
            "http://history.metaquotes.net/symbols/XAUUSD/list.txt"
        );
    }

    #[test]
    fn test_file_url() {
        let url = file_url(BASE_URL, "gbpjpy", "GBPJPY_2019_03_abc.dat");
        assert_eq!(
            url,
            "http://history.metaquotes.net/symbols/GBPJPY/GBPJPY_2019_03_abc.dat"
        );
    }

    #[test]
    fn test_trailing_slash_in_base() {
        assert_eq!(
            list_url("http://localhost:8080/symbols/", "EURUSD"),
            "http://localhost:8080/symbols/EURUSD/list.txt"
        );
    }
}
