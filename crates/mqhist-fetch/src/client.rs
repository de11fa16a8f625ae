//! HTTP client for list files and history archives.

use bytes::Bytes;
use mqhist_types::MqhistError;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::list::parse_list;
use crate::url::{self, BASE_URL};

/// User agent sent with every request; the history server rejects unknown clients.
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:42.0) Gecko/20100101 Firefox/42.0";

/// Configuration for the download client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Maximum concurrent downloads.
    pub concurrency: usize,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retry attempts for failed requests.
    pub max_retries: u32,
    /// Base delay for exponential backoff (in milliseconds).
    pub base_delay_ms: u64,
    /// Maximum delay between retries (in milliseconds).
    pub max_delay_ms: u64,
    /// User agent string.
    pub user_agent: String,
    /// History server base URL.
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            timeout: Duration::from_secs(120),
            max_retries: 5,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            base_url: BASE_URL.to_string(),
        }
    }
}

/// Errors that can occur during downloads.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error status.
    #[error("Server error: {status}")]
    ServerError {
        /// HTTP status code.
        status: u16,
    },

    /// Resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Writing the downloaded file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DownloadError> for MqhistError {
    fn from(err: DownloadError) -> Self {
        match err {
            DownloadError::Io(e) => Self::Io(e),
            other => Self::Http(other.to_string()),
        }
    }
}

/// Result of [`DownloadClient::download_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// File already existed; nothing was requested.
    Skipped,
    /// File was downloaded; carries the number of bytes written.
    Downloaded(usize),
    /// Server has no such file.
    Missing,
}

/// HTTP client with connection pooling and retry logic.
#[derive(Debug, Clone)]
pub struct DownloadClient {
    client: Client,
    config: ClientConfig,
}

impl DownloadClient {
    /// Creates a new download client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .pool_max_idle_per_host(config.concurrency)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()?;
        Ok(Self { client, config })
    }

    /// Creates a client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_defaults() -> Result<Self, reqwest::Error> {
        Self::new(ClientConfig::default())
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the list file URL of `pair` on the configured server.
    #[must_use]
    pub fn list_url(&self, pair: &str) -> String {
        url::list_url(&self.config.base_url, pair)
    }

    /// Returns the URL of an archive of `pair` on the configured server.
    #[must_use]
    pub fn file_url(&self, pair: &str, file: &str) -> String {
        url::file_url(&self.config.base_url, pair, file)
    }

    /// Fetches the list file of `pair`.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::NotFound`] if the server has no list for the
    /// pair, or any error of [`Self::download`].
    pub async fn fetch_list(&self, pair: &str) -> Result<Vec<String>, DownloadError> {
        let url = self.list_url(pair);
        debug!(%url, "fetching list file");
        let body = self
            .download(&url)
            .await?
            .ok_or(DownloadError::NotFound(url))?;
        let list = parse_list(&String::from_utf8_lossy(&body));
        debug!(pair, entries = list.len(), "fetched list file");
        Ok(list)
    }

    /// Downloads `url` into `path` unless the file already exists.
    ///
    /// Parent directories are created as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the download fails after all retries or the file
    /// cannot be written.
    pub async fn download_to(&self, url: &str, path: &Path) -> Result<DownloadOutcome, DownloadError> {
        if tokio::fs::try_exists(path).await? {
            debug!(path = %path.display(), "skipping, file already exists");
            return Ok(DownloadOutcome::Skipped);
        }

        let Some(bytes) = self.download(url).await? else {
            warn!(%url, "archive not found on server");
            return Ok(DownloadOutcome::Missing);
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, &bytes).await?;
        debug!(%url, path = %path.display(), bytes = bytes.len(), "downloaded archive");
        Ok(DownloadOutcome::Downloaded(bytes.len()))
    }

    /// Downloads a single resource, returning its bytes.
    ///
    /// Returns `Ok(None)` if the resource does not exist (404).
    ///
    /// # Errors
    ///
    /// Returns an error if the download fails after all retries.
    pub async fn download(&self, url: &str) -> Result<Option<Bytes>, DownloadError> {
        let mut attempts = 0;

        loop {
            match self.client.get(url).send().await {
                Ok(response) => {
                    if response.status() == reqwest::StatusCode::NOT_FOUND {
                        return Ok(None);
                    }

                    // Retry on server errors (5xx) and rate limiting (429)
                    if response.status().is_server_error()
                        || response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS
                    {
                        if attempts < self.config.max_retries {
                            attempts += 1;
                            let delay = self.calculate_backoff_delay(attempts);
                            debug!(%url, status = response.status().as_u16(), attempts, ?delay, "retrying");
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                        return Err(DownloadError::ServerError {
                            status: response.status().as_u16(),
                        });
                    }

                    response.error_for_status_ref()?;
                    return Ok(Some(response.bytes().await?));
                }
                Err(e) if self.is_retryable_error(&e) && attempts < self.config.max_retries => {
                    attempts += 1;
                    let delay = self.calculate_backoff_delay(attempts);
                    debug!(%url, error = %e, attempts, ?delay, "retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Calculates the backoff delay with exponential backoff and jitter.
    fn calculate_backoff_delay(&self, attempt: u32) -> Duration {
        // base_delay * 2^attempt
        let exp_delay = self
            .config
            .base_delay_ms
            .saturating_mul(1u64 << attempt.min(10));

        let capped_delay = exp_delay.min(self.config.max_delay_ms);

        // Deterministic jitter of up to ±25%
        let jitter_range = capped_delay / 4;
        let jitter = if jitter_range > 0 {
            let jitter_offset = (u64::from(attempt) * 17) % (jitter_range * 2);
            jitter_offset as i64 - jitter_range as i64
        } else {
            0
        };

        let final_delay = (capped_delay as i64 + jitter).max(100) as u64;
        Duration::from_millis(final_delay)
    }

    /// Determines if an error is retryable.
    fn is_retryable_error(&self, error: &reqwest::Error) -> bool {
        if error.is_builder() {
            return false;
        }
        error.is_timeout() || error.is_connect() || error.is_request()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.base_delay_ms, 500);
        assert_eq!(config.max_delay_ms, 30_000);
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
        assert_eq!(config.base_url, BASE_URL);
    }

    #[tokio::test]
    async fn test_client_creation() {
        let client = DownloadClient::with_defaults();
        assert!(client.is_ok());
    }

    #[test]
    fn test_urls_use_configured_base() {
        let config = ClientConfig {
            base_url: "http://127.0.0.1:9000/symbols".to_string(),
            ..ClientConfig::default()
        };
        let client = DownloadClient::new(config).unwrap();
        assert_eq!(
            client.list_url("eurusd"),
            "http://127.0.0.1:9000/symbols/EURUSD/list.txt"
        );
        assert_eq!(
            client.file_url("EURUSD", "a.dat"),
            "http://127.0.0.1:9000/symbols/EURUSD/a.dat"
        );
    }

    #[test]
    fn test_backoff_delay_calculation() {
        let client = DownloadClient::with_defaults().unwrap();

        // base_delay * 2 = 1000ms plus jitter
        let delay1 = client.calculate_backoff_delay(1);
        assert!(delay1.as_millis() >= 750 && delay1.as_millis() <= 1250);

        let delay2 = client.calculate_backoff_delay(2);
        assert!(delay2.as_millis() >= 1500 && delay2.as_millis() <= 2500);

        let delay_high = client.calculate_backoff_delay(20);
        assert!(delay_high.as_millis() <= 37_500);
    }

    #[tokio::test]
    async fn test_download_to_skips_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("EURUSD/2020/09/existing.dat");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"cached").unwrap();

        // unroutable URL: a request would fail, so success proves no request was made
        let client = DownloadClient::with_defaults().unwrap();
        let outcome = client
            .download_to("http://invalid.invalid/never", &path)
            .await
            .unwrap();

        assert_eq!(outcome, DownloadOutcome::Skipped);
        assert_eq!(std::fs::read(&path).unwrap(), b"cached");
    }

    #[test]
    fn test_error_conversion() {
        let err: MqhistError = DownloadError::ServerError { status: 503 }.into();
        assert!(matches!(err, MqhistError::Http(_)));

        let io = std::io::Error::other("disk full");
        let err: MqhistError = DownloadError::Io(io).into();
        assert!(matches!(err, MqhistError::Io(_)));
    }
}
