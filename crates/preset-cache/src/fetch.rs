use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::fs;
use tracing::debug;
use url::Url;

use preset_core::error::{PresetError, PresetResult};
use preset_core::PresetFetcher;

// Helper function to convert reqwest errors to PresetError
fn handle_reqwest_error(err: reqwest::Error) -> PresetError {
    PresetError::network(err.to_string())
}

/// Fetches preset files over HTTP(S) or from the local filesystem
#[derive(Clone)]
pub struct UrlFetcher {
    client: Client,
}

impl UrlFetcher {
    /// Create a new fetcher with the given timeouts in seconds
    pub fn new(connect_timeout: u64, request_timeout: u64) -> PresetResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout))
            .timeout(Duration::from_secs(request_timeout))
            .build()
            .map_err(handle_reqwest_error)?;

        Ok(Self { client })
    }

    async fn fetch_http(&self, url: &Url) -> PresetResult<String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(handle_reqwest_error)?;

        if !response.status().is_success() {
            return Err(PresetError::network(format!(
                "Request for {} failed (status: {})",
                url,
                response.status()
            )));
        }

        response.text().await.map_err(handle_reqwest_error)
    }

    async fn fetch_file(&self, path: PathBuf) -> PresetResult<String> {
        fs::read_to_string(&path)
            .await
            .map_err(|e| PresetError::network(format!("Failed to read {}: {}", path.display(), e)))
    }
}

#[async_trait]
impl PresetFetcher for UrlFetcher {
    async fn fetch(&self, url: &str) -> PresetResult<String> {
        debug!("Fetching presets from {}", url);

        match Url::parse(url) {
            Ok(parsed) => match parsed.scheme() {
                "http" | "https" => self.fetch_http(&parsed).await,
                "file" => {
                    let path = parsed
                        .to_file_path()
                        .map_err(|_| PresetError::network(format!("Invalid file url: {}", url)))?;
                    self.fetch_file(path).await
                }
                scheme => Err(PresetError::network(format!(
                    "Unsupported url scheme '{}' in {}",
                    scheme, url
                ))),
            },
            // Anything that does not parse as an absolute url is a local path
            Err(url::ParseError::RelativeUrlWithoutBase) => self.fetch_file(PathBuf::from(url)).await,
            Err(e) => Err(PresetError::network(format!("Invalid url {}: {}", url, e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_fetch_local_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("presets.json");
        std::fs::write(&path, "[]").unwrap();

        let fetcher = UrlFetcher::new(5, 5).unwrap();
        let body = fetcher.fetch(path.to_str().unwrap()).await.unwrap();
        assert_eq!(body, "[]");

        let file_url = Url::from_file_path(&path).unwrap();
        let body = fetcher.fetch(file_url.as_str()).await.unwrap();
        assert_eq!(body, "[]");
    }

    #[tokio::test]
    async fn test_fetch_missing_file() {
        let dir = tempdir().unwrap();
        let fetcher = UrlFetcher::new(5, 5).unwrap();
        let err = fetcher
            .fetch(dir.path().join("missing.json").to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, PresetError::Network(_)));
    }

    #[tokio::test]
    async fn test_unsupported_scheme() {
        let fetcher = UrlFetcher::new(5, 5).unwrap();
        let err = fetcher.fetch("ftp://example.com/presets.json").await.unwrap_err();
        assert!(err.to_string().contains("Unsupported url scheme"));
    }
}
