//! Dataset Source Module
//! Locates the CSV resource (local file or HTTP URL) and fetches its bytes.

use reqwest::blocking::Client;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid dataset URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout { url: Url, timeout: Duration },
    #[error("Request to {url} failed: {source}")]
    Http {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("Request to {url} answered with status {status}")]
    Status {
        url: Url,
        status: reqwest::StatusCode,
    },
}

/// Where a dataset lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Path(PathBuf),
    Url(Url),
}

impl Source {
    /// `http://` and `https://` locators are URLs, anything else is a path.
    pub fn parse(locator: &str) -> Result<Self, FetchError> {
        let trimmed = locator.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Url::parse(trimmed)
                .map(Source::Url)
                .map_err(|source| FetchError::InvalidUrl {
                    url: trimmed.to_string(),
                    source,
                })
        } else {
            Ok(Source::Path(PathBuf::from(trimmed)))
        }
    }

    /// Read the whole resource. `timeout` bounds HTTP requests only.
    pub fn fetch(&self, timeout: Duration) -> Result<Vec<u8>, FetchError> {
        match self {
            Source::Path(path) => {
                debug!(path = %path.display(), "reading dataset file");
                std::fs::read(path).map_err(|source| FetchError::Io {
                    path: path.clone(),
                    source,
                })
            }
            Source::Url(url) => Self::fetch_url(url, timeout),
        }
    }

    fn fetch_url(url: &Url, timeout: Duration) -> Result<Vec<u8>, FetchError> {
        debug!(%url, ?timeout, "requesting dataset");
        let request_error = |source: reqwest::Error| {
            if source.is_timeout() {
                FetchError::Timeout {
                    url: url.clone(),
                    timeout,
                }
            } else {
                FetchError::Http {
                    url: url.clone(),
                    source,
                }
            }
        };

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(request_error)?;
        let response = client.get(url.clone()).send().map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.clone(),
                status,
            });
        }

        let body = response.bytes().map_err(request_error)?;
        debug!(%url, bytes = body.len(), "dataset downloaded");
        Ok(body.to_vec())
    }
}

impl FromStr for Source {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Source::parse(s)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Path(path) => write!(f, "{}", path.display()),
            Source::Url(url) => write!(f, "{url}"),
        }
    }
}
