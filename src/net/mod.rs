//! Data provider.
//!
//! - `fetch`  — blocking HTTP client
//! - `prefix` — deployment path prefix discovery
//! - `source` — the three site resources, loaded all-or-nothing

pub mod fetch;
pub mod prefix;
pub mod source;

use std::path::PathBuf;

/// Why a site resource could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("invalid URL {url:?}: {source}")]
    Url {
        url: String,
        source: url::ParseError,
    },
    #[error("request for {url} failed: {source}")]
    Fetch { url: String, source: reqwest::Error },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed {resource}: {source}")]
    Parse {
        resource: &'static str,
        source: serde_json::Error,
    },
}
