use std::time::Duration;

use reqwest::blocking::Client;
use url::Url;

use super::LoadError;

const USER_AGENT: &str = concat!("meshview/", env!("CARGO_PKG_VERSION"));
const TIMEOUT: Duration = Duration::from_secs(15);
const MAX_REDIRECTS: usize = 10;

/// Result of fetching a URL
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub body: String,
    /// Final URL after redirects.
    pub url: String,
}

/// Shared client for every request of one load.
pub fn client() -> Result<Client, LoadError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(TIMEOUT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
        .map_err(LoadError::Client)
}

/// Parse a site address, assuming `https://` when no scheme is given.
pub fn site_url(input: &str) -> Result<Url, LoadError> {
    let input = input.trim();
    let with_scheme = if !input.starts_with("http://") && !input.starts_with("https://") {
        format!("https://{}", input)
    } else {
        input.to_string()
    };
    Url::parse(&with_scheme).map_err(|source| LoadError::Url {
        url: input.to_string(),
        source,
    })
}

/// GET `url` and return the body. Non-2xx statuses are errors.
pub fn fetch_text(client: &Client, url: &Url, accept: &str) -> Result<FetchResult, LoadError> {
    log::debug!("GET {}", url);
    let response = client
        .get(url.as_str())
        .header("Accept", accept)
        .send()
        .map_err(|source| LoadError::Fetch {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(LoadError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let final_url = response.url().to_string();

    let body = response.text().map_err(|source| LoadError::Fetch {
        url: final_url.clone(),
        source,
    })?;

    Ok(FetchResult {
        body,
        url: final_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_https() {
        let url = site_url("mesh.example.org").unwrap();
        assert_eq!(url.as_str(), "https://mesh.example.org/");
        let url = site_url(" http://localhost:4000/ ").unwrap();
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.port(), Some(4000));
    }

    #[test]
    fn garbage_is_a_url_error() {
        assert!(matches!(site_url("http://"), Err(LoadError::Url { .. })));
    }

    #[test]
    fn client_builds() {
        assert!(client().is_ok());
    }
}
