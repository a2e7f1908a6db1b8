//! Deployment path prefix discovery.
//!
//! Sites served under a sub-path declare it in their pages as
//! `<meta name="path-prefix" content="/mesh">`; every data and route URL is
//! then resolved under that prefix.

use reqwest::blocking::Client;
use scraper::{Html, Selector};
use url::Url;

use super::fetch::fetch_text;
use super::LoadError;
use crate::config::normalize_prefix;

/// Read the prefix from a page's meta tag. `None` when the tag is absent.
pub fn path_prefix_from_html(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"meta[name="path-prefix"]"#).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(normalize_prefix)
}

/// Fetch the site's landing page and read its prefix; `""` when the page
/// declares none.
pub fn discover(client: &Client, site: &Url) -> Result<String, LoadError> {
    let page = fetch_text(client, site, "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")?;
    let prefix = path_prefix_from_html(&page.body).unwrap_or_default();
    log::info!("path prefix for {} is {:?}", page.url, prefix);
    Ok(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_meta_tag() {
        let html = r#"<!doctype html><html><head>
            <meta charset="utf-8">
            <meta name="path-prefix" content="/mesh/">
            </head><body></body></html>"#;
        assert_eq!(path_prefix_from_html(html).as_deref(), Some("/mesh"));
    }

    #[test]
    fn empty_or_missing_tag() {
        let empty = r#"<html><head><meta name="path-prefix" content=""></head></html>"#;
        assert_eq!(path_prefix_from_html(empty).as_deref(), Some(""));
        assert_eq!(path_prefix_from_html("<html><head></head></html>"), None);
    }
}
