//! Document fetching and parsing.
//!
//! The [`DocumentFetcher`] trait is the only network-facing seam of a run.
//! It returns a [`FetchedPage`] (raw HTML plus the text of linked
//! stylesheets) and the engine turns that into a [`ParsedDocument`] that
//! extractors query with CSS selectors.
//!
//! # Example
//!
//! ```rust,no_run
//! use stylescout::fetch::{DocumentFetcher, FetchConfig, HttpFetcher, ParsedDocument};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let fetcher = HttpFetcher::new(FetchConfig::default())?;
//! let page = fetcher.fetch_page("https://example.com").await?;
//! let document = ParsedDocument::from_page(page);
//! println!("{} bytes of CSS", document.all_css().len());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::http_client::{PageClient, DEFAULT_USER_AGENT};

/// Why a page could not be fetched.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to fetch {url}: {source:#}")]
    Request {
        url: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Network settings for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Timeout for the page itself.
    pub timeout: Duration,
    /// Maximum number of `<link rel="stylesheet">` targets to download.
    pub max_stylesheets: usize,
    /// Timeout for each linked stylesheet.
    pub stylesheet_timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_stylesheets: 5,
            stylesheet_timeout: Duration::from_secs(5),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// A linked stylesheet that was downloaded with its page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stylesheet {
    pub url: String,
    pub css: String,
}

/// Raw page content as returned by a fetcher.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL the page was requested from.
    pub url: String,
    pub html: String,
    pub stylesheets: Vec<Stylesheet>,
}

impl FetchedPage {
    /// A page with no linked stylesheets.
    pub fn from_html(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
            stylesheets: Vec::new(),
        }
    }
}

/// Fetches a page and everything extractors need from the network.
///
/// Implementations must bound their own waiting time and report every
/// network or decoding problem as a [`FetchError`].
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// [`DocumentFetcher`] backed by [`PageClient`].
pub struct HttpFetcher {
    client: PageClient,
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> anyhow::Result<Self> {
        let client = PageClient::with_user_agent(config.timeout, &config.user_agent)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    #[instrument(skip(self), fields(url = %url))]
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let base = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        let html = self
            .client
            .fetch_text(url)
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let mut stylesheets = Vec::new();
        for href in stylesheet_links(&html, &base, self.config.max_stylesheets) {
            match self
                .client
                .fetch_text_within(&href, self.config.stylesheet_timeout)
                .await
            {
                Ok(css) => stylesheets.push(Stylesheet { url: href, css }),
                Err(e) => debug!("Could not fetch CSS from {}: {:#}", href, e),
            }
        }

        Ok(FetchedPage {
            url: url.to_string(),
            html,
            stylesheets,
        })
    }
}

/// Absolute URLs of the first `limit` linked stylesheets.
pub fn stylesheet_links(html: &str, base: &Url, limit: usize) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("link[rel~=\"stylesheet\"][href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|link| link.value().attr("href"))
        .filter_map(|href| base.join(href.trim()).ok())
        .filter(|resolved| matches!(resolved.scheme(), "http" | "https"))
        .map(String::from)
        .take(limit)
        .collect()
}

/// A fetched page parsed into a queryable DOM.
pub struct ParsedDocument {
    url: String,
    html: Html,
    stylesheets: Vec<Stylesheet>,
}

impl ParsedDocument {
    pub fn from_page(page: FetchedPage) -> Self {
        Self {
            html: Html::parse_document(&page.html),
            url: page.url,
            stylesheets: page.stylesheets,
        }
    }

    /// Parse bare HTML, mostly useful in tests.
    pub fn parse(url: &str, html: &str) -> Self {
        Self::from_page(FetchedPage::from_html(url, html))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    pub fn stylesheets(&self) -> &[Stylesheet] {
        &self.stylesheets
    }

    /// Elements matching a CSS selector. An invalid selector matches nothing.
    pub fn select(&self, selector: &str) -> Vec<ElementRef<'_>> {
        match Selector::parse(selector) {
            Ok(parsed) => self.html.select(&parsed).collect(),
            Err(e) => {
                debug!("Invalid selector {selector:?}: {e}");
                Vec::new()
            }
        }
    }

    /// Text of the first element matching `selector`, trimmed.
    pub fn first_text(&self, selector: &str) -> Option<String> {
        self.select(selector)
            .first()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|text| !text.is_empty())
    }

    /// CSS embedded in the page: `style` attributes and `<style>` blocks.
    pub fn inline_css(&self) -> String {
        let mut css = String::new();

        for element in self.select("[style]") {
            if let Some(style) = element.value().attr("style") {
                css.push_str(style);
                css.push(' ');
            }
        }

        for block in self.select("style") {
            css.extend(block.text());
            css.push(' ');
        }

        css
    }

    /// Inline CSS followed by every downloaded stylesheet.
    pub fn all_css(&self) -> String {
        let mut css = self.inline_css();
        for sheet in &self.stylesheets {
            css.push_str(&sheet.css);
            css.push(' ');
        }
        css
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head>
        <title>Test Page</title>
        <link rel="stylesheet" href="/main.css">
        <link rel="preload stylesheet" href="https://cdn.example.org/x.css">
        <link rel="icon" href="/favicon.ico">
        <style>body { color: #333; }</style>
        </head><body><p style="margin: 0">Hi</p></body></html>"#;

    #[test]
    fn resolves_stylesheet_links() {
        let base = Url::parse("https://example.com/blog/post").unwrap();
        let links = stylesheet_links(PAGE, &base, 5);
        assert_eq!(
            links,
            vec![
                "https://example.com/main.css",
                "https://cdn.example.org/x.css"
            ]
        );
    }

    #[test]
    fn stylesheet_limit_applies() {
        let base = Url::parse("https://example.com/").unwrap();
        assert_eq!(stylesheet_links(PAGE, &base, 1).len(), 1);
        assert!(stylesheet_links(PAGE, &base, 0).is_empty());
    }

    #[test]
    fn inline_css_collects_attributes_and_blocks() {
        let document = ParsedDocument::parse("https://example.com", PAGE);
        let css = document.inline_css();
        assert!(css.contains("margin: 0"));
        assert!(css.contains("color: #333"));
    }

    #[test]
    fn all_css_appends_stylesheets() {
        let mut page = FetchedPage::from_html("https://example.com", PAGE);
        page.stylesheets.push(Stylesheet {
            url: "https://example.com/main.css".into(),
            css: "h1 { color: red; }".into(),
        });
        let document = ParsedDocument::from_page(page);
        assert!(document.all_css().ends_with("h1 { color: red; } "));
        assert_eq!(document.stylesheets().len(), 1);
    }

    #[test]
    fn invalid_selector_matches_nothing() {
        let document = ParsedDocument::parse("https://example.com", PAGE);
        assert!(document.select("p[[").is_empty());
        assert_eq!(document.first_text("title").as_deref(), Some("Test Page"));
    }

    #[tokio::test]
    async fn invalid_url_is_rejected() {
        let fetcher = HttpFetcher::new(FetchConfig::default()).unwrap();
        let err = fetcher.fetch_page("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }
}
