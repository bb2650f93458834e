pub mod extract;
pub mod plugins;

use std::path::Path;

use anyhow::{Context, Result};
use url::{ParseError, Url};

use stylescout::PluginConfig;

/// Plugin config from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<PluginConfig> {
    match path {
        Some(path) => PluginConfig::load_from(path),
        None => PluginConfig::load(),
    }
}

/// Add `https://` when the input has no scheme, then validate it.
///
/// `host:port` parses as a scheme-only URL, so anything that cannot carry a
/// host is retried with the prefix as well.
pub fn normalize_url(input: &str) -> Result<String> {
    let trimmed = input.trim();
    let parsed = match Url::parse(trimmed) {
        Ok(url) if !url.cannot_be_a_base() => url,
        Ok(_) | Err(ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{trimmed}"))
            .with_context(|| format!("Invalid URL: {input}"))?,
        Err(e) => return Err(e).with_context(|| format!("Invalid URL: {input}")),
    };
    Ok(parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adds_https_scheme() {
        assert_eq!(normalize_url("example.com").unwrap(), "https://example.com/");
        assert_eq!(normalize_url(" example.com/docs ").unwrap(), "https://example.com/docs");
    }

    #[test]
    fn scheme_inside_query_is_not_a_scheme() {
        assert_eq!(
            normalize_url("example.com/?next=https://x").unwrap(),
            "https://example.com/?next=https://x"
        );
        assert_eq!(normalize_url("localhost:8080").unwrap(), "https://localhost:8080/");
    }

    #[test]
    fn keeps_existing_scheme() {
        assert_eq!(normalize_url("http://localhost:8080/").unwrap(), "http://localhost:8080/");
    }

    #[test]
    fn rejects_garbage() {
        assert!(normalize_url("https://").is_err());
    }
}
