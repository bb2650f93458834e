//! Brand identity: logo, favicon, theme colors and organization name.
//!
//! Everything is read from markup. Candidate URLs are resolved against the
//! page URL and judged by scheme and extension only; nothing is requested.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;
use serde_json::{json, Value};
use url::Url;

use crate::fetch::ParsedDocument;
use crate::plugin::{Extractor, PluginLoadError, PluginOutput};
use crate::render::RenderingHandle;

static CUSTOM_PROPERTY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(--[\w-]+)\s*:\s*([^;}\n]+)").expect("valid custom property pattern")
});

/// Where logos usually live, most specific first.
const LOGO_SELECTORS: &[&str] = &[
    r#"img[class*="logo"]"#,
    r#"img[id*="logo"]"#,
    r#"img[alt*="logo"]"#,
    r#"img[src*="logo"]"#,
    ".header img",
    ".navbar img",
    ".brand img",
    ".logo img",
    "header img",
    ".navbar-brand img",
    ".site-logo img",
    ".brand-logo img",
];

const FAVICON_SELECTORS: &[&str] = &[
    r#"link[rel~="icon"]"#,
    r#"link[rel="apple-touch-icon"]"#,
    r#"link[rel~="favicon"]"#,
];

const ORGANIZATION_METAS: &[&str] = &[
    r#"meta[property="og:site_name"]"#,
    r#"meta[name="application-name"]"#,
    r#"meta[name="apple-mobile-web-app-title"]"#,
    r#"meta[property="og:title"]"#,
];

const TITLE_SUFFIXES: &[&str] = &[" - Home", " | Home", " - Official Site", " | Official Site"];

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp", "avif", "ico"];

const LOGO_HINTS: &[&str] = &["logo", "brand", "header", "nav"];
const NOT_LOGO_HINTS: &[&str] = &["banner", "hero", "background", "avatar", "profile"];
const BRAND_PROPERTY_HINTS: &[&str] = &["color", "brand", "primary", "theme"];

const MAX_BRAND_COLORS: usize = 5;

pub struct BrandingExtractor;

pub fn factory() -> Result<Box<dyn Extractor>, PluginLoadError> {
    Ok(Box::new(BrandingExtractor))
}

impl Extractor for BrandingExtractor {
    fn name(&self) -> &str {
        "branding_extractor"
    }

    fn description(&self) -> &str {
        "Extracts logos, favicons, brand colors and organization name"
    }

    fn extract(
        &self,
        document: &ParsedDocument,
        _live: Option<&dyn RenderingHandle>,
        url: &str,
    ) -> anyhow::Result<PluginOutput> {
        let base = Url::parse(url).or_else(|_| Url::parse(document.url()))?;

        let mut output = PluginOutput::new();
        if let Some(logo) = logo_url(document, &base) {
            output.insert("logo_url".into(), json!(logo));
        }
        output.insert("favicon_url".into(), json!(favicon_url(document, &base)));

        let colors = brand_colors(document);
        if !colors.is_empty() {
            output.insert("brand_colors".into(), json!(colors));
        }
        if let Some(name) = organization(document) {
            output.insert("organization".into(), json!(name));
        }
        if let Some(color) = theme_color(document) {
            output.insert("theme_color".into(), json!(color));
        }

        let icons = apple_touch_icons(document, &base);
        if !icons.is_empty() {
            output.insert("apple_touch_icons".into(), Value::Array(icons));
        }
        Ok(output)
    }
}

fn meta_content(document: &ParsedDocument, selector: &str) -> Option<String> {
    document
        .select(selector)
        .first()
        .and_then(|meta| meta.value().attr("content"))
        .map(str::trim)
        .filter(|content| !content.is_empty())
        .map(str::to_string)
}

/// Absolute http(s) URL for `href`, if it can be resolved.
fn resolve(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with("data:") {
        return None;
    }
    base.join(href)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}

/// Image extension of the URL path, or `None` when the path has none.
fn extension(url: &Url) -> Option<String> {
    let last = url.path_segments()?.next_back()?;
    let (_, extension) = last.rsplit_once('.')?;
    Some(extension.to_ascii_lowercase())
}

/// URLs with a known image extension pass; so do extensionless ones, which
/// CDNs commonly serve images from.
fn looks_like_image(url: &Url) -> bool {
    extension(url).map_or(true, |extension| IMAGE_EXTENSIONS.contains(&extension.as_str()))
}

fn logo_url(document: &ParsedDocument, base: &Url) -> Option<String> {
    for selector in LOGO_SELECTORS {
        for image in document.select(selector) {
            let Some(src) = image.value().attr("src") else {
                continue;
            };
            let Some(url) = resolve(base, src) else {
                continue;
            };
            if is_likely_logo(image, url.as_str()) && looks_like_image(&url) {
                return Some(url.into());
            }
        }
    }

    // Inline SVG logos have no URL of their own.
    (!document.select(r#"svg[class*="logo"]"#).is_empty()).then(|| format!("{base}#svg-logo-found"))
}

fn dimension(image: ElementRef<'_>, name: &str) -> Option<u32> {
    image
        .value()
        .attr(name)?
        .trim()
        .trim_end_matches("px")
        .parse()
        .ok()
}

/// Score hints in the attributes and URL against signs of a content image.
fn is_likely_logo(image: ElementRef<'_>, url: &str) -> bool {
    let element = image.value();
    let attributes = ["class", "id", "alt", "src"]
        .iter()
        .filter_map(|name| element.attr(name))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let url = url.to_lowercase();

    let mut score = 2 * LOGO_HINTS.iter().filter(|hint| attributes.contains(*hint)).count();
    let mut penalty = NOT_LOGO_HINTS.iter().filter(|hint| attributes.contains(*hint)).count();

    let width = dimension(image, "width");
    let height = dimension(image, "height");
    if width.is_some_and(|w| w > 500) || height.is_some_and(|h| h > 500) {
        penalty += 2;
    }
    if let (Some(w), Some(h)) = (width, height) {
        if (20..=300).contains(&w) && (20..=150).contains(&h) {
            score += 1;
        }
    }

    if url.contains("logo") || url.contains("brand") {
        score += 3;
    }
    if ["banner", "hero", "bg", "background"].iter().any(|hint| url.contains(hint)) {
        penalty += 2;
    }
    score > penalty
}

fn favicon_url(document: &ParsedDocument, base: &Url) -> String {
    FAVICON_SELECTORS
        .iter()
        .flat_map(|selector| document.select(selector))
        .filter_map(|link| link.value().attr("href"))
        .find_map(|href| resolve(base, href))
        .or_else(|| base.join("/favicon.ico").ok())
        .map(String::from)
        .unwrap_or_default()
}

/// Theme color plus brand-looking custom properties from inline styles.
fn brand_colors(document: &ParsedDocument) -> Vec<String> {
    let mut colors: Vec<String> = meta_content(document, r#"meta[name="theme-color"]"#)
        .into_iter()
        .collect();

    let css = document.inline_css();
    for captures in CUSTOM_PROPERTY.captures_iter(&css) {
        let property = captures[1].to_lowercase();
        if !BRAND_PROPERTY_HINTS.iter().any(|hint| property.contains(hint)) {
            continue;
        }
        let value = captures[2].trim();
        let lower = value.to_lowercase();
        if (lower.starts_with('#') || lower.starts_with("rgb") || lower.starts_with("hsl"))
            && !colors.iter().any(|known| known.eq_ignore_ascii_case(value))
        {
            colors.push(value.to_string());
        }
    }

    colors.truncate(MAX_BRAND_COLORS);
    colors
}

fn organization(document: &ParsedDocument) -> Option<String> {
    ORGANIZATION_METAS
        .iter()
        .find_map(|selector| meta_content(document, selector))
        .or_else(|| {
            let title = document.first_text("title")?;
            let name = TITLE_SUFFIXES
                .iter()
                .find_map(|suffix| title.strip_suffix(suffix))
                .unwrap_or(&title)
                .trim()
                .to_string();
            (!name.is_empty()).then_some(name)
        })
}

fn theme_color(document: &ParsedDocument) -> Option<String> {
    meta_content(document, r#"meta[name="theme-color"]"#)
        .or_else(|| meta_content(document, r#"meta[name="msapplication-TileColor"]"#))
}

fn apple_touch_icons(document: &ParsedDocument, base: &Url) -> Vec<Value> {
    document
        .select(r#"link[rel="apple-touch-icon"], link[rel="apple-touch-icon-precomposed"]"#)
        .into_iter()
        .filter_map(|link| {
            let url = resolve(base, link.value().attr("href")?)?;
            Some(json!({
                "url": url.as_str(),
                "sizes": link.value().attr("sizes").unwrap_or_default(),
                "type": "apple-touch-icon",
            }))
        })
        .collect()
}
