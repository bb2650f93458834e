//! Typography: font families, Google Fonts and the computed type scale.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::warn;
use url::Url;

use super::{dedup_case_insensitive, live_strings};
use crate::fetch::ParsedDocument;
use crate::plugin::{Extractor, PluginLoadError, PluginOutput};
use crate::render::RenderingHandle;

static FONT_FAMILY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)font-family\s*:\s*([^;}]+)").expect("valid font-family pattern"));

static FONT_SHORTHAND: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[;{\s])font\s*:\s*[^;}]*?\d(?:px|em|rem|pt|%)?(?:/\S+)?\s+([^;}]+)")
        .expect("valid font shorthand pattern")
});

static GOOGLE_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"@import\s+url\(['"]?([^'")]*fonts\.googleapis\.com[^'")]*)['"]?\)"#)
        .expect("valid import pattern")
});

const MAX_FONTS: usize = 10;

const COMPUTED_FONTS_SCRIPT: &str = r"(function() {
    var fonts = [];
    var elements = document.querySelectorAll('h1, h2, h3, h4, h5, h6, p, div, span, a, li');
    for (var i = 0; i < Math.min(elements.length, 50); i++) {
        var family = window.getComputedStyle(elements[i]).fontFamily;
        if (family && family !== 'inherit') {
            fonts.push(family);
        }
    }
    return fonts;
})()";

const TYPOGRAPHY_SCRIPT: &str = r"(function() {
    var describe = function(el) {
        var style = window.getComputedStyle(el);
        return {
            fontSize: style.fontSize,
            fontWeight: style.fontWeight,
            lineHeight: style.lineHeight,
            fontFamily: style.fontFamily
        };
    };
    var typography = { headings: {}, paragraphs: {}, scale: [] };
    for (var i = 1; i <= 6; i++) {
        var heading = document.querySelector('h' + i);
        if (heading) {
            typography.headings['h' + i] = describe(heading);
        }
    }
    var p = document.querySelector('p');
    if (p) {
        typography.paragraphs.p = describe(p);
    }
    var elements = document.querySelectorAll('*');
    var sizes = [];
    for (var j = 0; j < Math.min(elements.length, 100); j++) {
        var size = window.getComputedStyle(elements[j]).fontSize;
        if (size && size !== '0px' && sizes.indexOf(size) < 0) {
            sizes.push(size);
        }
    }
    typography.scale = sizes.sort(function(a, b) {
        return parseFloat(b) - parseFloat(a);
    }).slice(0, 10);
    return typography;
})()";

/// A Google Fonts family referenced by the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoogleFont {
    pub family: String,
    pub weights: Vec<String>,
    pub url: String,
}

pub struct FontExtractor;

pub fn factory() -> Result<Box<dyn Extractor>, PluginLoadError> {
    Ok(Box::new(FontExtractor))
}

impl Extractor for FontExtractor {
    fn name(&self) -> &str {
        "font_extractor"
    }

    fn description(&self) -> &str {
        "Extracts typography and font information"
    }

    fn extract(
        &self,
        document: &ParsedDocument,
        live: Option<&dyn RenderingHandle>,
        _url: &str,
    ) -> anyhow::Result<PluginOutput> {
        let css = document.all_css();
        let css_fonts = fonts_in_css(&css);
        let computed_fonts = dedup_case_insensitive(
            live_strings(live, COMPUTED_FONTS_SCRIPT, "fonts")
                .iter()
                .flat_map(|family| split_families(family))
                .filter(|font| font.len() > 1),
        );

        let combined: Vec<String> = css_fonts.iter().chain(&computed_fonts).cloned().collect();
        let unique = dedup_case_insensitive(combined.iter().cloned());

        Ok(json!({
            "fonts": &unique[..unique.len().min(MAX_FONTS)],
            "primary_font": css_fonts.first(),
            "google_fonts": google_fonts(document, &css),
            "typography_scale": typography_scale(live),
            "font_categories": categorize(&combined),
            "css_fonts": css_fonts,
            "computed_fonts": computed_fonts,
            "total_fonts_found": unique.len(),
        })
        .as_object()
        .cloned()
        .unwrap_or_default())
    }
}

/// Split a `font-family` value into clean family names.
pub fn split_families(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|font| font.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|font| !font.is_empty())
        .map(str::to_string)
        .collect()
}

/// Families declared through `font-family` and the `font` shorthand, first
/// ten distinct.
pub fn fonts_in_css(css: &str) -> Vec<String> {
    let declared = FONT_FAMILY
        .captures_iter(css)
        .chain(FONT_SHORTHAND.captures_iter(css))
        .filter_map(|caps| caps.get(1))
        .flat_map(|m| split_families(m.as_str()))
        .filter(|font| font.len() > 1 && !is_css_keyword(font));

    let mut fonts = dedup_case_insensitive(declared);
    fonts.truncate(MAX_FONTS);
    fonts
}

fn is_css_keyword(font: &str) -> bool {
    let lower = font.to_ascii_lowercase();
    matches!(lower.as_str(), "inherit" | "initial" | "unset" | "revert")
        || lower.starts_with("var(")
        || lower.contains("!important")
}

/// Families requested from Google Fonts, by `<link>` or `@import`.
pub fn google_fonts(document: &ParsedDocument, css: &str) -> Vec<GoogleFont> {
    let links = document
        .select(r#"link[href*="fonts.googleapis.com"]"#)
        .into_iter()
        .filter_map(|link| link.value().attr("href").map(str::to_string));
    let imports = GOOGLE_IMPORT
        .captures_iter(css)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()));

    links
        .chain(imports)
        .flat_map(|href| families_in_url(&href))
        .collect()
}

/// Parse the `family` parameters of a Google Fonts URL.
///
/// Handles both `family=Open+Sans:400,700|Lato` and
/// `family=Roboto:wght@400;700&family=Lato`.
fn families_in_url(href: &str) -> Vec<GoogleFont> {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };
    let Ok(parsed) = Url::parse(&absolute) else {
        return Vec::new();
    };

    parsed
        .query_pairs()
        .filter(|(key, _)| *key == "family")
        .flat_map(|(_, value)| {
            value
                .split('|')
                .filter(|family| !family.is_empty())
                .map(|family| {
                    let (name, variant) = family.split_once(':').unwrap_or((family, ""));
                    let weights = variant
                        .rsplit('@')
                        .next()
                        .unwrap_or_default()
                        .split([',', ';'])
                        .filter(|weight| !weight.is_empty())
                        .map(str::to_string)
                        .collect();
                    GoogleFont {
                        family: name.trim().to_string(),
                        weights,
                        url: href.to_string(),
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

fn typography_scale(live: Option<&dyn RenderingHandle>) -> Value {
    let Some(handle) = live else {
        return json!({});
    };
    match handle.evaluate(TYPOGRAPHY_SCRIPT) {
        Ok(scale @ Value::Object(_)) => scale,
        Ok(_) => json!({}),
        Err(e) => {
            warn!("Could not analyze typography scale: {e}");
            json!({})
        }
    }
}

const SERIF: &[&str] = &["times", "georgia", "garamond", "baskerville", "minion"];
const SANS_SERIF: &[&str] = &["arial", "helvetica", "verdana", "calibri", "open sans", "roboto", "lato"];
const MONOSPACE: &[&str] = &["courier", "monaco", "consolas", "menlo", "source code pro"];
const SYSTEM: &[&str] = &["system-ui", "-apple-system", "blinkmacsystemfont", "segoe ui"];

/// Bucket fonts by family class. Empty buckets are omitted.
pub fn categorize(fonts: &[String]) -> Map<String, Value> {
    let mut categories: Map<String, Value> = Map::new();
    for font in fonts {
        let lower = font.to_lowercase();
        let known = |list: &[&str]| list.iter().any(|name| lower.contains(name));

        // "sans-serif" contains "serif", so sans is checked first.
        let category = if known(SANS_SERIF) || lower.contains("sans") {
            "sans_serif"
        } else if known(SERIF) || lower.contains("serif") {
            "serif"
        } else if known(MONOSPACE) || lower.contains("mono") {
            "monospace"
        } else if known(SYSTEM) {
            "system"
        } else if font.split_whitespace().count() > 1 {
            "web_fonts"
        } else {
            "display"
        };

        if let Value::Array(bucket) = categories
            .entry(category)
            .or_insert_with(|| Value::Array(Vec::new()))
        {
            bucket.push(Value::String(font.clone()));
        }
    }
    categories
}
