//! CSS rules, custom properties, media queries and modern feature usage.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};

use crate::fetch::ParsedDocument;
use crate::plugin::{Extractor, PluginLoadError, PluginOutput};
use crate::render::RenderingHandle;

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: Lazy<Regex> = Lazy::new(|| Regex::new($re).expect("valid CSS pattern"));
    };
}

pattern!(COMMENT, r"(?s)/\*.*?\*/");
pattern!(RULE, r"([^{}]+)\{([^{}]*)\}");
pattern!(DECLARATION, r"([a-zA-Z-]+)\s*:\s*([^;]+)");
pattern!(AT_RULE, r"@([a-zA-Z-]+)");
pattern!(CUSTOM_PROPERTY, r"--([\w-]+)\s*:\s*([^;}]+)");
pattern!(
    MEDIA_QUERY,
    r"@media\s+([^{]+)\{((?:[^{}]*\{[^{}]*\})*[^{}]*)\}"
);
pattern!(BLOCK, r"\{[^{}]*\}");
pattern!(CLASS_NAME, r"\.([a-zA-Z][\w-]*)");
pattern!(BEM, r"\.[\w-]+__[\w-]+(?:--[\w-]+)?");
pattern!(UTILITY, r"\.(?:text-\w+|bg-\w+|p-\d+|m-\d+|w-\d+)");
pattern!(SECTION_COMMENT, r"/\*\s*={3,}.*?={3,}\s*\*/");
pattern!(SELECTOR, r"([^{}]+)\{");
pattern!(PROPERTY_NAME, r"[a-zA-Z-]+\s*:");

/// Feature name and the pattern that detects it.
static FEATURES: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("container_queries", r"@container[^{]*"),
        ("css_nesting", r"&[^{};]*\{"),
        ("has_selectors", r":has\([^)]*\)"),
        ("custom_properties", r"var\(--[^)]+\)"),
        ("fluid_typography", r"\b(?:clamp|min|max)\([^)]+\)"),
        ("color_functions", r"\b(?:oklch|lab|lch|color-mix|color)\([^)]+\)"),
        ("grid_layout", r"display\s*:\s*(?:inline-)?grid\b"),
        ("flexbox", r"display\s*:\s*(?:inline-)?flex\b"),
        ("grid_areas", r"grid-template-areas\s*:\s*[^;}]+"),
    ]
    .into_iter()
    .filter_map(|(name, re)| Regex::new(re).ok().map(|re| (name, re)))
    .collect()
});

const LOGICAL_PROPERTIES: &[&str] = &[
    "margin-inline",
    "margin-block",
    "padding-inline",
    "padding-block",
    "border-inline",
    "border-block",
    "inset-inline",
    "inset-block",
];

const OOCSS_OBJECTS: &[&str] = &[".media", ".flag", ".nav", ".btn", ".card"];

const CSS_TEXT_PREVIEW: usize = 10_000;
const MAX_FEATURE_MATCHES: usize = 10;
const MAX_MEDIA_QUERIES: usize = 10;
const MEDIA_CONTENT_PREVIEW: usize = 500;

pub struct CssExtractor;

pub fn factory() -> Result<Box<dyn Extractor>, PluginLoadError> {
    Ok(Box::new(CssExtractor))
}

impl Extractor for CssExtractor {
    fn name(&self) -> &str {
        "css_extractor"
    }

    fn description(&self) -> &str {
        "Extracts and analyzes CSS rules and properties"
    }

    fn extract(
        &self,
        document: &ParsedDocument,
        _live: Option<&dyn RenderingHandle>,
        _url: &str,
    ) -> anyhow::Result<PluginOutput> {
        let css = document.all_css();
        let uncommented = COMMENT.replace_all(&css, " ");
        let rules = CssRules::parse(&uncommented);

        let mut output = PluginOutput::new();
        output.insert(
            "css_text".into(),
            json!(css.chars().take(CSS_TEXT_PREVIEW).collect::<String>()),
        );
        output.insert("rule_count".into(), json!(rules.selectors.len()));
        output.insert("css_rules".into(), rules.into_json());
        output.insert("custom_properties".into(), Value::Object(custom_properties(&uncommented)));
        output.insert("modern_features".into(), Value::Object(modern_features(&uncommented)));
        output.insert("css_architecture".into(), architecture(&css, &uncommented));
        output.insert("media_queries".into(), json!(media_queries(&uncommented)));
        output.insert("total_css_size".into(), json!(css.len()));
        output.insert("stylesheet_count".into(), json!(document.stylesheets().len()));
        Ok(output)
    }
}

/// Qualified rules found in a stylesheet.
#[derive(Debug, Default)]
pub struct CssRules {
    pub selectors: Vec<String>,
    pub properties: BTreeMap<String, Vec<String>>,
    pub at_rules: BTreeMap<String, usize>,
    pub selector_types: BTreeMap<&'static str, usize>,
}

impl CssRules {
    pub fn parse(css: &str) -> Self {
        let mut rules = Self::default();

        for caps in RULE.captures_iter(css) {
            let selector = caps.get(1).map_or("", |m| m.as_str()).trim();
            if selector.is_empty() || selector.starts_with('@') {
                continue;
            }
            *rules.selector_types.entry(selector_type(selector)).or_default() += 1;
            rules.selectors.push(selector.to_string());

            let body = caps.get(2).map_or("", |m| m.as_str());
            for declaration in DECLARATION.captures_iter(body) {
                let (Some(name), Some(value)) = (declaration.get(1), declaration.get(2)) else {
                    continue;
                };
                rules
                    .properties
                    .entry(name.as_str().trim().to_string())
                    .or_default()
                    .push(value.as_str().trim().to_string());
            }
        }

        for caps in AT_RULE.captures_iter(css) {
            if let Some(keyword) = caps.get(1) {
                *rules.at_rules.entry(keyword.as_str().to_string()).or_default() += 1;
            }
        }

        rules
    }

    fn into_json(self) -> Value {
        let usage: BTreeMap<&String, usize> = self
            .properties
            .iter()
            .map(|(name, values)| (name, values.len()))
            .collect();
        json!({
            "property_usage": usage,
            "selectors": self.selectors,
            "properties": self.properties,
            "at_rules": self.at_rules,
            "selector_types": self.selector_types,
        })
    }
}

fn selector_type(selector: &str) -> &'static str {
    if selector.starts_with('#') {
        "id"
    } else if selector.starts_with('.') {
        "class"
    } else if selector.contains(':') {
        "pseudo"
    } else if selector.contains('[') {
        "attribute"
    } else {
        "element"
    }
}

/// `--name: value` declarations; a later declaration of the same name wins.
pub fn custom_properties(css: &str) -> Map<String, Value> {
    CUSTOM_PROPERTY
        .captures_iter(css)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str();
            let value = caps.get(2)?.as_str().trim();
            Some((format!("--{name}"), json!(value)))
        })
        .collect()
}

/// Modern CSS features in use, with up to ten sample matches each.
pub fn modern_features(css: &str) -> Map<String, Value> {
    let mut features = Map::new();
    for (name, pattern) in FEATURES.iter() {
        let samples: Vec<&str> = pattern
            .find_iter(css)
            .map(|m| m.as_str().trim())
            .take(MAX_FEATURE_MATCHES)
            .collect();
        if !samples.is_empty() {
            features.insert((*name).to_string(), json!(samples));
        }
    }

    let logical: Vec<&str> = LOGICAL_PROPERTIES
        .iter()
        .copied()
        .filter(|property| css.contains(property))
        .collect();
    if !logical.is_empty() {
        features.insert("logical_properties".into(), json!(logical));
    }
    features
}

fn architecture(raw: &str, css: &str) -> Value {
    let mut methodology = Vec::new();
    if BEM.is_match(css) {
        methodology.push("BEM");
    }
    if OOCSS_OBJECTS.iter().any(|object| css.contains(object)) {
        methodology.push("OOCSS");
    }
    if UTILITY.is_match(css) {
        methodology.push("Utility-First");
    }

    let mut naming: HashMap<&str, usize> = ["camelCase", "kebab-case", "snake_case", "PascalCase"]
        .into_iter()
        .map(|style| (style, 0))
        .collect();
    for caps in CLASS_NAME.captures_iter(css) {
        let Some(class) = caps.get(1).map(|m| m.as_str()) else {
            continue;
        };
        let style = if class.contains('_') {
            "snake_case"
        } else if class.contains('-') {
            "kebab-case"
        } else if class.starts_with(|c: char| c.is_ascii_uppercase()) {
            "PascalCase"
        } else if class.chars().skip(1).any(|c| c.is_ascii_uppercase()) {
            "camelCase"
        } else {
            continue;
        };
        *naming.entry(style).or_default() += 1;
    }

    let selectors: Vec<&str> = SELECTOR
        .captures_iter(css)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();
    let parts: usize = selectors.iter().map(|s| s.split_whitespace().count()).sum();
    #[allow(clippy::cast_precision_loss)]
    let average = if selectors.is_empty() {
        0.0
    } else {
        (parts as f64 / selectors.len() as f64 * 100.0).round() / 100.0
    };

    json!({
        "methodology": methodology,
        "naming_patterns": naming,
        "organization": {
            "has_comments": COMMENT.is_match(raw),
            "has_sections": SECTION_COMMENT.is_match(raw),
            "import_count": css.matches("@import").count(),
            "media_query_count": css.matches("@media").count(),
        },
        "complexity": {
            "selector_count": selectors.len(),
            "property_count": PROPERTY_NAME.find_iter(css).count(),
            "avg_selector_complexity": average,
            "lines_of_css": raw.lines().count(),
        },
    })
}

/// `@media` blocks with their condition and a preview of their content.
pub fn media_queries(css: &str) -> Vec<Value> {
    MEDIA_QUERY
        .captures_iter(css)
        .take(MAX_MEDIA_QUERIES)
        .map(|caps| {
            let condition = caps.get(1).map_or("", |m| m.as_str()).trim();
            let content = caps.get(2).map_or("", |m| m.as_str()).trim();
            json!({
                "condition": condition,
                "content": content.chars().take(MEDIA_CONTENT_PREVIEW).collect::<String>(),
                "rules_count": BLOCK.find_iter(content).count(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSS: &str = r"
        /* ===== Base ===== */
        :root { --brand: #0055ff; --space-m: 1rem; }
        body { margin: 0; display: grid; font-size: clamp(1rem, 2vw, 1.25rem); }
        .card__title--active { color: var(--brand); }
        #hero { padding-inline: 2rem; }
        a:hover { color: oklch(70% 0.1 250); }
        .layout:has(> img) { display: flex; }
        @media (max-width: 600px) { .card { padding: 0; } .nav { display: none; } }
        @container sidebar (min-width: 400px) { .card { gap: 1rem; } }
    ";

    #[test]
    fn parses_rules() {
        let rules = CssRules::parse(&COMMENT.replace_all(CSS, " "));
        assert!(rules.selectors.contains(&":root".to_string()));
        assert!(rules.selectors.contains(&".nav".to_string()));
        assert_eq!(rules.selector_types["id"], 1);
        assert_eq!(rules.properties["display"].len(), 3);
        assert_eq!(rules.at_rules["media"], 1);
        assert_eq!(rules.at_rules["container"], 1);
    }

    #[test]
    fn custom_properties_by_name() {
        let properties = custom_properties(CSS);
        assert_eq!(properties["--brand"], "#0055ff");
        assert_eq!(properties["--space-m"], "1rem");
        assert_eq!(properties.len(), 2);
    }

    #[test]
    fn detects_modern_features() {
        let features = modern_features(CSS);
        for feature in [
            "container_queries",
            "has_selectors",
            "custom_properties",
            "fluid_typography",
            "color_functions",
            "grid_layout",
            "flexbox",
            "logical_properties",
        ] {
            assert!(features.contains_key(feature), "missing {feature}");
        }
        assert!(!features.contains_key("grid_areas"));
        assert_eq!(features["logical_properties"], json!(["padding-inline"]));
    }

    #[test]
    fn media_query_blocks() {
        let queries = media_queries(CSS);
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0]["condition"], "(max-width: 600px)");
        assert_eq!(queries[0]["rules_count"], 2);
    }

    #[test]
    fn architecture_signals() {
        let uncommented = COMMENT.replace_all(CSS, " ");
        let architecture = architecture(CSS, &uncommented);
        let methodology = architecture["methodology"].as_array().unwrap();
        assert!(methodology.contains(&json!("BEM")));
        assert!(methodology.contains(&json!("OOCSS")));
        assert_eq!(architecture["organization"]["has_sections"], true);
        assert_eq!(architecture["organization"]["media_query_count"], 1);
    }

    #[test]
    fn extract_from_page() {
        let document = ParsedDocument::parse(
            "https://example.com",
            "<html><head><style>.a { color: red } .b { color: blue }</style></head></html>",
        );
        let output = CssExtractor
            .extract(&document, None, "https://example.com")
            .unwrap();
        assert_eq!(output["rule_count"], 2);
        assert_eq!(output["stylesheet_count"], 0);
        assert_eq!(output["css_rules"]["property_usage"]["color"], 2);
        assert!(output["total_css_size"].as_u64().unwrap() > 0);
    }
}
