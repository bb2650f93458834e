//! Structured JSON output.

use std::path::Path;

use serde_json::{json, Map, Value};

use super::{emit, field, strings, text, GENERATED_BY};
use crate::engine::GenerationPayload;
use crate::plugin::{Generator, PluginLoadError, PluginOutput};

const MAX_TEXT: usize = 5000;
const MAX_ITEMS: usize = 50;

pub struct JsonGenerator;

pub fn factory() -> Result<Box<dyn Generator>, PluginLoadError> {
    Ok(Box::new(JsonGenerator))
}

impl Generator for JsonGenerator {
    fn name(&self) -> &str {
        "json_generator"
    }

    fn output_format(&self) -> &str {
        "json"
    }

    fn generate(
        &self,
        payload: &GenerationPayload,
        output_dir: Option<&Path>,
    ) -> anyhow::Result<PluginOutput> {
        let document = json!({
            "metadata": {
                "generated_by": GENERATED_BY,
                "generated_at": chrono::Local::now().to_rfc3339(),
                "extraction_timestamp": payload.timestamp,
                "url": payload.url,
                "version": crate::VERSION,
            },
            "extraction_results": extraction_results(payload),
            "summary": summary(payload),
            "usage_examples": usage_examples(payload),
        });
        let rendered = serde_json::to_string_pretty(&document)?;
        emit(self, document, &rendered, output_dir)
    }
}

/// Non-empty extractor results with oversized values trimmed.
fn extraction_results(payload: &GenerationPayload) -> Map<String, Value> {
    payload
        .extraction
        .iter()
        .filter(|(_, result)| !result.is_empty())
        .map(|(name, result)| (name.clone(), Value::Object(trim(result))))
        .collect()
}

fn trim(result: &Map<String, Value>) -> Map<String, Value> {
    let mut trimmed = Map::new();
    for (key, value) in result {
        match value {
            Value::String(s) if s.len() > MAX_TEXT => {
                trimmed.insert(
                    key.clone(),
                    json!(format!("[Large text content: {} characters]", s.len())),
                );
            }
            Value::Array(items) if items.len() > MAX_ITEMS => {
                trimmed.insert(key.clone(), json!(&items[..MAX_ITEMS]));
                trimmed.insert(format!("{key}_total_count"), json!(items.len()));
            }
            _ => {
                trimmed.insert(key.clone(), value.clone());
            }
        }
    }
    trimmed
}

fn summary(payload: &GenerationPayload) -> Value {
    let mut summary = Map::new();
    let count = |extractor: &str, key: &str| {
        field(payload, extractor, key)
            .and_then(Value::as_u64)
            .unwrap_or(0)
    };
    let keys = |extractor: &str, key: &str| -> Vec<String> {
        field(payload, extractor, key)
            .and_then(Value::as_object)
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    };
    let non_empty = |extractor: &str, key: &str| match field(payload, extractor, key) {
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    };

    if payload.extractor("color_extractor").is_some() {
        summary.insert(
            "colors".into(),
            json!({
                "total_found": count("color_extractor", "total_colors_found"),
                "primary_color": text(payload, "color_extractor", "primary_color"),
                "has_palette": field(payload, "color_extractor", "color_palette")
                    .and_then(|palette| palette.get("primary"))
                    .is_some_and(|primary| !primary.is_null()),
            }),
        );
    }
    if payload.extractor("font_extractor").is_some() {
        summary.insert(
            "typography".into(),
            json!({
                "total_fonts": count("font_extractor", "total_fonts_found"),
                "primary_font": text(payload, "font_extractor", "primary_font"),
                "has_google_fonts": non_empty("font_extractor", "google_fonts"),
                "font_categories": keys("font_extractor", "font_categories"),
            }),
        );
    }
    if payload.extractor("html_extractor").is_some() {
        summary.insert(
            "structure".into(),
            json!({
                "title": text(payload, "html_extractor", "title").unwrap_or_default(),
                "has_description": non_empty("html_extractor", "meta_description"),
                "total_elements": field(payload, "html_extractor", "dom_structure")
                    .and_then(|dom| dom.get("total_elements"))
                    .and_then(Value::as_u64)
                    .unwrap_or(0),
                "semantic_score": keys("html_extractor", "semantic_elements").len(),
            }),
        );
    }
    if payload.extractor("css_extractor").is_some() {
        summary.insert(
            "styles".into(),
            json!({
                "total_rules": count("css_extractor", "rule_count"),
                "css_size": count("css_extractor", "total_css_size"),
                "has_custom_properties": non_empty("css_extractor", "custom_properties"),
                "modern_features": keys("css_extractor", "modern_features"),
            }),
        );
    }
    Value::Object(summary)
}

fn usage_examples(payload: &GenerationPayload) -> Value {
    let mut examples = Map::new();

    let colors = strings(payload, "color_extractor", "colors");
    if !colors.is_empty() {
        let numbered = |prefix: &str, limit: usize| -> Map<String, Value> {
            colors
                .iter()
                .take(limit)
                .enumerate()
                .map(|(i, color)| (format!("{prefix}{}", i + 1), json!(color)))
                .collect()
        };
        let tailwind: Map<String, Value> = colors
            .iter()
            .take(9)
            .enumerate()
            .map(|(i, color)| (((i + 1) * 100).to_string(), json!(color)))
            .collect();
        examples.insert(
            "colors".into(),
            json!({
                "css_variables": numbered("--primary-", 5),
                "sass_variables": numbered("$primary-", 5),
                "tailwind_config": { "primary": tailwind },
            }),
        );
    }

    let fonts = strings(payload, "font_extractor", "fonts");
    if let Some(primary) = fonts.first() {
        let stack = |font: Option<&String>| {
            font.map(|font| format!("'{font}', system-ui, sans-serif"))
                .unwrap_or_default()
        };
        let imports: Vec<String> = fonts
            .iter()
            .take(3)
            .filter(|font| font.contains(' '))
            .map(|font| {
                format!(
                    "@import url('https://fonts.googleapis.com/css2?family={}');",
                    font.replace(' ', "+")
                )
            })
            .collect();
        examples.insert(
            "fonts".into(),
            json!({
                "css_font_stack": {
                    "--font-primary": stack(Some(primary)),
                    "--font-secondary": stack(fonts.get(1)),
                },
                "google_fonts_import": imports,
            }),
        );
    }

    Value::Object(examples)
}
