//! Style Dictionary compatible design tokens.

use std::path::Path;

use serde_json::{json, Map, Value};

use super::{emit, strings};
use crate::engine::GenerationPayload;
use crate::plugin::{Generator, GeneratorMetadata, PluginLoadError, PluginOutput};

/// Semantic roles filled from the ranked colors, with a default per role.
const SEMANTIC_COLORS: &[(&str, &str)] = &[
    ("primary", "#3b82f6"),
    ("secondary", "#64748b"),
    ("accent", "#06d6a0"),
    ("success", "#10b981"),
    ("warning", "#f59e0b"),
    ("error", "#ef4444"),
];

const MAX_PALETTE: usize = 20;

pub struct DesignTokensGenerator;

pub fn factory() -> Result<Box<dyn Generator>, PluginLoadError> {
    Ok(Box::new(DesignTokensGenerator))
}

impl Generator for DesignTokensGenerator {
    fn name(&self) -> &str {
        "design-tokens_generator"
    }

    fn output_format(&self) -> &str {
        "design-tokens"
    }

    fn metadata(&self) -> GeneratorMetadata {
        GeneratorMetadata {
            description: Some(
                "Style Dictionary compatible design tokens for multi-platform design systems".into(),
            ),
            emoji: Some("🎨".into()),
            short_description: Some("Multi-platform design tokens with Style Dictionary".into()),
            file_extension: Some("json".into()),
            capabilities: Some(
                [
                    "Multi-platform token generation",
                    "Style Dictionary integration",
                    "Semantic token naming",
                    "Cross-platform compatibility",
                    "Design system scaling",
                ]
                .map(String::from)
                .to_vec(),
            ),
            use_cases: Some(
                [
                    "Design system implementation",
                    "Multi-platform applications",
                    "Brand consistency",
                    "Scalable design tokens",
                ]
                .map(String::from)
                .to_vec(),
            ),
            ..GeneratorMetadata::default()
        }
    }

    fn generate(
        &self,
        payload: &GenerationPayload,
        output_dir: Option<&Path>,
    ) -> anyhow::Result<PluginOutput> {
        let tokens = tokens(payload);
        let rendered = serde_json::to_string_pretty(&tokens)?;
        emit(self, tokens, &rendered, output_dir)
    }
}

fn token(value: impl Into<Value>) -> Value {
    json!({ "value": value.into() })
}

fn scale(entries: &[(&str, &str)]) -> Value {
    Value::Object(
        entries
            .iter()
            .map(|(name, value)| ((*name).to_string(), token(*value)))
            .collect(),
    )
}

/// Token tree for the payload. Scales without extracted counterparts use
/// fixed defaults.
pub fn tokens(payload: &GenerationPayload) -> Value {
    let colors = strings(payload, "color_extractor", "colors");
    let fonts: Vec<String> = strings(payload, "font_extractor", "fonts")
        .into_iter()
        .filter(|font| !font.starts_with("var(") && !matches!(font.as_str(), "inherit" | "initial"))
        .collect();

    let mut semantic = Map::new();
    let mut palette = Map::new();
    if !colors.is_empty() {
        for (i, (role, default)) in SEMANTIC_COLORS.iter().enumerate() {
            let value = colors.get(i).map_or(*default, String::as_str);
            semantic.insert((*role).to_string(), token(value));
        }
        for (i, color) in colors.iter().take(MAX_PALETTE).enumerate() {
            palette.insert(format!("color-{}", i + 1), token(color.as_str()));
        }
    }

    let mut family = Map::new();
    if let Some(primary) = fonts.first() {
        family.insert("primary".into(), token(json!([primary, "system-ui", "sans-serif"])));
        let secondary = match fonts.get(1) {
            Some(font) => json!([font, "system-ui", "sans-serif"]),
            None => json!(["system-ui", "sans-serif"]),
        };
        family.insert("secondary".into(), token(secondary));
        family.insert(
            "monospace".into(),
            token(json!(["SFMono-Regular", "Menlo", "Monaco", "Consolas", "monospace"])),
        );
    }

    json!({
        "color": { "semantic": semantic, "palette": palette },
        "font": {
            "family": family,
            "size": scale(&[
                ("xs", "12px"), ("sm", "14px"), ("base", "16px"), ("lg", "18px"),
                ("xl", "20px"), ("2xl", "24px"), ("3xl", "30px"), ("4xl", "36px"),
            ]),
            "weight": scale(&[
                ("light", "300"), ("normal", "400"), ("medium", "500"),
                ("semibold", "600"), ("bold", "700"),
            ]),
        },
        "spacing": {
            "scale": scale(&[
                ("xs", "4px"), ("sm", "8px"), ("md", "16px"), ("lg", "24px"),
                ("xl", "32px"), ("2xl", "48px"), ("3xl", "64px"),
            ]),
        },
        "border": {
            "radius": scale(&[
                ("none", "0px"), ("sm", "4px"), ("base", "8px"), ("lg", "12px"),
                ("xl", "16px"), ("full", "9999px"),
            ]),
        },
        "shadow": scale(&[
            ("sm", "0 1px 2px 0 rgb(0 0 0 / 0.05)"),
            ("base", "0 1px 3px 0 rgb(0 0 0 / 0.1), 0 1px 2px -1px rgb(0 0 0 / 0.1)"),
            ("md", "0 4px 6px -1px rgb(0 0 0 / 0.1), 0 2px 4px -2px rgb(0 0 0 / 0.1)"),
            ("lg", "0 10px 15px -3px rgb(0 0 0 / 0.1), 0 4px 6px -4px rgb(0 0 0 / 0.1)"),
        ]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ExtractionEnvelope;
    use crate::generators::testing::payload;

    #[test]
    fn semantic_colors_fall_back_per_role() {
        let tokens = tokens(&payload());
        let semantic = &tokens["color"]["semantic"];
        assert_eq!(semantic["primary"]["value"], "#0055ff");
        assert_eq!(semantic["text"], Value::Null);
        assert_eq!(semantic["success"]["value"], "#10b981");
        assert_eq!(tokens["color"]["palette"]["color-4"]["value"], "#222222");
    }

    #[test]
    fn font_families() {
        let tokens = tokens(&payload());
        assert_eq!(
            tokens["font"]["family"]["primary"]["value"],
            json!(["Inter", "system-ui", "sans-serif"])
        );
        assert_eq!(tokens["font"]["weight"]["bold"]["value"], "700");
    }

    #[test]
    fn empty_payload_keeps_fixed_scales() {
        let tokens = tokens(&GenerationPayload::new("https://x.test", ExtractionEnvelope::new()));
        assert_eq!(tokens["color"]["semantic"], json!({}));
        assert_eq!(tokens["font"]["family"], json!({}));
        assert_eq!(tokens["spacing"]["scale"]["md"]["value"], "16px");
    }

    #[test]
    fn declares_metadata_and_writes_json() {
        let generator = DesignTokensGenerator;
        assert_eq!(generator.file_extension(), "json");
        assert_eq!(generator.metadata().emoji.as_deref(), Some("🎨"));

        let dir = tempfile::tempdir().unwrap();
        let output = generator.generate(&payload(), Some(dir.path())).unwrap();
        let path = dir.path().join("design-tokens").join("styles.json");
        assert_eq!(output["file"], path.display().to_string());
        assert!(path.exists());
    }
}
