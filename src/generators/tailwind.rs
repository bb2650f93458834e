//! `tailwind.config.js` with the extracted palette and font families.

use std::path::Path;

use serde_json::{json, Map, Value};

use super::{body_background, strings, write_artifact};
use crate::engine::GenerationPayload;
use crate::plugin::{Generator, GeneratorMetadata, PluginLoadError, PluginOutput};

const DEFAULT_PRIMARY: &str = "#3b82f6";
const DEFAULT_SECONDARY: &str = "#64748b";
const DEFAULT_ACCENT: &str = "#06d6a0";

const MAX_EXTRACTED_COLORS: usize = 10;
const MAX_FONTS: usize = 5;

/// Family names that are CSS keywords rather than fonts.
const GENERIC_FAMILIES: &[&str] = &["serif", "sans-serif", "monospace", "inherit", "initial", "unset"];

const CONTENT_GLOBS: &[&str] = &[
    "./src/**/*.{js,jsx,ts,tsx}",
    "./pages/**/*.{js,jsx,ts,tsx}",
    "./components/**/*.{js,jsx,ts,tsx}",
    "./public/**/*.html",
];

/// Keys written as bare identifiers in the emitted module.
const BARE_KEYS: &[&str] = &["content", "theme", "extend", "plugins"];

const USAGE: &str = r#"/*
Usage Examples:

1. In your HTML/JSX:
   <div className="bg-primary text-white font-primary">
     Primary styled content
   </div>

   <div className="bg-extracted-1 text-secondary font-secondary">
     Using extracted colors and fonts
   </div>

2. Custom utility classes:
   <div className="shadow-soft rounded-4xl p-18">
     Custom spacing and shadows
   </div>

3. Responsive design:
   <div className="bg-primary md:bg-secondary lg:bg-accent">
     Responsive background colors
   </div>
*/"#;

pub struct TailwindGenerator;

pub fn factory() -> Result<Box<dyn Generator>, PluginLoadError> {
    Ok(Box::new(TailwindGenerator))
}

impl Generator for TailwindGenerator {
    fn name(&self) -> &str {
        "tailwind_generator"
    }

    fn output_format(&self) -> &str {
        "tailwind"
    }

    fn metadata(&self) -> GeneratorMetadata {
        GeneratorMetadata {
            description: Some(
                "Complete Tailwind CSS configuration with extracted color palettes and font families"
                    .into(),
            ),
            emoji: Some("⚡".into()),
            short_description: Some("Tailwind configuration with custom colors and fonts".into()),
            file_extension: Some("js".into()),
            capabilities: Some(
                [
                    "Custom color palettes",
                    "Font family configuration",
                    "Spacing scales",
                    "Component classes",
                    "Dark mode variants",
                ]
                .map(String::from)
                .to_vec(),
            ),
            use_cases: Some(
                [
                    "Tailwind CSS projects",
                    "Rapid prototyping",
                    "Component libraries",
                    "Design system implementation",
                ]
                .map(String::from)
                .to_vec(),
            ),
            ..GeneratorMetadata::default()
        }
    }

    fn artifact_name(&self) -> String {
        format!("tailwind.config.{}", self.file_extension())
    }

    fn generate(
        &self,
        payload: &GenerationPayload,
        output_dir: Option<&Path>,
    ) -> anyhow::Result<PluginOutput> {
        let config = config(payload);
        let module = js_module(&config)?;

        let mut output = PluginOutput::new();
        if let Some(dir) = output_dir {
            let path = write_artifact(dir, self.output_format(), &self.artifact_name(), &module)?;
            output.insert("file".into(), Value::String(path.display().to_string()));
        }
        output.insert("content".into(), Value::String(module));
        output.insert("config".into(), config);
        Ok(output)
    }
}

/// Font names without quotes, generic keywords dropped.
fn clean_fonts(fonts: &[String]) -> Vec<String> {
    fonts
        .iter()
        .take(MAX_FONTS)
        .map(|font| font.replace(['"', '\''], ""))
        .filter(|font| !GENERIC_FAMILIES.contains(&font.as_str()))
        .collect()
}

fn family(font: Option<&String>) -> Value {
    match font {
        Some(font) => json!([font, "system-ui", "sans-serif"]),
        None => json!(["system-ui", "sans-serif"]),
    }
}

/// The config object `module.exports` is set to.
pub fn config(payload: &GenerationPayload) -> Value {
    let colors = strings(payload, "color_extractor", "colors");
    let fonts = clean_fonts(&strings(payload, "font_extractor", "fonts"));

    let mut extend = Map::new();
    if !colors.is_empty() {
        let pick = |i: usize, default: &str| colors.get(i).cloned().unwrap_or_else(|| default.into());
        let background = body_background(payload);
        let extracted: Map<String, Value> = colors
            .iter()
            .take(MAX_EXTRACTED_COLORS)
            .enumerate()
            .map(|(i, color)| (format!("extracted-{}", i + 1), json!(color)))
            .collect();
        extend.insert(
            "colors".into(),
            json!({
                "primary": pick(0, DEFAULT_PRIMARY),
                "secondary": pick(1, DEFAULT_SECONDARY),
                "accent": pick(2, DEFAULT_ACCENT),
                "background": background,
                "extracted": extracted,
            }),
        );
    }
    if !fonts.is_empty() {
        extend.insert(
            "fontFamily".into(),
            json!({
                "primary": family(fonts.first()),
                "secondary": family(fonts.get(1)),
                "display": family(fonts.get(2)),
            }),
        );
    }

    extend.insert(
        "spacing".into(),
        json!({ "18": "4.5rem", "88": "22rem", "112": "28rem", "128": "32rem" }),
    );
    extend.insert("borderRadius".into(), json!({ "4xl": "2rem", "5xl": "2.5rem" }));
    let brand = colors.first().map_or(DEFAULT_PRIMARY, String::as_str);
    extend.insert(
        "boxShadow".into(),
        json!({
            "soft": "0 2px 15px -3px rgba(0, 0, 0, 0.07), 0 10px 20px -2px rgba(0, 0, 0, 0.04)",
            "brand": format!("0 4px 14px 0 {brand}40"),
        }),
    );

    json!({
        "content": CONTENT_GLOBS,
        "theme": { "extend": extend },
        "plugins": [],
    })
}

fn js_module(config: &Value) -> anyhow::Result<String> {
    let mut body = serde_json::to_string_pretty(config)?;
    for key in BARE_KEYS {
        body = body.replace(&format!("\"{key}\":"), &format!("{key}:"));
    }
    Ok(format!(
        "/** @type {{import('tailwindcss').Config}} */\nmodule.exports = {body}\n\n{USAGE}\n"
    ))
}
