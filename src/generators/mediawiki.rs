//! MediaWiki style guide with color and typography tables.

use std::fmt::Write as _;
use std::path::Path;

use serde_json::Value;

use super::{emit, strings, text};
use crate::engine::GenerationPayload;
use crate::plugin::{Generator, GeneratorMetadata, PluginLoadError, PluginOutput};

const MAX_COLORS: usize = 10;
const MAX_FONTS: usize = 8;

pub struct MediaWikiGenerator;

pub fn factory() -> Result<Box<dyn Generator>, PluginLoadError> {
    Ok(Box::new(MediaWikiGenerator))
}

impl Generator for MediaWikiGenerator {
    fn name(&self) -> &str {
        "mediawiki_generator"
    }

    fn output_format(&self) -> &str {
        "mediawiki"
    }

    fn metadata(&self) -> GeneratorMetadata {
        GeneratorMetadata {
            description: Some(
                "Ready-to-use MediaWiki template with color tables and font documentation".into(),
            ),
            emoji: Some("📝".into()),
            short_description: Some(
                "MediaWiki template with color tables and font documentation".into(),
            ),
            file_extension: Some("mediawiki".into()),
            ..GeneratorMetadata::default()
        }
    }

    fn generate(
        &self,
        payload: &GenerationPayload,
        output_dir: Option<&Path>,
    ) -> anyhow::Result<PluginOutput> {
        let page = render(payload);
        emit(self, Value::String(page.clone()), &page, output_dir)
    }
}

/// Rough family class used in the typography table.
pub fn classify(font: &str) -> &'static str {
    let lower = font.to_lowercase();
    let any = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));
    if any(&["mono", "code", "console", "courier"]) {
        "Monospace"
    } else if any(&["serif", "times", "georgia"]) && !lower.contains("sans") {
        "Serif"
    } else if any(&["display", "heading", "title"]) {
        "Display"
    } else {
        "Sans-serif"
    }
}

/// The wiki page.
pub fn render(payload: &GenerationPayload) -> String {
    let mut page = format!("== Style Guide for {} ==\n\n", payload.url);

    page.push_str("=== Basic Information ===\n");
    let facts = [
        ("Title", text(payload, "html_extractor", "title")),
        ("Description", text(payload, "html_extractor", "meta_description")),
        ("Primary Color", text(payload, "color_extractor", "primary_color")),
        ("Primary Font", text(payload, "font_extractor", "primary_font")),
    ];
    for (label, value) in facts {
        let _ = writeln!(page, "'''{label}:''' {}", value.unwrap_or("Not detected"));
    }
    let _ = writeln!(page, "'''Extracted:''' {}", payload.timestamp);
    page.push('\n');

    let colors = strings(payload, "color_extractor", "colors");
    if !colors.is_empty() {
        page.push_str("=== Color Palette ===\n{| class=\"wikitable\"\n|-\n! Color !! Value !! Usage\n");
        for (i, color) in colors.iter().take(MAX_COLORS).enumerate() {
            let _ = write!(
                page,
                "|-\n| style='background-color: {color}' | \n| <code>{color}</code>\n| Color {}\n",
                i + 1
            );
        }
        page.push_str("|}\n\n");
    }

    let fonts = strings(payload, "font_extractor", "fonts");
    if !fonts.is_empty() {
        page.push_str("=== Typography ===\n{| class=\"wikitable\"\n|-\n! Font Family !! Type\n");
        for font in fonts.iter().take(MAX_FONTS) {
            let _ = write!(page, "|-\n| {font}\n| {}\n", classify(font));
        }
        page.push_str("|}\n\n");
    }

    page.push_str(
        "=== How to Use ===\n\
         # Copy the color values from the table above\n\
         # Use the font families in your CSS or theme settings\n\
         # Apply the background color to match the original site\n\
         # Test the color combinations for accessibility",
    );
    page
}
