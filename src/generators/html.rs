//! Standalone HTML style guide with color swatches and font samples.

use std::fmt::Write as _;
use std::path::Path;

use serde_json::Value;

use super::modern_css::parse_hex;
use super::{body_background, emit, strings, text, GENERATED_BY};
use crate::engine::GenerationPayload;
use crate::plugin::{Generator, GeneratorMetadata, PluginLoadError, PluginOutput};

const MAX_SWATCHES: usize = 12;
const MAX_FONT_SAMPLES: usize = 8;

const PANGRAM: &str = "The quick brown fox jumps over the lazy dog";

const STYLE: &str = "
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: system-ui, -apple-system, sans-serif;
            line-height: 1.6;
            color: #333;
            max-width: 1200px;
            margin: 0 auto;
            padding: 2rem;
            background: #f8fafc;
        }
        .header, .section {
            background: white;
            margin-bottom: 2rem;
            padding: 2rem;
            border-radius: 12px;
            box-shadow: 0 2px 20px rgba(0,0,0,0.1);
        }
        .header { text-align: center; }
        .header h1 { color: #1e293b; margin-bottom: 0.5rem; font-size: 2.5rem; }
        .header p { color: #64748b; font-size: 1.1rem; }
        .section h2 {
            color: #1e293b;
            margin-bottom: 1.5rem;
            font-size: 1.8rem;
            border-bottom: 3px solid #3b82f6;
            padding-bottom: 0.5rem;
        }
        .color-grid {
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(200px, 1fr));
            gap: 1rem;
        }
        .color-swatch, .font-sample {
            border: 1px solid #e2e8f0;
            border-radius: 8px;
            overflow: hidden;
            transition: transform 0.2s;
            cursor: pointer;
        }
        .color-swatch:hover, .font-sample:hover {
            transform: translateY(-2px);
            box-shadow: 0 4px 12px rgba(0,0,0,0.15);
        }
        .color-preview {
            height: 80px;
            display: flex;
            align-items: center;
            justify-content: center;
            font-weight: 500;
        }
        .color-info { padding: 1rem; text-align: center; }
        .color-value, .font-name, .info-value {
            font-family: 'SF Mono', Monaco, monospace;
            color: #475569;
        }
        .font-grid { display: grid; gap: 1.5rem; }
        .font-sample { padding: 1.5rem; }
        .font-preview { font-size: 1.25rem; margin: 0.5rem 0; color: #1e293b; }
        .font-size { color: #64748b; }
        .info-grid {
            display: grid;
            grid-template-columns: repeat(auto-fit, minmax(250px, 1fr));
            gap: 1rem;
        }
        .info-item { padding: 1rem; border: 1px solid #e2e8f0; border-radius: 8px; }
        .info-label { font-weight: 600; color: #475569; margin-bottom: 0.5rem; }
        .info-value { word-break: break-all; }
        @media (max-width: 768px) {
            body { padding: 1rem; }
            .color-grid { grid-template-columns: repeat(auto-fit, minmax(150px, 1fr)); }
            .header h1 { font-size: 2rem; }
        }
        @media print {
            body { background: white; max-width: none; }
            .section { box-shadow: none; break-inside: avoid; }
        }
";

const SCRIPT: &str = "
        document.querySelectorAll('.color-swatch').forEach(swatch => {
            swatch.addEventListener('click', () => {
                const value = swatch.querySelector('.color-value').textContent;
                navigator.clipboard.writeText(value).then(() => {
                    const preview = swatch.querySelector('.color-preview');
                    const original = preview.textContent;
                    preview.textContent = 'Copied!';
                    setTimeout(() => { preview.textContent = original; }, 1000);
                });
            });
        });
";

const INSTRUCTIONS: &[&str] = &[
    "Click on color swatches to copy hex values",
    "Use the font families shown in your CSS",
    "Test color combinations for accessibility compliance",
    "Consider the original context when applying colors",
];

pub struct HtmlGenerator;

pub fn factory() -> Result<Box<dyn Generator>, PluginLoadError> {
    Ok(Box::new(HtmlGenerator))
}

impl Generator for HtmlGenerator {
    fn name(&self) -> &str {
        "html_generator"
    }

    fn output_format(&self) -> &str {
        "html"
    }

    fn metadata(&self) -> GeneratorMetadata {
        GeneratorMetadata {
            description: Some("Interactive HTML report with live previews and visual analysis".into()),
            emoji: Some("📊".into()),
            short_description: Some("Interactive HTML report with visual previews".into()),
            file_extension: Some("html".into()),
            capabilities: Some(
                [
                    "Visual color previews",
                    "Live font rendering",
                    "Interactive elements",
                    "Print-friendly layout",
                ]
                .map(String::from)
                .to_vec(),
            ),
            use_cases: Some(
                [
                    "Design reviews",
                    "Client presentations",
                    "Documentation",
                    "Style guide reference",
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
        let html = report(payload);
        emit(self, Value::String(html.clone()), &html, output_dir)
    }
}

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Black or white, whichever reads better on `background`.
fn contrast_color(background: &str) -> &'static str {
    match parse_hex(background) {
        Some([r, g, b]) => {
            // Perceived brightness scaled by 1000.
            let brightness = u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114;
            if brightness > 128_000 {
                "#000000"
            } else {
                "#ffffff"
            }
        }
        None => "#ffffff",
    }
}

/// The full report document.
pub fn report(payload: &GenerationPayload) -> String {
    let url = escape(&payload.url);
    let body_font = text(payload, "html_extractor", "body_font")
        .or_else(|| text(payload, "font_extractor", "primary_font"))
        .unwrap_or("system-ui, sans-serif");

    let mut html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <meta name="generator" content="{GENERATED_BY}">
    <title>Style Guide - {url}</title>
    <style>{STYLE}    </style>
</head>
<body>
    <div class="header">
        <h1>🎨 Style Guide</h1>
        <p>Extracted from <strong>{url}</strong> on {timestamp}</p>
    </div>
"#,
        timestamp = escape(&payload.timestamp),
    );

    html.push_str(&info_section(&[
        ("URL", url.as_str()),
        ("Body Background", escape(body_background(payload)).as_str()),
        ("Body Font", escape(body_font).as_str()),
    ]));
    html.push_str(&color_section(&strings(payload, "color_extractor", "colors")));
    html.push_str(&font_section(&strings(payload, "font_extractor", "fonts")));

    html.push_str("    <div class=\"section\">\n        <h2>📖 Usage Instructions</h2>\n        <ol>\n");
    for step in INSTRUCTIONS {
        let _ = writeln!(html, "            <li>{step}</li>");
    }
    html.push_str("        </ol>\n    </div>\n");

    let _ = writeln!(html, "    <script>{SCRIPT}    </script>\n</body>\n</html>");
    html
}

fn info_section(items: &[(&str, &str)]) -> String {
    let mut html = String::from(
        "    <div class=\"section\">\n        <h2>📋 Basic Information</h2>\n        <div class=\"info-grid\">\n",
    );
    for (label, value) in items {
        let _ = writeln!(
            html,
            "            <div class=\"info-item\"><div class=\"info-label\">{label}</div><div class=\"info-value\">{value}</div></div>"
        );
    }
    html.push_str("        </div>\n    </div>\n");
    html
}

fn color_section(colors: &[String]) -> String {
    let mut html = String::from(
        "    <div class=\"section\">\n        <h2>🎨 Color Palette</h2>\n        <div class=\"color-grid\">\n",
    );
    for (i, color) in colors.iter().take(MAX_SWATCHES).enumerate() {
        let color = escape(color);
        let _ = writeln!(
            html,
            r#"            <div class="color-swatch">
                <div class="color-preview" style="background-color: {color}; color: {};">Color {}</div>
                <div class="color-info"><div class="color-value">{color}</div></div>
            </div>"#,
            contrast_color(&color),
            i + 1
        );
    }
    html.push_str("        </div>\n    </div>\n");
    html
}

fn font_section(fonts: &[String]) -> String {
    let mut html = String::from(
        "    <div class=\"section\">\n        <h2>🔤 Typography</h2>\n        <div class=\"font-grid\">\n",
    );
    for font in fonts.iter().take(MAX_FONT_SAMPLES) {
        let font = escape(font);
        let family = format!("font-family: &#39;{font}&#39;, system-ui, sans-serif");
        let _ = writeln!(
            html,
            r#"            <div class="font-sample">
                <div class="font-name">{font}</div>
                <div class="font-preview" style="{family};">{PANGRAM}</div>
                <div class="font-size" style="{family}; font-size: 0.875rem;">Small text sample</div>
                <div class="font-size" style="{family}; font-size: 1.125rem;">Large text sample</div>
            </div>"#
        );
    }
    html.push_str("        </div>\n    </div>\n");
    html
}
