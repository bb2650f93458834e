//! CSS custom properties plus utility and component classes.

use std::fmt::Write as _;
use std::path::Path;

use serde_json::Value;

use super::{emit, field, strings, GENERATED_BY};
use crate::engine::GenerationPayload;
use crate::plugin::{Generator, PluginLoadError, PluginOutput};

const SCALES: &str = "
  /* Spacing */
  --space-xs: 0.25rem;
  --space-sm: 0.5rem;
  --space-md: 1rem;
  --space-lg: 1.5rem;
  --space-xl: 2rem;
  --space-2xl: 3rem;

  /* Border Radius */
  --radius-sm: 0.25rem;
  --radius-md: 0.5rem;
  --radius-lg: 1rem;
  --radius-full: 9999px;

  /* Shadows */
  --shadow-sm: 0 1px 2px rgba(0, 0, 0, 0.1);
  --shadow-md: 0 4px 6px rgba(0, 0, 0, 0.1);
  --shadow-lg: 0 10px 15px rgba(0, 0, 0, 0.1);
  --shadow-xl: 0 20px 25px rgba(0, 0, 0, 0.1);
}";

const TYPE_SCALE: &str = "/* Typography Scale */
.text-xs { font-size: 0.75rem; line-height: 1rem; }
.text-sm { font-size: 0.875rem; line-height: 1.25rem; }
.text-base { font-size: 1rem; line-height: 1.5rem; }
.text-lg { font-size: 1.125rem; line-height: 1.75rem; }
.text-xl { font-size: 1.25rem; line-height: 1.75rem; }
.text-2xl { font-size: 1.5rem; line-height: 2rem; }
.text-3xl { font-size: 1.875rem; line-height: 2.25rem; }
.text-4xl { font-size: 2.25rem; line-height: 2.5rem; }";

const COMPONENTS: &str = "/* Component Classes */
.btn {
  display: inline-flex;
  align-items: center;
  justify-content: center;
  padding: var(--space-sm) var(--space-md);
  border: 1px solid transparent;
  border-radius: var(--radius-md);
  font-family: var(--font-primary);
  font-weight: 500;
  text-decoration: none;
  transition: all 0.2s ease;
  cursor: pointer;
}

.btn-primary {
  background-color: var(--color-primary);
  color: white;
}

.btn-secondary {
  background-color: transparent;
  color: var(--color-primary);
  border-color: var(--color-primary);
}

.card {
  background: var(--color-background, white);
  border-radius: var(--radius-lg);
  padding: var(--space-lg);
  box-shadow: var(--shadow-sm);
}

.container {
  width: 100%;
  max-width: 1200px;
  margin: 0 auto;
  padding: 0 var(--space-md);
}";

/// Palette variable suffix and where its value sits in `color_palette`.
const PALETTE_VARIABLES: &[(&str, &[&str])] = &[
    ("primary", &["primary"]),
    ("secondary", &["secondary"]),
    ("accent", &["accent"]),
    ("background", &["background"]),
    ("text", &["text"]),
    ("primary-light", &["variations", "light"]),
    ("primary-dark", &["variations", "dark"]),
];

pub struct CssGenerator;

pub fn factory() -> Result<Box<dyn Generator>, PluginLoadError> {
    Ok(Box::new(CssGenerator))
}

impl Generator for CssGenerator {
    fn name(&self) -> &str {
        "css_generator"
    }

    fn output_format(&self) -> &str {
        "css"
    }

    fn generate(
        &self,
        payload: &GenerationPayload,
        output_dir: Option<&Path>,
    ) -> anyhow::Result<PluginOutput> {
        let css = stylesheet(payload);
        emit(self, Value::String(css.clone()), &css, output_dir)
    }
}

/// The full generated stylesheet.
pub fn stylesheet(payload: &GenerationPayload) -> String {
    let colors = strings(payload, "color_extractor", "colors");
    let fonts = strings(payload, "font_extractor", "fonts");
    let palette = field(payload, "color_extractor", "color_palette");

    [
        header(payload),
        variables(&colors, &fonts, palette),
        utilities(&colors, palette),
        typography(&fonts),
        COMPONENTS.to_string(),
    ]
    .join("\n\n")
}

fn header(payload: &GenerationPayload) -> String {
    format!(
        "/*\n * CSS Design System\n * Generated from: {}\n * Generated at: {}\n * Generator: {GENERATED_BY}\n */",
        payload.url, payload.timestamp
    )
}

fn palette_entry<'a>(palette: Option<&'a Value>, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(palette?, |value, key| value.get(key))?
        .as_str()
        .filter(|s| !s.is_empty())
}

/// Fallback stack for a font family.
pub fn font_stack(font: &str) -> String {
    let lower = font.to_lowercase();
    let fallback = if ["times", "georgia", "serif"].iter().any(|k| lower.contains(k)) && !lower.contains("sans") {
        "serif"
    } else if ["courier", "monaco", "mono"].iter().any(|k| lower.contains(k)) {
        "monospace"
    } else {
        "system-ui, sans-serif"
    };
    format!("'{font}', {fallback}")
}

fn variables(colors: &[String], fonts: &[String], palette: Option<&Value>) -> String {
    let mut css = String::from(":root {\n");

    if !colors.is_empty() || palette.is_some() {
        css.push_str("  /* Colors */\n");
        for (i, color) in colors.iter().take(12).enumerate() {
            let _ = writeln!(css, "  --color-{}: {color};", i + 1);
        }
        for (name, path) in PALETTE_VARIABLES {
            if let Some(value) = palette_entry(palette, path) {
                let _ = writeln!(css, "  --color-{name}: {value};");
            }
        }
    }

    if !fonts.is_empty() {
        css.push_str("\n  /* Typography */\n");
        for (i, font) in fonts.iter().take(6).enumerate() {
            let _ = writeln!(css, "  --font-{}: {};", i + 1, font_stack(font));
        }
        for (name, font) in ["primary", "secondary", "accent"].iter().zip(fonts) {
            let _ = writeln!(css, "  --font-{name}: '{font}', system-ui, sans-serif;");
        }
    }

    css.push_str(SCALES);
    css
}

fn utilities(colors: &[String], palette: Option<&Value>) -> String {
    let mut css = String::from("/* Utility Classes */");
    let mut rule_set = |name: &str, var: &str| {
        let _ = write!(
            css,
            "\n.text-{name} {{ color: var(--color-{var}); }}\
             \n.bg-{name} {{ background-color: var(--color-{var}); }}\
             \n.border-{name} {{ border-color: var(--color-{var}); }}"
        );
    };

    for i in 1..=colors.len().min(8) {
        rule_set(&format!("color-{i}"), &i.to_string());
    }
    for name in ["primary", "secondary", "accent"] {
        if palette_entry(palette, &[name]).is_some() {
            rule_set(name, name);
        }
    }
    css
}

fn typography(fonts: &[String]) -> String {
    let mut css = String::from("/* Typography Classes */\n");
    for i in 1..=fonts.len().min(4) {
        let _ = writeln!(css, ".font-{i} {{ font-family: var(--font-{i}); }}");
    }
    for name in ["primary", "secondary", "accent"].iter().take(fonts.len()) {
        let _ = writeln!(css, ".font-{name} {{ font-family: var(--font-{name}); }}");
    }
    css.push('\n');
    css.push_str(TYPE_SCALE);
    css
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ExtractionEnvelope;
    use crate::generators::testing::payload;

    #[test]
    fn variables_cover_palette_and_fonts() {
        let css = stylesheet(&payload());
        assert!(css.starts_with("/*\n * CSS Design System\n * Generated from: https://acme.example.com"));
        assert!(css.contains("  --color-1: #0055ff;"));
        assert!(css.contains("  --color-primary-dark: #003bb2;"));
        assert!(css.contains("  --font-2: 'Georgia', serif;"));
        assert!(css.contains("  --font-3: 'Fira Mono', monospace;"));
        assert!(css.contains("  --font-accent: 'Fira Mono', system-ui, sans-serif;"));
        assert!(css.contains(".bg-color-4 { background-color: var(--color-4); }"));
        assert!(css.contains(".border-primary { border-color: var(--color-primary); }"));
        assert!(css.contains(".font-secondary { font-family: var(--font-secondary); }"));
    }

    #[test]
    fn empty_payload_still_yields_scales() {
        let css = stylesheet(&GenerationPayload::new("https://x.test", ExtractionEnvelope::new()));
        assert!(!css.contains("/* Colors */"));
        assert!(css.contains("--space-md: 1rem;"));
        assert!(css.contains(".btn-primary"));
    }

    #[test]
    fn font_stacks() {
        assert_eq!(font_stack("Open Sans"), "'Open Sans', system-ui, sans-serif");
        assert_eq!(font_stack("Noto Serif"), "'Noto Serif', serif");
        assert_eq!(font_stack("Courier New"), "'Courier New', monospace");
    }

    #[test]
    fn writes_css_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = CssGenerator.generate(&payload(), Some(dir.path())).unwrap();
        let written = std::fs::read_to_string(dir.path().join("css").join("styles.css")).unwrap();
        assert_eq!(output["content"], written);
    }
}
