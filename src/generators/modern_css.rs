//! CSS using OKLCH colors, container queries and fluid typography.

use std::fmt::Write as _;
use std::path::Path;

use serde_json::Value;

use super::{body_background, emit, strings, GENERATED_BY};
use crate::engine::GenerationPayload;
use crate::plugin::{Generator, GeneratorMetadata, PluginLoadError, PluginOutput};

const MAX_COLORS: usize = 8;
const MAX_UTILITY_COLORS: usize = 4;

const RESET: &str = "/* Modern CSS reset */
*, *::before, *::after {
  box-sizing: border-box;
}

html {
  font-size: clamp(1rem, 2.5vw, 1.125rem);
}";

const SCALES: &str = "  --text-xs: clamp(0.75rem, 2vw, 0.875rem);
  --text-sm: clamp(0.875rem, 2.5vw, 1rem);
  --text-base: clamp(1rem, 2.5vw, 1.125rem);
  --text-lg: clamp(1.125rem, 3vw, 1.25rem);
  --text-xl: clamp(1.25rem, 3.5vw, 1.5rem);
  --text-2xl: clamp(1.5rem, 4vw, 2rem);

  /* Spacing system */
  --space-xs: clamp(0.25rem, 1vw, 0.5rem);
  --space-sm: clamp(0.5rem, 2vw, 1rem);
  --space-md: clamp(1rem, 3vw, 1.5rem);
  --space-lg: clamp(1.5rem, 4vw, 2rem);
  --space-xl: clamp(2rem, 5vw, 3rem);
}";

const FEATURES: &str = "/* Container queries */
.card {
  container-type: inline-size;
  container-name: card;
}

@container card (min-width: 400px) {
  .card-content {
    display: grid;
    grid-template-columns: 1fr 2fr;
    gap: var(--space-md);
  }
}

/* Modern selectors */
.component:where(.primary, .secondary) {
  padding: var(--space-md);
  border-radius: 0.5rem;
}

.layout:has(.sidebar) .main-content {
  margin-inline-start: 250px;
}";

pub struct ModernCssGenerator;

pub fn factory() -> Result<Box<dyn Generator>, PluginLoadError> {
    Ok(Box::new(ModernCssGenerator))
}

impl Generator for ModernCssGenerator {
    fn name(&self) -> &str {
        "modern-css_generator"
    }

    fn output_format(&self) -> &str {
        "modern-css"
    }

    fn metadata(&self) -> GeneratorMetadata {
        GeneratorMetadata {
            description: Some(
                "Cutting-edge CSS with OKLCH colors, container queries, fluid typography, and design tokens"
                    .into(),
            ),
            emoji: Some("🚀".into()),
            short_description: Some("Cutting-edge CSS with OKLCH and container queries".into()),
            file_extension: Some("css".into()),
            capabilities: Some(
                [
                    "OKLCH color space",
                    "Container queries",
                    "Fluid typography with clamp()",
                    "CSS custom properties",
                    "Relative color syntax",
                    "Modern selectors (:has, :is, :where)",
                ]
                .map(String::from)
                .to_vec(),
            ),
            use_cases: Some(
                [
                    "Modern web applications",
                    "Progressive enhancement",
                    "Future-proof styling",
                    "Component libraries",
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
        let css = stylesheet(payload);
        emit(self, Value::String(css.clone()), &css, output_dir)
    }
}

/// The full generated stylesheet.
pub fn stylesheet(payload: &GenerationPayload) -> String {
    let colors = strings(payload, "color_extractor", "colors");
    let fonts = strings(payload, "font_extractor", "fonts");

    [
        format!(
            "/* Modern CSS with cutting-edge features */\n/* Generated from: {} by {GENERATED_BY} */",
            payload.url
        ),
        RESET.to_string(),
        root(&colors, &fonts),
        body(payload),
        FEATURES.to_string(),
        utilities(&colors),
    ]
    .join("\n\n")
}

fn root(colors: &[String], fonts: &[String]) -> String {
    let mut css = String::from(":root {\n  /* Color system with OKLCH */\n");
    for (i, color) in colors.iter().take(MAX_COLORS).enumerate() {
        let var = format!("--color-{}", i + 1);
        let oklch = to_oklch(color).unwrap_or_else(|| format!("oklch(from {color} l c h)"));
        let _ = writeln!(css, "  {var}: {color};");
        let _ = writeln!(css, "  {var}-oklch: {oklch};");
        let _ = writeln!(css, "  {var}-light: oklch(from {oklch} calc(l + 0.2) c h);");
        let _ = writeln!(css, "  {var}-dark: oklch(from {oklch} calc(l - 0.2) c h);");
    }

    css.push_str("\n  /* Typography system */\n");
    for (role, font) in ["primary", "secondary", "display"].iter().zip(fonts) {
        let _ = writeln!(css, "  --font-{role}: '{font}', system-ui, sans-serif;");
    }
    css.push_str(SCALES);
    css
}

fn body(payload: &GenerationPayload) -> String {
    format!(
        "/* Modern CSS features */\nbody {{\n  background: {};\n  font-family: var(--font-primary);\n  font-size: var(--text-base);\n  line-height: 1.6;\n}}",
        body_background(payload)
    )
}

fn utilities(colors: &[String]) -> String {
    let mut css = String::from("/* Utility classes */\n");
    for i in 1..=colors.len().min(MAX_UTILITY_COLORS) {
        let _ = writeln!(css, ".bg-color-{i} {{ background: var(--color-{i}-oklch); }}");
        let _ = writeln!(css, ".text-color-{i} {{ color: var(--color-{i}-oklch); }}");
    }
    css.push_str("\n.text-fluid { font-size: var(--text-base); }\n");
    css.push_str(".text-responsive { font-size: clamp(1rem, 4vw, 2rem); }\n");
    css
}

/// `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa` as 0-255 channels, alpha ignored.
pub(crate) fn parse_hex(color: &str) -> Option<[u8; 3]> {
    let hex = color.strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 | 4 => {
            let mut rgb = [0; 3];
            for (i, digit) in hex.chars().take(3).enumerate() {
                rgb[i] = channel(&digit.to_string().repeat(2))?;
            }
            Some(rgb)
        }
        6 | 8 => Some([channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?]),
        _ => None,
    }
}

fn linear(channel: u8) -> f64 {
    let c = f64::from(channel) / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Convert a hex color to `oklch(L% C Hdeg)` via OKLab.
fn to_oklch(color: &str) -> Option<String> {
    let [red, green, blue] = parse_hex(color)?.map(linear);

    let l = (0.412_221_470_8 * red + 0.536_332_536_3 * green + 0.051_445_992_9 * blue).cbrt();
    let m = (0.211_903_498_2 * red + 0.680_699_545_1 * green + 0.107_396_956_6 * blue).cbrt();
    let s = (0.088_302_461_9 * red + 0.281_718_837_6 * green + 0.629_978_700_5 * blue).cbrt();

    let lightness = 0.210_454_255_3 * l + 0.793_617_785_0 * m - 0.004_072_046_8 * s;
    let a = 1.977_998_495_1 * l - 2.428_592_205_0 * m + 0.450_593_709_9 * s;
    let b = 0.025_904_037_1 * l + 0.782_771_766_2 * m - 0.808_675_766_0 * s;

    // Hue is meaningless for greys.
    let (chroma, hue) = match a.hypot(b) {
        chroma if chroma < 1e-4 => (0.0, 0.0),
        chroma => (chroma, b.atan2(a).to_degrees().rem_euclid(360.0)),
    };

    Some(format!("oklch({:.1}% {chroma:.3} {hue:.1}deg)", lightness * 100.0))
}
