//! Color extraction from CSS text and computed styles.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use super::live_strings;
use crate::fetch::ParsedDocument;
use crate::plugin::{Extractor, PluginLoadError, PluginOutput};
use crate::render::RenderingHandle;

static HEX_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#(?:[0-9a-fA-F]{3,4}){1,2}\b").expect("valid hex color pattern"));

static RGB_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"rgba?\(\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*(?:,\s*[\d.]+\s*)?\)")
        .expect("valid rgb color pattern")
});

/// Neutrals too common to say anything about a site's palette.
const NEUTRALS: &[&str] = &[
    "#000000", "#ffffff", "#f0f0f0", "#e0e0e0", "#d0d0d0", "#c0c0c0", "#808080", "#404040",
    "#202020",
];

const MAX_COLORS: usize = 20;
const PALETTE_SOURCE: usize = 10;
const VARIATION: f64 = 0.3;

const COMPUTED_COLORS_SCRIPT: &str = r"(function() {
    var colors = [];
    var elements = document.querySelectorAll('*');
    var props = ['color', 'backgroundColor', 'borderColor', 'outlineColor'];
    for (var i = 0; i < Math.min(elements.length, 100); i++) {
        var style = window.getComputedStyle(elements[i]);
        for (var j = 0; j < props.length; j++) {
            var color = style[props[j]];
            if (color && color !== 'rgba(0, 0, 0, 0)' && color !== 'transparent') {
                colors.push(color);
            }
        }
    }
    return colors;
})()";

pub struct ColorExtractor;

pub fn factory() -> Result<Box<dyn Extractor>, PluginLoadError> {
    Ok(Box::new(ColorExtractor))
}

impl Extractor for ColorExtractor {
    fn name(&self) -> &str {
        "color_extractor"
    }

    fn description(&self) -> &str {
        "Extracts colors from CSS and computed styles"
    }

    fn extract(
        &self,
        document: &ParsedDocument,
        live: Option<&dyn RenderingHandle>,
        _url: &str,
    ) -> anyhow::Result<PluginOutput> {
        let css_colors = colors_in_css(&document.all_css());
        let computed_colors: Vec<String> = live_strings(live, COMPUTED_COLORS_SCRIPT, "colors")
            .iter()
            .filter_map(|color| normalize_color(color))
            .collect();

        let all: Vec<&String> = css_colors.iter().chain(&computed_colors).collect();
        let ranked = rank(all.iter().copied());
        let distinct = all.iter().collect::<HashSet<_>>().len();

        let palette_source = &ranked[..ranked.len().min(PALETTE_SOURCE)];
        let output = json!({
            "colors": &ranked[..ranked.len().min(MAX_COLORS)],
            "primary_color": ranked.first(),
            "color_palette": palette(palette_source),
            "total_colors_found": distinct,
            "computed_colors": computed_colors,
            "css_colors": css_colors,
        });

        match output {
            Value::Object(map) => Ok(map),
            _ => Ok(PluginOutput::new()),
        }
    }
}

/// Every hex and `rgb()`/`rgba()` color in `css`, as lowercase `#rrggbb`.
pub fn colors_in_css(css: &str) -> Vec<String> {
    let hex = HEX_COLOR
        .find_iter(css)
        .filter_map(|m| normalize_hex(m.as_str()));
    let rgb = RGB_COLOR.captures_iter(css).filter_map(|caps| {
        let channel = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
        Some(to_hex(channel(1)?, channel(2)?, channel(3)?))
    });
    hex.chain(rgb).collect()
}

/// Normalize a computed color value (`rgb(...)` or hex) to `#rrggbb`.
pub fn normalize_color(color: &str) -> Option<String> {
    let color = color.trim();
    if color.starts_with('#') {
        return normalize_hex(color);
    }
    if color.starts_with("rgb") {
        return colors_in_css(color).into_iter().next();
    }
    None
}

/// `#abc`, `#abcd`, `#aabbcc` and `#aabbccdd` to lowercase `#aabbcc`.
/// Alpha is dropped.
pub fn normalize_hex(color: &str) -> Option<String> {
    let digits = color.strip_prefix('#')?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let digits = digits.to_ascii_lowercase();
    match digits.len() {
        3 | 4 => Some(digits.chars().take(3).fold(String::from("#"), |mut hex, c| {
            hex.push(c);
            hex.push(c);
            hex
        })),
        6 | 8 => Some(format!("#{}", &digits[..6])),
        _ => None,
    }
}

fn to_hex(r: u32, g: u32, b: u32) -> String {
    format!("#{:02x}{:02x}{:02x}", r.min(255), g.min(255), b.min(255))
}

/// Distinct non-neutral colors, most frequent first. Ties keep first-seen order.
pub fn rank<'a>(colors: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for color in colors {
        let count = counts.entry(color.as_str()).or_insert(0);
        if *count == 0 {
            order.push(color.as_str());
        }
        *count += 1;
    }

    order.retain(|color| !NEUTRALS.contains(color));
    order.sort_by_key(|color| std::cmp::Reverse(counts[color]));
    order.into_iter().map(str::to_string).collect()
}

fn rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Perceived luminance above one half.
pub fn is_light(hex: &str) -> bool {
    rgb(hex).is_some_and(|(r, g, b)| {
        (0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)) / 255.0 > 0.5
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn blend(hex: &str, shift: impl Fn(f64) -> f64) -> String {
    match rgb(hex) {
        Some((r, g, b)) => {
            let adjust = |c: u8| shift(f64::from(c)).clamp(0.0, 255.0) as u32;
            to_hex(adjust(r), adjust(g), adjust(b))
        }
        None => hex.to_string(),
    }
}

pub fn lighten(hex: &str) -> String {
    blend(hex, |c| c + (255.0 - c) * VARIATION)
}

pub fn darken(hex: &str) -> String {
    blend(hex, |c| c * (1.0 - VARIATION))
}

fn palette(colors: &[String]) -> Value {
    let Some(primary) = colors.first() else {
        return json!({});
    };
    json!({
        "primary": primary,
        "secondary": colors.get(1),
        "accent": colors.get(2),
        "background": colors.iter().find(|c| is_light(c)).map_or("#ffffff", String::as_str),
        "text": colors.iter().find(|c| !is_light(c)).map_or("#000000", String::as_str),
        "all_colors": colors,
        "variations": {
            "light": lighten(primary),
            "dark": darken(primary),
        },
    })
}
