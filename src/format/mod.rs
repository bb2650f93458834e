//! Output format metadata.
//!
//! Every format has a [`FormatMetadata`] record assembled from two layers:
//! the static [`FallbackTable`] shipped in `formats.toml`, and whatever the
//! generator producing that format declares about itself. The
//! [`FormatResolver`] merges the two field by field.

pub mod resolver;

use std::collections::HashMap;
use std::fmt::Write as _;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::plugin::GeneratorMetadata;

pub use resolver::{FormatResolver, PREFERRED_FORMAT};

/// Format-level failures.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FormatError {
    /// No generator is registered, so there is no format to default to.
    #[error("no generator plugins available")]
    NoGeneratorsAvailable,
}

/// Descriptive metadata for one output format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatMetadata {
    pub name: Option<String>,
    pub description: Option<String>,
    pub emoji: Option<String>,
    pub short_description: Option<String>,
    pub full_description: Option<String>,
    pub file_extension: Option<String>,
    pub capabilities: Option<Vec<String>>,
    pub use_cases: Option<Vec<String>>,
    pub terminal_message: Option<String>,
    pub howto_title: Option<String>,
    pub howto_instructions: Option<Vec<String>>,
    pub howto_description: Option<String>,
    pub import_example: Option<String>,
}

impl FormatMetadata {
    /// Overwrite every field the generator declares with a non-empty value.
    pub fn apply(&mut self, declared: GeneratorMetadata) {
        override_text(&mut self.description, declared.description);
        override_text(&mut self.emoji, declared.emoji);
        override_text(&mut self.short_description, declared.short_description);
        override_text(&mut self.full_description, declared.full_description);
        override_text(&mut self.file_extension, declared.file_extension);
        override_list(&mut self.capabilities, declared.capabilities);
        override_list(&mut self.use_cases, declared.use_cases);
    }

    /// Post-run hint with `{output_path}` and `{html_path}` filled in.
    pub fn terminal_message_for(
        &self,
        output_path: Option<&str>,
        html_path: Option<&str>,
    ) -> Option<String> {
        let mut message = self.terminal_message.clone()?;
        if let Some(path) = output_path {
            message = message.replace("{output_path}", path);
        }
        if let Some(path) = html_path {
            message = message.replace("{html_path}", path);
        }
        Some(message)
    }

    /// Markdown "how to use" section.
    pub fn howto_section(&self) -> Option<String> {
        let title = self.howto_title.as_deref()?;
        let mut section = format!("## 🚀 How to Use This Information\n\n### {title}\n");
        for step in self.howto_instructions.iter().flatten() {
            let _ = writeln!(section, "{step}");
        }
        if let Some(description) = &self.howto_description {
            let _ = write!(section, "\n{description}");
        }
        Some(section)
    }

    pub fn capabilities_section(&self) -> Option<String> {
        bullet_section("### ✨ Capabilities", self.capabilities.as_deref())
    }

    pub fn use_cases_section(&self) -> Option<String> {
        bullet_section("### 🎯 Use Cases", self.use_cases.as_deref())
    }
}

fn override_text(slot: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        *slot = Some(value);
    }
}

fn override_list(slot: &mut Option<Vec<String>>, value: Option<Vec<String>>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        *slot = Some(value);
    }
}

fn bullet_section(heading: &str, items: Option<&[String]>) -> Option<String> {
    let items = items.filter(|items| !items.is_empty())?;
    let mut section = format!("{heading}\n");
    for item in items {
        let _ = writeln!(section, "- {item}");
    }
    Some(section.trim_end().to_string())
}

/// Static per-format records, read-only once loaded.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct FallbackTable {
    formats: HashMap<String, FormatMetadata>,
}

static BUILTIN: Lazy<FallbackTable> = Lazy::new(|| {
    FallbackTable::from_toml(include_str!("formats.toml")).unwrap_or_else(|e| {
        tracing::error!("Built-in format table is invalid: {e}");
        FallbackTable::default()
    })
});

impl FallbackTable {
    /// The table shipped with the crate.
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    pub fn from_toml(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (String, FormatMetadata)>) -> Self {
        Self {
            formats: entries.into_iter().collect(),
        }
    }

    /// Record for `format`, or an empty record when the format is unknown.
    pub fn record(&self, format: &str) -> FormatMetadata {
        self.formats.get(format).cloned().unwrap_or_default()
    }

    pub fn contains(&self, format: &str) -> bool {
        self.formats.contains_key(format)
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}
