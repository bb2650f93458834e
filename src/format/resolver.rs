//! Hybrid format metadata: static fallbacks overridden by generator declarations.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex, PoisonError};

use super::{FallbackTable, FormatError, FormatMetadata};
use crate::plugin::PluginRegistry;

/// Format returned by [`FormatResolver::default_format`] whenever it is available.
pub const PREFERRED_FORMAT: &str = "mediawiki";

/// Resolves and caches [`FormatMetadata`] for every generator format.
///
/// Cached records live as long as the resolver; there is no invalidation.
pub struct FormatResolver {
    registry: Arc<PluginRegistry>,
    fallbacks: FallbackTable,
    cache: Mutex<HashMap<String, FormatMetadata>>,
}

impl FormatResolver {
    pub fn new(registry: Arc<PluginRegistry>, fallbacks: FallbackTable) -> Self {
        Self {
            registry,
            fallbacks,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolver over the built-in fallback table.
    pub fn with_builtin_fallbacks(registry: Arc<PluginRegistry>) -> Self {
        Self::new(registry, FallbackTable::builtin().clone())
    }

    /// Output format of every registered generator, in registry order.
    pub fn available_formats(&self) -> Vec<String> {
        self.registry
            .generators()
            .map(|generator| generator.output_format().to_string())
            .collect()
    }

    /// Metadata for `format`.
    ///
    /// Starts from the static record (empty for unknown formats) and lets the
    /// first registered generator producing `format` override each field it
    /// declares.
    pub fn format_metadata(&self, format: &str) -> FormatMetadata {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = cache.get(format) {
            return cached.clone();
        }

        let mut metadata = self.fallbacks.record(format);
        if let Some(generator) = self.registry.generator_for_format(format) {
            metadata.apply(generator.metadata());
        }

        cache.insert(format.to_string(), metadata.clone());
        metadata
    }

    /// [`PREFERRED_FORMAT`] if available, else the first available format.
    pub fn default_format(&self) -> Result<String, FormatError> {
        let available = self.available_formats();
        if available.iter().any(|format| format == PREFERRED_FORMAT) {
            return Ok(PREFERRED_FORMAT.to_string());
        }
        available
            .into_iter()
            .next()
            .ok_or(FormatError::NoGeneratorsAvailable)
    }

    pub fn is_format_available(&self, format: &str) -> bool {
        self.available_formats().iter().any(|f| f == format)
    }

    /// Values accepted by the CLI's format option.
    pub fn format_choices_for_cli(&self) -> Vec<String> {
        self.available_formats()
    }

    /// One help line per format: padded name, optional emoji, short description.
    pub fn format_descriptions_for_help(&self) -> String {
        let mut help = String::new();
        for format in self.available_formats() {
            let metadata = self.format_metadata(&format);
            let emoji = metadata
                .emoji
                .map(|emoji| format!("{emoji} "))
                .unwrap_or_default();
            let description = metadata
                .short_description
                .unwrap_or_else(|| "No description".to_string());
            let _ = writeln!(help, "  {format:<12} {emoji}{description}");
        }
        help.trim_end_matches('\n').to_string()
    }
}
