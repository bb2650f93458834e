//! Compiled-in discovery source for plugins.
//!
//! Each entry maps a plugin name to a zero-argument factory. The registry
//! walks these entries instead of scanning directories at runtime.

use super::{Extractor, Generator, PluginLoadError};
use crate::{extractors, generators};

/// Entries whose name starts with this prefix are never loaded.
pub const RESERVED_PREFIX: &str = "__";

/// Builds one extractor instance.
pub type ExtractorFactory = fn() -> Result<Box<dyn Extractor>, PluginLoadError>;

/// Builds one generator instance.
pub type GeneratorFactory = fn() -> Result<Box<dyn Generator>, PluginLoadError>;

/// Named factories for both plugin kinds.
#[derive(Clone, Default)]
pub struct PluginCatalog {
    pub(crate) extractors: Vec<(String, ExtractorFactory)>,
    pub(crate) generators: Vec<(String, GeneratorFactory)>,
}

impl PluginCatalog {
    /// An empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with every plugin shipped in this crate.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new()
            .with_extractor("html_extractor", extractors::html::factory)
            .with_extractor("color_extractor", extractors::color::factory)
            .with_extractor("font_extractor", extractors::font::factory)
            .with_extractor("css_extractor", extractors::css::factory)
            .with_extractor("branding_extractor", extractors::branding::factory)
            .with_generator("json_generator", generators::json::factory)
            .with_generator("css_generator", generators::css::factory)
            .with_generator("modern-css_generator", generators::modern_css::factory)
            .with_generator("tailwind_generator", generators::tailwind::factory)
            .with_generator("design-tokens_generator", generators::design_tokens::factory)
            .with_generator("html_generator", generators::html::factory)
            .with_generator("mediawiki_generator", generators::mediawiki::factory)
    }

    /// Add an extractor entry.
    #[must_use]
    pub fn with_extractor(mut self, name: impl Into<String>, factory: ExtractorFactory) -> Self {
        self.extractors.push((name.into(), factory));
        self
    }

    /// Add a generator entry.
    #[must_use]
    pub fn with_generator(mut self, name: impl Into<String>, factory: GeneratorFactory) -> Self {
        self.generators.push((name.into(), factory));
        self
    }

    /// Extractor entries in discovery order: sorted by name, reserved names dropped.
    pub(crate) fn extractor_entries(&self) -> Vec<&(String, ExtractorFactory)> {
        discovery_order(&self.extractors)
    }

    /// Generator entries in discovery order: sorted by name, reserved names dropped.
    pub(crate) fn generator_entries(&self) -> Vec<&(String, GeneratorFactory)> {
        discovery_order(&self.generators)
    }
}

fn discovery_order<F>(entries: &[(String, F)]) -> Vec<&(String, F)> {
    let mut visible: Vec<_> = entries
        .iter()
        .filter(|(name, _)| !name.starts_with(RESERVED_PREFIX))
        .collect();
    // Stable sort keeps duplicate names in declaration order, so the last
    // declared one is registered last and wins.
    visible.sort_by(|a, b| a.0.cmp(&b.0));
    visible
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_extractor() -> Result<Box<dyn Extractor>, PluginLoadError> {
        Err(PluginLoadError::Unavailable("test".into()))
    }

    #[test]
    fn builtin_lists_all_plugins() {
        let catalog = PluginCatalog::builtin();
        assert_eq!(catalog.extractors.len(), 5);
        assert_eq!(catalog.generators.len(), 7);
    }

    #[test]
    fn entries_are_sorted_and_skip_reserved() {
        let catalog = PluginCatalog::new()
            .with_extractor("zeta", no_extractor)
            .with_extractor("__init", no_extractor)
            .with_extractor("alpha", no_extractor);

        let names: Vec<&str> = catalog
            .extractor_entries()
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn builtin_generator_order_is_sorted() {
        let catalog = PluginCatalog::builtin();
        let names: Vec<&str> = catalog
            .generator_entries()
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "css_generator",
                "design-tokens_generator",
                "html_generator",
                "json_generator",
                "mediawiki_generator",
                "modern-css_generator",
                "tailwind_generator",
            ]
        );
    }
}
