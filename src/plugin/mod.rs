//! Plugin system for extractors and generators.
//!
//! Two capability traits sit at the seam between the engine and the
//! heuristics it runs:
//!
//! - [`Extractor`]: derives one category of design data (colors, fonts,
//!   structure) from a fetched page
//! - [`Generator`]: serializes the run's [`GenerationPayload`] into one
//!   output format
//!
//! Plugins are compiled in. A [`PluginCatalog`] lists `(name, factory)`
//! entries and the [`PluginRegistry`] instantiates each exactly once during
//! discovery.
//!
//! # Example
//!
//! ```rust
//! use stylescout::plugin::{PluginCatalog, PluginConfig, PluginRegistry};
//!
//! let registry = PluginRegistry::discover(&PluginCatalog::builtin(), PluginConfig::default());
//! assert!(registry.get_extractor("color_extractor").is_some());
//! assert!(registry.get_generator("json_generator").is_some());
//! ```

pub mod catalog;
pub mod config;
pub mod registry;

use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::engine::GenerationPayload;
use crate::fetch::ParsedDocument;
use crate::render::RenderingHandle;

pub use catalog::{ExtractorFactory, GeneratorFactory, PluginCatalog, RESERVED_PREFIX};
pub use config::PluginConfig;
pub use registry::{PluginInfo, PluginKind, PluginListing, PluginRegistry};

/// Result mapping produced by every extractor and generator.
pub type PluginOutput = serde_json::Map<String, serde_json::Value>;

/// Why a plugin could not be loaded during discovery.
#[derive(Error, Debug)]
pub enum PluginLoadError {
    /// The plugin cannot run in this build or environment. Logged as a warning.
    #[error("plugin unavailable: {0}")]
    Unavailable(String),

    /// The factory ran but failed to build an instance. Logged as an error.
    #[error("plugin construction failed: {0}")]
    Construction(#[from] anyhow::Error),
}

/// Derives one category of design data from a fetched page.
///
/// Implementations are stateless across calls. `live` is `None` when no
/// rendering handle could be acquired, in which case only static analysis of
/// `document` is possible.
pub trait Extractor: Send + Sync {
    /// Plugin name (e.g., "color_extractor").
    fn name(&self) -> &str;

    /// One-line description for listings.
    fn description(&self) -> &str;

    /// Extract data from the page.
    fn extract(
        &self,
        document: &ParsedDocument,
        live: Option<&dyn RenderingHandle>,
        url: &str,
    ) -> anyhow::Result<PluginOutput>;
}

/// Optional descriptive fields a generator may declare.
///
/// Every field left as `None` falls back to the static format table during
/// metadata resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeneratorMetadata {
    pub description: Option<String>,
    pub emoji: Option<String>,
    pub short_description: Option<String>,
    pub full_description: Option<String>,
    pub file_extension: Option<String>,
    pub capabilities: Option<Vec<String>>,
    pub use_cases: Option<Vec<String>>,
}

/// Serializes the aggregated extraction envelope into one output format.
///
/// Generators receive the payload by shared reference and must treat it as
/// read-only; later generators see exactly what earlier ones saw. Results are
/// read by extractor name ("color_extractor"): an extractor registered under
/// another key is still found through the name it reports for itself.
pub trait Generator: Send + Sync {
    /// Plugin name (e.g., "json_generator").
    fn name(&self) -> &str;

    /// Identity key of the produced format (e.g., "json").
    fn output_format(&self) -> &str;

    /// Declared metadata. Defaults to no declarations.
    fn metadata(&self) -> GeneratorMetadata {
        GeneratorMetadata::default()
    }

    /// File extension of the written artifact, falling back to the format name.
    fn file_extension(&self) -> String {
        self.metadata()
            .file_extension
            .unwrap_or_else(|| self.output_format().to_string())
    }

    /// File name of the written artifact inside `<output_dir>/<format>/`.
    fn artifact_name(&self) -> String {
        format!("styles.{}", self.file_extension())
    }

    /// Render the payload, writing an artifact under `output_dir` when given.
    fn generate(
        &self,
        payload: &GenerationPayload,
        output_dir: Option<&Path>,
    ) -> anyhow::Result<PluginOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare;

    impl Generator for Bare {
        fn name(&self) -> &str {
            "bare_generator"
        }

        fn output_format(&self) -> &str {
            "bare"
        }

        fn generate(
            &self,
            _payload: &GenerationPayload,
            _output_dir: Option<&Path>,
        ) -> anyhow::Result<PluginOutput> {
            Ok(PluginOutput::new())
        }
    }

    #[test]
    fn file_extension_defaults_to_output_format() {
        assert_eq!(Bare.file_extension(), "bare");
        assert_eq!(Bare.artifact_name(), "styles.bare");
        assert_eq!(Bare.metadata(), GeneratorMetadata::default());
    }

    #[test]
    fn load_error_messages() {
        let err = PluginLoadError::Unavailable("needs pdfium".into());
        assert_eq!(err.to_string(), "plugin unavailable: needs pdfium");

        let err = PluginLoadError::from(anyhow::anyhow!("bad table"));
        assert!(err.to_string().contains("bad table"));
    }
}
