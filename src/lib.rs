//! `stylescout` - design attribute extraction for live websites
//!
//! # Features
//!
//! - **Extractors**: colors, fonts, CSS features, branding and DOM structure from a fetched page
//! - **Live rendering**: optional script evaluation handle for computed styles
//! - **Generators**: JSON, CSS variables, modern CSS, Tailwind config, design tokens,
//!   HTML style guide, MediaWiki documentation
//! - **Isolation**: a failing plugin yields an empty result, never a failed run
//!
//! # Example
//!
//! ```rust,no_run
//! use stylescout::{FetchConfig, PluginConfig, StyleEngine};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = StyleEngine::builtin(PluginConfig::load()?, FetchConfig::default(), true)?;
//!     let generators = vec!["json_generator".to_string()];
//!     if let Some(run) = engine
//!         .extract("https://example.com", None, Some(generators.as_slice()), None)
//!         .await
//!     {
//!         println!("Extractors used: {:?}", run.metadata.extractors_used);
//!     }
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod extractors;
pub mod fetch;
pub mod format;
pub mod generators;
pub mod http_client;
pub mod js_engine;
pub mod plugin;
pub mod render;

pub use engine::{
    ExtractionEnvelope, GenerationPayload, GenerationResults, RunMetadata, RunResult, StyleEngine,
};
pub use fetch::{DocumentFetcher, FetchConfig, FetchError, FetchedPage, HttpFetcher, ParsedDocument};
pub use format::{FallbackTable, FormatError, FormatMetadata, FormatResolver};
pub use plugin::{
    Extractor, Generator, GeneratorMetadata, PluginCatalog, PluginConfig, PluginLoadError,
    PluginOutput, PluginRegistry,
};
pub use render::{DisabledRenderer, QuickJsRenderer, RenderError, Renderer, RenderingHandle};

/// Version of stylescout
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
