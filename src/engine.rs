//! Extraction engine.
//!
//! One call to [`StyleEngine::extract`] runs the whole pipeline for a URL:
//!
//! 1. Open a live-rendering session (optional, failure downgrades to static analysis)
//! 2. Fetch and parse the page (failure ends the run with `None`)
//! 3. Run the selected extractors, collecting each result under its name
//! 4. Package the envelope into a [`GenerationPayload`]
//! 5. Run the selected generators against that payload
//!
//! Plugins run one after another in the order they were requested. Every
//! plugin call is isolated: an error or panic is logged and recorded as an
//! empty mapping, and the run carries on.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use crate::fetch::{DocumentFetcher, FetchConfig, HttpFetcher, ParsedDocument};
use crate::format::{FallbackTable, FormatError, FormatMetadata, FormatResolver};
use crate::plugin::registry::panic_message;
use crate::plugin::{
    PluginCatalog, PluginConfig, PluginInfo, PluginListing, PluginOutput, PluginRegistry,
};
use crate::render::{DisabledRenderer, QuickJsRenderer, RenderSession, Renderer};

/// Extractor name to that extractor's result.
pub type ExtractionEnvelope = BTreeMap<String, PluginOutput>;

/// Generator name to that generator's result.
pub type GenerationResults = BTreeMap<String, PluginOutput>;

/// The only input generators receive.
///
/// The envelope is keyed by registration name. Generators look results up
/// by the name an extractor reports for itself ("color_extractor"), so an
/// extractor registered under a different key stays reachable through
/// [`GenerationPayload::extractor`].
#[derive(Debug, Clone, Serialize)]
pub struct GenerationPayload {
    pub url: String,
    pub extraction: ExtractionEnvelope,
    /// Local time the payload was built, `%Y-%m-%d %H:%M:%S`.
    pub timestamp: String,
    /// Self-reported extractor name to registration name, where they differ.
    #[serde(skip)]
    aliases: BTreeMap<String, String>,
}

impl GenerationPayload {
    pub fn new(url: impl Into<String>, extraction: ExtractionEnvelope) -> Self {
        Self {
            url: url.into(),
            extraction,
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            aliases: BTreeMap::new(),
        }
    }

    /// Make the result stored under `registered` reachable as `reported` too.
    #[must_use]
    pub fn with_alias(mut self, reported: impl Into<String>, registered: impl Into<String>) -> Self {
        self.aliases.insert(reported.into(), registered.into());
        self
    }

    /// Result of one extractor, if it was part of the run.
    ///
    /// `name` matches the registration name first, then the name the
    /// extractor reports for itself.
    pub fn extractor(&self, name: &str) -> Option<&PluginOutput> {
        self.extraction.get(name).or_else(|| {
            self.aliases
                .get(name)
                .and_then(|registered| self.extraction.get(registered))
        })
    }
}

/// Which plugins actually ran, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunMetadata {
    pub extractors_used: Vec<String>,
    pub generators_used: Vec<String>,
}

/// Everything one extraction run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub url: String,
    pub extraction: ExtractionEnvelope,
    pub generation: GenerationResults,
    pub metadata: RunMetadata,
}

/// Runs extractors and generators against one page at a time.
pub struct StyleEngine {
    registry: Arc<PluginRegistry>,
    formats: FormatResolver,
    fetcher: Box<dyn DocumentFetcher>,
    renderer: Box<dyn Renderer>,
}

impl StyleEngine {
    /// Assemble an engine from its collaborators.
    ///
    /// The registry is frozen from here on; the engine only reads it.
    pub fn new(
        registry: PluginRegistry,
        fetcher: Box<dyn DocumentFetcher>,
        renderer: Box<dyn Renderer>,
    ) -> Self {
        let registry = Arc::new(registry);
        Self {
            formats: FormatResolver::with_builtin_fallbacks(Arc::clone(&registry)),
            registry,
            fetcher,
            renderer,
        }
    }

    /// Engine over the built-in plugins, fetching over HTTP.
    ///
    /// With `live_rendering` off, extractors only ever see static content.
    pub fn builtin(
        config: PluginConfig,
        fetch: FetchConfig,
        live_rendering: bool,
    ) -> anyhow::Result<Self> {
        let registry = PluginRegistry::discover(&PluginCatalog::builtin(), config);
        let fetcher = HttpFetcher::new(fetch)?;
        let renderer: Box<dyn Renderer> = if live_rendering {
            Box::new(QuickJsRenderer)
        } else {
            Box::new(DisabledRenderer)
        };
        Ok(Self::new(registry, Box::new(fetcher), renderer))
    }

    /// Replace the static format table.
    #[must_use]
    pub fn with_fallbacks(mut self, fallbacks: FallbackTable) -> Self {
        self.formats = FormatResolver::new(Arc::clone(&self.registry), fallbacks);
        self
    }

    /// Run one extraction.
    ///
    /// `extractors` and `generators` select plugins by name; `None` (or an
    /// empty list) means "every available one". Unknown names are skipped.
    /// Returns `None` when the page cannot be fetched, in which case no
    /// plugin runs.
    pub async fn extract(
        &self,
        url: &str,
        extractors: Option<&[String]>,
        generators: Option<&[String]>,
        output_dir: Option<&Path>,
    ) -> Option<RunResult> {
        let session = RenderSession::open(self.renderer.as_ref());

        let page = match self.fetcher.fetch_page(url).await {
            Ok(page) => page,
            Err(e) => {
                error!("Failed to fetch page content from {url}: {e}");
                return None;
            }
        };
        let document = ParsedDocument::from_page(page);
        let live = session.as_ref().map(RenderSession::handle);

        let mut extraction = ExtractionEnvelope::new();
        let mut extractors_used = Vec::new();
        let mut aliases = Vec::new();
        for name in requested_or(extractors, || self.registry.available_extractors()) {
            let Some(extractor) = self.registry.get_extractor(&name) else {
                continue;
            };
            info!("Running extractor: {name}");
            let output = isolated(&name, || extractor.extract(&document, live, url));
            if extractor.name() != name {
                aliases.push((extractor.name().to_string(), name.clone()));
            }
            if extraction.insert(name.clone(), output).is_none() {
                extractors_used.push(name);
            }
        }

        let payload = aliases
            .into_iter()
            .fold(GenerationPayload::new(url, extraction), |payload, (reported, registered)| {
                payload.with_alias(reported, registered)
            });

        let mut generation = GenerationResults::new();
        let mut generators_used = Vec::new();
        for name in requested_or(generators, || self.registry.available_generators()) {
            let Some(generator) = self.registry.get_generator(&name) else {
                continue;
            };
            info!("Running generator: {name}");
            let output = isolated(&name, || generator.generate(&payload, output_dir));
            if generation.insert(name.clone(), output).is_none() {
                generators_used.push(name);
            }
        }

        drop(session);

        Some(RunResult {
            url: url.to_string(),
            extraction: payload.extraction,
            generation,
            metadata: RunMetadata {
                extractors_used,
                generators_used,
            },
        })
    }

    pub fn list_available_plugins(&self) -> PluginListing {
        self.registry.list_plugins()
    }

    pub fn plugin_info(&self, name: &str) -> Option<PluginInfo> {
        self.registry.plugin_info(name)
    }

    pub fn available_formats(&self) -> Vec<String> {
        self.formats.available_formats()
    }

    pub fn default_format(&self) -> Result<String, FormatError> {
        self.formats.default_format()
    }

    pub fn format_metadata(&self, format: &str) -> FormatMetadata {
        self.formats.format_metadata(format)
    }

    pub fn is_format_available(&self, format: &str) -> bool {
        self.formats.is_format_available(format)
    }

    pub fn format_choices_for_cli(&self) -> Vec<String> {
        self.formats.format_choices_for_cli()
    }

    pub fn format_descriptions_for_help(&self) -> String {
        self.formats.format_descriptions_for_help()
    }

    /// Name of the generator that produces `format`.
    pub fn generator_for_format(&self, format: &str) -> Option<String> {
        self.registry
            .generator_for_format(format)
            .map(|generator| generator.name().to_string())
    }
}

fn requested_or(
    requested: Option<&[String]>,
    available: impl FnOnce() -> Vec<String>,
) -> Vec<String> {
    match requested {
        Some(names) if !names.is_empty() => names.to_vec(),
        _ => available(),
    }
}

/// Run one plugin call, turning errors and panics into an empty result.
fn isolated(name: &str, call: impl FnOnce() -> anyhow::Result<PluginOutput>) -> PluginOutput {
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            error!("Error in {name}: {e:#}");
            PluginOutput::new()
        }
        Err(payload) => {
            error!("Error in {name}: panicked: {}", panic_message(payload.as_ref()));
            PluginOutput::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_timestamp_format() {
        let payload = GenerationPayload::new("https://example.com", ExtractionEnvelope::new());
        assert_eq!(payload.timestamp.len(), "2025-01-01 00:00:00".len());
        assert!(chrono::NaiveDateTime::parse_from_str(&payload.timestamp, "%Y-%m-%d %H:%M:%S").is_ok());
    }

    #[test]
    fn extractor_lookup_follows_aliases() {
        let mut extraction = ExtractionEnvelope::new();
        let mut colors = PluginOutput::new();
        colors.insert("primary_color".into(), serde_json::json!("#0055ff"));
        extraction.insert("color".into(), colors);
        let payload = GenerationPayload::new("https://example.com", extraction)
            .with_alias("color_extractor", "color");

        assert_eq!(payload.extractor("color").unwrap()["primary_color"], "#0055ff");
        assert_eq!(payload.extractor("color_extractor").unwrap()["primary_color"], "#0055ff");
        assert!(payload.extractor("font_extractor").is_none());
        assert!(serde_json::to_value(&payload).unwrap().get("aliases").is_none());
    }

    #[test]
    fn isolated_swallows_errors_and_panics() {
        assert!(isolated("bad", || Err(anyhow::anyhow!("nope"))).is_empty());
        assert!(isolated("worse", || panic!("boom")).is_empty());

        let mut ok = PluginOutput::new();
        ok.insert("k".into(), serde_json::json!(1));
        let expected = ok.clone();
        assert_eq!(isolated("good", move || Ok(ok)), expected);
    }

    #[test]
    fn result_serializes_with_snake_case_metadata() {
        let result = RunResult {
            url: "https://example.com".into(),
            extraction: ExtractionEnvelope::new(),
            generation: GenerationResults::new(),
            metadata: RunMetadata {
                extractors_used: vec!["color_extractor".into()],
                generators_used: vec![],
            },
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["metadata"]["extractors_used"][0], "color_extractor");
        assert!(json["generation"].as_object().unwrap().is_empty());
    }
}
