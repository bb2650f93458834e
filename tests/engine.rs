//! End-to-end engine runs against in-memory pages and stub plugins.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use stylescout::render::RenderError;
use stylescout::{extractors, generators};
use stylescout::{
    DisabledRenderer, DocumentFetcher, Extractor, FallbackTable, FetchError, FetchedPage,
    GenerationPayload, Generator, ParsedDocument, PluginCatalog, PluginConfig, PluginOutput,
    PluginRegistry, Renderer, RenderingHandle, StyleEngine,
};

const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Acme</title>
  <style>
    :root { --brand: #0055ff; }
    body { color: #333333; font-family: "Inter", sans-serif; background: #ffffff; }
    .btn { background: #0055ff; border: 1px solid #ff6600; }
    .btn:hover { background: #0055ff; }
    h1 { font-family: Georgia, serif; }
  </style>
</head>
<body><h1 id="top">Welcome</h1><p class="lead">Hi</p></body>
</html>"#;

/// Serves `PAGE` for every URL, or fails every request.
struct StaticFetcher {
    reachable: bool,
}

#[async_trait]
impl DocumentFetcher for StaticFetcher {
    async fn fetch_page(&self, url: &str) -> Result<FetchedPage, FetchError> {
        if self.reachable {
            Ok(FetchedPage::from_html(url, PAGE))
        } else {
            Err(FetchError::Request {
                url: url.to_string(),
                source: anyhow::anyhow!("connection refused"),
            })
        }
    }
}

/// Hands out handles and counts how many were released.
#[derive(Clone, Default)]
struct CountingRenderer {
    acquired: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

struct CountingHandle {
    released: Arc<AtomicUsize>,
}

impl RenderingHandle for CountingHandle {
    fn evaluate(&self, _script: &str) -> Result<Value, RenderError> {
        Ok(json!([]))
    }

    fn release(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

impl Renderer for CountingRenderer {
    fn acquire(&self) -> Result<Box<dyn RenderingHandle>, RenderError> {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountingHandle {
            released: Arc::clone(&self.released),
        }))
    }
}

struct Failing;

impl Extractor for Failing {
    fn name(&self) -> &str {
        "failing_extractor"
    }

    fn description(&self) -> &str {
        "Always errors"
    }

    fn extract(
        &self,
        _document: &ParsedDocument,
        _live: Option<&dyn RenderingHandle>,
        _url: &str,
    ) -> anyhow::Result<PluginOutput> {
        anyhow::bail!("boom")
    }
}

struct Panicking;

impl Generator for Panicking {
    fn name(&self) -> &str {
        "panicking_generator"
    }

    fn output_format(&self) -> &str {
        "panic"
    }

    fn generate(
        &self,
        _payload: &GenerationPayload,
        _output_dir: Option<&Path>,
    ) -> anyhow::Result<PluginOutput> {
        panic!("generator exploded")
    }
}

/// Records which extractors it saw in the payload.
#[derive(Default)]
struct Spy {
    seen: Arc<Mutex<Vec<String>>>,
}

impl Generator for Spy {
    fn name(&self) -> &str {
        "spy_generator"
    }

    fn output_format(&self) -> &str {
        "spy"
    }

    fn generate(
        &self,
        payload: &GenerationPayload,
        _output_dir: Option<&Path>,
    ) -> anyhow::Result<PluginOutput> {
        let mut seen = self.seen.lock().unwrap();
        seen.extend(payload.extraction.keys().cloned());
        let mut output = PluginOutput::new();
        output.insert("url".into(), Value::String(payload.url.clone()));
        Ok(output)
    }
}

/// Counts calls and returns an empty mapping.
struct CountingExtractor {
    calls: Arc<AtomicUsize>,
}

impl Extractor for CountingExtractor {
    fn name(&self) -> &str {
        "counting_extractor"
    }

    fn description(&self) -> &str {
        "Counts calls"
    }

    fn extract(
        &self,
        _document: &ParsedDocument,
        _live: Option<&dyn RenderingHandle>,
        _url: &str,
    ) -> anyhow::Result<PluginOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(PluginOutput::new())
    }
}

struct CountingGenerator {
    calls: Arc<AtomicUsize>,
}

impl Generator for CountingGenerator {
    fn name(&self) -> &str {
        "counting_generator"
    }

    fn output_format(&self) -> &str {
        "count"
    }

    fn generate(
        &self,
        _payload: &GenerationPayload,
        _output_dir: Option<&Path>,
    ) -> anyhow::Result<PluginOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(PluginOutput::new())
    }
}

/// Engine with one counting extractor and one counting generator.
fn counting_engine(reachable: bool) -> (StyleEngine, Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let extractor_calls = Arc::new(AtomicUsize::new(0));
    let generator_calls = Arc::new(AtomicUsize::new(0));

    let mut registry = PluginRegistry::new(PluginConfig::default());
    registry.register_extractor(
        "counting_extractor",
        Arc::new(CountingExtractor {
            calls: Arc::clone(&extractor_calls),
        }),
    );
    registry.register_generator(
        "counting_generator",
        Arc::new(CountingGenerator {
            calls: Arc::clone(&generator_calls),
        }),
    );

    let engine = StyleEngine::new(
        registry,
        Box::new(StaticFetcher { reachable }),
        Box::new(DisabledRenderer),
    );
    (engine, extractor_calls, generator_calls)
}

fn builtin_engine(reachable: bool, renderer: CountingRenderer) -> StyleEngine {
    let registry = PluginRegistry::discover(&PluginCatalog::builtin(), PluginConfig::default());
    StyleEngine::new(
        registry,
        Box::new(StaticFetcher { reachable }),
        Box::new(renderer),
    )
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|name| (*name).to_string()).collect()
}

#[tokio::test]
async fn selected_plugins_only() {
    let engine = builtin_engine(true, CountingRenderer::default());
    let extractors = names(&["color_extractor", "font_extractor"]);
    let generators = names(&["json_generator"]);

    let run = engine
        .extract("https://acme.test", Some(extractors.as_slice()), Some(generators.as_slice()), None)
        .await
        .expect("page is reachable");

    assert_eq!(
        run.extraction.keys().collect::<Vec<_>>(),
        vec!["color_extractor", "font_extractor"]
    );
    assert_eq!(run.generation.keys().collect::<Vec<_>>(), vec!["json_generator"]);
    assert_eq!(run.metadata.extractors_used, extractors);
    assert_eq!(run.metadata.generators_used, generators);
    assert_eq!(run.url, "https://acme.test");

    let colors = &run.extraction["color_extractor"];
    assert_eq!(colors["primary_color"], "#0055ff");

    let content = &run.generation["json_generator"]["content"];
    assert_eq!(content["metadata"]["url"], "https://acme.test");
    assert!(run.generation["json_generator"].get("file").is_none());
}

#[tokio::test]
async fn defaults_run_everything_available() {
    let engine = builtin_engine(true, CountingRenderer::default());
    let run = engine
        .extract("https://acme.test", None, None, None)
        .await
        .unwrap();

    assert_eq!(
        run.metadata.extractors_used,
        names(&[
            "branding_extractor",
            "color_extractor",
            "css_extractor",
            "font_extractor",
            "html_extractor"
        ])
    );
    assert_eq!(run.metadata.generators_used.len(), 7);
    assert_eq!(run.extraction["html_extractor"]["title"], "Acme");
}

#[tokio::test]
async fn empty_selection_means_defaults() {
    let engine = builtin_engine(true, CountingRenderer::default());
    let none: Vec<String> = Vec::new();
    let generators = names(&["json_generator"]);

    let run = engine
        .extract("https://acme.test", Some(none.as_slice()), Some(generators.as_slice()), None)
        .await
        .unwrap();

    assert_eq!(run.extraction.len(), 5);
}

#[tokio::test]
async fn unknown_names_are_skipped() {
    let engine = builtin_engine(true, CountingRenderer::default());
    let extractors = names(&["missing_extractor", "html_extractor"]);
    let generators = names(&["missing_generator"]);

    let run = engine
        .extract("https://acme.test", Some(extractors.as_slice()), Some(generators.as_slice()), None)
        .await
        .unwrap();

    assert_eq!(run.metadata.extractors_used, names(&["html_extractor"]));
    assert!(run.generation.is_empty());
    assert!(run.metadata.generators_used.is_empty());
}

#[tokio::test]
async fn unreachable_page_yields_none_and_releases_handle() {
    let renderer = CountingRenderer::default();
    let engine = builtin_engine(false, renderer.clone());

    let run = engine.extract("https://down.test", None, None, None).await;

    assert!(run.is_none());
    assert_eq!(renderer.acquired.load(Ordering::SeqCst), 1);
    assert_eq!(renderer.released.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unreachable_page_runs_no_plugins() {
    let (engine, extractor_calls, generator_calls) = counting_engine(false);

    assert!(engine.extract("https://down.test", None, None, None).await.is_none());
    assert_eq!(extractor_calls.load(Ordering::SeqCst), 0);
    assert_eq!(generator_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn reachable_page_runs_each_plugin_once() {
    let (engine, extractor_calls, generator_calls) = counting_engine(true);

    let run = engine.extract("https://acme.test", None, None, None).await.unwrap();
    assert_eq!(run.metadata.extractors_used, names(&["counting_extractor"]));
    assert_eq!(extractor_calls.load(Ordering::SeqCst), 1);
    assert_eq!(generator_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn handle_released_after_successful_run() {
    let renderer = CountingRenderer::default();
    let engine = builtin_engine(true, renderer.clone());

    engine.extract("https://acme.test", None, None, None).await.unwrap();
    engine.extract("https://acme.test", None, None, None).await.unwrap();

    assert_eq!(renderer.acquired.load(Ordering::SeqCst), 2);
    assert_eq!(renderer.released.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn disabled_rendering_still_extracts() {
    let registry = PluginRegistry::discover(&PluginCatalog::builtin(), PluginConfig::default());
    let engine = StyleEngine::new(
        registry,
        Box::new(StaticFetcher { reachable: true }),
        Box::new(DisabledRenderer),
    );
    let extractors = names(&["font_extractor"]);
    let generators: Vec<String> = names(&["css_generator"]);

    let run = engine
        .extract("https://acme.test", Some(extractors.as_slice()), Some(generators.as_slice()), None)
        .await
        .unwrap();

    assert_eq!(run.extraction["font_extractor"]["primary_font"], "Inter");
    let css = run.generation["css_generator"]["content"].as_str().unwrap();
    assert!(css.contains("--font-primary: 'Inter'"));
}

#[tokio::test]
async fn failing_plugins_yield_empty_results() {
    let mut registry = PluginRegistry::new(PluginConfig::default());
    registry.register_extractor("failing_extractor", Arc::new(Failing));
    registry.register_generator("panicking_generator", Arc::new(Panicking));
    let spy = Spy::default();
    let seen = Arc::clone(&spy.seen);
    registry.register_generator("spy_generator", Arc::new(spy));

    let engine = StyleEngine::new(
        registry,
        Box::new(StaticFetcher { reachable: true }),
        Box::new(DisabledRenderer),
    );
    let run = engine
        .extract("https://acme.test", None, None, None)
        .await
        .unwrap();

    assert_eq!(run.extraction["failing_extractor"], PluginOutput::new());
    assert_eq!(run.generation["panicking_generator"], PluginOutput::new());
    assert_eq!(run.generation["spy_generator"]["url"], "https://acme.test");
    assert_eq!(*seen.lock().unwrap(), names(&["failing_extractor"]));
    assert_eq!(
        run.metadata.generators_used,
        names(&["panicking_generator", "spy_generator"])
    );
}

#[tokio::test]
async fn failing_extractor_leaves_others_intact() {
    let mut registry = PluginRegistry::new(PluginConfig::default());
    registry.register_extractor("failing_extractor", Arc::new(Failing));
    registry.register_extractor("color_extractor", Arc::from(extractors::color::factory().unwrap()));
    registry.register_generator("json_generator", Arc::from(generators::json::factory().unwrap()));

    let engine = StyleEngine::new(
        registry,
        Box::new(StaticFetcher { reachable: true }),
        Box::new(DisabledRenderer),
    );
    let run = engine
        .extract("https://acme.test", None, None, None)
        .await
        .unwrap();

    assert_eq!(
        run.extraction.keys().collect::<Vec<_>>(),
        vec!["color_extractor", "failing_extractor"]
    );
    assert_eq!(run.extraction["failing_extractor"], PluginOutput::new());
    assert_eq!(run.extraction["color_extractor"]["primary_color"], "#0055ff");
    assert!(!run.extraction["color_extractor"]["colors"].as_array().unwrap().is_empty());
    assert_eq!(run.metadata.extractors_used.len(), 2);

    assert_eq!(run.generation.keys().collect::<Vec<_>>(), vec!["json_generator"]);
    let content = &run.generation["json_generator"]["content"];
    assert_eq!(content["summary"]["colors"]["primary_color"], "#0055ff");
    assert!(content["extraction_results"].get("failing_extractor").is_none());
}

#[tokio::test]
async fn generators_write_into_output_dir() {
    let engine = builtin_engine(true, CountingRenderer::default());
    let dir = tempfile::tempdir().unwrap();
    let generators = names(&["mediawiki_generator", "design-tokens_generator", "tailwind_generator"]);

    let run = engine
        .extract("https://acme.test", None, Some(generators.as_slice()), Some(dir.path()))
        .await
        .unwrap();

    let wiki = dir.path().join("mediawiki").join("styles.mediawiki");
    let tokens = dir.path().join("design-tokens").join("styles.json");
    let tailwind = dir.path().join("tailwind").join("tailwind.config.js");
    assert!(wiki.exists());
    assert!(tokens.exists());
    assert!(tailwind.exists());
    assert_eq!(
        run.generation["mediawiki_generator"]["file"],
        wiki.display().to_string()
    );
}

#[test]
fn format_queries() {
    let engine = builtin_engine(true, CountingRenderer::default());

    assert_eq!(engine.default_format().unwrap(), "mediawiki");
    assert!(engine.is_format_available("design-tokens"));
    assert!(!engine.is_format_available("pdf"));
    assert_eq!(
        engine.generator_for_format("json").as_deref(),
        Some("json_generator")
    );
    assert_eq!(engine.format_metadata("design-tokens").emoji.as_deref(), Some("🎨"));
    assert_eq!(engine.format_metadata("unknown"), Default::default());
}

#[test]
fn every_table_format_has_a_generator() {
    let engine = builtin_engine(true, CountingRenderer::default());
    let table = FallbackTable::builtin();

    let formats = engine.available_formats();
    assert_eq!(formats.len(), table.len());
    for format in &formats {
        assert!(table.contains(format), "{format} missing from the format table");
    }
    assert_eq!(
        engine.generator_for_format("modern-css").as_deref(),
        Some("modern-css_generator")
    );
    assert_eq!(engine.format_metadata("tailwind").file_extension.as_deref(), Some("js"));
}

#[tokio::test]
async fn scenario_two_extractors_one_generator() {
    let mut registry = PluginRegistry::new(PluginConfig::default());
    registry.register_extractor("color", Arc::from(extractors::color::factory().unwrap()));
    registry.register_extractor("font", Arc::from(extractors::font::factory().unwrap()));
    registry.register_generator("json_generator", Arc::from(generators::json::factory().unwrap()));
    registry.register_generator("css_generator", Arc::from(generators::css::factory().unwrap()));

    let engine = StyleEngine::new(
        registry,
        Box::new(StaticFetcher { reachable: true }),
        Box::new(DisabledRenderer),
    );
    assert_eq!(engine.format_metadata("json").emoji.as_deref(), Some("💾"));

    let dir = tempfile::tempdir().unwrap();
    let generators = names(&["json_generator"]);
    let run = engine
        .extract("https://example.com", None, Some(generators.as_slice()), Some(dir.path()))
        .await
        .unwrap();

    assert_eq!(run.generation.keys().collect::<Vec<_>>(), vec!["json_generator"]);
    assert_eq!(run.extraction.keys().collect::<Vec<_>>(), vec!["color", "font"]);
    assert!(dir.path().join("json").join("styles.json").exists());

    // Results registered as "color"/"font" still reach the generator.
    let summary = &run.generation["json_generator"]["content"]["summary"];
    assert_eq!(summary["colors"]["primary_color"], "#0055ff");
    assert_eq!(summary["typography"]["primary_font"], "Inter");
}
