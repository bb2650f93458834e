//! Plugin registry: discovery, registration and lookup.
//!
//! Both plugin kinds are kept in registration order. Registering a name that
//! already exists replaces the instance in place: the last registration wins
//! and the name keeps its original position.

use std::any::Any;
use std::collections::BTreeSet;
use std::panic;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, warn};

use super::catalog::PluginCatalog;
use super::config::PluginConfig;
use super::{Extractor, Generator, PluginLoadError};

/// The two plugin kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginKind {
    Extractor,
    Generator,
}

impl std::fmt::Display for PluginKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Extractor => write!(f, "extractor"),
            Self::Generator => write!(f, "generator"),
        }
    }
}

/// Names of everything in the registry, for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PluginListing {
    pub extractors: Vec<String>,
    pub generators: Vec<String>,
    /// Union of both kinds, sorted.
    pub loaded: Vec<String>,
}

/// Summary of a single plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginInfo {
    pub name: String,
    pub kind: PluginKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
}

/// Indexes extractor and generator instances by name.
#[derive(Default)]
pub struct PluginRegistry {
    extractors: Vec<(String, Arc<dyn Extractor>)>,
    generators: Vec<(String, Arc<dyn Generator>)>,
    config: PluginConfig,
}

impl PluginRegistry {
    /// Create an empty registry governed by `config`.
    #[must_use]
    pub fn new(config: PluginConfig) -> Self {
        Self {
            extractors: Vec::new(),
            generators: Vec::new(),
            config,
        }
    }

    /// Create a registry and load every plugin in `catalog`.
    #[must_use]
    pub fn discover(catalog: &PluginCatalog, config: PluginConfig) -> Self {
        let mut registry = Self::new(config);
        registry.discover_from(catalog);
        registry
    }

    /// Load every plugin in `catalog`, in sorted name order.
    ///
    /// A plugin whose factory fails or panics is skipped and logged; discovery
    /// always continues with the remaining entries. Running this again over
    /// the same catalog leaves the registry with the same names.
    pub fn discover_from(&mut self, catalog: &PluginCatalog) {
        for (name, factory) in catalog.extractor_entries() {
            if let Some(plugin) = load(PluginKind::Extractor, name, *factory) {
                self.register_extractor(name.clone(), Arc::from(plugin));
            }
        }

        for (name, factory) in catalog.generator_entries() {
            if let Some(plugin) = load(PluginKind::Generator, name, *factory) {
                self.register_generator(name.clone(), Arc::from(plugin));
            }
        }

        debug!(
            extractors = self.extractors.len(),
            generators = self.generators.len(),
            "Plugin discovery finished"
        );
    }

    /// Register an extractor under `name`, returning the instance it replaced.
    pub fn register_extractor(
        &mut self,
        name: impl Into<String>,
        extractor: Arc<dyn Extractor>,
    ) -> Option<Arc<dyn Extractor>> {
        upsert(&mut self.extractors, name.into(), extractor)
    }

    /// Register a generator under `name`, returning the instance it replaced.
    pub fn register_generator(
        &mut self,
        name: impl Into<String>,
        generator: Arc<dyn Generator>,
    ) -> Option<Arc<dyn Generator>> {
        upsert(&mut self.generators, name.into(), generator)
    }

    pub fn get_extractor(&self, name: &str) -> Option<Arc<dyn Extractor>> {
        lookup(&self.extractors, name)
    }

    pub fn get_generator(&self, name: &str) -> Option<Arc<dyn Generator>> {
        lookup(&self.generators, name)
    }

    /// Extractors a run uses when the caller names none.
    ///
    /// With a configured allow-list this is the allow-list (in its own order)
    /// narrowed to registered extractors; otherwise every registered name.
    pub fn available_extractors(&self) -> Vec<String> {
        let enabled = &self.config.enabled_extractors;
        if enabled.is_empty() {
            return names(&self.extractors);
        }
        enabled
            .iter()
            .filter(|name| self.get_extractor(name).is_some())
            .cloned()
            .collect()
    }

    /// Every registered generator. The generator enable-list is deliberately
    /// not applied here.
    pub fn available_generators(&self) -> Vec<String> {
        names(&self.generators)
    }

    /// Generator instances in registration order.
    pub fn generators(&self) -> impl Iterator<Item = &Arc<dyn Generator>> {
        self.generators.iter().map(|(_, generator)| generator)
    }

    /// First generator, in registration order, producing `format`.
    pub fn generator_for_format(&self, format: &str) -> Option<Arc<dyn Generator>> {
        self.generators()
            .find(|generator| generator.output_format() == format)
            .cloned()
    }

    pub fn list_plugins(&self) -> PluginListing {
        let extractors = names(&self.extractors);
        let generators = names(&self.generators);
        let loaded: BTreeSet<String> = extractors.iter().chain(&generators).cloned().collect();

        PluginListing {
            extractors,
            generators,
            loaded: loaded.into_iter().collect(),
        }
    }

    /// Describe one plugin. Extractors shadow generators of the same name.
    pub fn plugin_info(&self, name: &str) -> Option<PluginInfo> {
        if let Some(extractor) = self.get_extractor(name) {
            return Some(PluginInfo {
                name: extractor.name().to_string(),
                kind: PluginKind::Extractor,
                description: Some(extractor.description().to_string()),
                output_format: None,
            });
        }

        self.get_generator(name).map(|generator| PluginInfo {
            name: generator.name().to_string(),
            kind: PluginKind::Generator,
            description: None,
            output_format: Some(generator.output_format().to_string()),
        })
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }
}

fn load<T: ?Sized>(
    kind: PluginKind,
    name: &str,
    factory: fn() -> Result<Box<T>, PluginLoadError>,
) -> Option<Box<T>> {
    match panic::catch_unwind(factory) {
        Ok(Ok(plugin)) => {
            debug!("Loaded {kind} plugin: {name}");
            Some(plugin)
        }
        Ok(Err(PluginLoadError::Unavailable(reason))) => {
            warn!("Failed to load {kind} plugin {name}: {reason}");
            None
        }
        Ok(Err(err)) => {
            error!("Error loading {kind} plugin {name}: {err}");
            None
        }
        Err(payload) => {
            error!(
                "Error loading {kind} plugin {name}: factory panicked: {}",
                panic_message(payload.as_ref())
            );
            None
        }
    }
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn upsert<T: ?Sized>(
    slots: &mut Vec<(String, Arc<T>)>,
    name: String,
    plugin: Arc<T>,
) -> Option<Arc<T>> {
    if let Some(slot) = slots.iter_mut().find(|(existing, _)| *existing == name) {
        return Some(std::mem::replace(&mut slot.1, plugin));
    }
    slots.push((name, plugin));
    None
}

fn lookup<T: ?Sized>(slots: &[(String, Arc<T>)], name: &str) -> Option<Arc<T>> {
    slots
        .iter()
        .find(|(existing, _)| existing == name)
        .map(|(_, plugin)| Arc::clone(plugin))
}

fn names<T: ?Sized>(slots: &[(String, Arc<T>)]) -> Vec<String> {
    slots.iter().map(|(name, _)| name.clone()).collect()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::engine::GenerationPayload;
    use crate::fetch::ParsedDocument;
    use crate::plugin::PluginOutput;
    use crate::render::RenderingHandle;

    struct Named(&'static str);

    impl Extractor for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            "test extractor"
        }

        fn extract(
            &self,
            _document: &ParsedDocument,
            _live: Option<&dyn RenderingHandle>,
            _url: &str,
        ) -> anyhow::Result<PluginOutput> {
            Ok(PluginOutput::new())
        }
    }

    struct Format(&'static str, &'static str);

    impl Generator for Format {
        fn name(&self) -> &str {
            self.0
        }

        fn output_format(&self) -> &str {
            self.1
        }

        fn generate(
            &self,
            _payload: &GenerationPayload,
            _output_dir: Option<&Path>,
        ) -> anyhow::Result<PluginOutput> {
            Ok(PluginOutput::new())
        }
    }

    fn alpha() -> Result<Box<dyn Extractor>, PluginLoadError> {
        Ok(Box::new(Named("alpha")))
    }

    fn beta() -> Result<Box<dyn Extractor>, PluginLoadError> {
        Ok(Box::new(Named("beta")))
    }

    fn missing() -> Result<Box<dyn Extractor>, PluginLoadError> {
        Err(PluginLoadError::Unavailable("no such module".into()))
    }

    fn broken() -> Result<Box<dyn Extractor>, PluginLoadError> {
        Err(PluginLoadError::Construction(anyhow::anyhow!("bad state")))
    }

    fn exploding() -> Result<Box<dyn Extractor>, PluginLoadError> {
        panic!("factory blew up")
    }

    fn json() -> Result<Box<dyn Generator>, PluginLoadError> {
        Ok(Box::new(Format("json_generator", "json")))
    }

    fn catalog() -> PluginCatalog {
        PluginCatalog::new()
            .with_extractor("beta", beta)
            .with_extractor("missing", missing)
            .with_extractor("alpha", alpha)
            .with_extractor("broken", broken)
            .with_extractor("exploding", exploding)
            .with_generator("json_generator", json)
    }

    #[test]
    fn discovery_skips_failing_plugins() {
        let registry = PluginRegistry::discover(&catalog(), PluginConfig::default());
        assert_eq!(registry.available_extractors(), vec!["alpha", "beta"]);
        assert!(registry.get_extractor("broken").is_none());
        assert!(registry.get_extractor("exploding").is_none());
        assert!(registry.get_extractor("missing").is_none());
        assert!(registry.get_generator("json_generator").is_some());
    }

    #[test]
    fn discovery_is_idempotent() {
        let mut registry = PluginRegistry::discover(&catalog(), PluginConfig::default());
        let before = registry.list_plugins();
        registry.discover_from(&catalog());
        assert_eq!(registry.list_plugins(), before);
    }

    #[test]
    fn register_overwrites_in_place() {
        let mut registry = PluginRegistry::new(PluginConfig::default());
        assert!(registry
            .register_extractor("one", Arc::new(Named("first")))
            .is_none());
        registry.register_extractor("two", Arc::new(Named("two")));
        let replaced = registry.register_extractor("one", Arc::new(Named("second")));

        assert_eq!(replaced.map(|e| e.name().to_string()), Some("first".into()));
        assert_eq!(registry.available_extractors(), vec!["one", "two"]);
        assert_eq!(registry.get_extractor("one").unwrap().name(), "second");
    }

    #[test]
    fn allow_list_filters_extractors_only() {
        let config = PluginConfig {
            enabled_extractors: vec!["beta".into(), "ghost".into(), "alpha".into()],
            enabled_generators: vec!["nothing".into()],
        };
        let registry = PluginRegistry::discover(&catalog(), config);

        assert_eq!(registry.available_extractors(), vec!["beta", "alpha"]);
        assert_eq!(registry.available_generators(), vec!["json_generator"]);
    }

    #[test]
    fn listing_reports_union() {
        let registry = PluginRegistry::discover(&catalog(), PluginConfig::default());
        let listing = registry.list_plugins();
        assert_eq!(listing.extractors, vec!["alpha", "beta"]);
        assert_eq!(listing.generators, vec!["json_generator"]);
        assert_eq!(listing.loaded, vec!["alpha", "beta", "json_generator"]);
    }

    #[test]
    fn plugin_info_by_kind() {
        let registry = PluginRegistry::discover(&catalog(), PluginConfig::default());

        let info = registry.plugin_info("alpha").unwrap();
        assert_eq!(info.kind, PluginKind::Extractor);
        assert_eq!(info.description.as_deref(), Some("test extractor"));

        let info = registry.plugin_info("json_generator").unwrap();
        assert_eq!(info.kind, PluginKind::Generator);
        assert_eq!(info.output_format.as_deref(), Some("json"));

        assert!(registry.plugin_info("nope").is_none());
    }

    #[test]
    fn generator_for_format_takes_first_registered() {
        let mut registry = PluginRegistry::new(PluginConfig::default());
        registry.register_generator("a", Arc::new(Format("a", "json")));
        registry.register_generator("b", Arc::new(Format("b", "json")));

        assert_eq!(registry.generator_for_format("json").unwrap().name(), "a");
        assert!(registry.generator_for_format("css").is_none());
    }

    #[test]
    fn panic_message_handles_both_payloads() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let borrowed: Box<dyn Any + Send> = Box::new("borrowed");
        let other: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(borrowed.as_ref()), "borrowed");
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }
}
