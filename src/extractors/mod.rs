//! Built-in extractors.
//!
//! Each submodule exposes a `factory` registered in
//! [`PluginCatalog::builtin`](crate::plugin::PluginCatalog::builtin).
//! The heuristics are best-effort: they read whatever CSS and markup the
//! fetcher handed over and never touch the network themselves.

pub mod branding;
pub mod color;
pub mod css;
pub mod font;
pub mod html;

use std::collections::HashSet;

use tracing::warn;

use crate::render::RenderingHandle;

/// Run `script` on the live handle and collect the string items of the
/// returned array.
///
/// A missing handle, a script failure or a non-array result all yield an
/// empty list; the extractor carries on with static data.
pub(crate) fn live_strings(live: Option<&dyn RenderingHandle>, script: &str, what: &str) -> Vec<String> {
    let Some(handle) = live else {
        return Vec::new();
    };
    match handle.evaluate(script) {
        Ok(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        Ok(_) => Vec::new(),
        Err(e) => {
            warn!("Could not get computed {what}: {e}");
            Vec::new()
        }
    }
}

/// Keep the first occurrence of every value, comparing case-insensitively.
pub(crate) fn dedup_case_insensitive(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.to_lowercase()))
        .collect()
}
