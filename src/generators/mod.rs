//! Built-in generators.
//!
//! Every generator renders the [`GenerationPayload`] into its format and
//! returns `{"content": ...}`. Given an output directory it also writes
//! `<dir>/<format>/<artifact name>` through [`write_artifact`] and adds
//! `"file"` to the result.
//!
//! Generators look up extractor results by the name each extractor reports
//! for itself ("color_extractor"), through [`GenerationPayload::extractor`].

pub mod css;
pub mod design_tokens;
pub mod html;
pub mod json;
pub mod mediawiki;
pub mod modern_css;
pub mod tailwind;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::info;

use crate::engine::GenerationPayload;
use crate::plugin::{Generator, PluginOutput};

/// Name written into generated artifacts.
pub(crate) const GENERATED_BY: &str = concat!("stylescout ", env!("CARGO_PKG_VERSION"));

/// Write `contents` to `<output_dir>/<format>/<file_name>`.
///
/// An existing file is first moved to
/// `<output_dir>/<format>/archive/<%Y-%m-%d-%H-%M-%S>/`.
pub fn write_artifact(
    output_dir: &Path,
    format: &str,
    file_name: &str,
    contents: &str,
) -> Result<PathBuf> {
    let format_dir = output_dir.join(format);
    fs::create_dir_all(&format_dir)
        .with_context(|| format!("Failed to create {}", format_dir.display()))?;

    let path = format_dir.join(file_name);
    if path.exists() {
        archive(&path, &format_dir)?;
    }

    fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(path)
}

fn archive(path: &Path, format_dir: &Path) -> Result<PathBuf> {
    let timestamp = chrono::Local::now().format("%Y-%m-%d-%H-%M-%S").to_string();
    let archive_dir = format_dir.join("archive").join(&timestamp);
    fs::create_dir_all(&archive_dir)
        .with_context(|| format!("Failed to create {}", archive_dir.display()))?;

    let file_name = path.file_name().context("artifact path has no file name")?;
    let target = archive_dir.join(file_name);
    fs::rename(path, &target)
        .with_context(|| format!("Failed to archive {}", path.display()))?;
    info!("Archived {} to archive/{timestamp}/", file_name.to_string_lossy());
    Ok(target)
}

/// Package a generator result, writing the artifact when `output_dir` is set.
pub(crate) fn emit(
    generator: &dyn Generator,
    content: Value,
    rendered: &str,
    output_dir: Option<&Path>,
) -> Result<PluginOutput> {
    let mut output = PluginOutput::new();
    if let Some(dir) = output_dir {
        let path = write_artifact(
            dir,
            generator.output_format(),
            &generator.artifact_name(),
            rendered,
        )?;
        output.insert("file".into(), Value::String(path.display().to_string()));
    }
    output.insert("content".into(), content);
    Ok(output)
}

/// One field of one extractor's result.
pub(crate) fn field<'a>(payload: &'a GenerationPayload, extractor: &str, key: &str) -> Option<&'a Value> {
    payload.extractor(extractor)?.get(key)
}

/// A string-array field, skipping non-string items.
pub(crate) fn strings(payload: &GenerationPayload, extractor: &str, key: &str) -> Vec<String> {
    field(payload, extractor, key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// A string field, treating empty strings as absent.
pub(crate) fn text<'a>(payload: &'a GenerationPayload, extractor: &str, key: &str) -> Option<&'a str> {
    field(payload, extractor, key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

/// Page background: the body's own, else the palette's, else white.
pub(crate) fn body_background(payload: &GenerationPayload) -> &str {
    text(payload, "html_extractor", "body_background")
        .or_else(|| {
            field(payload, "color_extractor", "color_palette")
                .and_then(|palette| palette.get("background"))
                .and_then(Value::as_str)
                .filter(|value| !value.is_empty())
        })
        .unwrap_or("#ffffff")
}
