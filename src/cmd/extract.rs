use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Result};

use stylescout::{FetchConfig, RunResult, StyleEngine};

use super::{load_config, normalize_url};

pub struct ExtractOptions {
    pub url: String,
    pub formats: Vec<String>,
    pub extractors: Vec<String>,
    pub generators: Vec<String>,
    pub output_dir: Option<PathBuf>,
    pub live_rendering: bool,
    pub config: Option<PathBuf>,
    pub json: bool,
}

pub async fn cmd_extract(opts: ExtractOptions) -> Result<()> {
    let url = normalize_url(&opts.url)?;
    let config = load_config(opts.config.as_deref())?;
    let engine = StyleEngine::builtin(config, FetchConfig::default(), opts.live_rendering)?;

    let generators = select_generators(&engine, &opts.formats, opts.generators)?;

    if !opts.json {
        println!("🌐 Extracting: {url}");
    }
    let start = Instant::now();
    let Some(run) = engine
        .extract(
            &url,
            Some(opts.extractors.as_slice()),
            Some(generators.as_slice()),
            opts.output_dir.as_deref(),
        )
        .await
    else {
        bail!("Could not fetch {url}");
    };
    let elapsed = start.elapsed();

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&run)?);
        return Ok(());
    }

    print_summary(&engine, &run);
    println!("\n⏱️  Done in {:.0}ms", elapsed.as_secs_f64() * 1000.0);
    Ok(())
}

/// Generator names for the run.
///
/// Formats map to their generators; with neither formats nor generators
/// given, the default format's generator is used.
fn select_generators(
    engine: &StyleEngine,
    formats: &[String],
    mut generators: Vec<String>,
) -> Result<Vec<String>> {
    for format in formats {
        let Some(generator) = engine.generator_for_format(format) else {
            bail!(
                "Unknown format '{format}'. Available: {}",
                engine.format_choices_for_cli().join(", ")
            );
        };
        if !generators.contains(&generator) {
            generators.push(generator);
        }
    }

    if generators.is_empty() {
        let format = engine.default_format()?;
        generators.extend(engine.generator_for_format(&format));
    }
    Ok(generators)
}

fn print_summary(engine: &StyleEngine, run: &RunResult) {
    let text = |extractor: &str, key: &str| {
        run.extraction
            .get(extractor)
            .and_then(|output| output.get(key))
            .and_then(|value| value.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let count = |extractor: &str, key: &str| {
        run.extraction
            .get(extractor)
            .and_then(|output| output.get(key))
            .and_then(|value| value.as_array())
            .map_or(0, Vec::len)
    };

    println!("\n📊 Extraction summary:");
    if let Some(title) = text("html_extractor", "title") {
        println!("   Title: {title}");
    }
    println!("   Colors: {}", count("color_extractor", "colors"));
    if let Some(primary) = text("color_extractor", "primary_color") {
        println!("   Primary color: {primary}");
    }
    println!("   Fonts: {}", count("font_extractor", "fonts"));
    if let Some(primary) = text("font_extractor", "primary_font") {
        println!("   Primary font: {primary}");
    }
    println!("   Extractors: {}", run.metadata.extractors_used.join(", "));

    let html_report = run
        .generation
        .values()
        .filter_map(|output| output.get("file").and_then(|v| v.as_str()))
        .find(|file| file.ends_with(".html"));

    for name in &run.metadata.generators_used {
        let Some(output) = run.generation.get(name) else {
            continue;
        };
        let Some(file) = output.get("file").and_then(|v| v.as_str()) else {
            if output.is_empty() {
                println!("\n⚠️  {name} produced no output");
            }
            continue;
        };
        let Some(format) = engine.plugin_info(name).and_then(|info| info.output_format) else {
            continue;
        };
        let metadata = engine.format_metadata(&format);
        let emoji = metadata.emoji.as_deref().unwrap_or("💾");
        println!("\n{emoji} Saved {format}: {file}");
        if let Some(message) = metadata.terminal_message_for(Some(file), html_report) {
            // Without an HTML report, steps pointing at one are dropped.
            for line in message.lines().filter(|line| !line.contains("{html_path}")) {
                println!("{line}");
            }
        }
    }
}
