use std::path::Path;

use anyhow::Result;

use stylescout::{FetchConfig, StyleEngine};

use super::load_config;

fn engine(config: Option<&Path>) -> Result<StyleEngine> {
    StyleEngine::builtin(load_config(config)?, FetchConfig::default(), false)
}

pub fn cmd_plugins(config: Option<&Path>, json: bool) -> Result<()> {
    let engine = engine(config)?;
    let listing = engine.list_available_plugins();

    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("🔌 Extractors ({}):", listing.extractors.len());
    for name in &listing.extractors {
        match engine.plugin_info(name).and_then(|info| info.description) {
            Some(description) => println!("   {name:<24} {description}"),
            None => println!("   {name}"),
        }
    }

    println!("\n🛠️  Generators ({}):", listing.generators.len());
    for name in &listing.generators {
        match engine.plugin_info(name).and_then(|info| info.output_format) {
            Some(format) => println!("   {name:<24} → {format}"),
            None => println!("   {name}"),
        }
    }

    println!("\n📋 Loaded: {}", listing.loaded.join(", "));
    Ok(())
}

pub fn cmd_formats(config: Option<&Path>) -> Result<()> {
    let engine = engine(config)?;

    println!("📦 Available formats:\n");
    println!("{}", engine.format_descriptions_for_help());

    match engine.default_format() {
        Ok(format) => println!("\nDefault: {format}"),
        Err(e) => println!("\n⚠️  {e}"),
    }
    Ok(())
}
