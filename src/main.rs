//! `stylescout` CLI - extract design attributes from live websites

mod cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "stylescout")]
#[command(about = "Extract colors, fonts and CSS structure from websites")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract styles from a URL and generate output
    Extract {
        /// URL to analyze (https:// is added when no scheme is given)
        url: String,

        /// Output format(s), e.g. `-o json -o css`
        #[arg(short = 'o', long = "format")]
        formats: Vec<String>,

        /// Extractors to run (comma-separated, default: all enabled)
        #[arg(long, value_delimiter = ',')]
        extractors: Vec<String>,

        /// Generators to run (comma-separated)
        #[arg(long, value_delimiter = ',')]
        generators: Vec<String>,

        /// Directory to write generated files into
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Skip live rendering; analyze static HTML and CSS only
        #[arg(long)]
        no_render: bool,

        /// Plugin config file (default: ~/.config/stylescout/plugins.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the full run result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List registered plugins
    Plugins {
        /// Plugin config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show available output formats
    Formats {
        /// Plugin config file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match cli.command {
        Commands::Extract {
            url,
            formats,
            extractors,
            generators,
            output_dir,
            no_render,
            config,
            json,
        } => {
            cmd::extract::cmd_extract(cmd::extract::ExtractOptions {
                url,
                formats,
                extractors,
                generators,
                output_dir,
                live_rendering: !no_render,
                config,
                json,
            })
            .await?;
        }
        Commands::Plugins { config, json } => {
            cmd::plugins::cmd_plugins(config.as_deref(), json)?;
        }
        Commands::Formats { config } => {
            cmd::plugins::cmd_formats(config.as_deref())?;
        }
    }

    Ok(())
}
