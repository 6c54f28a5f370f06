//! Main entry point for the Translation AI CLI

#![forbid(unsafe_code)]

use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use translation_ai::cli::commands::{self, Commands, ProfilesCommands, TranslateCommands};
use translation_ai::TranslatorConfig;

/// Translation AI - structure-preserving Markdown translation
#[derive(Parser, Debug)]
#[command(name = "translation-ai", version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./translation-ai.{toml,json,yaml} if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let args = Args::parse();

    // Logs go to stderr; stdout carries the translation
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("translation_ai={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = TranslatorConfig::load(args.config.as_deref())?;

    match args.command {
        Commands::Translate {
            command: TranslateCommands::Markdown(markdown),
        } => commands::handle_translate_markdown(markdown, &config).await?,
        Commands::Profiles {
            command: ProfilesCommands::List,
        } => commands::handle_profiles_list(&config).await?,
        Commands::Profiles {
            command: ProfilesCommands::Show { name },
        } => commands::handle_profiles_show(&name, &config).await?,
    }

    Ok(())
}
