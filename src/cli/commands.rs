//! CLI command definitions and handlers

use anyhow::Context;
use clap::{Args, Subcommand};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::info;

use crate::core::config::TranslatorConfig;
use crate::core::models::TranslationRequest;
use crate::core::translator::Translator;
use crate::profile::{create_engine, list_profiles, load_profile};

/// Commands for Translation AI
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Translate a document
    Translate {
        #[command(subcommand)]
        command: TranslateCommands,
    },

    /// Inspect translation profiles
    Profiles {
        #[command(subcommand)]
        command: ProfilesCommands,
    },
}

/// Document formats that can be translated
#[derive(Subcommand, Debug)]
pub enum TranslateCommands {
    /// Translate Markdown, keeping code, frontmatter and layout intact
    Markdown(MarkdownArgs),
}

/// Profile inspection commands
#[derive(Subcommand, Debug)]
pub enum ProfilesCommands {
    /// List available profiles
    List,

    /// Show a profile with its API key masked
    Show {
        /// Profile name
        name: String,
    },
}

/// Arguments of `translate markdown`
#[derive(Args, Debug)]
pub struct MarkdownArgs {
    /// Profile to translate with
    #[arg(short, long)]
    pub profile: String,

    /// Source language
    #[arg(long)]
    pub from: String,

    /// Target language
    #[arg(long)]
    pub to: String,

    /// Print fragments as they arrive
    #[arg(long)]
    pub stream: bool,

    /// Maximum span size in characters (overrides the config file)
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Read the document from a file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Document text (reads --file or stdin when omitted)
    pub input: Option<String>,
}

/// Pick the document: positional text, then `--file`, then `reader`
pub async fn resolve_input<R>(input: Option<String>, file: Option<&Path>, mut reader: R) -> anyhow::Result<String>
where
    R: AsyncRead + Unpin,
{
    if let Some(text) = input {
        return Ok(text);
    }

    if let Some(path) = file {
        return tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()));
    }

    let mut content = String::new();
    reader
        .read_to_string(&mut content)
        .await
        .context("Failed to read standard input")?;
    Ok(content)
}

/// Handle `translate markdown`
pub async fn handle_translate_markdown(args: MarkdownArgs, config: &TranslatorConfig) -> anyhow::Result<()> {
    let start_time = Instant::now();

    let config = match args.chunk_size {
        Some(chunk_size) => config.clone().with_chunk_size(chunk_size),
        None => config.clone(),
    };
    config.validate()?;

    let content = resolve_input(args.input, args.file.as_deref(), tokio::io::stdin()).await?;

    let profile = load_profile(&config.profiles_dir, &args.profile)
        .with_context(|| format!("Cannot use profile '{}'", args.profile))?;
    let engine = create_engine(&profile, &config)?;

    let translator = Translator::markdown(engine, config.chunk_size);
    let request = TranslationRequest::new(content, args.from, args.to);

    let mut stdout = tokio::io::stdout();

    if args.stream {
        let mut fragments = translator.translate_stream(&request);
        while let Some(fragment) = fragments.next().await {
            let fragment = fragment.context("Translation failed")?;
            stdout.write_all(fragment.as_bytes()).await?;
            stdout.flush().await?;
        }
    } else {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
        spinner.set_message(format!("Translating from {} to {}", request.source_lang, request.target_lang));
        spinner.enable_steady_tick(Duration::from_millis(100));

        let result = translator.translate(&request).await;
        spinner.finish_and_clear();

        let translated = result.context("Translation failed")?;
        stdout.write_all(translated.as_bytes()).await?;
        stdout.flush().await?;
    }

    info!("Completed in {:?}", start_time.elapsed());
    Ok(())
}

/// Handle `profiles list`
pub async fn handle_profiles_list(config: &TranslatorConfig) -> anyhow::Result<()> {
    let names = list_profiles(&config.profiles_dir)?;

    if names.is_empty() {
        eprintln!("No profiles found in {}", config.profiles_dir.display());
        return Ok(());
    }

    for name in names {
        println!("{}", name);
    }
    Ok(())
}

/// Handle `profiles show`
pub async fn handle_profiles_show(name: &str, config: &TranslatorConfig) -> anyhow::Result<()> {
    let profile = load_profile(&config.profiles_dir, name)?;
    println!("{}", serde_json::to_string_pretty(&profile.redacted())?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_positional_input_wins() {
        let input = resolve_input(Some("# Title".to_string()), Some(Path::new("/missing.md")), &b"stdin"[..])
            .await
            .unwrap();

        assert_eq!(input, "# Title");
    }

    #[tokio::test]
    async fn test_file_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.md");
        std::fs::write(&path, "# From file\n").unwrap();

        let input = resolve_input(None, Some(&path), &b"stdin"[..]).await.unwrap();

        assert_eq!(input, "# From file\n");
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let result = resolve_input(None, Some(Path::new("/definitely/not/here.md")), &b""[..]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_reader_fallback() {
        let input = resolve_input(None, None, &b"piped\n"[..]).await.unwrap();
        assert_eq!(input, "piped\n");
    }
}
