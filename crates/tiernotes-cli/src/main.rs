use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tiernotes_core::classify::heuristic::HeuristicClassifier;
use tiernotes_core::{
    ClassifierKind, Config, Pipeline, TierPolicy, backend, build_classifier, config_file,
    sanitize,
};
use tiernotes_pdf_mupdf::MupdfBackend;

mod output;

use output::ColorMode;

/// Tiered lecture notes - split a PDF into core, detailed and full-theory notes
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate easy/medium/hard note PDFs from a lecture PDF
    Process {
        /// Path to the lecture PDF
        file_path: PathBuf,

        /// Directory to write easy.pdf, medium.pdf and hard.pdf into
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Classifier to use (heuristic or delegated)
        #[arg(long)]
        strategy: Option<ClassifierKind>,

        /// Heuristic tier policy (weighted or simple)
        #[arg(long)]
        policy: Option<TierPolicy>,

        /// Write into a fresh subdirectory per run
        #[arg(long)]
        per_request_dirs: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Dry run: print how each sentence would be tiered, without rendering
    Classify {
        /// Path to the lecture PDF
        file_path: PathBuf,

        /// Heuristic tier policy (weighted or simple)
        #[arg(long)]
        policy: Option<TierPolicy>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    // Resolve configuration: CLI flags > env vars > config files > defaults
    let file = config_file::load_config();
    let mut config = Config::from_file(&file)?;
    config.apply_env(|key| std::env::var(key).ok())?;

    match cli.command {
        Command::Process {
            file_path,
            output_dir,
            strategy,
            policy,
            per_request_dirs,
            no_color,
        } => {
            if let Some(dir) = output_dir {
                config.output.dir = dir;
            }
            if let Some(strategy) = strategy {
                config.classifier = strategy;
            }
            if let Some(policy) = policy {
                config.heuristic.policy = policy;
            }
            config.output.per_request_dirs |= per_request_dirs;
            process(file_path, &config, ColorMode(!no_color)).await
        }
        Command::Classify {
            file_path,
            policy,
            no_color,
        } => {
            if let Some(policy) = policy {
                config.heuristic.policy = policy;
            }
            classify(file_path, &config, ColorMode(!no_color)).await
        }
    }
}

fn read_input(file_path: &Path) -> anyhow::Result<Vec<u8>> {
    if !file_path.exists() {
        anyhow::bail!("File not found: {}", file_path.display());
    }
    Ok(std::fs::read(file_path)?)
}

async fn process(file_path: PathBuf, config: &Config, color: ColorMode) -> anyhow::Result<()> {
    let data = read_input(&file_path)?;

    let classifier = build_classifier(config)?;
    let pipeline = Pipeline::new(Arc::new(MupdfBackend::new()), classifier, config);
    tracing::info!(
        file = %file_path.display(),
        classifier = pipeline.classifier_name(),
        "processing"
    );

    let notes = pipeline.run(data).await?;
    let dir = notes.output_dir.ok_or_else(|| {
        anyhow::anyhow!(
            "notes were generated but could not be written to {}",
            config.output.dir.display()
        )
    })?;

    let mut stdout = std::io::stdout();
    output::print_written(&mut stdout, &dir, color)?;
    stdout.flush()?;
    Ok(())
}

async fn classify(file_path: PathBuf, config: &Config, color: ColorMode) -> anyhow::Result<()> {
    let data = read_input(&file_path)?;
    let file_name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file_path.display().to_string());

    let max_pages = config.max_pages;
    let raw = tokio::task::spawn_blocking(move || {
        backend::extract_text(&MupdfBackend::new(), &data, max_pages)
    })
    .await??;

    let classifier = HeuristicClassifier::new(config.heuristic.clone());
    let buckets = classifier.buckets(&sanitize(&raw));

    let mut stdout = std::io::stdout();
    output::print_buckets(&mut stdout, &file_name, &buckets, color)?;
    stdout.flush()?;
    Ok(())
}
