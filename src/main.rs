use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vocab_extract::pipeline::FulltextExporter;
use vocab_extract::utils::{PageSource, TesseractPageSource, TextDumpSource};
use vocab_extract::{BatchOrchestrator, ExtractConfig};

#[derive(Debug, Parser)]
#[command(author, version, about = "Extract vocabulary entries from a scanned bilingual dictionary")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// OCR a page range and append parsed entries to the CSV
    Extract(ConfigArgs),
    /// OCR a page range into one text file per page
    Fulltext(ConfigArgs),
    /// Parse existing per-page text dumps into the CSV without running OCR
    Parse(ParseArgs),
}

#[derive(Debug, Args)]
struct ConfigArgs {
    /// Path to configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Scanned dictionary PDF
    #[arg(long)]
    pdf: Option<PathBuf>,
    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Scratch directory for page images
    #[arg(long)]
    temp: Option<PathBuf>,
    /// First page (1-based)
    #[arg(long)]
    start: Option<u32>,
    /// Last page (inclusive)
    #[arg(long)]
    end: Option<u32>,
    /// Rasterization DPI
    #[arg(long)]
    dpi: Option<u32>,
    /// OCR timeout per page, in seconds
    #[arg(long)]
    timeout: Option<u64>,
}

#[derive(Debug, Args)]
struct ParseArgs {
    #[command(flatten)]
    common: ConfigArgs,
    /// Directory of page-NNN.txt dumps (default: <output>/ocr_fulltext)
    #[arg(long)]
    dumps: Option<PathBuf>,
}

impl ConfigArgs {
    fn load(&self) -> Result<ExtractConfig> {
        let mut config = match &self.config {
            Some(path) => {
                info!("Loading configuration from: {:?}", path);
                ExtractConfig::from_file(path)?
            }
            None => ExtractConfig::default(),
        };

        if let Some(pdf) = &self.pdf {
            config.source_document = pdf.clone();
        }
        if let Some(output) = &self.output {
            config.output_directory = output.clone();
        }
        if let Some(temp) = &self.temp {
            config.temp_directory = temp.clone();
        }
        if let Some(start) = self.start {
            config.page_range.start = start;
        }
        if let Some(end) = self.end {
            config.page_range.end = end;
        }
        if let Some(dpi) = self.dpi {
            config.resolution_dpi = dpi;
        }
        if let Some(timeout) = self.timeout {
            config.recognition_timeout_secs = timeout;
        }

        config.validate()?;
        info!("Configuration: {}", config);
        Ok(config)
    }
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract(args) => {
            let config = args.load()?;
            ensure_source_exists(&config)?;
            run_batch(&config, TesseractPageSource::from_config(&config))
        }
        Commands::Fulltext(args) => {
            let config = args.load()?;
            ensure_source_exists(&config)?;
            let exporter = FulltextExporter::new(config.fulltext_dir());
            exporter.export(&TesseractPageSource::from_config(&config), config.page_range)?;
            Ok(())
        }
        Commands::Parse(args) => {
            let config = args.common.load()?;
            let dumps = args.dumps.unwrap_or_else(|| config.fulltext_dir());
            info!("Parsing text dumps from: {:?}", dumps);
            run_batch(&config, TextDumpSource::new(dumps))
        }
    }
}

fn ensure_source_exists(config: &ExtractConfig) -> Result<()> {
    if !config.source_document.is_file() {
        anyhow::bail!("Source PDF does not exist: {}", config.source_document.display());
    }
    Ok(())
}

fn run_batch<S: PageSource>(config: &ExtractConfig, source: S) -> Result<()> {
    let orchestrator = BatchOrchestrator::new(config, source)?;
    let report = orchestrator.run()?;
    info!("Summary: {}", serde_json::to_string(&report)?);
    Ok(())
}
