//! # WebP Converter - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Merge della configurazione da file con i flag CLI
//! - Pianificazione dei job e avvio della conversione batch
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI (input, quality, lossless, workers, etc.)
//! 2. Configura il logging (INFO o DEBUG a seconda del flag verbose, `RUST_LOG` ha la precedenza)
//! 3. Carica la configurazione (se presente) e applica gli override
//! 4. Verifica che l'encoder WebP sia disponibile
//! 5. Converte tutti i file e stampa il riepilogo
//!
//! ## Esempio di utilizzo:
//! ```bash
//! webp-convert photos/ --out-dir webp/ --quality 85 --workers 8 --verbose
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use webp_converter::{
    BatchConverter, ConversionJob, ConverterConfig, FileHandler, ImageCodec, ImageKind,
    NativeCodec, WebPConverter,
};

#[derive(Parser)]
#[command(name = "webp-convert")]
#[command(about = "Convert JPEG, PNG, GIF and BMP images to WebP")]
struct Args {
    /// Input images or directories
    #[arg(required_unless_present = "check")]
    inputs: Vec<PathBuf>,

    /// Output file (single input only)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output directory; directory inputs keep their layout below it
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// WebP quality (0-100)
    #[arg(short, long)]
    quality: Option<u8>,

    /// Lossless encoding (quality is forced to 100)
    #[arg(long)]
    lossless: bool,

    /// Request metadata preservation
    #[arg(long)]
    preserve_metadata: bool,

    /// Maximum input size in bytes
    #[arg(long)]
    max_size: Option<u64>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of parallel workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Report whether the WebP encoder is usable and exit
    #[arg(long)]
    check: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if args.check {
        return check_capability();
    }

    let config = load_config(&args).await?;
    let options = config.conversion_options()?;

    let jobs = ConversionJob::plan(&args.inputs, args.output.as_deref(), args.out_dir.as_deref())?;
    if jobs.is_empty() {
        info!("No supported images found");
        return Ok(());
    }

    if options.preserve_metadata() {
        info!("Metadata preservation requested; output carries pixel data only");
    }

    let converter = WebPConverter::from_config(&config)?;
    let batch = BatchConverter::new(converter, options, config.workers).with_progress(jobs.len() > 1);
    let outcome = batch.run(jobs).await;

    info!("{}", outcome.stats.format_summary());

    if !outcome.is_success() {
        for (input, e) in &outcome.failures {
            error!("{} [{}]: {}", input.display(), e.kind(), e);
        }
        return Err(anyhow::anyhow!(
            "{} of {} conversions failed",
            outcome.stats.errors,
            outcome.stats.files_processed
        ));
    }

    Ok(())
}

/// Config file values, then CLI overrides
async fn load_config(args: &Args) -> Result<ConverterConfig> {
    let mut config = match &args.config {
        Some(path) => ConverterConfig::from_file(path).await?,
        None => ConverterConfig::default(),
    };

    if let Some(quality) = args.quality {
        config.quality = quality;
    }
    if args.lossless {
        config.lossless = true;
    }
    if args.preserve_metadata {
        config.preserve_metadata = true;
    }
    if let Some(max_size) = args.max_size {
        config.max_file_size = max_size;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }

    config.validate()?;
    Ok(config)
}

fn check_capability() -> Result<()> {
    let converter = WebPConverter::with_codec(NativeCodec::new())?;
    let kinds: Vec<String> = ImageKind::ALL.iter().map(|kind| kind.to_string()).collect();

    info!("WebP encoder available (codec: {})", converter.codec().name());
    info!("Supported inputs: {}", kinds.join(", "));
    info!(
        "Default input limit: {}",
        FileHandler::format_size(converter.validator().max_file_size())
    );
    Ok(())
}
