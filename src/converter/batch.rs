//! # Batch Conversion Module
//!
//! Orchestratore per convertire molti file con concorrenza controllata.
//!
//! ## Responsabilità:
//! - Pianifica i job espandendo le directory di input (ricorsivamente)
//! - Calcola i path di output tramite `PathResolver`
//! - Limita le conversioni concorrenti con un `Semaphore`
//! - Aggrega le statistiche e raccoglie i fallimenti per file

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use super::path_resolver::PathResolver;
use super::webp_converter::WebPConverter;
use crate::codec::{ImageCodec, NativeCodec};
use crate::error::{ConvertError, Result};
use crate::file_handler::FileHandler;
use crate::options::ConversionOptions;
use crate::progress::{ConversionStats, ProgressManager};

/// One input and where its WebP goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl ConversionJob {
    /// Expand `inputs` into jobs.
    ///
    /// Directories are walked for supported extensions and keep their layout
    /// under `out_dir`. `output` names the destination of a single file input.
    pub fn plan(
        inputs: &[PathBuf],
        output: Option<&Path>,
        out_dir: Option<&Path>,
    ) -> Result<Vec<ConversionJob>> {
        let mut jobs = Vec::new();

        for input in inputs {
            if input.is_dir() {
                let files = FileHandler::find_image_files(input);
                debug!("Found {} images under {}", files.len(), input.display());
                for file in files {
                    let output = PathResolver::get_output_path(&file, input, out_dir)?;
                    jobs.push(ConversionJob { input: file, output });
                }
            } else {
                let base = input.parent().unwrap_or(Path::new(""));
                let output = PathResolver::get_output_path(input, base, out_dir)?;
                jobs.push(ConversionJob {
                    input: input.clone(),
                    output,
                });
            }
        }

        if let Some(output) = output {
            if out_dir.is_some() {
                return Err(ConvertError::invalid_configuration(
                    "--output and --out-dir cannot be combined",
                ));
            }
            if jobs.len() != 1 || inputs.iter().any(|input| input.is_dir()) {
                return Err(ConvertError::invalid_configuration(
                    "--output requires exactly one input file",
                ));
            }
            jobs[0].output = output.to_path_buf();
        }

        Ok(jobs)
    }
}

/// Result of a batch run
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub stats: ConversionStats,
    pub failures: Vec<(PathBuf, ConvertError)>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.stats.errors == 0
    }
}

/// Runs jobs through a shared converter, at most `workers` at a time
pub struct BatchConverter<C: ImageCodec = NativeCodec> {
    converter: Arc<WebPConverter<C>>,
    options: ConversionOptions,
    semaphore: Arc<Semaphore>,
    show_progress: bool,
}

impl<C> BatchConverter<C>
where
    C: ImageCodec + 'static,
    C::Surface: Sync,
{
    pub fn new(converter: WebPConverter<C>, options: ConversionOptions, workers: usize) -> Self {
        Self {
            converter: Arc::new(converter),
            options,
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Convert every job; failures are collected, never short-circuit the batch
    pub async fn run(&self, jobs: Vec<ConversionJob>) -> BatchOutcome {
        let progress = if self.show_progress {
            ProgressManager::new(jobs.len() as u64)
        } else {
            ProgressManager::hidden(jobs.len() as u64)
        };
        info!("Converting {} files", jobs.len());

        let mut tasks = Vec::with_capacity(jobs.len());
        for job in jobs {
            let converter = Arc::clone(&self.converter);
            let semaphore = Arc::clone(&self.semaphore);
            let progress = progress.clone();
            let options = self.options;

            let input = job.input.clone();
            let task = tokio::spawn(async move {
                // The semaphore is never closed
                let _permit = semaphore.acquire_owned().await.ok();
                let result = converter
                    .convert_with_report(&job.input, &job.output, Some(options))
                    .await;

                let name = job
                    .input
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                match &result {
                    Ok(report) => progress.update(&format!(
                        "{} -> {} ({})",
                        name,
                        FileHandler::format_size(report.output_size),
                        report.kind
                    )),
                    Err(e) => progress.update(&format!("{}: {}", name, e.kind())),
                }

                result
            });
            tasks.push((input, task));
        }

        let mut outcome = BatchOutcome::default();
        for (input, task) in tasks {
            let error = match task.await {
                Ok(Ok(report)) => {
                    outcome.stats.add_converted(report.input_size, report.output_size);
                    continue;
                }
                Ok(Err(e)) => e,
                Err(e) => ConvertError::conversion_failed(&input, format!("Conversion task failed: {}", e)),
            };

            error!("Failed to convert {}: {}", input.display(), error);
            outcome.stats.add_error();
            outcome.failures.push((input, error));
        }

        progress.finish(&outcome.stats.format_summary());
        outcome
    }
}
