//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il progress tracking e le statistiche di conversione.
//!
//! ## Responsabilità:
//! - Progress bar visual con `indicatif` per feedback real-time
//! - Tracking statistiche di conversione (file processati, convertiti, errori)
//! - Calcolo percentuali di riduzione rispetto agli input
//! - Report finale con statistiche aggregate
//!
//! ## Componenti principali:
//! - `ProgressManager`: Gestisce progress bar principale
//! - `ConversionStats`: Traccia statistiche cumulative
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:12] [========================================] 42/42 (100%) photo.jpg -> photo.webp
//! ```
//!
//! ## Esempio:
//! ```rust,ignore
//! let progress = ProgressManager::new(total_files);
//! let mut stats = ConversionStats::new();
//!
//! stats.add_converted(input_size, output_size);
//! progress.update("photo.jpg -> photo.webp");
//!
//! progress.finish(&stats.format_summary());
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::file_handler::FileHandler;

/// Manages progress reporting for batch conversion
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Progress manager that draws nothing
    pub fn hidden(total_files: u64) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_length(total_files);
        Self { bar }
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

/// Statistics tracker for conversion results
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConversionStats {
    pub files_processed: usize,
    pub files_converted: usize,
    pub errors: usize,
    pub total_input_size: u64,
    pub total_output_size: u64,
}

impl ConversionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_converted(&mut self, input_size: u64, output_size: u64) {
        self.files_processed += 1;
        self.files_converted += 1;
        self.total_input_size += input_size;
        self.total_output_size += output_size;
    }

    pub fn add_error(&mut self) {
        self.files_processed += 1;
        self.errors += 1;
    }

    pub fn overall_reduction_percent(&self) -> f64 {
        FileHandler::calculate_reduction(self.total_input_size, self.total_output_size)
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Processed: {} files | Converted: {} | Errors: {} | {} -> {} ({:.2}% smaller)",
            self.files_processed,
            self.files_converted,
            self.errors,
            FileHandler::format_size(self.total_input_size),
            FileHandler::format_size(self.total_output_size),
            self.overall_reduction_percent()
        )
    }
}
