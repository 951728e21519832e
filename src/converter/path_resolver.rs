//! # Path Resolution Module
//!
//! Centralizza il calcolo dei path di output per la modalità batch.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ConvertError, Result};

pub const OUTPUT_EXTENSION: &str = "webp";

/// Utility per calcolare i path di output in modo centralizzato
pub struct PathResolver;

impl PathResolver {
    /// Calcola il path di output per un file dato.
    ///
    /// With an output directory the input's position relative to
    /// `input_base_dir` is preserved; otherwise the WebP lands next to the input.
    pub fn get_output_path(
        input_path: &Path,
        input_base_dir: &Path,
        output_dir: Option<&Path>,
    ) -> Result<PathBuf> {
        let file_stem = input_path
            .file_stem()
            .ok_or_else(|| ConvertError::invalid_input(input_path, "Invalid file name"))?
            .to_string_lossy();
        let filename = format!("{}.{}", file_stem, OUTPUT_EXTENSION);

        let Some(output_dir) = output_dir else {
            // Modalità accanto all'input
            return Ok(input_path.with_file_name(filename));
        };

        let relative_dir = match input_path.strip_prefix(input_base_dir) {
            Ok(rel) => rel.parent().unwrap_or(Path::new("")),
            Err(e) => {
                debug!(
                    "{} is not under {} ({}), using flat output",
                    input_path.display(),
                    input_base_dir.display(),
                    e
                );
                Path::new("")
            }
        };

        let result = output_dir.join(relative_dir).join(filename);
        debug!("Resolved output path: {} -> {}", input_path.display(), result.display());
        Ok(result)
    }
}
