//! # Converter Module
//!
//! Pipeline di conversione verso WebP.
//!
//! ## Struttura:
//! - `webp_converter`: Macchina a stati per la conversione di un singolo file
//! - `batch`: Conversione concorrente di molti file
//! - `path_resolver`: Calcolo centralizzato dei path di output
//! - `lease`: Rilascio garantito dell'immagine decodificata

pub mod batch;
mod lease;
pub mod path_resolver;
pub mod webp_converter;

pub use batch::{BatchConverter, BatchOutcome, ConversionJob};
pub use path_resolver::PathResolver;
pub use webp_converter::{ConversionReport, ConversionState, WebPConverter};
