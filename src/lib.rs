//! # WebP Converter Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare della pipeline di conversione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!
//! ## Architettura dei moduli:
//! - `options`: Opzioni di encode immutabili e validate
//! - `format`: Formati di input supportati (JPEG/PNG/GIF/BMP)
//! - `validator`: Controlli su file, estensione, dimensione e contenuto
//! - `codec`: Trait del codec e implementazione nativa (libwebp)
//! - `file_handler`: Directory di output, scrittura e rilascio risorse
//! - `converter`: Macchina a stati della conversione e modalità batch
//! - `config`: Configurazione persistente in JSON
//! - `progress`: Progress bar e statistiche
//! - `error`: Tipi di errore della libreria
//!
//! ## Utilizzo:
//! ```rust,no_run
//! use webp_converter::{ConversionOptions, WebPConverter};
//!
//! # async fn run() -> webp_converter::Result<()> {
//! let converter = WebPConverter::new()?;
//! let options = ConversionOptions::create().with_quality(90)?;
//! converter.convert("photo.jpg", "photo.webp", Some(options)).await?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod converter;
pub mod error;
pub mod file_handler;
pub mod format;
pub mod options;
pub mod progress;
pub mod validator;

#[cfg(test)]
mod test_support;

pub use codec::{AlphaMode, CodecError, DecodedImage, EncodeSettings, ImageCodec, NativeCodec};
pub use config::ConverterConfig;
pub use converter::{
    BatchConverter, BatchOutcome, ConversionJob, ConversionReport, ConversionState,
    PathResolver, WebPConverter,
};
pub use error::{ConvertError, ErrorKind, Result};
pub use file_handler::FileHandler;
pub use format::ImageKind;
pub use options::ConversionOptions;
pub use progress::{ConversionStats, ProgressManager};
pub use validator::{ImageValidator, SniffOutcome, ValidatedInput};
