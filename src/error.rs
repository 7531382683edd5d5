//! Error type shared by the document renderer, the symbol encoder and the session driver.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::ecc::QrCodeEcc;
use crate::qrcode::DataTooLong;

/// All errors returned by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The message is empty or only whitespace.
    #[error("Text cannot be empty!")]
    EmptyMessage,

    /// The payload does not fit in a version 40 symbol at the configured level.
    #[error(
        "payload of {len} bytes does not fit in a QR symbol at {ecl} error correction ({source})"
    )]
    Encoding {
        len: usize,
        ecl: QrCodeEcc,
        #[source]
        source: DataTooLong,
    },

    /// An output file could not be written.
    #[error("failed to write '{path}': {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The output extension does not name an image format this crate can write.
    #[error("unsupported image format for '{path}'", path = .path.display())]
    UnsupportedFormat { path: PathBuf },

    /// The image codec failed while encoding the symbol.
    #[error("failed to encode image '{path}': {source}", path = .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The configured module size and quiet zone give an image too large to draw.
    #[error("symbol image too large (box size {box_size}, border {border})")]
    SymbolTooLarge { box_size: u32, border: u32 },

    /// Standard input ended while a prompt was waiting for an answer.
    #[error("input ended before all prompts were answered")]
    InputClosed,

    /// Reading a prompt answer or writing to the terminal failed.
    #[error("terminal I/O failed: {0}")]
    Terminal(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
