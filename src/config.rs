//! Fixed generation policy and session defaults.

use std::path::PathBuf;

use crate::ecc::QrCodeEcc;
use crate::qrcode::Version;

/// How a payload is turned into a symbol image.
///
/// The defaults are the policy used by the `qrnote` binary: start the version search at 1,
/// highest error correction, 10 pixels per module and the standard 4-module quiet zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SymbolConfig {
    /// Smallest version tried; larger versions are used when the payload needs them.
    pub min_version: Version,
    pub ecl: QrCodeEcc,
    /// Pixels per module edge.
    pub box_size: u32,
    /// Quiet zone width in modules.
    pub border: u32,
}

impl Default for SymbolConfig {
    fn default() -> Self {
        Self {
            min_version: Version::MIN,
            ecl: QrCodeEcc::High,
            box_size: 10,
            border: 4,
        }
    }
}

/// File names and locations used by [`crate::session::Session`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Directory that relative output names are resolved against.
    pub output_dir: PathBuf,
    /// Name of the rendered page, rewritten on every round.
    pub document_name: String,
    /// Default name of the symbol pointing at the local page.
    pub image_name: String,
    /// Default name of the optional symbol pointing at a hosted URL.
    pub url_image_name: String,
    pub symbol: SymbolConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            document_name: "message.html".to_string(),
            image_name: "qr_code.png".to_string(),
            url_image_name: "qr_code_url.png".to_string(),
            symbol: SymbolConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Session writing into `output_dir` with all other settings at their defaults.
    pub fn in_dir(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }
}
