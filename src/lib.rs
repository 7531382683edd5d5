//! # qrnote
//!
//! Turn a short message into a styled HTML card and a QR code that opens it.
//!
//! `qrnote` has two independent generators and a small interactive driver on top:
//!
//! - [`DocumentRenderer`] escapes a message and embeds it in a self-contained HTML page.
//! - [`SymbolEncoder`] encodes any text (a `file://` link to that page, or a URL where the page
//!   is hosted) into a QR symbol and writes it as a PNG (or SVG) image.
//! - [`session::Session`] runs the prompt flow used by the `qrnote` binary.
//!
//! Symbols are built by an in-crate QR Code Model 2 encoder: versions 1 to 40, four error
//! correction levels, numeric, alphanumeric and byte modes, automatic mask selection.
//!
//! ## Example
//!
//! ```rust,no_run
//! use qrnote::{session::file_uri, DocumentRenderer, SymbolEncoder};
//!
//! let page = DocumentRenderer::new().render("Meet me at 6 <3", "message.html")?;
//! SymbolEncoder::default().encode(&file_uri(&page), "qr_code.png")?;
//! # Ok::<(), qrnote::Error>(())
//! ```
//!
//! ## Modules
//!
//! - [`qrcode`]: QR symbol construction.
//! - [`segment`]: Data segments and mode selection.
//! - [`ecc`]: Error correction levels, capacity tables, Reed-Solomon.
//! - [`symbol`]: Rendering symbols to image files.
//! - [`document`]: The message page.
//! - [`session`]: The interactive flow.

pub mod config;
pub mod document;
pub mod ecc;
pub mod error;
pub mod qrcode;
pub mod segment;
pub mod session;
pub mod symbol;

pub use config::{SessionConfig, SymbolConfig};
pub use document::{escape_html, DocumentRenderer, Message};
pub use ecc::QrCodeEcc;
pub use error::{Error, Result};
pub use qrcode::{DataTooLong, QrCode, Version};
pub use symbol::SymbolEncoder;
