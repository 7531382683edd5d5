//! Rendering symbols to image files.
//!
//! A [`SymbolEncoder`] turns a payload into a [`QrCode`] and draws it as a grayscale raster or
//! an SVG document, with a configurable module size and quiet zone.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::{GrayImage, ImageBuffer, ImageFormat, Luma};
use tracing::info;

use crate::config::SymbolConfig;
use crate::error::{Error, Result};
use crate::qrcode::QrCode;

/// Largest image side, in pixels, that the encoder will draw.
const MAX_IMAGE_SIDE: u32 = 16_384;

/*---- Output formats ----*/

enum OutputFormat {
    Svg,
    Raster(ImageFormat),
}

impl OutputFormat {
    /// Picks the format from the file extension: `.svg` for vector output, otherwise whatever
    /// raster format the `image` crate associates with the extension.
    fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("svg") => Ok(OutputFormat::Svg),
            _ => ImageFormat::from_path(path)
                .map(OutputFormat::Raster)
                .map_err(|_| Error::UnsupportedFormat {
                    path: path.to_path_buf(),
                }),
        }
    }
}

/// Encodes payloads into QR symbol images.
///
/// Every call is independent; an encoder can be shared freely and used for any number of
/// payloads and output files.
///
/// # Example
///
/// ```rust,no_run
/// use qrnote::{SymbolConfig, SymbolEncoder};
///
/// let encoder = SymbolEncoder::new(SymbolConfig::default());
/// encoder.encode("https://example.com/message.html", "qr_code.png")?;
/// # Ok::<(), qrnote::Error>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct SymbolEncoder {
    config: SymbolConfig,
}

impl SymbolEncoder {
    pub fn new(config: SymbolConfig) -> Self {
        Self { config }
    }

    /// Encodes `payload` into a symbol using the smallest version that fits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if the payload exceeds the capacity of a version 40 symbol
    /// at the configured error correction level.
    pub fn symbol(&self, payload: &str) -> Result<QrCode> {
        QrCode::encode_text(payload, self.config.ecl, self.config.min_version).map_err(|source| {
            Error::Encoding {
                len: payload.len(),
                ecl: self.config.ecl,
                source,
            }
        })
    }

    /// Side of the drawn symbol in modules (quiet zone included) and in pixels.
    fn dimensions(&self, qr: &QrCode) -> Result<(u32, u32)> {
        let SymbolConfig {
            box_size, border, ..
        } = self.config;
        let modules = border
            .checked_mul(2)
            .and_then(|b| b.checked_add(qr.size().unsigned_abs()));
        let pixels = modules.and_then(|m| m.checked_mul(box_size.max(1)));
        match (modules, pixels) {
            (Some(modules), Some(pixels)) if pixels <= MAX_IMAGE_SIDE => Ok((modules, pixels)),
            _ => Err(Error::SymbolTooLarge { box_size, border }),
        }
    }

    /// Renders `qr` as a grayscale image: black modules on white, `box_size` pixels per module
    /// and a light quiet zone of `border` modules on every side.
    ///
    /// A `box_size` of 0 is treated as 1.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SymbolTooLarge`] if the image side would exceed 16384 pixels.
    pub fn rasterize(&self, qr: &QrCode) -> Result<GrayImage> {
        let (_, dimension) = self.dimensions(qr)?;
        let scale = self.config.box_size.max(1);
        // Bounded by MAX_IMAGE_SIDE, so the border fits in an i32.
        let border = self.config.border as i32;

        Ok(ImageBuffer::from_fn(dimension, dimension, |x, y| {
            let qr_x = (x / scale) as i32 - border;
            let qr_y = (y / scale) as i32 - border;
            if qr.get_module(qr_x, qr_y) {
                Luma([0u8])
            } else {
                Luma([255u8])
            }
        }))
    }

    /// Returns an SVG document depicting `qr` with the configured quiet zone and module size.
    ///
    /// The string always uses Unix newlines (\n), regardless of the platform.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SymbolTooLarge`] under the same limits as [`SymbolEncoder::rasterize`].
    pub fn to_svg_string(&self, qr: &QrCode) -> Result<String> {
        let (dimension, pixels) = self.dimensions(qr)?;
        let border = self.config.border as i32;

        let mut result = String::new();
        result += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
        result += "<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" ";
        result += "\"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n";
        result += &format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" \
             width=\"{pixels}\" height=\"{pixels}\" \
             viewBox=\"0 0 {dimension} {dimension}\" stroke=\"none\">\n"
        );
        result += "\t<rect width=\"100%\" height=\"100%\" fill=\"#FFFFFF\"/>\n";
        result += "\t<path d=\"";
        let mut first = true;
        for y in 0..qr.size() {
            for x in 0..qr.size() {
                if qr.get_module(x, y) {
                    if !first {
                        result += " ";
                    }
                    first = false;
                    result += &format!("M{},{}h1v1h-1z", x + border, y + border);
                }
            }
        }
        result += "\" fill=\"#000000\"/>\n";
        result += "</svg>\n";
        Ok(result)
    }

    /// Encodes `payload` and writes the image to `output_path`, replacing any existing file.
    ///
    /// The format follows the extension (`.png`, or `.svg` for vector output). The image is
    /// built in memory first, so on error an existing file at `output_path` is left as it was.
    ///
    /// # Errors
    ///
    /// * [`Error::UnsupportedFormat`] if the extension names no writable format.
    /// * [`Error::Encoding`] if the payload is too long for any symbol version.
    /// * [`Error::SymbolTooLarge`] if the configured sizes give an oversized image.
    /// * [`Error::Image`] if the image codec fails.
    /// * [`Error::Io`] if the file cannot be written.
    pub fn encode(&self, payload: &str, output_path: impl AsRef<Path>) -> Result<()> {
        let path = output_path.as_ref();
        let format = OutputFormat::from_path(path)?;
        let qr = self.symbol(payload)?;

        let bytes: Vec<u8> = match format {
            OutputFormat::Svg => self.to_svg_string(&qr)?.into_bytes(),
            OutputFormat::Raster(format) => {
                let mut buffer = Cursor::new(Vec::new());
                self.rasterize(&qr)?
                    .write_to(&mut buffer, format)
                    .map_err(|source| Error::Image {
                        path: path.to_path_buf(),
                        source,
                    })?;
                buffer.into_inner()
            }
        };

        fs::write(path, &bytes).map_err(|e| Error::io(path, e))?;
        info!(
            path = %path.display(),
            version = qr.version().value(),
            bytes = bytes.len(),
            "wrote qr symbol"
        );
        Ok(())
    }
}

// Tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecc::QrCodeEcc;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    #[test]
    fn test_encode_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qr_code.png");
        SymbolEncoder::default()
            .encode("file:///tmp/message.html", &path)
            .unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], &PNG_MAGIC);

        // Version 3 (29 modules) plus two 4-module borders, 10 px per module
        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (370, 370));
    }

    #[test]
    fn test_encode_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.png");
        let second = dir.path().join("b.png");
        let encoder = SymbolEncoder::default();
        encoder.encode("https://example.com/message.html", &first).unwrap();
        encoder.encode("https://example.com/message.html", &second).unwrap();
        assert_eq!(fs::read(first).unwrap(), fs::read(second).unwrap());
    }

    #[test]
    fn test_too_long_payload_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.png");
        let payload = "x".repeat(2000);

        let err = SymbolEncoder::default().encode(&payload, &path).unwrap_err();
        assert!(matches!(
            err,
            Error::Encoding {
                len: 2000,
                ecl: QrCodeEcc::High,
                ..
            }
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_too_long_payload_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keep.png");
        fs::write(&path, b"previous").unwrap();

        let result = SymbolEncoder::default().encode(&"x".repeat(1274), &path);
        assert!(matches!(result, Err(Error::Encoding { .. })));
        assert_eq!(fs::read(&path).unwrap(), b"previous");
    }

    #[test]
    fn test_encode_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qr.png");
        fs::write(&path, b"stale").unwrap();
        SymbolEncoder::default().encode("fresh", &path).unwrap();
        assert_eq!(&fs::read(&path).unwrap()[..8], &PNG_MAGIC);
    }

    #[test]
    fn test_empty_payload_is_minimal_symbol() {
        let encoder = SymbolEncoder::default();
        let qr = encoder.symbol("").unwrap();
        assert_eq!(qr.size(), 21);
        assert_eq!(encoder.rasterize(&qr).unwrap().dimensions(), (290, 290));
    }

    #[test]
    fn test_rasterize_layout() {
        let encoder = SymbolEncoder::default();
        let qr = encoder.symbol("hello").unwrap();
        let img = encoder.rasterize(&qr).unwrap();

        // Quiet zone
        assert_eq!(img.get_pixel(0, 0)[0], 255);
        assert_eq!(img.get_pixel(39, 39)[0], 255);
        // Top-left finder: dark outer ring, light inner ring, dark center
        assert_eq!(img.get_pixel(40, 40)[0], 0);
        assert_eq!(img.get_pixel(49, 49)[0], 0);
        assert_eq!(img.get_pixel(55, 55)[0], 255);
        assert_eq!(img.get_pixel(75, 75)[0], 0);
        // Only two colors
        assert!(img.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn test_custom_box_size_and_border() {
        let encoder = SymbolEncoder::new(SymbolConfig {
            box_size: 1,
            border: 0,
            ..SymbolConfig::default()
        });
        let qr = encoder.symbol("").unwrap();
        let img = encoder.rasterize(&qr).unwrap();
        assert_eq!(img.dimensions(), (21, 21));
        assert_eq!(img.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_svg_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qr_code.SVG");
        SymbolEncoder::default().encode("hello", &path).unwrap();

        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        // 21 modules + 8 border, scaled by 10
        assert!(svg.contains("width=\"290\""));
        assert!(svg.contains("viewBox=\"0 0 29 29\""));
        assert!(svg.contains("M4,4h1v1h-1z"));
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("qr_code.notanimage");
        let err = SymbolEncoder::default().encode("hello", &path).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("qr_code.png");
        let err = SymbolEncoder::default().encode("hello", &path).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_oversized_image_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let huge_border = SymbolEncoder::new(SymbolConfig {
            border: u32::MAX,
            ..SymbolConfig::default()
        });
        let qr = huge_border.symbol("hello").unwrap();
        assert!(matches!(
            huge_border.rasterize(&qr),
            Err(Error::SymbolTooLarge { border: u32::MAX, .. })
        ));
        assert!(huge_border.to_svg_string(&qr).is_err());

        let huge_box = SymbolEncoder::new(SymbolConfig {
            box_size: u32::MAX / 2,
            ..SymbolConfig::default()
        });
        let path = dir.path().join("huge.png");
        let err = huge_box.encode("hello", &path).unwrap_err();
        assert!(matches!(err, Error::SymbolTooLarge { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_largest_allowed_image() {
        // Version 1 with a 4-module border is 29 modules wide: 29 * 564 = 16356 px
        let encoder = SymbolEncoder::new(SymbolConfig {
            box_size: 564,
            ..SymbolConfig::default()
        });
        let qr = encoder.symbol("").unwrap();
        let svg = encoder.to_svg_string(&qr).unwrap();
        assert!(svg.contains("width=\"16356\""));

        let over = SymbolEncoder::new(SymbolConfig {
            box_size: 565,
            ..SymbolConfig::default()
        });
        assert!(over.to_svg_string(&qr).is_err());
    }
}
