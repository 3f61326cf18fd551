//! # Barcode Images
//!
//! Renders product barcodes as Code 128 SVG files with `barcoders`.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Product create   render to a staging file, insert, then move the      │
//! │                   file into place. A failed insert drops the staging   │
//! │                   file; an image already at the final path is kept.    │
//! │  Product delete   file removed, best-effort                            │
//! │  GET image        served from disk, rendered again if missing          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Codes are encoded with character set B, which covers every character a
//! stored barcode may contain.

use std::path::{Path, PathBuf};

use barcoders::generators::svg::SVG;
use barcoders::sym::code128::Code128;
use thiserror::Error;

use crate::files::write_atomic;

/// Code 128 prefix selecting character set B.
const CHARSET_B: char = 'Ɓ';

/// Barcode rendering errors.
#[derive(Debug, Error)]
pub enum BarcodeError {
    #[error("Barcode is empty")]
    Empty,

    #[error("Character {0:?} cannot be encoded in Code 128")]
    UnsupportedCharacter(char),

    #[error("Cannot encode barcode: {0}")]
    Encode(barcoders::error::Error),

    #[error("Cannot write barcode image: {0}")]
    Io(#[from] std::io::Error),
}

/// Something that can turn a barcode string into an image file.
pub trait BarcodeRenderer: Send + Sync {
    /// Renders `code` to `path`, replacing any existing file.
    fn render(&self, code: &str, path: &Path) -> Result<(), BarcodeError>;

    /// Content type of the files this renderer produces.
    fn content_type(&self) -> &'static str;
}

/// Image path for a barcode inside `dir`.
pub fn barcode_path(dir: &Path, code: &str) -> PathBuf {
    dir.join(format!("{}.svg", code.replace(' ', "_")))
}

/// Code 128 renderer producing SVG.
#[derive(Debug, Clone)]
pub struct Code128Svg {
    /// Bar height in pixels.
    pub bar_height: u32,
}

impl Default for Code128Svg {
    fn default() -> Self {
        Code128Svg { bar_height: 80 }
    }
}

impl Code128Svg {
    /// Builds the SVG document for `code`.
    pub fn svg(&self, code: &str) -> Result<String, BarcodeError> {
        if code.is_empty() {
            return Err(BarcodeError::Empty);
        }
        if let Some(bad) = code.chars().find(|c| !(c.is_ascii_graphic() || *c == ' ')) {
            return Err(BarcodeError::UnsupportedCharacter(bad));
        }

        let symbol = Code128::new(format!("{CHARSET_B}{code}")).map_err(BarcodeError::Encode)?;
        SVG::new(self.bar_height)
            .generate(&symbol.encode())
            .map_err(BarcodeError::Encode)
    }
}

impl BarcodeRenderer for Code128Svg {
    fn render(&self, code: &str, path: &Path) -> Result<(), BarcodeError> {
        let svg = self.svg(code)?;
        write_atomic(path, svg.as_bytes())?;
        tracing::debug!(%code, ?path, "Barcode rendered");
        Ok(())
    }

    fn content_type(&self) -> &'static str {
        "image/svg+xml"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("shopfloor-barcode-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_refuses_what_code128_cannot_carry() {
        let renderer = Code128Svg::default();
        assert!(matches!(renderer.svg(""), Err(BarcodeError::Empty)));
        assert!(matches!(renderer.svg("é1"), Err(BarcodeError::UnsupportedCharacter('é'))));
        assert!(matches!(renderer.svg("A\tB"), Err(BarcodeError::UnsupportedCharacter('\t'))));
    }

    #[test]
    fn test_distinct_codes_render_differently() {
        let renderer = Code128Svg::default();
        let a = renderer.svg("100000000001").unwrap();
        let b = renderer.svg("100000000002").unwrap();
        assert_ne!(a, b);
        assert!(renderer.svg("AB-12. 3").is_ok());
    }

    #[test]
    fn test_render_writes_svg() {
        let dir = temp_dir();
        let path = barcode_path(&dir, "100000000001");

        Code128Svg::default().render("100000000001", &path).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("<rect"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_failed_render_leaves_nothing() {
        let dir = temp_dir();
        let path = barcode_path(&dir, "BAD\u{7f}");
        assert!(Code128Svg::default().render("BAD\u{7f}", &path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_barcode_path_has_no_spaces() {
        let path = barcode_path(Path::new("/tmp/codes"), "AB 12");
        assert_eq!(path, PathBuf::from("/tmp/codes/AB_12.svg"));
    }
}
