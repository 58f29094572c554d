//! PDF Core - the output side of pageflow
//!
//! This crate provides:
//! - Building a new PDF document page by page
//! - Document metadata and custom properties
//! - Embedding TrueType fonts (full, subsetted, or metrics-only)
//! - A scoped per-page drawing surface (`Canvas`)
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{Align, Canvas, ColorMode, PdfDocument};
//!
//! let mut doc = PdfDocument::new(ColorMode::Rgb);
//! let page = doc.add_page();
//! doc.set_page_size(page, 595.28, 841.89)?;
//! let mut canvas = Canvas::new(&mut doc, page)?;
//! canvas.set_font("helvetica", 12.0)?;
//! canvas.draw_text("Hello, World!", 100.0, 100.0, Align::Left)?;
//! canvas.finish()?;
//! doc.save("output.pdf")?;
//! ```

mod canvas;
mod document;
mod font;
mod image;
mod text;

pub use canvas::Canvas;
pub use document::{Color, PdfDocument, PdfInfo};
pub use font::{
    FontData, FontFamily, FontFamilyBuilder, FontStyle, FontWeight, StandardFont,
};
pub use text::encode_winansi;

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Font not found: {0}")]
    FontNotFound(String),

    #[error("Font already exists: {0}")]
    FontAlreadyExists(String),

    #[error("Failed to parse font: {0}")]
    FontParseError(String),

    #[error("Font subset error: {0}")]
    FontSubsetError(String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Text alignment options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Text encoding mode for drawn text
///
/// `Wide` emits two-byte glyph codes through a Type0/CIDFontType2 font
/// (Identity-H). `SingleByte` emits WinAnsi-encoded literal strings through
/// a simple font. The mode is fixed per drawing surface by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextEncoding {
    Wide,
    #[default]
    SingleByte,
}

/// Font embedding policy applied when the document is serialized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FontEmbedding {
    /// Embed a subset containing only the glyphs actually used
    #[default]
    Subset,
    /// Embed the complete font program
    Full,
    /// Do not embed; the viewer substitutes by name and metrics
    None,
}

/// Output color space for page content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorMode {
    #[default]
    Rgb,
    Cmyk,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_default() {
        assert_eq!(Align::default(), Align::Left);
    }

    #[test]
    fn test_policy_defaults() {
        assert_eq!(TextEncoding::default(), TextEncoding::SingleByte);
        assert_eq!(FontEmbedding::default(), FontEmbedding::Subset);
        assert_eq!(ColorMode::default(), ColorMode::Rgb);
    }
}
