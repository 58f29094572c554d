//! Document model - the logical, unpaginated content tree
//!
//! This crate provides:
//! - Document schema types (sections, paragraphs, runs, images)
//! - Page setup (size, orientation, margins, header/footer)
//! - Document info and color-mode flags
//! - Parsing from JSON
//!
//! # Example
//!
//! ```ignore
//! use doc_model::{parse_document, Document};
//!
//! let document = parse_document(json)?;
//! println!("{} sections", document.sections.len());
//! ```

mod document;
mod info;
pub mod parser;

pub use document::{
    Align, Block, Color, Document, Font, FontDef, FontStyle, ImageBlock, Margins, Orientation,
    PageSetup, PageSize, ParagraphBlock, Run, Section,
};
pub use info::{ColorMode, DocumentInfo};
pub use parser::parse_document;

use thiserror::Error;

/// Errors that can occur while building or parsing a document
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to parse document: {0}")]
    ParseError(String),

    #[error("Unsupported document version: {0}")]
    UnsupportedVersion(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_document_is_empty() {
        let doc = Document::default();
        assert!(doc.sections.is_empty());
        assert!(doc.info.is_none());
    }
}
