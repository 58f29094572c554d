//! Rendering - pagination and orchestration
//!
//! This crate turns a [`doc_model::Document`] into a paginated PDF:
//! - [`DocumentFormatter`] runs the one-time pagination pass and can draw
//!   any resulting page onto a canvas
//! - [`PdfRenderer`] is the lifecycle controller binding a document to a
//!   formatter and an output document, with lazy, idempotent preparation
//!
//! # Example
//!
//! ```ignore
//! use render::PdfRenderer;
//!
//! let mut renderer = PdfRenderer::new();
//! renderer.set_document(&document);
//! renderer.render_document()?;
//! renderer.save("report.pdf")?;
//! ```

mod fonts;
mod formatter;
mod layout;
mod renderer;

pub use formatter::{DocumentFormatter, FormattedDocument, PageInfo};
pub use renderer::PdfRenderer;

use thiserror::Error;

/// Creator string stamped into output metadata unless overridden
pub const DEFAULT_CREATOR: &str = concat!("pageflow ", env!("CARGO_PKG_VERSION"));

/// Errors surfaced by pagination and rendering
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("No document has been attached to the renderer")]
    DocumentNotSet,

    #[error("The document has not been paginated yet")]
    NotPaginated,

    #[error("No output document exists; nothing has been prepared or rendered")]
    OutputNotCreated,

    #[error("Page range {start}..={end} is out of bounds (document has {page_count} pages)")]
    PageRangeOutOfBounds {
        start: usize,
        end: usize,
        page_count: usize,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Font error: {0}")]
    FontError(String),

    #[error("Model error: {0}")]
    ModelError(#[from] doc_model::ModelError),

    #[error("PDF error: {0}")]
    PdfError(#[from] pdf_core::PdfError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for rendering operations
pub type Result<T> = std::result::Result<T, RenderError>;
