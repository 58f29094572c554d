//! Rendering orchestration
//!
//! `PdfRenderer` is the lifecycle controller between a source document, the
//! formatter that paginates it and the output document that collects pages.
//! Both collaborators are created lazily and prepared at most once; the
//! explicit state machines below replace the usual nullable-reference
//! checks so "not created yet" and "created but not prepared" stay distinct
//! states.

use crate::fonts::convert_color_mode;
use crate::formatter::DocumentFormatter;
use crate::{RenderError, Result, DEFAULT_CREATOR};
use chrono::Local;
use doc_model::Document;
use log::{debug, info};
use pdf_core::{Canvas, FontEmbedding, PdfDocument, TextEncoding};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Formatter lifecycle: created lazily, paginated at most once
enum FormatterState<'a> {
    /// No formatter exists for the bound document
    Unbound,
    /// A formatter exists but pagination has not run
    Bound(DocumentFormatter<'a>),
    /// Pagination has run; page count and drawing are available
    Paginated(DocumentFormatter<'a>),
}

impl<'a> FormatterState<'a> {
    fn formatter(&self) -> Option<&DocumentFormatter<'a>> {
        match self {
            FormatterState::Unbound => None,
            FormatterState::Bound(f) | FormatterState::Paginated(f) => Some(f),
        }
    }

    fn paginated_mut(&mut self) -> Option<&mut DocumentFormatter<'a>> {
        match self {
            FormatterState::Paginated(f) => Some(f),
            _ => None,
        }
    }
}

/// Output lifecycle: created lazily, metadata written once (idempotent
/// overwrite afterwards)
enum OutputState {
    None,
    Created(PdfDocument),
    MetadataWritten(PdfDocument),
}

impl OutputState {
    fn document_mut(&mut self) -> Option<&mut PdfDocument> {
        match self {
            OutputState::None => None,
            OutputState::Created(d) | OutputState::MetadataWritten(d) => Some(d),
        }
    }

    fn document(&self) -> Option<&PdfDocument> {
        match self {
            OutputState::None => None,
            OutputState::Created(d) | OutputState::MetadataWritten(d) => Some(d),
        }
    }
}

/// Renders a logical document into a paginated PDF
///
/// The renderer holds a non-owning reference to the document; rebinding via
/// [`set_document`](Self::set_document) discards the formatter and forces
/// re-pagination on next use. The text-encoding and font-embedding policy
/// is fixed per renderer instance and applied to every page it draws.
pub struct PdfRenderer<'a> {
    document: Option<&'a Document>,
    formatter: FormatterState<'a>,
    output: OutputState,
    /// Wide (Identity-H) text encoding instead of legacy single-byte
    unicode: bool,
    font_embedding: FontEmbedding,
    language: Option<String>,
    working_directory: Option<PathBuf>,
    creator: String,
    custom_properties: Vec<(String, String)>,
}

impl<'a> PdfRenderer<'a> {
    /// Create a renderer with the default policy (single-byte text,
    /// subsetted fonts)
    pub fn new() -> Self {
        Self {
            document: None,
            formatter: FormatterState::Unbound,
            output: OutputState::None,
            unicode: false,
            font_embedding: FontEmbedding::default(),
            language: None,
            working_directory: None,
            creator: DEFAULT_CREATOR.to_string(),
            custom_properties: Vec::new(),
        }
    }

    /// Select wide (Identity-H) text encoding
    pub fn with_unicode(mut self, unicode: bool) -> Self {
        self.unicode = unicode;
        self
    }

    /// Select the font embedding policy
    pub fn with_font_embedding(mut self, embedding: FontEmbedding) -> Self {
        self.font_embedding = embedding;
        self
    }

    /// Language written into output metadata when non-empty
    pub fn with_language(mut self, language: &str) -> Self {
        if !language.is_empty() {
            self.language = Some(language.to_string());
        }
        self
    }

    /// Base directory for relative save paths
    pub fn with_working_directory<P: AsRef<Path>>(mut self, directory: P) -> Self {
        self.working_directory = Some(directory.as_ref().to_path_buf());
        self
    }

    /// Override the creator string stamped into output metadata
    pub fn with_creator(mut self, creator: &str) -> Self {
        self.creator = creator.to_string();
        self
    }

    /// Custom properties merged into the output's property table
    pub fn with_custom_properties(mut self, properties: Vec<(String, String)>) -> Self {
        self.custom_properties = properties;
        self
    }

    /// Append one custom property
    pub fn add_custom_property(&mut self, key: &str, value: &str) {
        self.custom_properties
            .push((key.to_string(), value.to_string()));
    }

    /// Bind a source document
    ///
    /// Discards any previously created formatter so the next use
    /// re-paginates against the new document. Neither the formatter nor the
    /// output document is created here; the output document, if one exists,
    /// is kept and further pages are appended to it.
    pub fn set_document(&mut self, document: &'a Document) {
        self.document = Some(document);
        self.formatter = FormatterState::Unbound;
    }

    /// The bound source document
    pub fn document(&self) -> Option<&'a Document> {
        self.document
    }

    /// Ensure a formatter exists; with `complete`, ensure it has paginated
    ///
    /// Pagination runs at most once per bound document: repeated calls with
    /// `complete == true` are no-ops once the formatter is paginated.
    pub fn prepare_formatter(&mut self, complete: bool) -> Result<()> {
        let document = self.document.ok_or(RenderError::DocumentNotSet)?;

        if matches!(self.formatter, FormatterState::Unbound) {
            debug!("creating formatter");
            self.formatter = FormatterState::Bound(DocumentFormatter::new(document));
        }

        if complete {
            match std::mem::replace(&mut self.formatter, FormatterState::Unbound) {
                FormatterState::Bound(mut formatter) => match formatter.prepare() {
                    Ok(()) => self.formatter = FormatterState::Paginated(formatter),
                    Err(e) => {
                        self.formatter = FormatterState::Bound(formatter);
                        return Err(e);
                    }
                },
                other => self.formatter = other,
            }
        }

        Ok(())
    }

    /// Ensure the formatter has paginated and an output document with
    /// metadata exists
    ///
    /// Safe to call repeatedly: pagination runs once, the output document
    /// is created once, and metadata writes overwrite idempotently.
    pub fn prepare_render(&mut self) -> Result<()> {
        self.prepare_formatter(true)?;

        if matches!(self.output, OutputState::None) {
            let document = self.document.ok_or(RenderError::DocumentNotSet)?;
            debug!("creating output document");
            let mut output = PdfDocument::new(convert_color_mode(document.color_mode))
                .with_creator(&self.creator);
            if let Some(language) = &self.language {
                output = output.with_language(language);
            }
            self.output = OutputState::Created(output);
        }

        // Fonts loaded for measurement also draw the output pages
        if let (Some(formatter), Some(output)) =
            (self.formatter.formatter(), self.output.document_mut())
        {
            formatter.install_fonts(output)?;
        }

        self.write_document_info()
    }

    /// Paginate if needed, then render every page into the output document
    pub fn render_document(&mut self) -> Result<()> {
        self.prepare_formatter(true)?;
        let page_count = match self.formatter.formatter() {
            Some(formatter) => formatter.page_count()?,
            None => return Err(RenderError::NotPaginated),
        };
        self.render_pages(1, page_count)
    }

    /// Render an inclusive page range into the output document
    ///
    /// The range is validated against the paginated page count; formatter
    /// and output document are prepared first if they do not exist yet.
    /// Pages are appended in ascending order and never overwritten, so
    /// overlapping ranges across calls append duplicates by design.
    pub fn render_pages(&mut self, start_page: usize, end_page: usize) -> Result<()> {
        self.prepare_render()?;

        let formatter = self
            .formatter
            .paginated_mut()
            .ok_or(RenderError::NotPaginated)?;
        let output = self
            .output
            .document_mut()
            .ok_or(RenderError::OutputNotCreated)?;

        let page_count = formatter.page_count()?;
        if start_page < 1 || end_page > page_count {
            return Err(RenderError::PageRangeOutOfBounds {
                start: start_page,
                end: end_page,
                page_count,
            });
        }

        let encoding = if self.unicode {
            TextEncoding::Wide
        } else {
            TextEncoding::SingleByte
        };

        // One timestamp per render pass, consumed by `{date}` fields
        formatter.set_render_time(Local::now());
        info!("rendering pages {start_page}..={end_page} of {page_count}");

        for index in start_page..=end_page {
            let page_info = formatter.page_info(index)?;

            // Geometry is fixed before anything draws on the page
            let page = output.add_page();
            output.set_page_size(page, page_info.width, page_info.height)?;

            let mut canvas = Canvas::new(output, page)?;
            canvas.set_text_encoding(encoding);
            canvas.set_font_embedding(self.font_embedding);

            match formatter.draw_page(index, &mut canvas) {
                Ok(()) => canvas.finish()?,
                Err(e) => {
                    // The canvas flushes on drop; the partially drawn page
                    // stays in the output and the failure surfaces
                    drop(canvas);
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    /// Copy the document's info block and the caller's custom properties
    /// into the output document
    ///
    /// Skipped entirely when the document carries no info block. Absent
    /// fields are left untouched, so repeated calls overwrite idempotently.
    pub fn write_document_info(&mut self) -> Result<()> {
        let document = self.document.ok_or(RenderError::DocumentNotSet)?;

        let mut output = match std::mem::replace(&mut self.output, OutputState::None) {
            OutputState::None => return Err(RenderError::OutputNotCreated),
            OutputState::Created(d) | OutputState::MetadataWritten(d) => d,
        };

        if let Some(info) = &document.info {
            let meta = output.info_mut();
            if let Some(author) = &info.author {
                meta.author = Some(author.clone());
            }
            if let Some(keywords) = &info.keywords {
                meta.keywords = Some(keywords.clone());
            }
            if let Some(subject) = &info.subject {
                meta.subject = Some(subject.clone());
            }
            if let Some(title) = &info.title {
                meta.title = Some(title.clone());
            }

            for (key, value) in &self.custom_properties {
                output.set_property(key, value);
            }
        }

        self.output = OutputState::MetadataWritten(output);
        Ok(())
    }

    /// Serialize the output document to a file
    ///
    /// An empty path is rejected. A relative path is resolved against the
    /// configured working directory.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(RenderError::InvalidArgument(
                "output path must not be empty".to_string(),
            ));
        }

        let resolved = match &self.working_directory {
            Some(directory) if path.is_relative() => directory.join(path),
            _ => path.to_path_buf(),
        };

        let output = self
            .output
            .document_mut()
            .ok_or(RenderError::OutputNotCreated)?;
        info!("saving output to {}", resolved.display());
        output.save(resolved)?;
        Ok(())
    }

    /// Serialize the output document to a writer
    pub fn save_to<W: Write>(&mut self, writer: &mut W) -> Result<()> {
        let output = self
            .output
            .document_mut()
            .ok_or(RenderError::OutputNotCreated)?;
        output.save_to(writer)?;
        Ok(())
    }

    /// Serialize the output document to bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.save_to(&mut buffer)?;
        Ok(buffer)
    }

    /// The output document, if one has been created
    pub fn output_document(&self) -> Option<&PdfDocument> {
        self.output.document()
    }

    /// Replace the output document with one supplied by the caller
    ///
    /// Metadata has not been written to the new document; the next
    /// preparation pass writes it.
    pub fn set_output_document(&mut self, document: PdfDocument) {
        self.output = OutputState::Created(document);
    }

    /// Take ownership of the output document, leaving the renderer without
    /// one
    pub fn take_output_document(&mut self) -> Option<PdfDocument> {
        match std::mem::replace(&mut self.output, OutputState::None) {
            OutputState::None => None,
            OutputState::Created(d) | OutputState::MetadataWritten(d) => Some(d),
        }
    }

    /// The formatter, if one has been created
    pub fn formatter(&self) -> Option<&DocumentFormatter<'a>> {
        self.formatter.formatter()
    }

    /// Page count of the paginated document, if pagination has run
    pub fn page_count(&self) -> Option<usize> {
        self.formatter
            .formatter()
            .and_then(|f| f.page_count().ok())
    }
}

impl Default for PdfRenderer<'_> {
    fn default() -> Self {
        Self::new()
    }
}
