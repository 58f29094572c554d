//! Document formatter
//!
//! `DocumentFormatter` runs the one-time pagination pass over a borrowed
//! document, producing a `FormattedDocument`: per-page geometry plus the
//! positioned fragments to replay when a page is drawn onto a canvas.

use crate::fonts::{convert_color, convert_style, FontCatalog, ResolvedFont};
use crate::layout::{break_paragraph, Line};
use crate::{RenderError, Result};
use chrono::{DateTime, Local};
use doc_model::{Align, Block, Document, Margins, Orientation, Section};
use log::{debug, info};
use pdf_core::{Canvas, PdfDocument};

/// Fraction of the line box above the text baseline
const BASELINE_RATIO: f64 = 0.8;

/// Font size used for header and footer lines
const HEADER_FOOTER_SIZE: f64 = 9.0;

/// Read-only per-page geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageInfo {
    /// Page width in points
    pub width: f64,
    /// Page height in points
    pub height: f64,
    pub orientation: Orientation,
}

/// A positioned run of text on a laid-out page
#[derive(Debug, Clone)]
pub(crate) struct TextFragment {
    pub text: String,
    pub font: ResolvedFont,
    /// Left edge in points from the page's left
    pub x: f64,
    /// Baseline in points from the page's top
    pub y: f64,
}

/// A positioned image on a laid-out page
#[derive(Debug, Clone)]
pub(crate) struct ImageFragment {
    pub source: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One page of the paginated result
#[derive(Debug, Clone)]
pub struct PageLayout {
    info: PageInfo,
    margins: Margins,
    header: Option<String>,
    footer: Option<String>,
    pub(crate) texts: Vec<TextFragment>,
    pub(crate) images: Vec<ImageFragment>,
}

impl PageLayout {
    fn empty(info: PageInfo, section: &Section) -> Self {
        Self {
            info,
            margins: section.page.margins,
            header: section.page.header.clone(),
            footer: section.page.footer.clone(),
            texts: Vec::new(),
            images: Vec::new(),
        }
    }

    fn has_content(&self) -> bool {
        !self.texts.is_empty() || !self.images.is_empty()
    }

    /// The page's geometry
    pub fn info(&self) -> PageInfo {
        self.info
    }
}

/// The paginated document: page count plus per-page geometry and layout
#[derive(Debug, Clone, Default)]
pub struct FormattedDocument {
    pages: Vec<PageLayout>,
}

impl FormattedDocument {
    /// Number of pages produced by pagination
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Geometry of a page, 1-indexed
    pub fn page_info(&self, page: usize) -> Option<PageInfo> {
        self.pages.get(page.wrapping_sub(1)).map(|p| p.info)
    }

    /// A page's layout, 1-indexed
    pub(crate) fn page(&self, page: usize) -> Option<&PageLayout> {
        self.pages.get(page.wrapping_sub(1))
    }
}

/// Paginates a document and draws its pages
///
/// Created once per bound document. [`prepare`](Self::prepare) is
/// idempotent: the pagination pass runs at most once, and the formatter
/// must be prepared before page count or drawing are available.
pub struct DocumentFormatter<'a> {
    document: &'a Document,
    catalog: FontCatalog,
    formatted: Option<FormattedDocument>,
    pagination_passes: usize,
    render_time: Option<DateTime<Local>>,
}

impl<'a> DocumentFormatter<'a> {
    /// Create a formatter for a document without doing any work
    pub fn new(document: &'a Document) -> Self {
        Self {
            document,
            catalog: FontCatalog::default(),
            formatted: None,
            pagination_passes: 0,
            render_time: None,
        }
    }

    /// Load fonts and run pagination; a no-op when already prepared
    pub fn prepare(&mut self) -> Result<()> {
        if self.formatted.is_some() {
            return Ok(());
        }

        debug!("preparing formatter: loading fonts and paginating");
        self.catalog = FontCatalog::load(self.document)?;
        let formatted = paginate(self.document, &self.catalog);
        self.pagination_passes += 1;
        info!("pagination produced {} pages", formatted.page_count());
        self.formatted = Some(formatted);
        Ok(())
    }

    /// Whether pagination has run
    pub fn is_prepared(&self) -> bool {
        self.formatted.is_some()
    }

    /// How many times the pagination pass has actually run
    pub fn pagination_passes(&self) -> usize {
        self.pagination_passes
    }

    /// The paginated result, if prepared
    pub fn formatted(&self) -> Option<&FormattedDocument> {
        self.formatted.as_ref()
    }

    /// Page count of the paginated document
    pub fn page_count(&self) -> Result<usize> {
        self.formatted
            .as_ref()
            .map(|f| f.page_count())
            .ok_or(RenderError::NotPaginated)
    }

    /// Geometry of a page, 1-indexed
    pub fn page_info(&self, page: usize) -> Result<PageInfo> {
        let formatted = self.formatted.as_ref().ok_or(RenderError::NotPaginated)?;
        formatted
            .page_info(page)
            .ok_or(RenderError::PageRangeOutOfBounds {
                start: page,
                end: page,
                page_count: formatted.page_count(),
            })
    }

    /// Record the moment a render pass started; consumed by `{date}`
    /// header/footer fields
    pub fn set_render_time(&mut self, time: DateTime<Local>) {
        self.render_time = Some(time);
    }

    /// The recorded render timestamp, if a render pass has run
    pub fn render_time(&self) -> Option<DateTime<Local>> {
        self.render_time
    }

    /// Install the formatter's fonts into an output document
    ///
    /// Safe to call repeatedly; families already installed are skipped.
    pub fn install_fonts(&self, doc: &mut PdfDocument) -> Result<()> {
        self.catalog.install(doc)
    }

    /// Draw one page's layout onto a canvas
    pub fn draw_page(&self, page: usize, canvas: &mut Canvas) -> Result<()> {
        let formatted = self.formatted.as_ref().ok_or(RenderError::NotPaginated)?;
        let layout = formatted
            .page(page)
            .ok_or(RenderError::PageRangeOutOfBounds {
                start: page,
                end: page,
                page_count: formatted.page_count(),
            })?;

        if let Some(header) = &layout.header {
            let text = self.substitute_fields(header, page, formatted.page_count());
            draw_marginal(canvas, &text, layout.info.width, layout.margins.top * 0.5)?;
        }
        if let Some(footer) = &layout.footer {
            let text = self.substitute_fields(footer, page, formatted.page_count());
            let y = layout.info.height - layout.margins.bottom * 0.5;
            draw_marginal(canvas, &text, layout.info.width, y)?;
        }

        for fragment in &layout.texts {
            let (weight, style) = convert_style(fragment.font.style);
            canvas.set_font(
                self.catalog.draw_family(&fragment.font.family),
                fragment.font.size as f32,
            )?;
            canvas.set_font_weight(weight)?;
            canvas.set_font_style(style)?;
            canvas.set_text_color(
                fragment
                    .font
                    .color
                    .map(convert_color)
                    .unwrap_or_default(),
            );
            canvas.draw_text(&fragment.text, fragment.x, fragment.y, pdf_core::Align::Left)?;
        }

        for image in &layout.images {
            let data = std::fs::read(&image.source)?;
            canvas.draw_image(&data, image.x, image.y, image.width, image.height)?;
        }

        Ok(())
    }

    /// Replace `{page}`, `{pages}` and `{date}` fields
    fn substitute_fields(&self, template: &str, page: usize, pages: usize) -> String {
        let date = self
            .render_time
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        template
            .replace("{page}", &page.to_string())
            .replace("{pages}", &pages.to_string())
            .replace("{date}", &date)
    }
}

/// Centered header/footer line at the given distance from the page top
fn draw_marginal(canvas: &mut Canvas, text: &str, page_width: f64, y: f64) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    canvas.set_font(crate::fonts::FALLBACK_FAMILY, HEADER_FOOTER_SIZE as f32)?;
    canvas.set_font_weight(pdf_core::FontWeight::Regular)?;
    canvas.set_font_style(pdf_core::FontStyle::Normal)?;
    canvas.set_text_color(pdf_core::Color::black());
    canvas.draw_text(text, page_width / 2.0, y, pdf_core::Align::Center)?;
    Ok(())
}

/// Run the pagination pass
///
/// Each section opens a fresh page and flows its blocks into the section's
/// content box; lines and images that no longer fit move to a new page, and
/// explicit page breaks always start one.
fn paginate(document: &Document, catalog: &FontCatalog) -> FormattedDocument {
    let mut pages: Vec<PageLayout> = Vec::new();

    for section in &document.sections {
        let (width, height) = section.page.dimensions();
        let info = PageInfo {
            width,
            height,
            orientation: section.page.orientation,
        };
        let margins = section.page.margins;
        let content_width = section.page.content_width();
        let bottom_limit = height - margins.bottom;

        let mut current = PageLayout::empty(info, section);
        let mut cursor = margins.top;

        for block in &section.blocks {
            match block {
                Block::Paragraph(paragraph) => {
                    cursor += paragraph.space_before;
                    for line in break_paragraph(paragraph, catalog, content_width) {
                        if cursor + line.height > bottom_limit && current.has_content() {
                            pages.push(std::mem::replace(
                                &mut current,
                                PageLayout::empty(info, section),
                            ));
                            cursor = margins.top;
                        }
                        place_line(&mut current, &line, paragraph.align, margins.left, content_width, cursor);
                        cursor += line.height;
                    }
                    cursor += paragraph.space_after;
                }
                Block::PageBreak => {
                    pages.push(std::mem::replace(
                        &mut current,
                        PageLayout::empty(info, section),
                    ));
                    cursor = margins.top;
                }
                Block::Image(image) => {
                    if cursor + image.height > bottom_limit && current.has_content() {
                        pages.push(std::mem::replace(
                            &mut current,
                            PageLayout::empty(info, section),
                        ));
                        cursor = margins.top;
                    }
                    let x = margins.left
                        + match image.align {
                            Align::Left => 0.0,
                            Align::Center => (content_width - image.width) / 2.0,
                            Align::Right => content_width - image.width,
                        };
                    current.images.push(ImageFragment {
                        source: image.source.clone(),
                        x,
                        y: cursor,
                        width: image.width,
                        height: image.height,
                    });
                    cursor += image.height;
                }
            }
        }

        // A section always contributes at least one page
        pages.push(current);
    }

    FormattedDocument { pages }
}

/// Place a broken line's items as positioned fragments
fn place_line(
    page: &mut PageLayout,
    line: &Line,
    align: Align,
    left_margin: f64,
    content_width: f64,
    cursor: f64,
) {
    let x0 = left_margin
        + match align {
            Align::Left => 0.0,
            Align::Center => (content_width - line.width) / 2.0,
            Align::Right => content_width - line.width,
        };
    let baseline = cursor + line.height * BASELINE_RATIO;

    for item in &line.items {
        page.texts.push(TextFragment {
            text: item.text.clone(),
            font: item.font.clone(),
            x: x0 + item.x,
            y: baseline,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{Font, PageSetup, PageSize, ParagraphBlock};

    fn courier(size: f64) -> Font {
        Font::new("courier", size)
    }

    fn single_section_document(blocks: Vec<Block>) -> Document {
        let mut document = Document::new();
        let mut section = Section::new(PageSetup::default());
        for block in blocks {
            section.add_block(block);
        }
        document.add_section(section);
        document
    }

    #[test]
    fn test_unprepared_formatter_rejects_queries() {
        let document = Document::new();
        let formatter = DocumentFormatter::new(&document);
        assert!(!formatter.is_prepared());
        assert!(matches!(
            formatter.page_count(),
            Err(RenderError::NotPaginated)
        ));
        assert!(matches!(
            formatter.page_info(1),
            Err(RenderError::NotPaginated)
        ));
    }

    #[test]
    fn test_prepare_is_idempotent() {
        let document = single_section_document(vec![Block::Paragraph(ParagraphBlock::text(
            "Hello",
        ))]);
        let mut formatter = DocumentFormatter::new(&document);
        formatter.prepare().unwrap();
        formatter.prepare().unwrap();
        formatter.prepare().unwrap();
        assert_eq!(formatter.pagination_passes(), 1);
    }

    #[test]
    fn test_empty_document_has_zero_pages() {
        let document = Document::new();
        let mut formatter = DocumentFormatter::new(&document);
        formatter.prepare().unwrap();
        assert_eq!(formatter.page_count().unwrap(), 0);
    }

    #[test]
    fn test_empty_section_yields_one_page() {
        let document = single_section_document(vec![]);
        let mut formatter = DocumentFormatter::new(&document);
        formatter.prepare().unwrap();
        assert_eq!(formatter.page_count().unwrap(), 1);
    }

    #[test]
    fn test_page_breaks_split_pages() {
        let document = single_section_document(vec![
            Block::Paragraph(ParagraphBlock::text("One")),
            Block::PageBreak,
            Block::Paragraph(ParagraphBlock::text("Two")),
            Block::PageBreak,
            Block::Paragraph(ParagraphBlock::text("Three")),
        ]);
        let mut formatter = DocumentFormatter::new(&document);
        formatter.prepare().unwrap();
        assert_eq!(formatter.page_count().unwrap(), 3);
    }

    #[test]
    fn test_page_info_reflects_orientation() {
        let mut document = Document::new();
        document.add_section(Section::new(PageSetup {
            size: PageSize::A4,
            orientation: Orientation::Landscape,
            ..Default::default()
        }));
        let mut formatter = DocumentFormatter::new(&document);
        formatter.prepare().unwrap();

        let page_info = formatter.page_info(1).unwrap();
        assert_eq!(page_info.width, 841.89);
        assert_eq!(page_info.height, 595.28);
        assert_eq!(page_info.orientation, Orientation::Landscape);
    }

    #[test]
    fn test_page_info_out_of_range() {
        let document = single_section_document(vec![]);
        let mut formatter = DocumentFormatter::new(&document);
        formatter.prepare().unwrap();
        assert!(matches!(
            formatter.page_info(2),
            Err(RenderError::PageRangeOutOfBounds {
                start: 2,
                end: 2,
                page_count: 1
            })
        ));
    }

    #[test]
    fn test_wrapped_lines_overflow_to_next_page() {
        // Content box is 60x60pt. Courier 20pt words are 48pt wide, so each
        // of the three words wraps to its own 30pt line; two lines fill the
        // first page, the third moves to a second page.
        let mut document = Document::new();
        let mut section = Section::new(PageSetup {
            size: PageSize::Custom {
                width: 100.0,
                height: 100.0,
            },
            margins: doc_model::Margins::uniform(20.0),
            ..Default::default()
        });
        let mut paragraph = ParagraphBlock::default();
        paragraph.line_height = 1.5;
        paragraph.add_run("aaaa bbbb cccc", courier(20.0));
        section.add_block(Block::Paragraph(paragraph));
        document.add_section(section);

        let mut formatter = DocumentFormatter::new(&document);
        formatter.prepare().unwrap();
        assert_eq!(formatter.page_count().unwrap(), 2);
    }

    #[test]
    fn test_long_text_overflows_to_second_page() {
        // Content height: 100 - 40 = 60pt; line height 12 * 1.2 = 14.4pt
        // => 4 lines per page. Ten paragraphs of one line each need 3 pages.
        let mut document = Document::new();
        let mut section = Section::new(PageSetup {
            size: PageSize::Custom {
                width: 400.0,
                height: 100.0,
            },
            margins: doc_model::Margins::uniform(20.0),
            ..Default::default()
        });
        for i in 0..10 {
            section.add_paragraph(&format!("Line {i}"));
        }
        document.add_section(section);

        let mut formatter = DocumentFormatter::new(&document);
        formatter.prepare().unwrap();
        assert_eq!(formatter.page_count().unwrap(), 3);
    }

    #[test]
    fn test_fragments_positioned_within_margins() {
        let document = single_section_document(vec![Block::Paragraph(ParagraphBlock::text(
            "Positioned",
        ))]);
        let mut formatter = DocumentFormatter::new(&document);
        formatter.prepare().unwrap();

        let formatted = formatter.formatted().unwrap();
        let page = formatted.page(1).unwrap();
        assert_eq!(page.texts.len(), 1);
        let fragment = &page.texts[0];
        assert_eq!(fragment.x, 72.0); // default left margin
        assert!(fragment.y > 72.0); // below the top margin
    }

    #[test]
    fn test_substitute_fields() {
        let document = Document::new();
        let mut formatter = DocumentFormatter::new(&document);
        assert_eq!(
            formatter.substitute_fields("Page {page} of {pages}", 2, 7),
            "Page 2 of 7"
        );

        // Without a render pass the date field is blank
        assert_eq!(formatter.substitute_fields("{date}", 1, 1), "");

        formatter.set_render_time(Local::now());
        let stamped = formatter.substitute_fields("{date}", 1, 1);
        assert!(!stamped.is_empty());
    }

    #[test]
    fn test_two_sections_two_page_setups() {
        let mut document = Document::new();
        let mut first = Section::new(PageSetup::default());
        first.add_paragraph("First");
        let second = Section::new(PageSetup {
            size: PageSize::Letter,
            ..Default::default()
        });
        document.add_section(first);
        document.add_section(second);

        let mut formatter = DocumentFormatter::new(&document);
        formatter.prepare().unwrap();
        assert_eq!(formatter.page_count().unwrap(), 2);
        assert_eq!(formatter.page_info(1).unwrap().width, 595.28);
        assert_eq!(formatter.page_info(2).unwrap().width, 612.0);
    }
}
