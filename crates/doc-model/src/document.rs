//! Document schema types

use crate::info::{ColorMode, DocumentInfo};
use serde::{Deserialize, Serialize};

/// RGB Color for text
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Color {
    /// Red component (0.0 - 1.0)
    pub r: f64,
    /// Green component (0.0 - 1.0)
    pub g: f64,
    /// Blue component (0.0 - 1.0)
    pub b: f64,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Black color
    pub fn black() -> Self {
        Self {
            r: 0.0,
            g: 0.0,
            b: 0.0,
        }
    }

    /// Gray color
    pub fn gray() -> Self {
        Self {
            r: 0.5,
            g: 0.5,
            b: 0.5,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// Root document structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Schema version
    #[serde(default = "default_version")]
    pub version: String,

    /// Document info block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<DocumentInfo>,

    /// Output color space
    #[serde(default)]
    pub color_mode: ColorMode,

    /// Font definitions
    #[serde(default)]
    pub fonts: Vec<FontDef>,

    /// Content sections
    #[serde(default)]
    pub sections: Vec<Section>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self {
            version: default_version(),
            ..Default::default()
        }
    }

    /// Set the info block
    pub fn with_info(mut self, info: DocumentInfo) -> Self {
        self.info = Some(info);
        self
    }

    /// Set the output color space
    pub fn with_color_mode(mut self, color_mode: ColorMode) -> Self {
        self.color_mode = color_mode;
        self
    }

    /// Append a section
    pub fn add_section(&mut self, section: Section) -> &mut Self {
        self.sections.push(section);
        self
    }
}

/// Font definition: family id plus variant sources
///
/// Either `source` (single-variant shorthand) or any of the variant paths
/// may be given. Families whose id matches a standard font name need no
/// sources at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontDef {
    /// Family identifier referenced by runs
    pub id: String,

    /// Single-variant source path (legacy shorthand for `regular`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regular: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold_italic: Option<String>,

    /// Fallback family ids tried per character when glyphs are missing
    #[serde(default)]
    pub fallback: Vec<String>,
}

/// A run of content flowed onto pages of a uniform setup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Section {
    /// Page setup for every page this section produces
    #[serde(default)]
    pub page: PageSetup,

    /// Flowed content blocks
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl Section {
    pub fn new(page: PageSetup) -> Self {
        Self {
            page,
            blocks: Vec::new(),
        }
    }

    /// Append a block
    pub fn add_block(&mut self, block: Block) -> &mut Self {
        self.blocks.push(block);
        self
    }

    /// Append a plain paragraph with a single run
    pub fn add_paragraph(&mut self, text: &str) -> &mut Self {
        self.add_block(Block::Paragraph(ParagraphBlock::text(text)))
    }
}

/// Page setup: geometry plus optional header/footer lines
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSetup {
    #[serde(default)]
    pub size: PageSize,

    #[serde(default)]
    pub orientation: Orientation,

    #[serde(default)]
    pub margins: Margins,

    /// Header line; supports `{page}`, `{pages}` and `{date}` fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,

    /// Footer line; supports `{page}`, `{pages}` and `{date}` fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
}

impl PageSetup {
    /// Page dimensions in points with the orientation applied
    pub fn dimensions(&self) -> (f64, f64) {
        let (width, height) = self.size.points();
        match self.orientation {
            Orientation::Portrait => (width, height),
            Orientation::Landscape => (height, width),
        }
    }

    /// Width available to flowed content
    pub fn content_width(&self) -> f64 {
        let (width, _) = self.dimensions();
        width - self.margins.left - self.margins.right
    }

    /// Height available to flowed content
    pub fn content_height(&self) -> f64 {
        let (_, height) = self.dimensions();
        height - self.margins.top - self.margins.bottom
    }
}

/// Page size presets plus a custom escape hatch, in points
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    A4,
    A5,
    Letter,
    Legal,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Portrait dimensions in points
    pub fn points(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::A5 => (419.53, 595.28),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// Page orientation
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Page margins in points
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margins {
    pub fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(72.0)
    }
}

/// A flowed content block
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    Paragraph(ParagraphBlock),
    PageBreak,
    Image(ImageBlock),
}

/// A paragraph of styled runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphBlock {
    /// Styled text runs, concatenated in order
    #[serde(default)]
    pub runs: Vec<Run>,

    #[serde(default)]
    pub align: Align,

    /// Line height as a multiple of the font size
    #[serde(default = "default_line_height")]
    pub line_height: f64,

    /// Extra space above the paragraph, points
    #[serde(default)]
    pub space_before: f64,

    /// Extra space below the paragraph, points
    #[serde(default)]
    pub space_after: f64,
}

fn default_line_height() -> f64 {
    1.2
}

impl Default for ParagraphBlock {
    fn default() -> Self {
        Self {
            runs: Vec::new(),
            align: Align::default(),
            line_height: default_line_height(),
            space_before: 0.0,
            space_after: 0.0,
        }
    }
}

impl ParagraphBlock {
    /// A paragraph holding one unstyled run
    pub fn text(text: &str) -> Self {
        Self {
            runs: vec![Run {
                text: text.to_string(),
                font: None,
            }],
            ..Default::default()
        }
    }

    /// Set the alignment
    pub fn with_align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    /// Append a styled run
    pub fn add_run(&mut self, text: &str, font: Font) -> &mut Self {
        self.runs.push(Run {
            text: text.to_string(),
            font: Some(font),
        });
        self
    }
}

/// A contiguous piece of text sharing one style
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
}

/// Font selection for a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Font {
    /// Family id (a registered `FontDef` or a standard font name)
    pub family: String,

    #[serde(default = "default_font_size")]
    pub size: f64,

    #[serde(default)]
    pub style: FontStyle,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

fn default_font_size() -> f64 {
    12.0
}

impl Font {
    pub fn new(family: &str, size: f64) -> Self {
        Self {
            family: family.to_string(),
            size,
            style: FontStyle::default(),
            color: None,
        }
    }

    pub fn with_style(mut self, style: FontStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }
}

/// Font style variants
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

/// Horizontal alignment
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// An image placed in the content flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageBlock {
    /// Path to a JPEG or PNG file
    pub source: String,

    /// Display width in points
    pub width: f64,

    /// Display height in points
    pub height: f64,

    #[serde(default)]
    pub align: Align,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_points() {
        assert_eq!(PageSize::A4.points(), (595.28, 841.89));
        assert_eq!(PageSize::Letter.points(), (612.0, 792.0));
        assert_eq!(
            PageSize::Custom {
                width: 100.0,
                height: 200.0
            }
            .points(),
            (100.0, 200.0)
        );
    }

    #[test]
    fn test_orientation_swaps_dimensions() {
        let portrait = PageSetup::default();
        assert_eq!(portrait.dimensions(), (595.28, 841.89));

        let landscape = PageSetup {
            orientation: Orientation::Landscape,
            ..Default::default()
        };
        assert_eq!(landscape.dimensions(), (841.89, 595.28));
    }

    #[test]
    fn test_content_box() {
        let setup = PageSetup {
            size: PageSize::Letter,
            margins: Margins::uniform(36.0),
            ..Default::default()
        };
        assert_eq!(setup.content_width(), 612.0 - 72.0);
        assert_eq!(setup.content_height(), 792.0 - 72.0);
    }

    #[test]
    fn test_paragraph_builder() {
        let mut para = ParagraphBlock::text("Hello").with_align(Align::Center);
        para.add_run(" world", Font::new("helvetica", 14.0).with_style(FontStyle::Bold));

        assert_eq!(para.runs.len(), 2);
        assert_eq!(para.align, Align::Center);
        assert!(para.runs[0].font.is_none());
        assert_eq!(para.runs[1].font.as_ref().unwrap().size, 14.0);
    }

    #[test]
    fn test_section_builder() {
        let mut section = Section::new(PageSetup::default());
        section.add_paragraph("One").add_paragraph("Two");
        section.add_block(Block::PageBreak);
        assert_eq!(section.blocks.len(), 3);
    }

    #[test]
    fn test_block_serde_tagging() {
        let json = r#"{ "type": "pagebreak" }"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert!(matches!(block, Block::PageBreak));

        let json = r#"{ "type": "paragraph", "runs": [{ "text": "Hi" }] }"#;
        let block: Block = serde_json::from_str(json).unwrap();
        match block {
            Block::Paragraph(p) => assert_eq!(p.runs[0].text, "Hi"),
            _ => panic!("Expected paragraph"),
        }
    }

    #[test]
    fn test_color_default_is_black() {
        assert_eq!(Color::default(), Color::black());
    }
}
