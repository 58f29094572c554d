//! PDF output document
//!
//! `PdfDocument` is an in-memory, append-only container: pages are added in
//! order and never rewritten, content is buffered per page, and text is kept
//! as deferred operations so glyph encoding can happen after fonts have been
//! subsetted. Everything is flushed in one pipeline when the document is
//! serialized.

use crate::font::FontObjects;
use crate::image::{generate_image_operators, ImageXObject};
use crate::text::{encode_winansi, generate_text_operators, EncodedText, TextRenderContext};
use crate::{
    Align, ColorMode, FontEmbedding, FontFamily, FontFamilyBuilder, FontStyle, FontWeight,
    PdfError, Result, StandardFont, TextEncoding,
};
use log::debug;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::path::Path;

/// RGB Color (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create color from RGB values (0-255)
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    /// Black color
    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    /// White color
    pub fn white() -> Self {
        Self::rgb(1.0, 1.0, 1.0)
    }

    /// Naive RGB to CMYK conversion for CMYK-mode output
    pub fn to_cmyk(&self) -> (f32, f32, f32, f32) {
        let k = 1.0 - self.r.max(self.g).max(self.b);
        if (1.0 - k).abs() < f32::EPSILON {
            return (0.0, 0.0, 0.0, 1.0);
        }
        let c = (1.0 - self.r - k) / (1.0 - k);
        let m = (1.0 - self.g - k) / (1.0 - k);
        let y = (1.0 - self.b - k) / (1.0 - k);
        (c, m, y, k)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// Document-level metadata written to the PDF Info dictionary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdfInfo {
    pub author: Option<String>,
    pub keywords: Option<String>,
    pub subject: Option<String>,
    pub title: Option<String>,
    pub creator: Option<String>,
    pub language: Option<String>,
}

/// Which font a buffered text operation was shaped against
#[derive(Debug, Clone)]
pub(crate) enum FontRef {
    /// A registered family variant, keyed by the variant's font name
    Embedded(String),
    /// One of the built-in standard fonts
    Standard(StandardFont),
}

impl FontRef {
    /// Key used for resource naming and the embedded-font map
    fn key(&self) -> String {
        match self {
            FontRef::Embedded(name) => name.clone(),
            FontRef::Standard(font) => font.base_font().to_string(),
        }
    }
}

/// A text operation buffered until save time
///
/// Text is encoded during save, after fonts have been subsetted, so the
/// glyph ids written to the content stream match the embedded program.
#[derive(Debug, Clone)]
pub(crate) struct BufferedTextOp {
    text: String,
    font: FontRef,
    font_resource_name: String,
    page: usize,
    /// X coordinate in PDF coordinates (alignment already applied)
    x: f64,
    /// Y coordinate in PDF coordinates (bottom-origin)
    y: f64,
    font_size: f32,
    color: Color,
}

/// PDF output container
pub struct PdfDocument {
    /// The underlying lopdf document
    inner: Document,
    /// The page tree node every page hangs off
    pages_id: ObjectId,
    /// The document catalog
    catalog_id: ObjectId,
    /// Appended pages, in order
    page_ids: Vec<ObjectId>,
    /// Geometry per page, recorded when the page size is set
    page_sizes: Vec<(f64, f64)>,
    /// Document metadata
    info: PdfInfo,
    /// Custom properties, insertion-ordered, keys normalized to `/Name`
    properties: Vec<(String, String)>,
    /// Output color space for drawing operators
    color_mode: ColorMode,
    /// Text encoding mode applied to drawn text
    encoding: TextEncoding,
    /// Font embedding policy applied at save time
    embedding: FontEmbedding,
    /// Registered font families
    font_families: HashMap<String, FontFamily>,
    /// Fallback chains (family -> fallback families)
    font_fallbacks: HashMap<String, Vec<String>>,
    /// Standard fonts referenced so far, keyed by base font name
    standard_fonts: HashMap<String, StandardFont>,
    /// Current font cursor
    current_family: Option<String>,
    current_weight: FontWeight,
    current_style: FontStyle,
    current_font_size: f32,
    current_text_color: Color,
    /// Embedded font objects (font key -> PDF object id), built at save
    embedded_fonts: HashMap<String, ObjectId>,
    /// Font resource names per page (page -> font key -> "F1")
    page_font_resources: HashMap<usize, HashMap<String, String>>,
    next_font_resource: u32,
    /// Embedded images, deduplicated by content hash
    embedded_images: HashMap<u64, ObjectId>,
    /// Image resource names per page (page -> "Im1" -> object id)
    page_image_resources: HashMap<usize, HashMap<String, ObjectId>>,
    next_image_resource: u32,
    /// Buffered content operators per page
    page_content_buffer: HashMap<usize, Vec<u8>>,
    /// Deferred text operations, encoded at save
    buffered_text_ops: Vec<BufferedTextOp>,
}

/// Default page geometry for freshly appended pages (A4 portrait, points)
const DEFAULT_PAGE_SIZE: (f64, f64) = (595.28, 841.89);

fn media_box(width: f64, height: f64) -> Vec<Object> {
    vec![
        Object::Real(0.0),
        Object::Real(0.0),
        Object::Real(width as f32),
        Object::Real(height as f32),
    ]
}

impl PdfDocument {
    /// Create a new, empty document
    pub fn new(color_mode: ColorMode) -> Self {
        let mut inner = Document::with_version("1.7");

        let pages_id = inner.add_object(dictionary! {
            "Type" => "Pages",
            "Count" => 0,
            "Kids" => Object::Array(vec![]),
        });
        let catalog_id = inner.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        inner.trailer.set("Root", catalog_id);

        Self {
            inner,
            pages_id,
            catalog_id,
            page_ids: Vec::new(),
            page_sizes: Vec::new(),
            info: PdfInfo::default(),
            properties: Vec::new(),
            color_mode,
            encoding: TextEncoding::default(),
            embedding: FontEmbedding::default(),
            font_families: HashMap::new(),
            font_fallbacks: HashMap::new(),
            standard_fonts: HashMap::new(),
            current_family: None,
            current_weight: FontWeight::default(),
            current_style: FontStyle::default(),
            current_font_size: 12.0,
            current_text_color: Color::default(),
            embedded_fonts: HashMap::new(),
            page_font_resources: HashMap::new(),
            next_font_resource: 1,
            embedded_images: HashMap::new(),
            page_image_resources: HashMap::new(),
            next_image_resource: 1,
            page_content_buffer: HashMap::new(),
            buffered_text_ops: Vec::new(),
        }
    }

    /// Set the creator string written to document metadata
    pub fn with_creator(mut self, creator: &str) -> Self {
        self.info.creator = Some(creator.to_string());
        self
    }

    /// Set the document language written to metadata and the catalog
    pub fn with_language(mut self, language: &str) -> Self {
        self.info.language = Some(language.to_string());
        self
    }

    /// Number of pages appended so far
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// The output color space
    pub fn color_mode(&self) -> ColorMode {
        self.color_mode
    }

    /// Document metadata
    pub fn info(&self) -> &PdfInfo {
        &self.info
    }

    /// Mutable document metadata
    pub fn info_mut(&mut self) -> &mut PdfInfo {
        &mut self.info
    }

    /// Custom properties in insertion order
    pub fn properties(&self) -> &[(String, String)] {
        &self.properties
    }

    /// Insert or overwrite a custom property
    ///
    /// Keys are normalized to the PDF name convention: a leading `/` is
    /// prepended unless the key already carries one.
    pub fn set_property(&mut self, key: &str, value: &str) {
        let normalized = if key.starts_with('/') {
            key.to_string()
        } else {
            format!("/{key}")
        };

        if let Some(entry) = self.properties.iter_mut().find(|(k, _)| *k == normalized) {
            entry.1 = value.to_string();
        } else {
            self.properties.push((normalized, value.to_string()));
        }
    }

    /// Set the text encoding mode for subsequently drawn text
    pub fn set_text_encoding(&mut self, encoding: TextEncoding) {
        self.encoding = encoding;
    }

    /// Set the font embedding policy applied at save time
    pub fn set_font_embedding(&mut self, embedding: FontEmbedding) {
        self.embedding = embedding;
    }

    /// Append a new page with default geometry
    ///
    /// Returns the new page number (1-indexed). The caller is expected to
    /// fix the geometry with [`set_page_size`](Self::set_page_size) before
    /// drawing on the page.
    pub fn add_page(&mut self) -> usize {
        let (width, height) = DEFAULT_PAGE_SIZE;
        let page_id = self.inner.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => media_box(width, height),
            "Resources" => dictionary! {},
        });

        self.page_ids.push(page_id);
        self.page_sizes.push((width, height));

        let kids: Vec<Object> = self.page_ids.iter().map(|&id| id.into()).collect();
        if let Ok(pages) = self.inner.get_object_mut(self.pages_id) {
            if let Object::Dictionary(dict) = pages {
                dict.set("Kids", Object::Array(kids));
                dict.set("Count", self.page_ids.len() as i64);
            }
        }

        self.page_ids.len()
    }

    /// Set a page's geometry
    ///
    /// Must be called before any drawing targets the page; the recorded
    /// height drives the top-origin coordinate conversion for that page.
    pub fn set_page_size(&mut self, page: usize, width: f64, height: f64) -> Result<()> {
        let page_id = self.page_id(page)?;
        self.page_sizes[page - 1] = (width, height);

        if let Ok(Object::Dictionary(dict)) = self.inner.get_object_mut(page_id) {
            dict.set("MediaBox", media_box(width, height));
        }
        Ok(())
    }

    /// A page's geometry in points
    pub fn page_size(&self, page: usize) -> Result<(f64, f64)> {
        self.page_sizes
            .get(page.wrapping_sub(1))
            .copied()
            .ok_or(PdfError::InvalidPage(page, self.page_ids.len()))
    }

    fn page_id(&self, page: usize) -> Result<ObjectId> {
        self.page_ids
            .get(page.wrapping_sub(1))
            .copied()
            .ok_or(PdfError::InvalidPage(page, self.page_ids.len()))
    }

    /// Register a font family with its variants
    pub fn register_font_family(&mut self, name: &str, builder: FontFamilyBuilder) -> Result<()> {
        if self.font_families.contains_key(name) {
            return Err(PdfError::FontAlreadyExists(name.to_string()));
        }
        let family = builder.build(name)?;
        self.font_families.insert(name.to_string(), family);
        Ok(())
    }

    /// Whether a family of this name has been registered
    pub fn has_font_family(&self, name: &str) -> bool {
        self.font_families.contains_key(name)
    }

    /// Install an already-built family (used when measurement fonts are
    /// shared with the output document)
    pub fn install_font_family(&mut self, name: &str, family: FontFamily) -> Result<()> {
        if self.font_families.contains_key(name) {
            return Err(PdfError::FontAlreadyExists(name.to_string()));
        }
        self.font_families.insert(name.to_string(), family);
        Ok(())
    }

    /// Set the fallback chain for a family
    ///
    /// Every name involved must be a registered family.
    pub fn set_font_fallback(&mut self, family: &str, fallbacks: &[String]) -> Result<()> {
        if !self.font_families.contains_key(family) {
            return Err(PdfError::FontNotFound(family.to_string()));
        }
        for fallback in fallbacks {
            if !self.font_families.contains_key(fallback) {
                return Err(PdfError::FontNotFound(fallback.clone()));
            }
        }
        self.font_fallbacks
            .insert(family.to_string(), fallbacks.to_vec());
        Ok(())
    }

    /// Set the current font family and size
    ///
    /// The family may be a registered family or a standard font name
    /// (helvetica, times, courier and their common aliases).
    pub fn set_font(&mut self, family: &str, size: f32) -> Result<()> {
        if !self.font_families.contains_key(family)
            && StandardFont::resolve(family, FontWeight::Regular, FontStyle::Normal).is_none()
        {
            return Err(PdfError::FontNotFound(family.to_string()));
        }
        self.current_family = Some(family.to_string());
        self.current_font_size = size;
        Ok(())
    }

    /// Set only the font size
    pub fn set_font_size(&mut self, size: f32) -> Result<()> {
        if self.current_family.is_none() {
            return Err(PdfError::FontNotFound("No font family set".to_string()));
        }
        self.current_font_size = size;
        Ok(())
    }

    /// Set the font weight
    pub fn set_font_weight(&mut self, weight: FontWeight) -> Result<()> {
        if self.current_family.is_none() {
            return Err(PdfError::FontNotFound("No font family set".to_string()));
        }
        self.current_weight = weight;
        Ok(())
    }

    /// Set the font style
    pub fn set_font_style(&mut self, style: FontStyle) -> Result<()> {
        if self.current_family.is_none() {
            return Err(PdfError::FontNotFound("No font family set".to_string()));
        }
        self.current_style = style;
        Ok(())
    }

    /// Set the text color
    pub fn set_text_color(&mut self, color: Color) {
        self.current_text_color = color;
    }

    /// Resolve the current font cursor to a concrete font reference
    fn resolve_current_font(&self) -> Result<FontRef> {
        let family = self
            .current_family
            .as_ref()
            .ok_or_else(|| PdfError::FontNotFound("No font family set".to_string()))?;

        if let Some(fam) = self.font_families.get(family) {
            let data = fam
                .get_variant(self.current_weight, self.current_style)
                .ok_or_else(|| PdfError::FontNotFound(family.clone()))?;
            return Ok(FontRef::Embedded(data.name.clone()));
        }

        StandardFont::resolve(family, self.current_weight, self.current_style)
            .map(FontRef::Standard)
            .ok_or_else(|| PdfError::FontNotFound(family.clone()))
    }

    fn get_font_data(&self, name: &str) -> Result<&crate::FontData> {
        self.font_families
            .values()
            .flat_map(|family| family.variants())
            .find(|variant| variant.name == name)
            .ok_or_else(|| PdfError::FontNotFound(name.to_string()))
    }

    fn get_font_data_mut(&mut self, name: &str) -> Result<&mut crate::FontData> {
        self.font_families
            .values_mut()
            .flat_map(|family| family.variants_mut())
            .find(|variant| variant.name == name)
            .ok_or_else(|| PdfError::FontNotFound(name.to_string()))
    }

    /// Width of `text` in points under the current font cursor
    pub fn text_width(&self, text: &str) -> Result<f64> {
        match self.resolve_current_font()? {
            FontRef::Embedded(name) => {
                let data = self.get_font_data(&name)?;
                Ok(data.text_width_points(text, self.current_font_size) as f64)
            }
            FontRef::Standard(font) => {
                Ok(font.text_width_points(text, self.current_font_size) as f64)
            }
        }
    }

    fn segment_width(&self, text: &str, font: &FontRef, size: f32) -> Result<f64> {
        match font {
            FontRef::Embedded(name) => {
                let data = self.get_font_data(name)?;
                Ok(data.text_width_points(text, size) as f64)
            }
            FontRef::Standard(standard) => Ok(standard.text_width_points(text, size) as f64),
        }
    }

    /// Split text into segments by glyph availability across the fallback
    /// chain of the current family
    fn segment_text_by_font(&self, text: &str, family: &str, primary: &FontRef) -> Vec<(String, FontRef)> {
        let primary_name = match primary {
            FontRef::Embedded(name) => name.clone(),
            // Standard fonts have no fallback chain
            FontRef::Standard(_) => return vec![(text.to_string(), primary.clone())],
        };

        let fallbacks = match self.font_fallbacks.get(family) {
            Some(list) if !list.is_empty() => list,
            _ => return vec![(text.to_string(), primary.clone())],
        };

        let font_for_char = |c: char| -> FontRef {
            if let Ok(data) = self.get_font_data(&primary_name) {
                if data.has_glyph(c) {
                    return primary.clone();
                }
            }
            for fallback_family in fallbacks {
                if let Some(family_data) = self.font_families.get(fallback_family) {
                    if let Some(variant) =
                        family_data.get_variant(self.current_weight, self.current_style)
                    {
                        if variant.has_glyph(c) {
                            return FontRef::Embedded(variant.name.clone());
                        }
                    }
                }
            }
            primary.clone()
        };

        let mut segments: Vec<(String, FontRef)> = Vec::new();
        for c in text.chars() {
            let font = font_for_char(c);
            match segments.last_mut() {
                Some((segment, current)) if current.key() == font.key() => segment.push(c),
                _ => segments.push((c.to_string(), font)),
            }
        }
        segments
    }

    /// Build the buffered text operations for one draw call
    ///
    /// Called by the canvas; the returned ops are queued on release so the
    /// surface's buffered state reaches the page even when a later draw
    /// fails.
    pub(crate) fn prepare_text_ops(
        &mut self,
        text: &str,
        page: usize,
        x: f64,
        y: f64,
        align: Align,
    ) -> Result<Vec<BufferedTextOp>> {
        let page_count = self.page_count();
        if page == 0 || page > page_count {
            return Err(PdfError::InvalidPage(page, page_count));
        }
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let family = self
            .current_family
            .clone()
            .ok_or_else(|| PdfError::FontNotFound("No font family set".to_string()))?;
        let primary = self.resolve_current_font()?;
        let segments = self.segment_text_by_font(text, &family, &primary);

        let mut total_width = 0.0f64;
        for (segment, font) in &segments {
            total_width += self.segment_width(segment, font, self.current_font_size)?;
        }

        // Convert from the caller's top-origin Y to PDF bottom-origin
        let (_, page_height) = self.page_size(page)?;
        let pdf_y = page_height - y;

        let start_x = match align {
            Align::Left => x,
            Align::Center => x - total_width / 2.0,
            Align::Right => x - total_width,
        };

        let mut ops = Vec::with_capacity(segments.len());
        let mut current_x = start_x;
        for (segment, font) in segments {
            if let FontRef::Embedded(ref name) = font {
                self.get_font_data_mut(name)?.add_chars(&segment);
            }
            if let FontRef::Standard(standard) = font {
                self.standard_fonts
                    .entry(standard.base_font().to_string())
                    .or_insert(standard);
            }

            let width = self.segment_width(&segment, &font, self.current_font_size)?;
            let font_resource_name = self.font_resource_name(&font.key(), page);

            ops.push(BufferedTextOp {
                text: segment,
                font,
                font_resource_name,
                page,
                x: current_x,
                y: pdf_y,
                font_size: self.current_font_size,
                color: self.current_text_color,
            });

            current_x += width;
        }

        Ok(ops)
    }

    /// Queue prepared text operations for save-time encoding
    pub(crate) fn queue_text_ops(&mut self, ops: Vec<BufferedTextOp>) {
        self.buffered_text_ops.extend(ops);
    }

    /// Get or create the per-page resource name for a font key
    fn font_resource_name(&mut self, font_key: &str, page: usize) -> String {
        let page_resources = self.page_font_resources.entry(page).or_default();
        if let Some(name) = page_resources.get(font_key) {
            return name.clone();
        }
        let name = format!("F{}", self.next_font_resource);
        self.next_font_resource += 1;
        page_resources.insert(font_key.to_string(), name.clone());
        name
    }

    /// Register an image on a page, deduplicated by content hash
    ///
    /// Returns the resource name and the image's intrinsic pixel size.
    pub(crate) fn register_image(&mut self, data: &[u8], page: usize) -> Result<(String, u32, u32)> {
        let page_count = self.page_count();
        if page == 0 || page > page_count {
            return Err(PdfError::InvalidPage(page, page_count));
        }

        let mut hasher = DefaultHasher::new();
        data.hash(&mut hasher);
        let data_hash = hasher.finish();

        let (object_id, width, height) = match self.embedded_images.get(&data_hash) {
            Some(&id) => {
                let stream = self.inner.get_object(id)?.as_stream()?;
                let width = stream.dict.get(b"Width")?.as_i64()? as u32;
                let height = stream.dict.get(b"Height")?.as_i64()? as u32;
                (id, width, height)
            }
            None => {
                let xobject = ImageXObject::from_bytes(data)?;
                let (width, height) = (xobject.width, xobject.height);
                let id = self.inner.add_object(xobject.to_pdf_stream());
                self.embedded_images.insert(data_hash, id);
                (id, width, height)
            }
        };

        let page_resources = self.page_image_resources.entry(page).or_default();
        for (name, &id) in page_resources.iter() {
            if id == object_id {
                return Ok((name.clone(), width, height));
            }
        }

        let name = format!("Im{}", self.next_image_resource);
        self.next_image_resource += 1;
        page_resources.insert(name.clone(), object_id);

        Ok((name, width, height))
    }

    /// Operators that place a registered image (top-origin coordinates)
    pub(crate) fn image_operators(
        &mut self,
        data: &[u8],
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Result<Vec<u8>> {
        let (resource_name, _, _) = self.register_image(data, page)?;
        let (_, page_height) = self.page_size(page)?;
        let pdf_y = page_height - y - height;
        Ok(generate_image_operators(&resource_name, x, pdf_y, width, height))
    }

    /// Append raw operators to a page's content buffer
    pub(crate) fn buffer_content(&mut self, page: usize, content: &[u8]) {
        self.page_content_buffer
            .entry(page)
            .or_default()
            .extend_from_slice(content);
    }

    /// Save the document to a file
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.finalize()?;
        self.inner
            .save(path)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(())
    }

    /// Save the document to a writer
    pub fn save_to<W: Write>(&mut self, writer: &mut W) -> Result<()> {
        self.finalize()?;
        self.inner
            .save_to(writer)
            .map_err(|e| PdfError::SaveError(e.to_string()))?;
        Ok(())
    }

    /// Save the document to bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.save_to(&mut buffer)?;
        Ok(buffer)
    }

    /// Run the save pipeline: subset, encode deferred text, flush content,
    /// embed fonts, wire resources, write metadata
    fn finalize(&mut self) -> Result<()> {
        debug!(
            "finalizing document: {} pages, {} deferred text ops",
            self.page_ids.len(),
            self.buffered_text_ops.len()
        );
        if self.embedding == FontEmbedding::Subset {
            self.subset_fonts()?;
        }
        self.encode_buffered_text()?;
        self.flush_content_buffers()?;
        self.embed_fonts()?;
        self.attach_page_resources()?;
        self.write_metadata();
        Ok(())
    }

    /// Build subsets for every font that saw use
    fn subset_fonts(&mut self) -> Result<()> {
        for family in self.font_families.values_mut() {
            for font in family.variants_mut() {
                if !font.used_chars.is_empty() {
                    font.create_subset()?;
                }
            }
        }
        Ok(())
    }

    /// Encode deferred text against the final fonts and buffer the
    /// resulting operators
    fn encode_buffered_text(&mut self) -> Result<()> {
        let text_ops: Vec<BufferedTextOp> = std::mem::take(&mut self.buffered_text_ops);

        for op in text_ops {
            let encoded = match (&op.font, self.encoding) {
                (FontRef::Embedded(name), TextEncoding::Wide) => {
                    let data = self.get_font_data(name)?;
                    EncodedText::Hex(data.encode_text_hex(&op.text))
                }
                // Standard fonts are simple fonts regardless of the mode
                _ => EncodedText::Literal(encode_winansi(&op.text)),
            };

            let text_width = self.segment_width(&op.text, &op.font, op.font_size)?;
            let ctx = TextRenderContext {
                font_name: op.font_resource_name.clone(),
                font_size: op.font_size,
                text_width,
                color: op.color,
                color_mode: self.color_mode,
            };

            // Position was alignment-resolved when the op was buffered
            let operators = generate_text_operators(&encoded, op.x, op.y, Align::Left, &ctx);
            self.buffer_content(op.page, &operators);
        }

        Ok(())
    }

    /// Write one content stream per page from the buffered operators
    ///
    /// Every page gets a stream, so pages untouched by drawing still
    /// serialize as valid (empty) pages.
    fn flush_content_buffers(&mut self) -> Result<()> {
        for page in 1..=self.page_count() {
            let content = self.page_content_buffer.remove(&page).unwrap_or_default();
            let stream_id = self
                .inner
                .add_object(Stream::new(Dictionary::new(), content));

            let page_id = self.page_id(page)?;
            if let Ok(Object::Dictionary(dict)) = self.inner.get_object_mut(page_id) {
                dict.set("Contents", Object::Reference(stream_id));
            }
        }
        Ok(())
    }

    /// Embed every used font and record its object id
    fn embed_fonts(&mut self) -> Result<()> {
        // Re-embedding from scratch keeps repeated saves consistent
        self.embedded_fonts.clear();

        let mut font_names: Vec<String> = self
            .font_families
            .values()
            .flat_map(|family| family.variants())
            .filter(|font| !font.used_chars.is_empty())
            .map(|font| font.name.clone())
            .collect();
        font_names.sort();
        font_names.dedup();

        for font_name in font_names {
            let objects = self
                .get_font_data(&font_name)?
                .to_pdf_objects(self.encoding, self.embedding)?;
            let font_id = self.add_font_objects(objects);
            self.embedded_fonts.insert(font_name, font_id);
        }

        let mut standard: Vec<(String, StandardFont)> = self
            .standard_fonts
            .iter()
            .map(|(name, &font)| (name.clone(), font))
            .collect();
        standard.sort_by(|a, b| a.0.cmp(&b.0));

        for (name, font) in standard {
            let font_id = self.inner.add_object(font.to_font_dictionary());
            self.embedded_fonts.insert(name, font_id);
        }

        Ok(())
    }

    /// Wire one font's object graph into the document
    fn add_font_objects(&mut self, objects: FontObjects) -> ObjectId {
        match objects {
            FontObjects::Composite {
                mut type0,
                mut cid,
                mut descriptor,
                font_file,
                to_unicode,
            } => {
                if let Some(stream) = font_file {
                    let font_file_id = self.inner.add_object(stream);
                    descriptor.set("FontFile2", Object::Reference(font_file_id));
                }
                let descriptor_id = self.inner.add_object(descriptor);
                cid.set("FontDescriptor", Object::Reference(descriptor_id));
                let cid_id = self.inner.add_object(cid);

                let to_unicode_id = self.inner.add_object(to_unicode);
                type0.set(
                    "DescendantFonts",
                    Object::Array(vec![Object::Reference(cid_id)]),
                );
                type0.set("ToUnicode", Object::Reference(to_unicode_id));
                self.inner.add_object(type0)
            }
            FontObjects::Simple {
                mut font,
                mut descriptor,
                font_file,
            } => {
                if let Some(stream) = font_file {
                    let font_file_id = self.inner.add_object(stream);
                    descriptor.set("FontFile2", Object::Reference(font_file_id));
                }
                let descriptor_id = self.inner.add_object(descriptor);
                font.set("FontDescriptor", Object::Reference(descriptor_id));
                self.inner.add_object(font)
            }
        }
    }

    /// Fill each page's Resources dictionary with its font and image refs
    fn attach_page_resources(&mut self) -> Result<()> {
        for page in 1..=self.page_count() {
            let mut font_dict = Dictionary::new();
            if let Some(fonts) = self.page_font_resources.get(&page) {
                let mut entries: Vec<(&String, &String)> = fonts.iter().collect();
                entries.sort();
                for (font_key, resource_name) in entries {
                    let font_ref = self
                        .embedded_fonts
                        .get(font_key)
                        .ok_or_else(|| PdfError::FontNotFound(font_key.clone()))?;
                    font_dict.set(resource_name.as_bytes(), Object::Reference(*font_ref));
                }
            }

            let mut xobject_dict = Dictionary::new();
            if let Some(images) = self.page_image_resources.get(&page) {
                let mut entries: Vec<(&String, &ObjectId)> = images.iter().collect();
                entries.sort();
                for (resource_name, object_id) in entries {
                    xobject_dict.set(resource_name.as_bytes(), Object::Reference(*object_id));
                }
            }

            let mut resources = Dictionary::new();
            if !font_dict.is_empty() {
                resources.set("Font", Object::Dictionary(font_dict));
            }
            if !xobject_dict.is_empty() {
                resources.set("XObject", Object::Dictionary(xobject_dict));
            }

            let page_id = self.page_id(page)?;
            if let Ok(Object::Dictionary(dict)) = self.inner.get_object_mut(page_id) {
                dict.set("Resources", Object::Dictionary(resources));
            }
        }
        Ok(())
    }

    /// Write the Info dictionary, custom properties and catalog language
    fn write_metadata(&mut self) {
        let mut dict = Dictionary::new();
        if let Some(title) = &self.info.title {
            dict.set("Title", Object::string_literal(title.as_str()));
        }
        if let Some(author) = &self.info.author {
            dict.set("Author", Object::string_literal(author.as_str()));
        }
        if let Some(subject) = &self.info.subject {
            dict.set("Subject", Object::string_literal(subject.as_str()));
        }
        if let Some(keywords) = &self.info.keywords {
            dict.set("Keywords", Object::string_literal(keywords.as_str()));
        }
        if let Some(creator) = &self.info.creator {
            dict.set("Creator", Object::string_literal(creator.as_str()));
        }

        for (key, value) in &self.properties {
            // Stored keys carry the normalizing slash; PDF names do not
            let name = key.trim_start_matches('/');
            dict.set(name.as_bytes(), Object::string_literal(value.as_str()));
        }

        if !dict.is_empty() {
            let info_id = self.inner.add_object(dict);
            self.inner.trailer.set("Info", Object::Reference(info_id));
        }

        if let Some(language) = self.info.language.clone() {
            if let Ok(Object::Dictionary(catalog)) = self.inner.get_object_mut(self.catalog_id) {
                catalog.set("Lang", Object::string_literal(language.as_str()));
            }
        }
    }

    /// Get a reference to the underlying lopdf document
    pub fn inner(&self) -> &Document {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_is_empty() {
        let doc = PdfDocument::new(ColorMode::Rgb);
        assert_eq!(doc.page_count(), 0);
        assert_eq!(doc.color_mode(), ColorMode::Rgb);
        assert!(doc.properties().is_empty());
    }

    #[test]
    fn test_add_page_appends_in_order() {
        let mut doc = PdfDocument::new(ColorMode::Rgb);
        assert_eq!(doc.add_page(), 1);
        assert_eq!(doc.add_page(), 2);
        assert_eq!(doc.add_page(), 3);
        assert_eq!(doc.page_count(), 3);
    }

    #[test]
    fn test_set_page_size() {
        let mut doc = PdfDocument::new(ColorMode::Rgb);
        let page = doc.add_page();
        doc.set_page_size(page, 612.0, 792.0).unwrap();
        assert_eq!(doc.page_size(page).unwrap(), (612.0, 792.0));
    }

    #[test]
    fn test_page_size_invalid_page() {
        let doc = PdfDocument::new(ColorMode::Rgb);
        assert!(matches!(
            doc.page_size(1),
            Err(PdfError::InvalidPage(1, 0))
        ));
    }

    #[test]
    fn test_set_property_normalizes_keys() {
        let mut doc = PdfDocument::new(ColorMode::Rgb);
        doc.set_property("Author2", "X");
        assert_eq!(doc.properties(), &[("/Author2".to_string(), "X".to_string())]);

        // Pre-normalized keys are not double-prefixed
        doc.set_property("/Author2", "Y");
        assert_eq!(doc.properties(), &[("/Author2".to_string(), "Y".to_string())]);
    }

    #[test]
    fn test_set_property_preserves_insertion_order() {
        let mut doc = PdfDocument::new(ColorMode::Rgb);
        doc.set_property("Zeta", "1");
        doc.set_property("Alpha", "2");
        doc.set_property("Zeta", "3");
        let keys: Vec<&str> = doc.properties().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["/Zeta", "/Alpha"]);
        assert_eq!(doc.properties()[0].1, "3");
    }

    #[test]
    fn test_standard_font_cursor() {
        let mut doc = PdfDocument::new(ColorMode::Rgb);
        doc.set_font("helvetica", 12.0).unwrap();
        doc.set_font_weight(FontWeight::Bold).unwrap();
        let width = doc.text_width("Hello").unwrap();
        assert!(width > 0.0);
    }

    #[test]
    fn test_set_font_unknown_family() {
        let mut doc = PdfDocument::new(ColorMode::Rgb);
        assert!(matches!(
            doc.set_font("nonexistent", 12.0),
            Err(PdfError::FontNotFound(_))
        ));
    }

    #[test]
    fn test_font_cursor_requires_family() {
        let mut doc = PdfDocument::new(ColorMode::Rgb);
        assert!(doc.set_font_size(14.0).is_err());
        assert!(doc.set_font_weight(FontWeight::Bold).is_err());
        assert!(doc.set_font_style(FontStyle::Italic).is_err());
    }

    #[test]
    fn test_prepare_text_ops_invalid_page() {
        let mut doc = PdfDocument::new(ColorMode::Rgb);
        doc.set_font("helvetica", 12.0).unwrap();
        let result = doc.prepare_text_ops("Test", 999, 0.0, 0.0, Align::Left);
        assert!(matches!(result, Err(PdfError::InvalidPage(999, 0))));
    }

    #[test]
    fn test_prepare_text_ops_empty_text() {
        let mut doc = PdfDocument::new(ColorMode::Rgb);
        let page = doc.add_page();
        doc.set_font("helvetica", 12.0).unwrap();
        let ops = doc.prepare_text_ops("", page, 0.0, 0.0, Align::Left).unwrap();
        assert!(ops.is_empty());
    }

    #[test]
    fn test_save_empty_document_to_bytes() {
        let mut doc = PdfDocument::new(ColorMode::Rgb);
        doc.add_page();
        let bytes = doc.to_bytes().unwrap();
        assert!(!bytes.is_empty());

        let reloaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(reloaded.get_pages().len(), 1);
    }

    #[test]
    fn test_metadata_round_trip() {
        let mut doc = PdfDocument::new(ColorMode::Rgb).with_creator("pageflow test");
        doc.add_page();
        doc.info_mut().title = Some("Report".to_string());
        doc.set_property("Department", "QA");

        let bytes = doc.to_bytes().unwrap();
        let reloaded = Document::load_mem(&bytes).unwrap();

        let info_ref = reloaded.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = reloaded.get_object(info_ref).unwrap().as_dict().unwrap();
        assert!(info.get(b"Title").is_ok());
        assert!(info.get(b"Creator").is_ok());
        assert!(info.get(b"Department").is_ok());
        assert!(info.get(b"Author").is_err());
    }

    #[test]
    fn test_color_to_cmyk() {
        let (c, m, y, k) = Color::rgb(1.0, 0.0, 0.0).to_cmyk();
        assert_eq!(k, 0.0);
        assert_eq!(c, 0.0);
        assert_eq!(m, 1.0);
        assert_eq!(y, 1.0);

        let (_, _, _, k) = Color::black().to_cmyk();
        assert_eq!(k, 1.0);
    }
}
