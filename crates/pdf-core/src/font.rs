//! Font handling for PDF documents
//!
//! Two kinds of fonts flow through the document: embedded TrueType fonts
//! (parsed with `ttf-parser`, optionally subsetted before embedding) and the
//! built-in standard fonts, which are never embedded and are measured from a
//! compact metric table.

use crate::{FontEmbedding, PdfError, Result, TextEncoding};
use lopdf::{Dictionary, Object, Stream};
use std::collections::HashSet;

/// Font weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
}

/// Font style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

/// Font data for an embedded TrueType font
#[derive(Debug, Clone)]
pub struct FontData {
    /// Font name/identifier (family name plus variant suffix)
    pub name: String,
    /// Raw TTF data
    pub ttf_data: Vec<u8>,
    /// Characters used so far (drives subsetting and the ToUnicode map)
    pub used_chars: HashSet<char>,
    /// Subset font program, built during save when the policy asks for it
    subset_data: Option<Vec<u8>>,
    /// Parsed font face
    face: Option<ttf_parser::Face<'static>>,
}

/// PDF objects generated for one font at save time
pub(crate) enum FontObjects {
    /// Type0 + CIDFontType2 pair for wide (Identity-H) text
    Composite {
        type0: Dictionary,
        cid: Dictionary,
        descriptor: Dictionary,
        font_file: Option<Stream>,
        to_unicode: Stream,
    },
    /// Simple TrueType font with WinAnsi encoding for single-byte text
    Simple {
        font: Dictionary,
        descriptor: Dictionary,
        font_file: Option<Stream>,
    },
}

/// Font family with variants
#[derive(Debug, Clone, Default)]
pub struct FontFamily {
    pub regular: Option<FontData>,
    pub bold: Option<FontData>,
    pub italic: Option<FontData>,
    pub bold_italic: Option<FontData>,
}

impl FontFamily {
    /// Get the font data for the specified weight and style,
    /// falling back to regular if the requested variant is missing
    pub fn get_variant(&self, weight: FontWeight, style: FontStyle) -> Option<&FontData> {
        match (weight, style) {
            (FontWeight::Bold, FontStyle::Italic) => self
                .bold_italic
                .as_ref()
                .or(self.bold.as_ref())
                .or(self.italic.as_ref())
                .or(self.regular.as_ref()),
            (FontWeight::Bold, FontStyle::Normal) => self.bold.as_ref().or(self.regular.as_ref()),
            (FontWeight::Regular, FontStyle::Italic) => {
                self.italic.as_ref().or(self.regular.as_ref())
            }
            (FontWeight::Regular, FontStyle::Normal) => self.regular.as_ref(),
        }
    }

    /// Internal font name for the variant (used for PDF resource naming)
    pub fn variant_name(&self, family_name: &str, weight: FontWeight, style: FontStyle) -> String {
        match (weight, style) {
            (FontWeight::Bold, FontStyle::Italic) => format!("{family_name}-bold-italic"),
            (FontWeight::Bold, FontStyle::Normal) => format!("{family_name}-bold"),
            (FontWeight::Regular, FontStyle::Italic) => format!("{family_name}-italic"),
            (FontWeight::Regular, FontStyle::Normal) => family_name.to_string(),
        }
    }

    /// Iterate over the variants that are present
    pub fn variants(&self) -> impl Iterator<Item = &FontData> {
        [
            self.regular.as_ref(),
            self.bold.as_ref(),
            self.italic.as_ref(),
            self.bold_italic.as_ref(),
        ]
        .into_iter()
        .flatten()
    }

    /// Iterate mutably over the variants that are present
    pub fn variants_mut(&mut self) -> impl Iterator<Item = &mut FontData> {
        [
            self.regular.as_mut(),
            self.bold.as_mut(),
            self.italic.as_mut(),
            self.bold_italic.as_mut(),
        ]
        .into_iter()
        .flatten()
    }
}

/// Builder for registering font families
pub struct FontFamilyBuilder {
    regular: Option<Vec<u8>>,
    bold: Option<Vec<u8>>,
    italic: Option<Vec<u8>>,
    bold_italic: Option<Vec<u8>>,
}

impl FontFamilyBuilder {
    pub fn new() -> Self {
        Self {
            regular: None,
            bold: None,
            italic: None,
            bold_italic: None,
        }
    }

    pub fn regular(mut self, ttf_data: Vec<u8>) -> Self {
        self.regular = Some(ttf_data);
        self
    }

    pub fn bold(mut self, ttf_data: Vec<u8>) -> Self {
        self.bold = Some(ttf_data);
        self
    }

    pub fn italic(mut self, ttf_data: Vec<u8>) -> Self {
        self.italic = Some(ttf_data);
        self
    }

    pub fn bold_italic(mut self, ttf_data: Vec<u8>) -> Self {
        self.bold_italic = Some(ttf_data);
        self
    }

    /// Build the FontFamily from the provided TTF data
    ///
    /// A regular variant is required; the others are optional.
    pub fn build(self, family_name: &str) -> Result<FontFamily> {
        let regular = match self.regular {
            Some(ttf_data) => Some(FontData::from_ttf(family_name, &ttf_data)?),
            None => {
                return Err(PdfError::FontParseError(
                    "FontFamily must have at least a regular variant".to_string(),
                ))
            }
        };

        let bold = self
            .bold
            .map(|data| FontData::from_ttf(&format!("{family_name}-bold"), &data))
            .transpose()?;

        let italic = self
            .italic
            .map(|data| FontData::from_ttf(&format!("{family_name}-italic"), &data))
            .transpose()?;

        let bold_italic = self
            .bold_italic
            .map(|data| FontData::from_ttf(&format!("{family_name}-bold-italic"), &data))
            .transpose()?;

        Ok(FontFamily {
            regular,
            bold,
            italic,
            bold_italic,
        })
    }
}

impl Default for FontFamilyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FontData {
    /// Create font data from TTF bytes
    pub fn from_ttf(name: &str, ttf_data: &[u8]) -> Result<Self> {
        let data = ttf_data.to_vec();

        // The face borrows the font bytes for the document lifetime; fonts
        // are loaded once, so leaking the backing buffer is acceptable.
        let static_data: &'static [u8] = Box::leak(data.clone().into_boxed_slice());

        let face = ttf_parser::Face::parse(static_data, 0)
            .map_err(|e| PdfError::FontParseError(format!("{e:?}")))?;

        Ok(Self {
            name: name.to_string(),
            ttf_data: data,
            used_chars: HashSet::new(),
            subset_data: None,
            face: Some(face),
        })
    }

    /// Record characters as used (for subsetting and ToUnicode)
    pub fn add_chars(&mut self, text: &str) {
        for c in text.chars() {
            self.used_chars.insert(c);
        }
    }

    /// Get glyph ID for a character
    pub fn glyph_id(&self, c: char) -> Option<u16> {
        self.face
            .as_ref()
            .and_then(|face| face.glyph_index(c).map(|id| id.0))
    }

    /// Check if the font has a glyph for the given character
    pub fn has_glyph(&self, c: char) -> bool {
        self.glyph_id(c).map(|id| id != 0).unwrap_or(false)
    }

    /// Get glyph advance width in font units
    pub fn glyph_advance(&self, c: char) -> Option<u16> {
        self.face.as_ref().and_then(|face| {
            let glyph_id = face.glyph_index(c)?;
            face.glyph_hor_advance(glyph_id)
        })
    }

    /// Font units per em
    pub fn units_per_em(&self) -> u16 {
        self.face
            .as_ref()
            .map(|face| face.units_per_em())
            .unwrap_or(1000)
    }

    /// Font ascender in font units
    pub fn ascender(&self) -> i16 {
        self.face
            .as_ref()
            .map(|face| face.ascender())
            .unwrap_or(800)
    }

    /// Font descender in font units
    pub fn descender(&self) -> i16 {
        self.face
            .as_ref()
            .map(|face| face.descender())
            .unwrap_or(-200)
    }

    /// Text width in font units
    pub fn text_width(&self, text: &str) -> u32 {
        text.chars()
            .filter_map(|c| self.glyph_advance(c))
            .map(|w| w as u32)
            .sum()
    }

    /// Text width in points for a given font size
    pub fn text_width_points(&self, text: &str, font_size: f32) -> f32 {
        let width = self.text_width(text);
        let units_per_em = self.units_per_em() as f32;
        (width as f32 / units_per_em) * font_size
    }

    /// Build a subset font program containing only the used glyphs
    ///
    /// The PDF subsetting profile preserves glyph ids, so text encoded
    /// against the original face stays valid against the subset.
    pub fn create_subset(&mut self) -> Result<()> {
        if self.used_chars.is_empty() {
            return Ok(());
        }

        let mut glyphs: Vec<u16> = self
            .used_chars
            .iter()
            .filter_map(|&c| self.glyph_id(c))
            .collect();
        glyphs.push(0); // .notdef stays in every subset
        glyphs.sort_unstable();
        glyphs.dedup();

        let subset = subsetter::subset(&self.ttf_data, 0, subsetter::Profile::pdf(&glyphs))
            .map_err(|e| PdfError::FontSubsetError(format!("{e:?}")))?;
        self.subset_data = Some(subset);
        Ok(())
    }

    /// The font program to embed under the given policy, if any
    fn font_program(&self, embedding: FontEmbedding) -> Option<&[u8]> {
        match embedding {
            FontEmbedding::Subset => Some(
                self.subset_data
                    .as_deref()
                    .unwrap_or(self.ttf_data.as_slice()),
            ),
            FontEmbedding::Full => Some(self.ttf_data.as_slice()),
            FontEmbedding::None => None,
        }
    }

    /// Encode text as a hex string of glyph ids for the Tj operator
    pub fn encode_text_hex(&self, text: &str) -> String {
        let mut result = String::new();
        for c in text.chars() {
            let gid = self.glyph_id(c).unwrap_or(0);
            result.push_str(&format!("{gid:04X}"));
        }
        format!("<{result}>")
    }

    /// Generate the PDF objects needed to reference and embed this font
    pub(crate) fn to_pdf_objects(
        &self,
        encoding: TextEncoding,
        embedding: FontEmbedding,
    ) -> Result<FontObjects> {
        let font_file = self.font_program(embedding).map(|program| {
            Stream::new(
                Dictionary::from_iter(vec![("Length1", (program.len() as i32).into())]),
                program.to_vec(),
            )
        });

        let descriptor = self.font_descriptor();

        match encoding {
            TextEncoding::Wide => {
                let to_unicode_content = self.generate_tounicode_cmap();
                let to_unicode = Stream::new(
                    Dictionary::from_iter(vec![("Type", Object::from("CMap"))]),
                    to_unicode_content.into_bytes(),
                );

                let cid_system_info = Dictionary::from_iter(vec![
                    ("Registry", Object::string_literal("Adobe")),
                    ("Ordering", Object::string_literal("Identity")),
                    ("Supplement", 0.into()),
                ]);

                let cid = Dictionary::from_iter(vec![
                    ("Type", "Font".into()),
                    ("Subtype", "CIDFontType2".into()),
                    ("BaseFont", Object::Name(self.name.clone().into())),
                    ("CIDSystemInfo", cid_system_info.into()),
                    ("W", self.generate_cid_widths().into()),
                    ("DW", 1000.into()),
                ]);

                let type0 = Dictionary::from_iter(vec![
                    ("Type", "Font".into()),
                    ("Subtype", "Type0".into()),
                    ("BaseFont", Object::Name(self.name.clone().into())),
                    ("Encoding", "Identity-H".into()),
                ]);

                Ok(FontObjects::Composite {
                    type0,
                    cid,
                    descriptor,
                    font_file,
                    to_unicode,
                })
            }
            TextEncoding::SingleByte => {
                let font = Dictionary::from_iter(vec![
                    ("Type", "Font".into()),
                    ("Subtype", "TrueType".into()),
                    ("BaseFont", Object::Name(self.name.clone().into())),
                    ("Encoding", "WinAnsiEncoding".into()),
                    ("FirstChar", 32.into()),
                    ("LastChar", 255.into()),
                    ("Widths", self.generate_winansi_widths().into()),
                ]);

                Ok(FontObjects::Simple {
                    font,
                    descriptor,
                    font_file,
                })
            }
        }
    }

    fn font_descriptor(&self) -> Dictionary {
        let units_per_em = self.units_per_em() as i32;
        let ascender = self.ascender();
        let descender = self.descender();

        // Bounding box approximated from the vertical metrics
        let font_bbox = vec![
            0.into(),
            descender.into(),
            units_per_em.into(),
            ascender.into(),
        ];

        Dictionary::from_iter(vec![
            ("Type", Object::from("FontDescriptor")),
            ("FontName", Object::Name(self.name.clone().into())),
            ("Flags", 4.into()), // symbolic
            ("FontBBox", font_bbox.into()),
            ("ItalicAngle", 0.into()),
            ("Ascent", ascender.into()),
            ("Descent", descender.into()),
            ("CapHeight", ascender.into()),
            ("StemV", 80.into()),
        ])
    }

    /// Scale a font-unit advance to thousandths of an em (PDF width units)
    fn advance_to_pdf_units(&self, advance: u16) -> i64 {
        (advance as f64 * 1000.0 / self.units_per_em() as f64).round() as i64
    }

    /// /W array for the CIDFont: individual `gid [width]` entries
    fn generate_cid_widths(&self) -> Vec<Object> {
        let mut widths = Vec::new();
        let face = match &self.face {
            Some(f) => f,
            None => return widths,
        };

        let mut gids: Vec<u16> = self
            .used_chars
            .iter()
            .filter_map(|&c| self.glyph_id(c))
            .collect();
        gids.sort_unstable();
        gids.dedup();

        for gid in gids {
            let advance = face
                .glyph_hor_advance(ttf_parser::GlyphId(gid))
                .unwrap_or(1000);
            widths.push(gid.into());
            widths.push(vec![Object::Integer(self.advance_to_pdf_units(advance))].into());
        }

        widths
    }

    /// /Widths array for the simple font: one entry per WinAnsi code 32..=255
    fn generate_winansi_widths(&self) -> Vec<Object> {
        (32u8..=255)
            .map(|code| {
                let c = crate::text::winansi_to_char(code);
                let advance = self.glyph_advance(c).unwrap_or(0);
                Object::Integer(self.advance_to_pdf_units(advance))
            })
            .collect()
    }

    /// ToUnicode CMap stream content, mapping glyph ids to codepoints
    fn generate_tounicode_cmap(&self) -> String {
        let mut cmap = String::new();

        cmap.push_str("/CIDInit /ProcSet findresource begin\n");
        cmap.push_str("12 dict begin\n");
        cmap.push_str("begincmap\n");
        cmap.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
        cmap.push_str("/CMapName /Adobe-Identity-UCS def\n");
        cmap.push_str("/CMapType 2 def\n");
        cmap.push_str("1 begincodespacerange\n");
        cmap.push_str("<0000> <FFFF>\n");
        cmap.push_str("endcodespacerange\n");

        let mut char_list: Vec<char> = self.used_chars.iter().copied().collect();
        char_list.sort_by_key(|c| *c as u32);

        // The PDF spec caps bfchar sections at 100 entries
        for chunk in char_list.chunks(100) {
            cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
            for c in chunk {
                let gid = self.glyph_id(*c).unwrap_or(0);
                let unicode = *c as u32;
                cmap.push_str(&format!("<{gid:04X}> <{unicode:04X}>\n"));
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\n");
        cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
        cmap.push_str("end\n");
        cmap.push_str("end\n");

        cmap
    }
}

/// One of the fourteen standard PDF fonts
///
/// Standard fonts are never embedded: viewers resolve them by name. Widths
/// come from a compact regular-weight metric table; the bold and oblique
/// variants reuse it, which is close enough for line breaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
}

/// Helvetica regular advance widths for ASCII 0x20..=0x7E, em/1000
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, 556, 556, 556,
    556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, 1015, 667, 667, 722, 722,
    667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944,
    667, 667, 611, 278, 278, 278, 469, 556, 333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222,
    500, 222, 833, 556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334,
    584,
];

/// Times-Roman advance widths for ASCII 0x20..=0x7E, em/1000
const TIMES_WIDTHS: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278, 500, 500, 500,
    500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444, 921, 722, 667, 667, 722, 611,
    556, 722, 722, 333, 389, 722, 611, 889, 722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722,
    722, 611, 333, 278, 333, 469, 500, 333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500,
    278, 778, 500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

impl StandardFont {
    /// Resolve a family name plus weight/style to a standard font
    ///
    /// Matching is case-insensitive and accepts the common aliases used by
    /// document authors ("arial" for Helvetica, "times new roman" for Times).
    pub fn resolve(family: &str, weight: FontWeight, style: FontStyle) -> Option<Self> {
        let bold = weight == FontWeight::Bold;
        let italic = style == FontStyle::Italic;
        match family.to_ascii_lowercase().as_str() {
            "helvetica" | "arial" | "sans-serif" => Some(match (bold, italic) {
                (false, false) => Self::Helvetica,
                (true, false) => Self::HelveticaBold,
                (false, true) => Self::HelveticaOblique,
                (true, true) => Self::HelveticaBoldOblique,
            }),
            "times" | "times new roman" | "serif" => Some(match (bold, italic) {
                (false, false) => Self::TimesRoman,
                (true, false) => Self::TimesBold,
                (false, true) => Self::TimesItalic,
                (true, true) => Self::TimesBoldItalic,
            }),
            "courier" | "monospace" => Some(match (bold, italic) {
                (false, false) => Self::Courier,
                (true, false) => Self::CourierBold,
                (false, true) => Self::CourierOblique,
                (true, true) => Self::CourierBoldOblique,
            }),
            _ => None,
        }
    }

    /// The PostScript BaseFont name
    pub fn base_font(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::HelveticaBoldOblique => "Helvetica-BoldOblique",
            Self::TimesRoman => "Times-Roman",
            Self::TimesBold => "Times-Bold",
            Self::TimesItalic => "Times-Italic",
            Self::TimesBoldItalic => "Times-BoldItalic",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
            Self::CourierOblique => "Courier-Oblique",
            Self::CourierBoldOblique => "Courier-BoldOblique",
        }
    }

    /// Advance width of a character, em/1000
    pub fn char_width(&self, c: char) -> u16 {
        match self {
            Self::Courier | Self::CourierBold | Self::CourierOblique | Self::CourierBoldOblique => {
                600
            }
            Self::Helvetica
            | Self::HelveticaBold
            | Self::HelveticaOblique
            | Self::HelveticaBoldOblique => ascii_width(&HELVETICA_WIDTHS, c, 556),
            Self::TimesRoman | Self::TimesBold | Self::TimesItalic | Self::TimesBoldItalic => {
                ascii_width(&TIMES_WIDTHS, c, 500)
            }
        }
    }

    /// Text width in points for a given font size
    pub fn text_width_points(&self, text: &str, font_size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| self.char_width(c) as u32).sum();
        units as f32 / 1000.0 * font_size
    }

    /// The font dictionary referencing this standard font
    pub(crate) fn to_font_dictionary(&self) -> Dictionary {
        Dictionary::from_iter(vec![
            ("Type", Object::from("Font")),
            ("Subtype", "Type1".into()),
            ("BaseFont", self.base_font().into()),
            ("Encoding", "WinAnsiEncoding".into()),
        ])
    }
}

fn ascii_width(table: &[u16; 95], c: char, fallback: u16) -> u16 {
    let code = c as u32;
    if (0x20..=0x7E).contains(&code) {
        table[(code - 0x20) as usize]
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_font() -> FontData {
        FontData {
            name: "test".to_string(),
            ttf_data: vec![0u8; 100],
            used_chars: HashSet::new(),
            subset_data: None,
            face: None,
        }
    }

    #[test]
    fn test_add_chars() {
        let mut font = bare_font();
        font.add_chars("Hello");
        assert_eq!(font.used_chars.len(), 4); // H, e, l, o
        assert!(font.used_chars.contains(&'H'));
        assert!(font.used_chars.contains(&'l'));
    }

    #[test]
    fn test_metric_defaults_without_face() {
        let font = bare_font();
        assert_eq!(font.units_per_em(), 1000);
        assert_eq!(font.ascender(), 800);
        assert_eq!(font.descender(), -200);
        assert_eq!(font.text_width("Hello"), 0);
        assert_eq!(font.text_width_points("Hello", 12.0), 0.0);
        assert!(!font.has_glyph('A'));
    }

    #[test]
    fn test_encode_text_hex_without_face() {
        let font = bare_font();
        assert_eq!(font.encode_text_hex(""), "<>");
        // Every character maps to gid 0 when there is no face
        assert_eq!(font.encode_text_hex("A"), "<0000>");
        assert_eq!(font.encode_text_hex("AB"), "<00000000>");
    }

    #[test]
    fn test_create_subset_no_chars_is_noop() {
        let mut font = bare_font();
        font.create_subset().unwrap();
        assert!(font.subset_data.is_none());
    }

    #[test]
    fn test_font_program_policy() {
        let font = bare_font();
        assert!(font.font_program(FontEmbedding::None).is_none());
        assert_eq!(
            font.font_program(FontEmbedding::Full).map(|p| p.len()),
            Some(100)
        );
        // No subset built yet, so Subset falls back to the full program
        assert_eq!(
            font.font_program(FontEmbedding::Subset).map(|p| p.len()),
            Some(100)
        );
    }

    #[test]
    fn test_tounicode_cmap() {
        let mut font = bare_font();
        font.add_chars("AB");
        let cmap = font.generate_tounicode_cmap();
        assert!(cmap.contains("/CIDInit"));
        assert!(cmap.contains("begincmap"));
        assert!(cmap.contains("endcmap"));
        assert!(cmap.contains("<0000> <0041>"));
        assert!(cmap.contains("<0000> <0042>"));
    }

    #[test]
    fn test_to_pdf_objects_shapes() {
        let mut font = bare_font();
        font.add_chars("Hi");

        match font
            .to_pdf_objects(TextEncoding::Wide, FontEmbedding::Full)
            .unwrap()
        {
            FontObjects::Composite {
                type0,
                cid,
                font_file,
                ..
            } => {
                assert!(!type0.is_empty());
                assert!(!cid.is_empty());
                assert!(font_file.is_some());
            }
            _ => panic!("Expected a composite font for wide encoding"),
        }

        match font
            .to_pdf_objects(TextEncoding::SingleByte, FontEmbedding::None)
            .unwrap()
        {
            FontObjects::Simple {
                font, font_file, ..
            } => {
                assert!(!font.is_empty());
                assert!(font_file.is_none());
            }
            _ => panic!("Expected a simple font for single-byte encoding"),
        }
    }

    #[test]
    fn test_standard_font_resolve() {
        assert_eq!(
            StandardFont::resolve("Helvetica", FontWeight::Regular, FontStyle::Normal),
            Some(StandardFont::Helvetica)
        );
        assert_eq!(
            StandardFont::resolve("arial", FontWeight::Bold, FontStyle::Normal),
            Some(StandardFont::HelveticaBold)
        );
        assert_eq!(
            StandardFont::resolve("Times New Roman", FontWeight::Regular, FontStyle::Italic),
            Some(StandardFont::TimesItalic)
        );
        assert_eq!(
            StandardFont::resolve("courier", FontWeight::Bold, FontStyle::Italic),
            Some(StandardFont::CourierBoldOblique)
        );
        assert_eq!(
            StandardFont::resolve("Sarabun", FontWeight::Regular, FontStyle::Normal),
            None
        );
    }

    #[test]
    fn test_standard_font_metrics() {
        let helv = StandardFont::Helvetica;
        assert_eq!(helv.char_width(' '), 278);
        assert_eq!(helv.char_width('W'), 944);
        // Non-ASCII falls back to the average width
        assert_eq!(helv.char_width('é'), 556);

        let courier = StandardFont::Courier;
        assert_eq!(courier.char_width('i'), 600);
        assert_eq!(courier.char_width('W'), 600);

        // 5 chars at 600/1000 em, 10pt
        assert_eq!(courier.text_width_points("Hello", 10.0), 30.0);
        assert!(helv.text_width_points("Hello", 10.0) > 0.0);
    }

    #[test]
    fn test_standard_font_dictionary() {
        let dict = StandardFont::TimesBold.to_font_dictionary();
        assert_eq!(dict.get(b"BaseFont").unwrap().as_name().unwrap(), b"Times-Bold");
        assert_eq!(
            dict.get(b"Encoding").unwrap().as_name().unwrap(),
            b"WinAnsiEncoding"
        );
    }
}
