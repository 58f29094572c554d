//! Font catalog shared by measurement and drawing
//!
//! The formatter needs font metrics before any output document exists, so
//! fonts are loaded here once during preparation. At render time the same
//! families are installed into the output document, keeping the metrics
//! used for line breaking and the glyphs used for drawing in agreement.

use crate::{RenderError, Result};
use doc_model::Document;
use log::debug;
use pdf_core::{FontFamily, FontFamilyBuilder, PdfDocument, StandardFont};
use std::collections::HashMap;

/// Family every unresolvable font falls back to
pub(crate) const FALLBACK_FAMILY: &str = "helvetica";

/// Fully resolved style for one run of text
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResolvedFont {
    pub family: String,
    pub size: f64,
    pub style: doc_model::FontStyle,
    pub color: Option<doc_model::Color>,
}

impl ResolvedFont {
    pub fn from_model(font: &doc_model::Font) -> Self {
        Self {
            family: font.family.clone(),
            size: font.size,
            style: font.style,
            color: font.color,
        }
    }
}

/// Loaded font families plus their fallback chains
#[derive(Default)]
pub(crate) struct FontCatalog {
    families: HashMap<String, FontFamily>,
    fallbacks: Vec<(String, Vec<String>)>,
}

impl FontCatalog {
    /// Load every font definition of a document
    ///
    /// Definitions without sources are accepted when their id resolves to a
    /// standard font; anything else is an error.
    pub fn load(document: &Document) -> Result<Self> {
        let mut families = HashMap::new();

        for def in &document.fonts {
            let has_variants = def.regular.is_some()
                || def.bold.is_some()
                || def.italic.is_some()
                || def.bold_italic.is_some();

            let mut builder = FontFamilyBuilder::new();
            if has_variants {
                if let Some(path) = &def.regular {
                    builder = builder.regular(read_font(path)?);
                }
                if let Some(path) = &def.bold {
                    builder = builder.bold(read_font(path)?);
                }
                if let Some(path) = &def.italic {
                    builder = builder.italic(read_font(path)?);
                }
                if let Some(path) = &def.bold_italic {
                    builder = builder.bold_italic(read_font(path)?);
                }
            } else if let Some(path) = &def.source {
                builder = builder.regular(read_font(path)?);
            } else {
                if StandardFont::resolve(
                    &def.id,
                    pdf_core::FontWeight::Regular,
                    pdf_core::FontStyle::Normal,
                )
                .is_none()
                {
                    return Err(RenderError::FontError(format!(
                        "Font '{}' has no source defined",
                        def.id
                    )));
                }
                // Standard fonts need no loading
                continue;
            }

            let family = builder
                .build(&def.id)
                .map_err(|e| RenderError::FontError(e.to_string()))?;
            families.insert(def.id.clone(), family);
        }

        let fallbacks = document
            .fonts
            .iter()
            .filter(|def| !def.fallback.is_empty())
            .map(|def| (def.id.clone(), def.fallback.clone()))
            .collect();

        Ok(Self {
            families,
            fallbacks,
        })
    }

    /// Width of `text` in points under the given resolved style
    pub fn measure(&self, text: &str, font: &ResolvedFont) -> f64 {
        let (weight, style) = convert_style(font.style);

        if let Some(family) = self.families.get(&font.family) {
            if let Some(data) = family.get_variant(weight, style) {
                return data.text_width_points(text, font.size as f32) as f64;
            }
        }

        let standard = StandardFont::resolve(&font.family, weight, style).unwrap_or_else(|| {
            debug!(
                "family '{}' is not registered; measuring with {}",
                font.family, FALLBACK_FAMILY
            );
            StandardFont::Helvetica
        });
        standard.text_width_points(text, font.size as f32) as f64
    }

    /// The family name to select on a canvas for the given style
    ///
    /// Unknown families collapse to the fallback so drawing agrees with
    /// measurement.
    pub fn draw_family<'f>(&self, family: &'f str) -> &'f str {
        if self.families.contains_key(family)
            || StandardFont::resolve(
                family,
                pdf_core::FontWeight::Regular,
                pdf_core::FontStyle::Normal,
            )
            .is_some()
        {
            family
        } else {
            FALLBACK_FAMILY
        }
    }

    /// Install the catalog's families and fallback chains into an output
    /// document; families already present are left untouched
    pub fn install(&self, doc: &mut PdfDocument) -> Result<()> {
        for (name, family) in &self.families {
            if !doc.has_font_family(name) {
                doc.install_font_family(name, family.clone())?;
            }
        }

        for (family, chain) in &self.fallbacks {
            if !doc.has_font_family(family) {
                continue;
            }
            // Only registered families can participate in a fallback chain;
            // standard-font entries are dropped from it.
            let registered: Vec<String> = chain
                .iter()
                .filter(|name| doc.has_font_family(name))
                .cloned()
                .collect();
            if !registered.is_empty() {
                doc.set_font_fallback(family, &registered)?;
            }
        }

        Ok(())
    }
}

fn read_font(path: &str) -> Result<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| RenderError::FontError(format!("Failed to read font {path}: {e}")))
}

/// Convert a model font style to the pdf-core weight/style pair
pub(crate) fn convert_style(
    style: doc_model::FontStyle,
) -> (pdf_core::FontWeight, pdf_core::FontStyle) {
    match style {
        doc_model::FontStyle::Regular => (pdf_core::FontWeight::Regular, pdf_core::FontStyle::Normal),
        doc_model::FontStyle::Bold => (pdf_core::FontWeight::Bold, pdf_core::FontStyle::Normal),
        doc_model::FontStyle::Italic => (pdf_core::FontWeight::Regular, pdf_core::FontStyle::Italic),
        doc_model::FontStyle::BoldItalic => {
            (pdf_core::FontWeight::Bold, pdf_core::FontStyle::Italic)
        }
    }
}

/// Convert a model color to the pdf-core color
pub(crate) fn convert_color(color: doc_model::Color) -> pdf_core::Color {
    pdf_core::Color::rgb(color.r as f32, color.g as f32, color.b as f32)
}

/// Convert the model color mode to the pdf-core color mode
pub(crate) fn convert_color_mode(mode: doc_model::ColorMode) -> pdf_core::ColorMode {
    match mode {
        doc_model::ColorMode::Rgb => pdf_core::ColorMode::Rgb,
        doc_model::ColorMode::Cmyk => pdf_core::ColorMode::Cmyk,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(family: &str, size: f64) -> ResolvedFont {
        ResolvedFont {
            family: family.to_string(),
            size,
            style: doc_model::FontStyle::Regular,
            color: None,
        }
    }

    #[test]
    fn test_measure_standard_font() {
        let catalog = FontCatalog::default();
        let width = catalog.measure("Hello", &resolved("helvetica", 12.0));
        assert!(width > 0.0);

        // Courier is fixed-pitch: 5 chars * 0.6em * 10pt
        let width = catalog.measure("Hello", &resolved("courier", 10.0));
        assert_eq!(width, 30.0);
    }

    #[test]
    fn test_measure_unknown_family_falls_back() {
        let catalog = FontCatalog::default();
        let unknown = catalog.measure("Hello", &resolved("no-such-family", 12.0));
        let helvetica = catalog.measure("Hello", &resolved("helvetica", 12.0));
        assert_eq!(unknown, helvetica);
    }

    #[test]
    fn test_draw_family_collapses_unknown() {
        let catalog = FontCatalog::default();
        assert_eq!(catalog.draw_family("helvetica"), "helvetica");
        assert_eq!(catalog.draw_family("courier"), "courier");
        assert_eq!(catalog.draw_family("no-such-family"), FALLBACK_FAMILY);
    }

    #[test]
    fn test_load_rejects_sourceless_nonstandard_font() {
        let mut document = Document::new();
        document.fonts.push(doc_model::FontDef {
            id: "mystery".to_string(),
            ..Default::default()
        });
        assert!(matches!(
            FontCatalog::load(&document),
            Err(RenderError::FontError(_))
        ));
    }

    #[test]
    fn test_load_accepts_sourceless_standard_font() {
        let mut document = Document::new();
        document.fonts.push(doc_model::FontDef {
            id: "helvetica".to_string(),
            ..Default::default()
        });
        let catalog = FontCatalog::load(&document).unwrap();
        assert_eq!(catalog.draw_family("helvetica"), "helvetica");
    }

    #[test]
    fn test_convert_style() {
        let (weight, style) = convert_style(doc_model::FontStyle::BoldItalic);
        assert_eq!(weight, pdf_core::FontWeight::Bold);
        assert_eq!(style, pdf_core::FontStyle::Italic);
    }
}
