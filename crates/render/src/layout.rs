//! Line breaking
//!
//! Paragraph runs are broken greedily on whitespace, measured in points
//! against the font catalog. Consecutive words sharing a style are merged
//! back into a single line item so one item maps to one draw call.

use crate::fonts::{FontCatalog, ResolvedFont};
use doc_model::ParagraphBlock;

/// Default style for runs that carry no font
pub(crate) const DEFAULT_FONT_SIZE: f64 = 12.0;

/// One positioned piece of a line, relative to the line's left edge
#[derive(Debug, Clone)]
pub(crate) struct LineItem {
    pub text: String,
    pub font: ResolvedFont,
    pub x: f64,
}

/// A broken line with its total advance width and height
#[derive(Debug, Clone)]
pub(crate) struct Line {
    pub items: Vec<LineItem>,
    pub width: f64,
    pub height: f64,
}

struct StyledWord {
    text: String,
    font: ResolvedFont,
    width: f64,
    space_width: f64,
}

fn default_font() -> ResolvedFont {
    ResolvedFont {
        family: crate::fonts::FALLBACK_FAMILY.to_string(),
        size: DEFAULT_FONT_SIZE,
        style: doc_model::FontStyle::Regular,
        color: None,
    }
}

/// Break a paragraph into lines no wider than `max_width`
///
/// A word wider than `max_width` is placed on a line of its own and
/// overflows; an empty paragraph still yields one empty line so the
/// vertical cursor advances.
pub(crate) fn break_paragraph(
    paragraph: &ParagraphBlock,
    catalog: &FontCatalog,
    max_width: f64,
) -> Vec<Line> {
    let words = collect_words(paragraph, catalog);

    if words.is_empty() {
        return vec![Line {
            items: Vec::new(),
            width: 0.0,
            height: DEFAULT_FONT_SIZE * paragraph.line_height,
        }];
    }

    let mut lines = Vec::new();
    let mut builder = LineBuilder::new(paragraph.line_height);

    for word in words {
        let joined = builder.width_with(&word);
        if joined > max_width && !builder.is_empty() {
            lines.push(builder.finish());
            builder = LineBuilder::new(paragraph.line_height);
        }
        builder.push(word);
    }

    if !builder.is_empty() {
        lines.push(builder.finish());
    }

    lines
}

/// Flatten the paragraph's runs into measured words
fn collect_words(paragraph: &ParagraphBlock, catalog: &FontCatalog) -> Vec<StyledWord> {
    let mut words = Vec::new();

    for run in &paragraph.runs {
        let font = run
            .font
            .as_ref()
            .map(ResolvedFont::from_model)
            .unwrap_or_else(default_font);
        let space_width = catalog.measure(" ", &font);

        for word in run.text.split_whitespace() {
            words.push(StyledWord {
                text: word.to_string(),
                font: font.clone(),
                width: catalog.measure(word, &font),
                space_width,
            });
        }
    }

    words
}

struct LineBuilder {
    items: Vec<LineItem>,
    width: f64,
    line_height: f64,
    max_size: f64,
}

impl LineBuilder {
    fn new(line_height: f64) -> Self {
        Self {
            items: Vec::new(),
            width: 0.0,
            line_height,
            max_size: 0.0,
        }
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The line width if `word` were appended
    fn width_with(&self, word: &StyledWord) -> f64 {
        if self.is_empty() {
            word.width
        } else {
            self.width + word.space_width + word.width
        }
    }

    fn push(&mut self, word: StyledWord) {
        self.max_size = self.max_size.max(word.font.size);

        if let Some(last) = self.items.last_mut() {
            if last.font == word.font {
                // Same style: merge into the previous item
                last.text.push(' ');
                last.text.push_str(&word.text);
                self.width += word.space_width + word.width;
                return;
            }
        }

        let x = if self.is_empty() {
            0.0
        } else {
            self.width + word.space_width
        };
        if !self.is_empty() {
            self.width += word.space_width;
        }
        self.items.push(LineItem {
            text: word.text,
            font: word.font,
            x,
        });
        self.width += word.width;
    }

    fn finish(self) -> Line {
        let size = if self.max_size > 0.0 {
            self.max_size
        } else {
            DEFAULT_FONT_SIZE
        };
        Line {
            items: self.items,
            width: self.width,
            height: size * self.line_height,
        }
    }
}
