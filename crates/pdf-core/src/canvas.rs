//! Scoped per-page drawing surface
//!
//! A `Canvas` borrows the document mutably and is bound to exactly one page.
//! Draw calls accumulate in the canvas; releasing the canvas (explicitly via
//! [`Canvas::finish`] or implicitly on drop) flushes everything buffered so
//! far to the page. Release happens on every exit path, so a failing draw
//! still leaves the page with the operators that preceded the failure.

use crate::document::BufferedTextOp;
use crate::{
    Align, Color, FontEmbedding, FontStyle, FontWeight, PdfDocument, PdfError, Result,
    TextEncoding,
};
use log::debug;

/// Drawing surface bound to one output page
pub struct Canvas<'a> {
    doc: &'a mut PdfDocument,
    page: usize,
    /// Raw operators buffered by this surface (images, graphics)
    ops: Vec<u8>,
    /// Text operations buffered by this surface, deferred until save
    text_ops: Vec<BufferedTextOp>,
    released: bool,
}

impl<'a> Canvas<'a> {
    /// Open a drawing surface for an existing page
    pub fn new(doc: &'a mut PdfDocument, page: usize) -> Result<Self> {
        let page_count = doc.page_count();
        if page == 0 || page > page_count {
            return Err(PdfError::InvalidPage(page, page_count));
        }
        Ok(Self {
            doc,
            page,
            ops: Vec::new(),
            text_ops: Vec::new(),
            released: false,
        })
    }

    /// The page this surface draws on (1-indexed)
    pub fn page(&self) -> usize {
        self.page
    }

    /// Select the text encoding mode before drawing
    pub fn set_text_encoding(&mut self, encoding: TextEncoding) {
        self.doc.set_text_encoding(encoding);
    }

    /// Select the font embedding policy before drawing
    pub fn set_font_embedding(&mut self, embedding: FontEmbedding) {
        self.doc.set_font_embedding(embedding);
    }

    /// Set the current font family and size
    pub fn set_font(&mut self, family: &str, size: f32) -> Result<()> {
        self.doc.set_font(family, size)
    }

    /// Set the font weight
    pub fn set_font_weight(&mut self, weight: FontWeight) -> Result<()> {
        self.doc.set_font_weight(weight)
    }

    /// Set the font style
    pub fn set_font_style(&mut self, style: FontStyle) -> Result<()> {
        self.doc.set_font_style(style)
    }

    /// Set the text color
    pub fn set_text_color(&mut self, color: Color) {
        self.doc.set_text_color(color);
    }

    /// Draw text at a position
    ///
    /// `y` is measured from the top of the page. Text is buffered and
    /// encoded when the document is saved, after font subsetting.
    pub fn draw_text(&mut self, text: &str, x: f64, y: f64, align: Align) -> Result<()> {
        let ops = self.doc.prepare_text_ops(text, self.page, x, y, align)?;
        self.text_ops.extend(ops);
        Ok(())
    }

    /// Draw an image (JPEG or PNG bytes) into the given box
    ///
    /// `y` is measured from the top of the page.
    pub fn draw_image(&mut self, data: &[u8], x: f64, y: f64, width: f64, height: f64) -> Result<()> {
        let operators = self
            .doc
            .image_operators(data, self.page, x, y, width, height)?;
        self.ops.extend_from_slice(&operators);
        Ok(())
    }

    /// Release the surface, flushing buffered state to the page
    pub fn finish(mut self) -> Result<()> {
        self.flush();
        Ok(())
    }

    fn flush(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        debug!(
            "releasing canvas for page {}: {} raw ops bytes, {} text ops",
            self.page,
            self.ops.len(),
            self.text_ops.len()
        );
        if !self.ops.is_empty() {
            let ops = std::mem::take(&mut self.ops);
            self.doc.buffer_content(self.page, &ops);
        }
        if !self.text_ops.is_empty() {
            let text_ops = std::mem::take(&mut self.text_ops);
            self.doc.queue_text_ops(text_ops);
        }
    }
}

impl Drop for Canvas<'_> {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ColorMode;

    #[test]
    fn test_canvas_requires_existing_page() {
        let mut doc = PdfDocument::new(ColorMode::Rgb);
        assert!(matches!(
            Canvas::new(&mut doc, 1),
            Err(PdfError::InvalidPage(1, 0))
        ));
    }

    #[test]
    fn test_canvas_draw_text_and_finish() {
        let mut doc = PdfDocument::new(ColorMode::Rgb);
        let page = doc.add_page();

        let mut canvas = Canvas::new(&mut doc, page).unwrap();
        canvas.set_font("helvetica", 12.0).unwrap();
        canvas
            .draw_text("Hello", 72.0, 72.0, Align::Left)
            .unwrap();
        canvas.finish().unwrap();

        let bytes = doc.to_bytes().unwrap();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn test_canvas_flushes_on_drop() {
        let mut doc = PdfDocument::new(ColorMode::Rgb);
        let page = doc.add_page();

        {
            let mut canvas = Canvas::new(&mut doc, page).unwrap();
            canvas.set_font("helvetica", 12.0).unwrap();
            canvas.draw_text("Kept", 72.0, 72.0, Align::Left).unwrap();
            // Dropped without finish(); buffered text must still reach the page
        }

        let bytes = doc.to_bytes().unwrap();
        let text = String::from_utf8_lossy(&bytes).to_string();
        // The literal shows up in the page content stream
        assert!(text.contains("(Kept)"));
    }

    #[test]
    fn test_canvas_partial_state_survives_draw_failure() {
        let mut doc = PdfDocument::new(ColorMode::Rgb);
        let page = doc.add_page();

        {
            let mut canvas = Canvas::new(&mut doc, page).unwrap();
            canvas.set_font("helvetica", 12.0).unwrap();
            canvas.draw_text("First", 72.0, 72.0, Align::Left).unwrap();
            // Garbage image data fails the draw; the canvas is dropped anyway
            assert!(canvas.draw_image(&[0u8; 8], 0.0, 0.0, 10.0, 10.0).is_err());
        }

        let bytes = doc.to_bytes().unwrap();
        let text = String::from_utf8_lossy(&bytes).to_string();
        assert!(text.contains("(First)"));
    }
}
