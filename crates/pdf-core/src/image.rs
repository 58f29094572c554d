//! Image XObjects
//!
//! JPEG data passes through untouched behind a DCTDecode filter; PNG data is
//! decoded to raw samples and recompressed with FlateDecode.

use crate::{PdfError, Result};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::GenericImageView;
use lopdf::{Dictionary, Object, Stream};
use std::io::Write;

/// An image prepared for embedding as a PDF XObject
pub struct ImageXObject {
    pub width: u32,
    pub height: u32,
    color_space: &'static str,
    filter: &'static str,
    data: Vec<u8>,
}

impl ImageXObject {
    /// Build from encoded image bytes, sniffing the container format
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        match image::guess_format(data) {
            Ok(image::ImageFormat::Jpeg) => Self::from_jpeg(data),
            Ok(image::ImageFormat::Png) => Self::from_png(data),
            Ok(other) => Err(PdfError::ImageError(format!(
                "Unsupported image format: {other:?}"
            ))),
            Err(e) => Err(PdfError::ImageError(e.to_string())),
        }
    }

    /// Build from JPEG bytes; the compressed data is embedded as-is
    pub fn from_jpeg(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
            .map_err(|e| PdfError::ImageError(e.to_string()))?;
        let (width, height) = img.dimensions();

        let color_space = match img.color() {
            image::ColorType::L8 | image::ColorType::L16 => "DeviceGray",
            _ => "DeviceRGB",
        };

        Ok(Self {
            width,
            height,
            color_space,
            filter: "DCTDecode",
            data: data.to_vec(),
        })
    }

    /// Build from PNG bytes; samples are re-encoded with FlateDecode
    pub fn from_png(data: &[u8]) -> Result<Self> {
        let img = image::load_from_memory_with_format(data, image::ImageFormat::Png)
            .map_err(|e| PdfError::ImageError(e.to_string()))?;
        let (width, height) = img.dimensions();

        // Alpha is not carried over; PDF image XObjects need a separate
        // SMask for it, which this container does not model.
        let (color_space, raw) = match img.color() {
            image::ColorType::L8 | image::ColorType::L16 | image::ColorType::La8
            | image::ColorType::La16 => ("DeviceGray", img.to_luma8().into_raw()),
            _ => ("DeviceRGB", img.to_rgb8().into_raw()),
        };

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&raw)
            .and_then(|_| encoder.finish())
            .map(|compressed| Self {
                width,
                height,
                color_space,
                filter: "FlateDecode",
                data: compressed,
            })
            .map_err(|e| PdfError::ImageError(e.to_string()))
    }

    /// Convert to a PDF stream object
    pub fn to_pdf_stream(&self) -> Stream {
        let dict = Dictionary::from_iter(vec![
            ("Type", Object::from("XObject")),
            ("Subtype", "Image".into()),
            ("Width", (self.width as i64).into()),
            ("Height", (self.height as i64).into()),
            ("ColorSpace", self.color_space.into()),
            ("BitsPerComponent", 8.into()),
            ("Filter", self.filter.into()),
        ]);

        let mut stream = Stream::new(dict, self.data.clone());
        // The data is already compressed; lopdf must not recompress it
        stream.allows_compression = false;
        stream
    }
}

/// Generate operators that place an image XObject
///
/// `x`/`y` address the lower-left corner in PDF coordinates.
pub fn generate_image_operators(
    resource_name: &str,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
) -> Vec<u8> {
    format!("q\n{width} 0 0 {height} {x} {y} cm\n/{resource_name} Do\nQ\n").into_bytes()
}
