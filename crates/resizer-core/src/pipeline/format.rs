//! Supported container formats and their decode/encode pair.
//!
//! Dispatch is by file extension and case-sensitive: `jpg`, `jpeg` and `png`.
//! Output format always mirrors the input format.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageReader, ImageResult, Limits};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Seek, Write};
use std::path::Path;

/// Default JPEG quality.
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// A supported image container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
}

/// Encoder settings shared by every save.
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    pub jpeg_quality: u8,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl ImageFormat {
    /// Map an extension (without the dot) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            _ => None,
        }
    }

    /// Map a path to a format by the suffix after the last dot of its file
    /// name. A bare `.png` counts as a PNG.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let (_, ext) = name.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
        }
    }

    /// Decode with this format's decoder, bypassing content sniffing.
    pub fn decode<R: BufRead + Seek>(self, reader: R, limits: Limits) -> ImageResult<DynamicImage> {
        let mut reader = ImageReader::with_format(reader, self.into());
        reader.limits(limits);
        reader.decode()
    }

    /// Encode `image` into `writer` with this format's encoder.
    ///
    /// JPEG cannot carry alpha, so images with an alpha channel are flattened
    /// to RGB first.
    pub fn encode<W: Write>(
        self,
        image: &DynamicImage,
        writer: W,
        options: &EncodeOptions,
    ) -> ImageResult<()> {
        match self {
            ImageFormat::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(writer, options.jpeg_quality);
                if image.color().has_alpha() {
                    DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)
                } else {
                    image.write_with_encoder(encoder)
                }
            }
            ImageFormat::Png => image.write_with_encoder(PngEncoder::new(writer)),
        }
    }
}

impl From<ImageFormat> for image::ImageFormat {
    fn from(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Png => image::ImageFormat::Png,
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
