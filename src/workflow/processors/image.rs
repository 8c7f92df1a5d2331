//! Image processing module - handles color-space inspection and conversion
//!
//! Includes:
//! - Format sniffing and decoding
//! - CMYK detection (JPEG frame header, original color type elsewhere)
//! - CMYK to RGB pixel conversion
//! - Re-encoding in the source format

use crate::common::{JPEG_QUALITY, errors::DecodeError};
use image::{
    DynamicImage, ExtendedColorType, ImageDecoder, ImageFormat, ImageReader, RgbImage,
    codecs::jpeg::JpegEncoder,
};
use std::io::Cursor;
use zune_jpeg::JpegDecoder;
use zune_jpeg::zune_core::{colorspace::ColorSpace, options::DecoderOptions};

// ────────────────────────────────────────────────────────────────
// Types
// ────────────────────────────────────────────────────────────────

/// Color model the image was stored in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Rgb,
    Cmyk,
    Other,
}

/// Channel layout of `DecodedImage::pixels`
///
/// `Cmyk` holds plain ink values (0 = no ink), not the inverted Adobe form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    Cmyk,
    Rgb,
}

impl PixelLayout {
    pub fn channels(&self) -> usize {
        match self {
            PixelLayout::Cmyk => 4,
            PixelLayout::Rgb => 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub mode: ColorMode,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    pub pixels: Vec<u8>,
}

/// Capability the pipeline needs from an image library.
pub trait ImageCodec: Send + Sync {
    /// Decode `bytes`, reporting the stored color model.
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, DecodeError>;

    /// Encode the image as RGB in its source format.
    fn to_rgb(&self, image: DecodedImage) -> Result<Vec<u8>, DecodeError>;
}

// ────────────────────────────────────────────────────────────────
// Default codec (zune-jpeg for CMYK JPEGs, image crate for the rest)
// ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCodec;

impl ImageCodec for DefaultCodec {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
        let format = image::guess_format(bytes).map_err(|_| DecodeError::UnknownFormat)?;

        if format == ImageFormat::Jpeg {
            if let Some(decoded) = decode_cmyk_jpeg(bytes)? {
                return Ok(decoded);
            }
        }

        // The decoder converts CMYK TIFFs to RGB on read; only the original
        // color type still says CMYK.
        let decoder = ImageReader::with_format(Cursor::new(bytes), format)
            .into_decoder()
            .map_err(|err| DecodeError::Corrupt(err.to_string()))?;
        let mode = color_mode_of(decoder.original_color_type());
        let rgb_image = DynamicImage::from_decoder(decoder)
            .map_err(|err| DecodeError::Corrupt(err.to_string()))?
            .to_rgb8();

        Ok(DecodedImage {
            mode,
            format,
            width: rgb_image.width(),
            height: rgb_image.height(),
            layout: PixelLayout::Rgb,
            pixels: rgb_image.into_raw(),
        })
    }

    fn to_rgb(&self, image: DecodedImage) -> Result<Vec<u8>, DecodeError> {
        let expected = image.width as usize * image.height as usize * image.layout.channels();
        if image.pixels.len() != expected {
            return Err(DecodeError::MalformedPixels {
                expected,
                actual: image.pixels.len(),
            });
        }

        let rgb_pixels = match image.layout {
            PixelLayout::Cmyk => cmyk_to_rgb(&image.pixels),
            PixelLayout::Rgb => image.pixels,
        };
        let rgb_len = rgb_pixels.len();
        let rgb_image = RgbImage::from_raw(image.width, image.height, rgb_pixels).ok_or(
            DecodeError::MalformedPixels {
                expected: image.width as usize * image.height as usize * 3,
                actual: rgb_len,
            },
        )?;

        encode_rgb(&rgb_image, image.format)
    }
}

/// Decode a JPEG whose frame header declares CMYK or YCCK straight to RGB.
///
/// Adobe CMYK JPEGs store inverted ink values and YCCK ones add a YCbCr
/// step; zune-jpeg's own RGB conversion handles both. Returns `None` for any
/// other JPEG so the caller falls back to the image crate.
fn decode_cmyk_jpeg(bytes: &[u8]) -> Result<Option<DecodedImage>, DecodeError> {
    let options = DecoderOptions::default().jpeg_set_out_colorspace(ColorSpace::RGB);
    let mut decoder = JpegDecoder::new_with_options(bytes, options);
    decoder
        .decode_headers()
        .map_err(|err| DecodeError::Corrupt(format!("{err:?}")))?;

    match decoder.get_input_colorspace() {
        Some(ColorSpace::CMYK) | Some(ColorSpace::YCCK) => {}
        _ => return Ok(None),
    }

    let (width, height) = decoder
        .dimensions()
        .ok_or_else(|| DecodeError::Corrupt("JPEG header carries no dimensions".to_string()))?;
    let pixels = decoder
        .decode()
        .map_err(|err| DecodeError::Corrupt(format!("{err:?}")))?;

    let expected = width * height * PixelLayout::Rgb.channels();
    if expected == 0 || pixels.len() != expected {
        return Err(DecodeError::MalformedPixels {
            expected,
            actual: pixels.len(),
        });
    }

    let to_u32 = |v: usize| {
        u32::try_from(v).map_err(|_| DecodeError::Corrupt(format!("dimension {v} out of range")))
    };

    Ok(Some(DecodedImage {
        mode: ColorMode::Cmyk,
        format: ImageFormat::Jpeg,
        width: to_u32(width)?,
        height: to_u32(height)?,
        layout: PixelLayout::Rgb,
        pixels,
    }))
}

fn color_mode_of(color_type: ExtendedColorType) -> ColorMode {
    match color_type {
        ExtendedColorType::Cmyk8 | ExtendedColorType::Cmyk16 => ColorMode::Cmyk,
        ExtendedColorType::Rgb1
        | ExtendedColorType::Rgb2
        | ExtendedColorType::Rgb4
        | ExtendedColorType::Rgb8
        | ExtendedColorType::Rgb16
        | ExtendedColorType::Rgb32F
        | ExtendedColorType::Rgba1
        | ExtendedColorType::Rgba2
        | ExtendedColorType::Rgba4
        | ExtendedColorType::Rgba8
        | ExtendedColorType::Rgba16
        | ExtendedColorType::Rgba32F
        | ExtendedColorType::Bgr8
        | ExtendedColorType::Bgra8 => ColorMode::Rgb,
        _ => ColorMode::Other,
    }
}

// ────────────────────────────────────────────────────────────────
// Pixel conversion
// ────────────────────────────────────────────────────────────────

/// Convert packed CMYK bytes to packed RGB bytes.
///
/// Each channel is `round((255 - c) * (255 - k) / 255)`, so equal input
/// always gives equal output.
pub fn cmyk_to_rgb(cmyk: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(cmyk.len() / 4 * 3);
    for px in cmyk.chunks_exact(4) {
        let k = 255 - px[3] as u16;
        for &ink in &px[..3] {
            let value = ((255 - ink as u16) * k + 127) / 255;
            rgb.push(value as u8);
        }
    }
    rgb
}

fn encode_rgb(rgb_image: &RgbImage, format: ImageFormat) -> Result<Vec<u8>, DecodeError> {
    let mut buffer = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY)
                .encode_image(rgb_image)
                .map_err(|err| DecodeError::Encode(err.to_string()))?;
        }
        other => {
            rgb_image
                .write_to(&mut Cursor::new(&mut buffer), other)
                .map_err(|err| DecodeError::Encode(err.to_string()))?;
        }
    }
    Ok(buffer)
}
