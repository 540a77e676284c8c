//! Raster attribute extraction (digital boards).

use image::{ColorType, DynamicImage, ImageFormat, ImageReader};
use serde::Serialize;
use std::io::Cursor;
use tracing::debug;

use super::jpeg;
use super::ExtractError;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RasterAttributes {
    /// Container format sniffed from the content, e.g. `"JPEG"`.
    pub format: String,
    pub width: u32,
    pub height: u32,
    /// Stored resolution (horizontal, vertical) in dots per inch.
    pub dpi: Option<(f64, f64)>,
    /// Colour mode as stored in the file: `"RGB"`, `"CMYK"`, `"L"`, ...
    pub colour_mode: String,
}

/// Decode `bytes` and read the attributes a digital board cares about.
pub fn extract_raster(bytes: &[u8]) -> Result<RasterAttributes, ExtractError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ExtractError::Decode(e.to_string()))?;
    let format = reader
        .format()
        .ok_or_else(|| ExtractError::Decode("unrecognised image format".into()))?;
    let image = reader.decode()?;

    let header = if format == ImageFormat::Jpeg {
        jpeg::scan_header(bytes)
    } else {
        None
    };

    let dpi = header
        .as_ref()
        .and_then(|h| h.density)
        .and_then(|d| d.dpi())
        .or_else(|| exif_dpi(bytes));

    let colour_mode = header
        .as_ref()
        .and_then(|h| h.colour_mode())
        .map(str::to_string)
        .unwrap_or_else(|| pixel_mode(&image));

    let attributes = RasterAttributes {
        format: format_tag(format),
        width: image.width(),
        height: image.height(),
        dpi,
        colour_mode,
    };
    debug!(?attributes, "raster attributes extracted");
    Ok(attributes)
}

fn format_tag(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "JPEG".to_string(),
        other => format!("{:?}", other).to_uppercase(),
    }
}

fn pixel_mode(image: &DynamicImage) -> String {
    match image.color() {
        ColorType::L8 | ColorType::L16 => "L".to_string(),
        ColorType::La8 | ColorType::La16 => "LA".to_string(),
        ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => "RGB".to_string(),
        ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => "RGBA".to_string(),
        other => format!("{:?}", other),
    }
}

/// Resolution from EXIF `XResolution`/`YResolution`, converted to inches.
fn exif_dpi(bytes: &[u8]) -> Option<(f64, f64)> {
    let exif = exif::Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok()?;

    let x = exif_rational(&exif, exif::Tag::XResolution)?;
    let y = exif_rational(&exif, exif::Tag::YResolution).unwrap_or(x);
    let unit = exif
        .get_field(exif::Tag::ResolutionUnit, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .unwrap_or(2);

    match unit {
        2 => Some((x, y)),
        3 => Some((x * 2.54, y * 2.54)),
        _ => None,
    }
}

fn exif_rational(exif: &exif::Exif, tag: exif::Tag) -> Option<f64> {
    match &exif.get_field(tag, exif::In::PRIMARY)?.value {
        exif::Value::Rational(values) => values.first().map(|r| r.to_f64()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::jpeg::{JpegEncoder, PixelDensity};
    use image::{GrayImage, RgbImage};

    fn jpeg(width: u32, height: u32, density: Option<u16>) -> Vec<u8> {
        let img = RgbImage::new(width, height);
        let mut buf = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, 90);
        if let Some(dpi) = density {
            encoder.set_pixel_density(PixelDensity::dpi(dpi));
        }
        encoder.encode_image(&img).unwrap();
        buf
    }

    #[test]
    fn test_jpeg_attributes() {
        let attrs = extract_raster(&jpeg(64, 32, Some(72))).unwrap();
        assert_eq!(attrs.format, "JPEG");
        assert_eq!((attrs.width, attrs.height), (64, 32));
        assert_eq!(attrs.dpi, Some((72.0, 72.0)));
        assert_eq!(attrs.colour_mode, "RGB");
    }

    /// Density-less JPEG carrying an EXIF resolution instead.
    fn exif_jpeg(resolution: u32, unit: u16) -> Vec<u8> {
        let mut tiff: Vec<u8> = b"II\x2a\x00\x08\x00\x00\x00".to_vec();
        tiff.extend(3u16.to_le_bytes());
        for (tag, kind, value) in [(0x011Au16, 5u16, 50u32), (0x011B, 5, 58), (0x0128, 3, unit as u32)] {
            tiff.extend(tag.to_le_bytes());
            tiff.extend(kind.to_le_bytes());
            tiff.extend(1u32.to_le_bytes());
            tiff.extend(value.to_le_bytes());
        }
        tiff.extend(0u32.to_le_bytes());
        for _ in 0..2 {
            tiff.extend(resolution.to_le_bytes());
            tiff.extend(1u32.to_le_bytes());
        }

        let mut app1 = vec![0xFF, 0xE1];
        app1.extend(((2 + 6 + tiff.len()) as u16).to_be_bytes());
        app1.extend(b"Exif\0\0");
        app1.extend(tiff);

        let plain = jpeg(16, 16, None);
        let mut out = plain[..2].to_vec();
        out.extend(app1);
        out.extend(&plain[2..]);
        out
    }

    #[test]
    fn test_exif_resolution_used_without_jfif_density() {
        let attrs = extract_raster(&exif_jpeg(300, 2)).unwrap();
        assert_eq!(attrs.dpi, Some((300.0, 300.0)));
        assert_eq!((attrs.width, attrs.height), (16, 16));
    }

    #[test]
    fn test_exif_centimetre_unit_converted() {
        let (x, y) = extract_raster(&exif_jpeg(100, 3)).unwrap().dpi.unwrap();
        assert!((x - 254.0).abs() < 1e-6);
        assert!((y - 254.0).abs() < 1e-6);
    }

    #[test]
    fn test_default_density_is_not_a_resolution() {
        let attrs = extract_raster(&jpeg(8, 8, None)).unwrap();
        assert_eq!(attrs.dpi, None);
    }

    #[test]
    fn test_greyscale_jpeg_reports_l() {
        let img = GrayImage::new(8, 8);
        let mut buf = Vec::new();
        JpegEncoder::new(&mut buf).encode_image(&img).unwrap();
        assert_eq!(extract_raster(&buf).unwrap().colour_mode, "L");
    }

    #[test]
    fn test_png_content_reports_png() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        let attrs = extract_raster(buf.get_ref()).unwrap();
        assert_eq!(attrs.format, "PNG");
        assert_eq!(attrs.colour_mode, "RGB");
    }

    #[test]
    fn test_garbage_fails_to_decode() {
        let err = extract_raster(b"definitely not an image").unwrap_err();
        assert!(matches!(err, ExtractError::Decode(_)));
    }
}
