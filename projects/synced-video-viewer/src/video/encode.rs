use image::codecs::jpeg::JpegEncoder;
use image::{ImageError, RgbImage};

pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Encode a decoded frame as a JPEG still.
pub fn encode_jpeg(frame: &RgbImage, quality: u8) -> Result<Vec<u8>, ImageError> {
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    encoder.encode_image(frame)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_encode_produces_jpeg() {
        let frame = RgbImage::from_pixel(32, 16, Rgb([10, 200, 30]));
        let bytes = encode_jpeg(&frame, DEFAULT_JPEG_QUALITY).unwrap();
        assert!(!bytes.is_empty());
        // SOI marker
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_lower_quality_is_not_larger() {
        let frame = RgbImage::from_fn(64, 64, |x, y| Rgb([(x * 4) as u8, (y * 4) as u8, 0]));
        let high = encode_jpeg(&frame, 95).unwrap();
        let low = encode_jpeg(&frame, 10).unwrap();
        assert!(low.len() <= high.len());
    }
}
