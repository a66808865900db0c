// Generated video used when no file is given: every frame is deterministic
// noise seeded by its index, with a bright bar that sweeps across the image.

use super::error::SourceError;
use super::FrameSource;
use image::{Rgb, RgbImage};

pub struct SyntheticSource {
    width: u32,
    height: u32,
    frame_count: Option<usize>,
    cursor: usize,
}

impl SyntheticSource {
    pub fn new(width: u32, height: u32, frame_count: Option<usize>) -> Self {
        Self {
            width,
            height,
            frame_count,
            cursor: 0,
        }
    }

    /// Render frame `index` without touching the read cursor.
    pub fn render(&self, index: usize) -> RgbImage {
        let seed = mix64(index as u64 ^ 0x9E37_79B9_7F4A_7C15);
        let bar = (index as u32).wrapping_mul(4) % self.width.max(1);
        RgbImage::from_fn(self.width, self.height, |x, y| {
            if x.abs_diff(bar) < 2 {
                return Rgb([255, 255, 255]);
            }
            let h = mix64(seed ^ ((y as u64) << 32 | x as u64));
            Rgb([h as u8, (h >> 8) as u8, (h >> 16) as u8])
        })
    }

    fn in_range(&self, index: usize) -> bool {
        self.frame_count.map_or(true, |n| index < n)
    }
}

impl FrameSource for SyntheticSource {
    fn frame_count(&self) -> Option<usize> {
        self.frame_count
    }

    fn seek(&mut self, frame_index: usize) -> Result<(), SourceError> {
        if !self.in_range(frame_index) {
            return Err(SourceError::Seek {
                frame_index,
                reason: format!("beyond last frame ({:?} frames)", self.frame_count),
            });
        }
        self.cursor = frame_index;
        Ok(())
    }

    fn decode_next(&mut self) -> Result<RgbImage, SourceError> {
        if !self.in_range(self.cursor) {
            return Err(SourceError::EndOfStream);
        }
        let frame = self.render(self.cursor);
        self.cursor += 1;
        Ok(frame)
    }
}

fn mix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_are_deterministic_and_distinct() {
        let source = SyntheticSource::new(16, 8, None);
        assert_eq!(source.render(3), source.render(3));
        assert_ne!(source.render(3), source.render(4));
    }

    #[test]
    fn test_sequential_decode_and_seek() {
        let mut source = SyntheticSource::new(16, 8, Some(5));
        let first = source.decode_next().unwrap();
        assert_eq!(first, source.render(0));

        source.seek(4).unwrap();
        assert_eq!(source.decode_next().unwrap(), source.render(4));
        assert!(matches!(source.decode_next(), Err(SourceError::EndOfStream)));
    }

    #[test]
    fn test_seek_out_of_range() {
        let mut source = SyntheticSource::new(4, 4, Some(2));
        assert!(matches!(
            source.seek(2),
            Err(SourceError::Seek { frame_index: 2, .. })
        ));
    }

    #[test]
    fn test_unbounded_source_has_no_length() {
        let mut source = SyntheticSource::new(4, 4, None);
        assert_eq!(source.frame_count(), None);
        source.seek(1_000_000).unwrap();
        assert!(source.decode_next().is_ok());
    }
}
