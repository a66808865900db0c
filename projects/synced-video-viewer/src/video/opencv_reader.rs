use super::error::SourceError;
use super::FrameSource;
use anyhow::{anyhow, Result};
use image::RgbImage;
use opencv::{
    core::Mat,
    imgproc,
    prelude::*,
    videoio::{
        VideoCapture, CAP_ANY, CAP_PROP_FPS, CAP_PROP_FRAME_COUNT, CAP_PROP_HW_ACCELERATION,
        CAP_PROP_POS_FRAMES, VIDEO_ACCELERATION_ANY,
    },
};
use std::path::Path;

pub struct OpencvReader {
    capture: VideoCapture,
    total_frames: Option<usize>,
}

impl OpencvReader {
    pub fn new(path: &Path) -> Result<Self> {
        let path_str = path
            .to_str()
            .ok_or_else(|| anyhow!("Non UTF-8 video path: {}", path.display()))?;
        let mut capture = VideoCapture::from_file(path_str, CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(anyhow!("Failed to open video file: {}", path_str));
        }

        // Try to enable hardware acceleration (VideoToolbox on macOS, VA-API on Linux, etc.)
        match capture.set(CAP_PROP_HW_ACCELERATION, VIDEO_ACCELERATION_ANY as f64) {
            Ok(true) => tracing::debug!("OpencvReader: hardware acceleration enabled"),
            _ => tracing::debug!("OpencvReader: hardware acceleration not available"),
        }

        let fps = capture.get(CAP_PROP_FPS)?;
        let raw_count = capture.get(CAP_PROP_FRAME_COUNT)?;
        // Some containers report 0 or a negative count when the length is unknown.
        let total_frames = (raw_count > 0.0).then_some(raw_count as usize);

        tracing::info!(
            "OpencvReader: opened {}, fps={:.2}, stream_frames={:?}",
            path_str,
            fps,
            total_frames
        );

        Ok(Self {
            capture,
            total_frames,
        })
    }

    fn read_mat(&mut self) -> Result<Option<Mat>> {
        let mut frame = Mat::default();
        let success = self.capture.read(&mut frame)?;
        if !success || frame.empty() {
            return Ok(None);
        }
        Ok(Some(frame))
    }
}

/// Convert an OpenCV Mat (BGR) to an RGB image buffer.
fn mat_to_rgb_image(mat: &Mat) -> Result<RgbImage> {
    let mut rgb_mat = Mat::default();
    imgproc::cvt_color_def(mat, &mut rgb_mat, imgproc::COLOR_BGR2RGB)?;

    let size = rgb_mat.size()?;
    if !rgb_mat.is_continuous() {
        return Err(anyhow!("Mat is not continuous"));
    }

    let buffer = rgb_mat.data_bytes()?.to_vec();
    RgbImage::from_vec(size.width as u32, size.height as u32, buffer)
        .ok_or_else(|| anyhow!("Failed to create ImageBuffer from Mat data"))
}

impl FrameSource for OpencvReader {
    fn frame_count(&self) -> Option<usize> {
        self.total_frames
    }

    fn seek(&mut self, frame_index: usize) -> Result<(), SourceError> {
        let accepted = self
            .capture
            .set(CAP_PROP_POS_FRAMES, frame_index as f64)
            .map_err(|e| SourceError::Seek {
                frame_index,
                reason: e.to_string(),
            })?;
        if !accepted {
            return Err(SourceError::Seek {
                frame_index,
                reason: "capture rejected the position".to_string(),
            });
        }
        Ok(())
    }

    fn decode_next(&mut self) -> Result<RgbImage, SourceError> {
        match self.read_mat()? {
            Some(mat) => Ok(mat_to_rgb_image(&mat)?),
            None => Err(SourceError::EndOfStream),
        }
    }
}
