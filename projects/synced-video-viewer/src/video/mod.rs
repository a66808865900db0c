pub mod encode;
pub mod error;
#[cfg(feature = "ffmpeg")]
pub mod ffmpeg_reader;
#[cfg(feature = "opencv")]
pub mod opencv_reader;
pub mod synced;
pub mod synthetic;

use error::{FrameError, SourceError};
use image::RgbImage;
use std::path::PathBuf;

/// A decodable video: sequential reads plus random-access seeks.
pub trait FrameSource: Send {
    /// Total number of frames, when the container reports it.
    fn frame_count(&self) -> Option<usize>;
    /// Make `frame_index` the next frame returned by `decode_next`.
    fn seek(&mut self, frame_index: usize) -> Result<(), SourceError>;
    fn decode_next(&mut self) -> Result<RgbImage, SourceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    Opencv,
    Ffmpeg,
}

#[derive(Debug, Clone)]
pub enum SourceSpec {
    File {
        path: PathBuf,
        backend: Backend,
    },
    Synthetic {
        width: u32,
        height: u32,
        frame_count: Option<usize>,
    },
}

impl SourceSpec {
    pub fn describe(&self) -> String {
        match self {
            SourceSpec::File { path, backend } => format!("{} ({:?})", path.display(), backend),
            SourceSpec::Synthetic {
                width,
                height,
                frame_count,
            } => match frame_count {
                Some(n) => format!("synthetic {}x{}, {} frames", width, height, n),
                None => format!("synthetic {}x{}, unbounded", width, height),
            },
        }
    }
}

pub fn open_source(spec: &SourceSpec) -> Result<Box<dyn FrameSource>, FrameError> {
    match spec {
        SourceSpec::File { path, backend } => {
            if !path.exists() {
                return Err(FrameError::SourceOpen {
                    path: path.display().to_string(),
                    reason: "file not found".to_string(),
                });
            }
            match backend {
                Backend::Opencv => open_opencv(path),
                Backend::Ffmpeg => open_ffmpeg(path),
            }
        }
        SourceSpec::Synthetic {
            width,
            height,
            frame_count,
        } => {
            if *width == 0 || *height == 0 {
                return Err(FrameError::SourceOpen {
                    path: spec.describe(),
                    reason: "frame size must be non-zero".to_string(),
                });
            }
            Ok(Box::new(synthetic::SyntheticSource::new(
                *width,
                *height,
                *frame_count,
            )))
        }
    }
}

#[cfg(feature = "opencv")]
fn open_opencv(path: &std::path::Path) -> Result<Box<dyn FrameSource>, FrameError> {
    let reader = opencv_reader::OpencvReader::new(path).map_err(|e| FrameError::SourceOpen {
        path: path.display().to_string(),
        reason: format!("{:#}", e),
    })?;
    Ok(Box::new(reader))
}

#[cfg(not(feature = "opencv"))]
fn open_opencv(path: &std::path::Path) -> Result<Box<dyn FrameSource>, FrameError> {
    Err(FrameError::SourceOpen {
        path: path.display().to_string(),
        reason: "built without the `opencv` feature".to_string(),
    })
}

#[cfg(feature = "ffmpeg")]
fn open_ffmpeg(path: &std::path::Path) -> Result<Box<dyn FrameSource>, FrameError> {
    let reader = ffmpeg_reader::FfmpegReader::new(path).map_err(|e| FrameError::SourceOpen {
        path: path.display().to_string(),
        reason: format!("{:#}", e),
    })?;
    Ok(Box::new(reader))
}

#[cfg(not(feature = "ffmpeg"))]
fn open_ffmpeg(path: &std::path::Path) -> Result<Box<dyn FrameSource>, FrameError> {
    Err(FrameError::SourceOpen {
        path: path.display().to_string(),
        reason: "built without the `ffmpeg` feature".to_string(),
    })
}
