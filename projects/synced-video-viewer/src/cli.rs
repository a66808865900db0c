use crate::video::{Backend, SourceSpec};
use anyhow::{anyhow, Result};
use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Port to bind to
    #[arg(long, default_value_t = 5000)]
    pub port: u16,

    /// Video file to display. A generated noise video is used when omitted.
    #[arg(long, env = "SYNCED_VIEWER_VIDEO")]
    pub video: Option<PathBuf>,

    /// Decoding backend for --video
    #[arg(long, value_enum, default_value = "ffmpeg")]
    pub backend: Backend,

    /// Number of frames of the generated video
    #[arg(long, default_value_t = 1800)]
    pub synthetic_frames: usize,

    /// Frame size of the generated video, as WIDTHxHEIGHT
    #[arg(long, default_value = "320x240", value_parser = parse_size)]
    pub synthetic_size: (u32, u32),

    /// Time series CSV shown in the chart
    #[arg(long, env = "SYNCED_VIEWER_DATA")]
    pub data: Option<PathBuf>,

    /// Column of --data holding the shared index (row number when omitted)
    #[arg(long)]
    pub index_col: Option<String>,

    /// CSV of `key,frame` rows mapping index values to video frames
    #[arg(long, env = "SYNCED_VIEWER_SYNC_MAP")]
    pub sync_map: Option<PathBuf>,

    /// Figure configuration (JSON)
    #[arg(long, env = "SYNCED_VIEWER_FIGURE")]
    pub figure: Option<PathBuf>,

    /// Delay between streamed frames during playback, in milliseconds
    #[arg(long, default_value_t = 33)]
    pub frame_delay_ms: u64,

    /// JPEG quality of streamed frames (1-100)
    #[arg(long, default_value_t = 80, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub jpeg_quality: u8,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn source_spec(&self) -> SourceSpec {
        match &self.video {
            Some(path) => SourceSpec::File {
                path: path.clone(),
                backend: self.backend,
            },
            None => SourceSpec::Synthetic {
                width: self.synthetic_size.0,
                height: self.synthetic_size.1,
                frame_count: Some(self.synthetic_frames),
            },
        }
    }

    /// `None` streams as fast as the decoder allows.
    pub fn frame_delay(&self) -> Option<Duration> {
        (self.frame_delay_ms > 0).then(|| Duration::from_millis(self.frame_delay_ms))
    }
}

fn parse_size(s: &str) -> Result<(u32, u32)> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("expected WIDTHxHEIGHT, got '{}'", s))?;
    Ok((w.trim().parse()?, h.trim().parse()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_use_synthetic_source() {
        let args = Args::try_parse_from(["synced-video-viewer"]).unwrap();
        assert_eq!(args.port, 5000);
        assert_eq!(args.frame_delay(), Some(Duration::from_millis(33)));
        match args.source_spec() {
            SourceSpec::Synthetic {
                width,
                height,
                frame_count,
            } => {
                assert_eq!((width, height), (320, 240));
                assert_eq!(frame_count, Some(1800));
            }
            other => panic!("unexpected source {:?}", other),
        }
    }

    #[test]
    fn test_video_flag_selects_backend() {
        let args = Args::try_parse_from([
            "synced-video-viewer",
            "--video",
            "clip.mp4",
            "--backend",
            "opencv",
            "--frame-delay-ms",
            "0",
        ])
        .unwrap();
        assert!(args.frame_delay().is_none());
        assert!(matches!(
            args.source_spec(),
            SourceSpec::File {
                backend: Backend::Opencv,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("640x480").unwrap(), (640, 480));
        assert!(parse_size("640").is_err());
        assert!(Args::try_parse_from(["synced-video-viewer", "--jpeg-quality", "0"]).is_err());
    }
}
