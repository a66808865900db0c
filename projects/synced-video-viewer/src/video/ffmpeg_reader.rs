use super::error::SourceError;
use super::FrameSource;
use anyhow::{anyhow, Context, Result};
use ffmpeg_next::ffi;
use ffmpeg_next::util::frame::Video;
use image::RgbImage;
use std::path::Path;

/// Video reader backed by FFmpeg via ffmpeg-next, decoding on the CPU.
///
/// Seeks land on the preceding keyframe; frames are then decoded and dropped
/// until the requested index so that the next read returns exactly it.
pub struct FfmpegReader {
    input_ctx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::codec::decoder::Video,
    video_stream_index: usize,
    /// Lazily created on first frame (source format is only known then).
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    width: u32,
    height: u32,
    source_fps: f64,
    /// Seconds per stream timestamp tick.
    time_base: f64,
    total_frames: Option<usize>,
    /// Frame reached by the last seek, returned by the next read.
    pending: Option<Video>,
    /// Persistent packet object to avoid allocations.
    reuse_packet: ffmpeg_next::codec::packet::Packet,
    /// Whether we've sent EOF to the decoder.
    eof_sent: bool,
}

// SAFETY: an FfmpegReader is owned by one SyncedFrameSource and only used by
// one thread at a time. The raw pointers inside ffmpeg-next types are not shared.
unsafe impl Send for FfmpegReader {}

impl FfmpegReader {
    pub fn new(path: &Path) -> Result<Self> {
        ffmpeg_next::init().context("Failed to initialize FFmpeg")?;

        let input_ctx = ffmpeg_next::format::input(&path).context("Failed to open video file")?;

        let video_stream = input_ctx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| anyhow!("No video stream found in {}", path.display()))?;

        let video_stream_index = video_stream.index();

        let rational_fps = video_stream.avg_frame_rate();
        let source_fps = if rational_fps.denominator() > 0 && rational_fps.numerator() > 0 {
            rational_fps.numerator() as f64 / rational_fps.denominator() as f64
        } else {
            tracing::warn!("FfmpegReader: could not determine FPS, defaulting to 30.0");
            30.0
        };

        let tb = video_stream.time_base();
        let time_base = if tb.denominator() > 0 {
            tb.numerator() as f64 / tb.denominator() as f64
        } else {
            1.0 / source_fps
        };

        let stream_frames = video_stream.frames();
        let duration_secs = input_ctx.duration() as f64 / ffi::AV_TIME_BASE as f64;
        let total_frames = if stream_frames > 0 {
            Some(stream_frames as usize)
        } else if duration_secs > 0.0 {
            Some((duration_secs * source_fps).round() as usize)
        } else {
            None
        };

        tracing::info!(
            "FfmpegReader: opened {}, duration={:.2}s, fps={:.2}, stream_frames={}, total={:?}",
            path.display(),
            duration_secs,
            source_fps,
            stream_frames,
            total_frames
        );

        let decoder_ctx =
            ffmpeg_next::codec::context::Context::from_parameters(video_stream.parameters())
                .context("Failed to create decoder context")?;
        let decoder = decoder_ctx
            .decoder()
            .video()
            .context("Failed to open video decoder")?;

        let width = decoder.width();
        let height = decoder.height();
        tracing::debug!("FfmpegReader: software decoding ({}x{})", width, height);

        Ok(Self {
            input_ctx,
            decoder,
            video_stream_index,
            scaler: None,
            width,
            height,
            source_fps,
            time_base,
            total_frames,
            pending: None,
            reuse_packet: ffmpeg_next::codec::packet::Packet::empty(),
            eof_sent: false,
        })
    }

    /// Retrieve the next decoded frame from the stream, feeding packets as needed.
    fn receive_raw(&mut self) -> Result<Video, SourceError> {
        let mut frame = Video::empty();
        loop {
            match self.decoder.receive_frame(&mut frame) {
                Ok(()) => return Ok(frame),
                Err(ffmpeg_next::Error::Other { errno: ffi::EAGAIN }) => {
                    if self.eof_sent {
                        return Err(SourceError::EndOfStream);
                    }
                }
                Err(ffmpeg_next::Error::Eof) => return Err(SourceError::EndOfStream),
                Err(e) => return Err(anyhow!("Decoder error: {}", e).into()),
            }

            // Feed packets until we find a video packet OR reach EOF
            let mut found_packet = false;
            while self.reuse_packet.read(&mut self.input_ctx).is_ok() {
                if self.reuse_packet.stream() == self.video_stream_index {
                    self.decoder
                        .send_packet(&self.reuse_packet)
                        .context("Failed to send packet to decoder")?;
                    found_packet = true;
                    break;
                }
            }

            if !found_packet {
                // EOF reached in input file, flush the decoder
                self.decoder
                    .send_eof()
                    .context("Failed to send EOF to decoder")?;
                self.eof_sent = true;
            }
        }
    }

    fn frame_index_of(&self, frame: &Video) -> Option<usize> {
        let ts = frame.timestamp().or_else(|| frame.pts())?;
        let secs = ts as f64 * self.time_base;
        (secs >= 0.0).then(|| (secs * self.source_fps).round() as usize)
    }

    /// Convert a decoded frame to packed RGB24.
    fn to_rgb_image(&mut self, frame: &Video) -> Result<RgbImage> {
        if self.scaler.is_none() {
            let scaler = ffmpeg_next::software::scaling::Context::get(
                frame.format(),
                self.width,
                self.height,
                ffmpeg_next::format::Pixel::RGB24,
                self.width,
                self.height,
                ffmpeg_next::software::scaling::Flags::BILINEAR,
            )
            .context("Failed to create scaler")?;
            self.scaler = Some(scaler);
        }
        let scaler = self
            .scaler
            .as_mut()
            .ok_or_else(|| anyhow!("Scaler unavailable"))?;

        let mut rgb = Video::empty();
        scaler.run(frame, &mut rgb).context("Scaler failed")?;

        let width = rgb.width() as usize;
        let height = rgb.height() as usize;
        let stride = rgb.stride(0);
        let data = rgb.data(0);
        let row_bytes = width * 3;

        let mut buffer = Vec::with_capacity(row_bytes * height);
        for y in 0..height {
            let offset = y * stride;
            buffer.extend_from_slice(&data[offset..offset + row_bytes]);
        }

        RgbImage::from_vec(width as u32, height as u32, buffer)
            .ok_or_else(|| anyhow!("Failed to create ImageBuffer from frame data"))
    }
}

impl FrameSource for FfmpegReader {
    fn frame_count(&self) -> Option<usize> {
        self.total_frames
    }

    fn seek(&mut self, frame_index: usize) -> Result<(), SourceError> {
        let time_secs = frame_index as f64 / self.source_fps;
        let timestamp = (time_secs * ffi::AV_TIME_BASE as f64) as i64;
        self.input_ctx
            .seek(timestamp, ..timestamp)
            .map_err(|e| SourceError::Seek {
                frame_index,
                reason: e.to_string(),
            })?;
        self.decoder.flush();
        self.eof_sent = false;
        self.scaler = None; // format might change after a seek
        self.pending = None;

        // Decode forward from the keyframe to the requested frame.
        loop {
            let frame = match self.receive_raw() {
                Ok(frame) => frame,
                Err(SourceError::EndOfStream) => {
                    return Err(SourceError::Seek {
                        frame_index,
                        reason: "past the end of the stream".to_string(),
                    })
                }
                Err(e) => return Err(e),
            };
            match self.frame_index_of(&frame) {
                Some(index) if index < frame_index => continue,
                _ => {
                    self.pending = Some(frame);
                    return Ok(());
                }
            }
        }
    }

    fn decode_next(&mut self) -> Result<RgbImage, SourceError> {
        let frame = match self.pending.take() {
            Some(frame) => frame,
            None => self.receive_raw()?,
        };
        Ok(self.to_rgb_image(&frame)?)
    }
}
