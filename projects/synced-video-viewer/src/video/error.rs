use thiserror::Error;

/// Failures reported by a [`FrameSource`](super::FrameSource) backend.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("end of stream")]
    EndOfStream,

    #[error("seek to frame {frame_index} failed: {reason}")]
    Seek { frame_index: usize, reason: String },

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Failures of the synchronized frame source.
///
/// `SourceOpen` and `UnknownLength` happen while opening; `KeyNotFound`,
/// `Decode` and `Encode` are per-fetch and leave the source usable.
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("failed to open video source {path}: {reason}")]
    SourceOpen { path: String, reason: String },

    #[error("video source cannot report its frame count and no sync map was given")]
    UnknownLength,

    #[error("no frame mapped to sync key {0}")]
    KeyNotFound(String),

    #[error("failed to decode frame {frame_index}: {source}")]
    Decode {
        frame_index: usize,
        #[source]
        source: SourceError,
    },

    #[error("failed to encode frame {frame_index}: {source}")]
    Encode {
        frame_index: usize,
        #[source]
        source: image::ImageError,
    },
}

impl FrameError {
    /// Whether the caller can keep using the source after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FrameError::KeyNotFound(_) | FrameError::Decode { .. } | FrameError::Encode { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FrameError::KeyNotFound("42".to_string());
        assert_eq!(err.to_string(), "no frame mapped to sync key 42");

        let err = FrameError::Decode {
            frame_index: 7,
            source: SourceError::EndOfStream,
        };
        assert_eq!(err.to_string(), "failed to decode frame 7: end of stream");
        assert!(err.is_recoverable());
        assert!(!FrameError::UnknownLength.is_recoverable());
    }

    #[test]
    fn test_backend_error_conversion() {
        let err: SourceError = anyhow::anyhow!("corrupt packet").into();
        assert!(matches!(err, SourceError::Backend(_)));
        assert_eq!(err.to_string(), "corrupt packet");
    }
}
