// Frame lookup by synchronization key.
//
// The source keeps track of where the decoder cursor is so that stepping
// through consecutive frames never pays for a random-access seek.

use super::encode::{encode_jpeg, DEFAULT_JPEG_QUALITY};
use super::error::FrameError;
use super::{open_source, FrameSource, SourceSpec};
use anyhow::{Context, Result};
use image::RgbImage;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::path::Path;

/// Key type usable in a [`SyncMap`].
pub trait FrameKey: Eq + Hash + Clone + Debug {
    /// Key that addresses `index` under the identity mapping.
    fn from_frame_index(index: usize) -> Option<Self>;
}

impl FrameKey for usize {
    fn from_frame_index(index: usize) -> Option<Self> {
        Some(index)
    }
}

impl FrameKey for u64 {
    fn from_frame_index(index: usize) -> Option<Self> {
        u64::try_from(index).ok()
    }
}

impl FrameKey for i64 {
    fn from_frame_index(index: usize) -> Option<Self> {
        i64::try_from(index).ok()
    }
}

impl FrameKey for String {
    fn from_frame_index(index: usize) -> Option<Self> {
        Some(index.to_string())
    }
}

/// Synchronization key -> frame index.
#[derive(Debug, Clone)]
pub struct SyncMap<K> {
    entries: HashMap<K, usize>,
}

impl<K: FrameKey> SyncMap<K> {
    pub fn new(entries: HashMap<K, usize>) -> Self {
        Self { entries }
    }

    /// Every frame in `[0, frame_count)` addressed by its own index.
    pub fn identity(frame_count: usize) -> Self {
        (0..frame_count)
            .filter_map(|i| K::from_frame_index(i).map(|k| (k, i)))
            .collect()
    }

    pub fn get(&self, key: &K) -> Option<usize> {
        self.entries.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in ascending order, used to step through the video.
    pub fn sorted_keys(&self) -> Vec<K>
    where
        K: Ord,
    {
        let mut keys: Vec<K> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl<K: FrameKey> FromIterator<(K, usize)> for SyncMap<K> {
    fn from_iter<T: IntoIterator<Item = (K, usize)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[derive(Deserialize)]
struct SyncRow {
    key: i64,
    frame: usize,
}

impl SyncMap<i64> {
    /// Load `key,frame` rows. A repeated key keeps its last frame.
    pub fn from_csv(path: &Path) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .with_context(|| format!("Failed to open sync map {}", path.display()))?;
        let mut entries = HashMap::new();
        for row in rdr.deserialize() {
            let row: SyncRow =
                row.with_context(|| format!("Invalid row in sync map {}", path.display()))?;
            entries.insert(row.key, row.frame);
        }
        Ok(Self::new(entries))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    pub seeks: usize,
    pub decodes: usize,
}

/// A video source addressed by synchronization key.
///
/// Not safe for concurrent callers: the decode position is plain mutable
/// state and the underlying decoder handles one read at a time.
pub struct SyncedFrameSource<K> {
    source: Box<dyn FrameSource>,
    sync_map: SyncMap<K>,
    /// Index of the frame the next sequential decode returns.
    position: Option<usize>,
    /// Cleared when a failed read may have moved the decoder without
    /// updating `position`.
    cursor_in_sync: bool,
    jpeg_quality: u8,
    stats: FetchStats,
}

impl<K: FrameKey> SyncedFrameSource<K> {
    pub fn open(spec: &SourceSpec, sync_map: Option<SyncMap<K>>) -> Result<Self, FrameError> {
        let source = open_source(spec)?;
        Self::new(source, sync_map)
    }

    /// Without an explicit map the identity map over the source's frames is
    /// used, which requires the source to know its length.
    pub fn new(
        source: Box<dyn FrameSource>,
        sync_map: Option<SyncMap<K>>,
    ) -> Result<Self, FrameError> {
        let sync_map = match sync_map {
            Some(map) => map,
            None => SyncMap::identity(source.frame_count().ok_or(FrameError::UnknownLength)?),
        };
        Ok(Self {
            source,
            sync_map,
            position: None,
            cursor_in_sync: true,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            stats: FetchStats::default(),
        })
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn stats(&self) -> FetchStats {
        self.stats
    }

    pub fn sync_map(&self) -> &SyncMap<K> {
        &self.sync_map
    }

    pub fn frame_count(&self) -> Option<usize> {
        self.source.frame_count()
    }

    /// JPEG bytes of the frame mapped to `key`.
    pub fn fetch(&mut self, key: &K) -> Result<Vec<u8>, FrameError> {
        let (frame_index, frame) = self.fetch_raw(key)?;
        encode_jpeg(&frame, self.jpeg_quality).map_err(|source| FrameError::Encode {
            frame_index,
            source,
        })
    }

    /// Decoded frame mapped to `key`, with its frame index.
    pub fn fetch_raw(&mut self, key: &K) -> Result<(usize, RgbImage), FrameError> {
        let frame_index = self
            .sync_map
            .get(key)
            .ok_or_else(|| FrameError::KeyNotFound(format!("{:?}", key)))?;

        if !self.cursor_in_sync || self.position != Some(frame_index) {
            self.stats.seeks += 1;
            if let Err(source) = self.source.seek(frame_index) {
                self.cursor_in_sync = false;
                return Err(FrameError::Decode {
                    frame_index,
                    source,
                });
            }
            self.cursor_in_sync = true;
        }

        match self.source.decode_next() {
            Ok(frame) => {
                self.stats.decodes += 1;
                self.position = Some(frame_index + 1);
                Ok((frame_index, frame))
            }
            Err(source) => {
                self.cursor_in_sync = false;
                Err(FrameError::Decode {
                    frame_index,
                    source,
                })
            }
        }
    }
}
