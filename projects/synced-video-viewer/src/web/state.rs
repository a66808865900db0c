use crate::cli::Args;
use crate::figure_config::FigureConfig;
use crate::plot::figure::{build_figure, Figure};
use crate::series::Series;
use crate::video::error::FrameError;
use crate::video::synced::{SyncMap, SyncedFrameSource};
use crate::video::SourceSpec;
use anyhow::{Context, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

/// Everything the handlers share. Each stream connection opens its own
/// frame source from `source_spec`.
pub struct AppState {
    pub source_spec: SourceSpec,
    pub sync_map: Option<SyncMap<i64>>,
    pub figure: Figure,
    pub info: ViewerInfo,
    /// Mapped sync keys in ascending order.
    pub keys: Vec<i64>,
    pub frame_delay: Option<Duration>,
    pub jpeg_quality: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewerInfo {
    pub source: String,
    pub frame_count: Option<usize>,
    pub keys: usize,
    pub first_key: Option<i64>,
    pub last_key: Option<i64>,
}

impl AppState {
    pub fn from_args(args: &Args) -> Result<Self> {
        let config = match &args.figure {
            Some(path) => FigureConfig::load(path)?,
            None => FigureConfig::default(),
        };

        let figure = match &args.data {
            Some(path) => {
                let series = Series::from_csv(path, args.index_col.as_deref())?;
                if series.is_empty() {
                    warn!("Time series {} has no rows", path.display());
                }
                info!(
                    "Loaded {} samples x {} columns from {}",
                    series.len(),
                    series.columns.len(),
                    path.display()
                );
                build_figure(&series, &config)?
            }
            None => build_figure(&Series::new("frame", Vec::new()), &config)?,
        };

        let sync_map = match &args.sync_map {
            Some(path) => Some(SyncMap::from_csv(path)?),
            None => None,
        };

        let state = Self {
            source_spec: args.source_spec(),
            sync_map,
            figure,
            info: ViewerInfo {
                source: String::new(),
                frame_count: None,
                keys: 0,
                first_key: None,
                last_key: None,
            },
            keys: Vec::new(),
            frame_delay: args.frame_delay(),
            jpeg_quality: args.jpeg_quality,
        };
        state.check_source()
    }

    /// Open the source once so that open failures abort startup.
    fn check_source(mut self) -> Result<Self> {
        let source = self
            .open_source()
            .with_context(|| format!("Cannot open {}", self.source_spec.describe()))?;
        let sync_map = source.sync_map();
        if sync_map.is_empty() {
            warn!("Sync map is empty, no frame can be shown");
        }
        let keys = sync_map.sorted_keys();
        self.info = ViewerInfo {
            source: self.source_spec.describe(),
            frame_count: source.frame_count(),
            keys: sync_map.len(),
            first_key: keys.first().copied(),
            last_key: keys.last().copied(),
        };
        self.keys = keys;
        info!(
            "Video source {} ({} sync keys)",
            self.info.source, self.info.keys
        );
        Ok(self)
    }

    pub fn open_source(&self) -> Result<SyncedFrameSource<i64>, FrameError> {
        Ok(
            SyncedFrameSource::open(&self.source_spec, self.sync_map.clone())?
                .with_jpeg_quality(self.jpeg_quality),
        )
    }
}
