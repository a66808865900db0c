// Figure configuration persisted as JSON next to the time series.
//
// {
//   "trace_styles": { "x": {"line": {"color": "red"}} },
//   "default_trace_style": { "mode": "lines", "hoverinfo": "skip" },
//   "regions": { "cluster": {"y_b": -1, "y_t": 1} },
//   "palette": ["#636EFA", "#EF553B"],
//   "range_slider": true
// }

use crate::plot::style::Style;
use anyhow::{Context, Result};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Map, Value};
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct FigureConfig {
    /// Column -> trace style, in legend order. Empty means "every column".
    #[serde(default, deserialize_with = "ordered_styles")]
    pub trace_styles: Vec<(String, Style)>,
    #[serde(default = "default_trace_style")]
    pub default_trace_style: Style,
    /// Categorical column -> base style of its shaded regions.
    #[serde(default, deserialize_with = "ordered_styles")]
    pub regions: Vec<(String, Style)>,
    #[serde(default)]
    pub palette: Vec<String>,
    #[serde(default = "default_range_slider")]
    pub range_slider: bool,
}

fn default_trace_style() -> Style {
    let mut style = Style::new();
    style.insert("mode".to_string(), json!("lines"));
    style.insert("hoverinfo".to_string(), json!("skip"));
    style
}

fn default_range_slider() -> bool {
    true
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            trace_styles: Vec::new(),
            default_trace_style: default_trace_style(),
            regions: Vec::new(),
            palette: Vec::new(),
            range_slider: default_range_slider(),
        }
    }
}

impl FigureConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read figure config {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid figure config {}", path.display()))
    }

    pub fn is_region_column(&self, column: &str) -> bool {
        self.regions.iter().any(|(name, _)| name == column)
    }
}

fn ordered_styles<'de, D>(deserializer: D) -> Result<Vec<(String, Style)>, D::Error>
where
    D: Deserializer<'de>,
{
    let map = Map::<String, Value>::deserialize(deserializer)?;
    map.into_iter()
        .map(|(column, value)| match value {
            Value::Object(style) => Ok((column, style)),
            other => Err(D::Error::custom(format!(
                "style for '{}' must be an object, got {}",
                column, other
            ))),
        })
        .collect()
}
