use crate::plot::intervals::{encode, Interval, IntervalError};
use crate::plot::style::{merge_style, Style};
use crate::series::Series;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Plotly's default qualitative colors.
pub const DEFAULT_PALETTE: [&str; 10] = [
    "#636EFA", "#EF553B", "#00CC96", "#AB63FA", "#FFA15A", "#19D3F3", "#FF6692", "#B6E880",
    "#FF97FF", "#FECB52",
];

/// A categorical sample value. Numbers sort before text, numbers by
/// `total_cmp` and text lexically, so groups come out in a fixed order.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Category {
    Number(f64),
    Text(String),
}

impl Category {
    /// Read a raw cell; anything that is not a number is text. An empty cell
    /// is a missing number.
    pub fn parse(cell: &str) -> Self {
        if cell.is_empty() {
            return Category::Number(f64::NAN);
        }
        match cell.parse::<f64>() {
            Ok(v) => Category::Number(v),
            Err(_) => Category::Text(cell.to_string()),
        }
    }
}

impl PartialEq for Category {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Category {}

impl PartialOrd for Category {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Category {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Category::Number(a), Category::Number(b)) => a.total_cmp(b),
            (Category::Number(_), Category::Text(_)) => Ordering::Less,
            (Category::Text(_), Category::Number(_)) => Ordering::Greater,
            (Category::Text(a), Category::Text(b)) => a.cmp(b),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub style: Style,
    pub intervals: Vec<Interval>,
}

pub type RegionGroup = BTreeMap<Category, Region>;

/// Group the samples of `column` by value and shade each value's runs.
///
/// An absent column yields an empty group. Every sample ends up in exactly
/// one group.
pub fn build_regions<F>(
    series: &Series,
    column: &str,
    mut style_for_value: F,
    base_style: &Style,
) -> Result<RegionGroup, IntervalError>
where
    F: FnMut(&Category) -> Style,
{
    let Some(column) = series.get(column) else {
        return Ok(RegionGroup::new());
    };

    let samples = column.categories();
    let distinct: BTreeSet<&Category> = samples.iter().collect();

    distinct
        .into_iter()
        .map(|category| {
            let mask: Vec<bool> = samples.iter().map(|s| s == category).collect();
            let region = Region {
                style: merge_style(base_style, &style_for_value(category)),
                intervals: encode(&mask, &series.index)?,
            };
            Ok((category.clone(), region))
        })
        .collect()
}

/// Cycles through a list of colors, one per categorical value.
#[derive(Debug, Clone)]
pub struct Palette {
    colors: Vec<String>,
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect())
    }
}

impl Palette {
    /// An empty list falls back to the default colors.
    pub fn new(colors: Vec<String>) -> Self {
        if colors.is_empty() {
            return Self::default();
        }
        Self { colors }
    }

    pub fn color_for(&self, value: &Category) -> &str {
        let n = self.colors.len() as u64;
        let slot = match value {
            Category::Number(v) if v.is_finite() && v.fract() == 0.0 => {
                (*v as i64).rem_euclid(n as i64) as u64
            }
            Category::Number(v) => v.to_bits() % n,
            // FNV-1a, stable across runs
            Category::Text(text) => {
                text.bytes().fold(0xcbf2_9ce4_8422_2325u64, |h, b| {
                    (h ^ b as u64).wrapping_mul(0x0100_0000_01b3)
                }) % n
            }
        };
        &self.colors[slot as usize]
    }

    pub fn style_for(&self, value: &Category) -> Style {
        let mut style = Style::new();
        style.insert(
            "fillcolor".to_string(),
            Value::String(self.color_for(value).to_string()),
        );
        style
    }
}
