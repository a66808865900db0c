// Chart payload consumed by the viewer page.

use crate::figure_config::FigureConfig;
use crate::plot::intervals::IntervalError;
use crate::plot::regions::{build_regions, Category, Palette};
use crate::plot::style::Style;
use crate::plot::traces::{build_traces, TraceDescriptor};
use crate::series::Series;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Span {
    pub x0: i64,
    pub x1: i64,
}

/// Shaded spans for one value of a categorical column.
#[derive(Debug, Clone, Serialize)]
pub struct RegionOverlay {
    pub column: String,
    pub value: Category,
    pub style: Style,
    pub spans: Vec<Span>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub range_slider: bool,
    pub x_title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Figure {
    pub traces: Vec<TraceDescriptor>,
    pub regions: Vec<RegionOverlay>,
    pub layout: Layout,
}

pub fn build_figure(series: &Series, config: &FigureConfig) -> Result<Figure, IntervalError> {
    let traces = if config.trace_styles.is_empty() {
        // Every numeric non-overlay column, unstyled.
        let all: Vec<(String, Style)> = series
            .columns
            .iter()
            .filter(|c| c.is_numeric() && !config.is_region_column(&c.name))
            .map(|c| (c.name.clone(), Style::new()))
            .collect();
        build_traces(
            series,
            all.iter().map(|(k, v)| (k, v)),
            &config.default_trace_style,
        )
    } else {
        build_traces(
            series,
            config.trace_styles.iter().map(|(k, v)| (k, v)),
            &config.default_trace_style,
        )
    };

    let palette = Palette::new(config.palette.clone());
    let mut regions = Vec::new();
    for (column, base_style) in &config.regions {
        let group = build_regions(series, column, |v| palette.style_for(v), base_style)?;
        for (category, region) in group {
            let spans = region
                .intervals
                .iter()
                .filter_map(|interval| interval.bounds(&series.index))
                .map(|(x0, x1)| Span { x0, x1 })
                .collect();
            regions.push(RegionOverlay {
                column: column.clone(),
                value: category,
                style: region.style,
                spans,
            });
        }
    }

    Ok(Figure {
        traces,
        regions,
        layout: Layout {
            range_slider: config.range_slider,
            x_title: series.index_name.clone(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Column;
    use serde_json::json;

    fn series() -> Series {
        Series::new("fnum", vec![100, 101, 102, 103, 104])
            .with_column(Column::new("x", vec![0.1, 0.2, 0.3, 0.4, 0.5]))
            .unwrap()
            .with_column(Column::new("y", vec![1.0, 2.0, 3.0, 4.0, 5.0]))
            .unwrap()
            .with_column(Column::new("cluster", vec![0.0, 1.0, 1.0, 0.0, 0.0]))
            .unwrap()
    }

    fn spans(region: &RegionOverlay) -> Vec<(i64, i64)> {
        region.spans.iter().map(|s| (s.x0, s.x1)).collect()
    }

    #[test]
    fn test_unconfigured_traces_cover_every_non_region_column() {
        let config: FigureConfig =
            serde_json::from_str(r#"{"regions": {"cluster": {"y_b": -1, "y_t": 1}}}"#).unwrap();
        let figure = build_figure(&series(), &config).unwrap();
        let names: Vec<&str> = figure.traces.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["x", "y"]);
        assert_eq!(figure.traces[0].style["mode"], json!("lines"));
        assert_eq!(figure.layout.x_title, "fnum");
    }

    #[test]
    fn test_region_spans_use_index_values() {
        let config: FigureConfig =
            serde_json::from_str(r#"{"regions": {"cluster": {"y_b": -1, "y_t": 1}}}"#).unwrap();
        let figure = build_figure(&series(), &config).unwrap();
        assert_eq!(figure.regions.len(), 2);

        let zero = &figure.regions[0];
        assert_eq!(zero.value, Category::Number(0.0));
        // The trailing run ends one index step after the last sample.
        assert_eq!(spans(zero), vec![(100, 101), (103, 105)]);

        let one = &figure.regions[1];
        assert_eq!(spans(one), vec![(101, 103)]);
        assert_eq!(one.style["y_t"], json!(1));
    }

    #[test]
    fn test_text_regions_serialize_their_label() {
        let csv = "t,state,x\n0,walk,1\n1,walk,2\n2,run,3\n3,rest,4\n";
        let series = Series::from_reader(csv.as_bytes(), Some("t")).unwrap();
        let config: FigureConfig =
            serde_json::from_str(r#"{"regions": {"state": {}}}"#).unwrap();
        let figure = build_figure(&series, &config).unwrap();

        assert_eq!(figure.regions.len(), 3);
        let names: Vec<&str> = figure.traces.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["x"]);

        let payload = serde_json::to_value(&figure.regions[1]).unwrap();
        assert_eq!(payload["value"], json!("run"));
        assert_eq!(payload["spans"], json!([{"x0": 2, "x1": 3}]));
    }

    #[test]
    fn test_configured_traces_only() {
        let config: FigureConfig =
            serde_json::from_str(r#"{"trace_styles": {"y": {"line": {"color": "green"}}}}"#)
                .unwrap();
        let figure = build_figure(&series(), &config).unwrap();
        assert_eq!(figure.traces.len(), 1);
        assert_eq!(figure.traces[0].name, "y");
        assert!(figure.regions.is_empty());
    }
}
