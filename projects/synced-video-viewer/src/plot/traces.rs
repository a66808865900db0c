use crate::plot::style::{merge_style, Style};
use crate::series::Series;
use serde::Serialize;

/// One renderable line of the chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceDescriptor {
    pub name: String,
    pub x: Vec<i64>,
    pub y: Vec<f64>,
    pub style: Style,
}

/// Build one trace per styled column, in the order of `style_for_column`.
///
/// Styled columns missing from `series` are skipped, as are series columns
/// without a style entry.
pub fn build_traces<'a, I>(
    series: &Series,
    style_for_column: I,
    default_style: &Style,
) -> Vec<TraceDescriptor>
where
    I: IntoIterator<Item = (&'a String, &'a Style)>,
{
    style_for_column
        .into_iter()
        .filter_map(|(name, style)| {
            let values = series.column(name)?;
            Some(TraceDescriptor {
                name: name.clone(),
                x: series.index.clone(),
                y: values.to_vec(),
                style: merge_style(default_style, style),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Column;
    use serde_json::{json, Map, Value};

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn styles(value: Value) -> Vec<(String, Style)> {
        object(value)
            .into_iter()
            .map(|(k, v)| (k, v.as_object().cloned().unwrap()))
            .collect()
    }

    fn ab_series() -> Series {
        Series::new("index", vec![0, 1, 2])
            .with_column(Column::new("a", vec![1.0, 2.0, 3.0]))
            .unwrap()
            .with_column(Column::new("b", vec![4.0, 5.0, 6.0]))
            .unwrap()
    }

    #[test]
    fn test_only_styled_present_columns_are_emitted() {
        let series = ab_series();
        let style_for_column = styles(json!({
            "b": {"color": "green"},
            "c": {"color": "red"},
        }));
        let default_style = object(json!({"mode": "lines"}));

        let traces = build_traces(
            &series,
            style_for_column.iter().map(|(k, v)| (k, v)),
            &default_style,
        );

        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].name, "b");
        assert_eq!(traces[0].x, vec![0, 1, 2]);
        assert_eq!(traces[0].y, vec![4.0, 5.0, 6.0]);
        assert_eq!(traces[0].style, object(json!({"mode": "lines", "color": "green"})));
    }

    #[test]
    fn test_order_follows_style_spec() {
        let series = ab_series();
        let style_for_column = styles(json!({"b": {}, "a": {}}));
        let traces = build_traces(
            &series,
            style_for_column.iter().map(|(k, v)| (k, v)),
            &Style::new(),
        );
        let names: Vec<&str> = traces.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
