// Time-series table shared by the chart and the frame synchronization.
//
// All columns share one index (frame number, sample number or timestamp).

use crate::plot::regions::Category;
use anyhow::{anyhow, Context, Result};
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    /// Numeric reading of every cell, NaN where a cell is empty or text.
    pub values: Vec<f64>,
    /// Raw cells, kept only when the column holds text.
    pub labels: Option<Vec<String>>,
}

impl Column {
    pub fn new(name: &str, values: Vec<f64>) -> Self {
        Self {
            name: name.to_string(),
            values,
            labels: None,
        }
    }

    /// Build a column from raw cells. Labels are kept when any non-empty
    /// cell is not a number.
    pub fn from_cells(name: &str, cells: Vec<String>) -> Self {
        let values: Vec<f64> = cells
            .iter()
            .map(|cell| cell.parse::<f64>().unwrap_or(f64::NAN))
            .collect();
        let is_text = cells
            .iter()
            .any(|cell| !cell.is_empty() && cell.parse::<f64>().is_err());
        Self {
            labels: is_text.then_some(cells),
            ..Self::new(name, values)
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.labels.is_none()
    }

    /// Per-sample categories, text cells kept as text.
    pub fn categories(&self) -> Vec<Category> {
        match &self.labels {
            Some(labels) => labels.iter().map(|l| Category::parse(l)).collect(),
            None => self.values.iter().map(|&v| Category::Number(v)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub index_name: String,
    pub index: Vec<i64>,
    pub columns: Vec<Column>,
}

impl Series {
    pub fn new(index_name: &str, index: Vec<i64>) -> Self {
        Self {
            index_name: index_name.to_string(),
            index,
            columns: Vec::new(),
        }
    }

    /// Append a column. Its length must match the index.
    pub fn with_column(mut self, column: Column) -> Result<Self> {
        if column.values.len() != self.index.len() {
            return Err(anyhow!(
                "Column '{}' has {} values, index has {}",
                column.name,
                column.values.len(),
                self.index.len()
            ));
        }
        self.columns.push(column);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.get(name).map(|c| c.values.as_slice())
    }

    /// Load a delimited file. `index_col` designates the shared index; when it
    /// is `None` the row number is used.
    pub fn from_csv(path: &Path, index_col: Option<&str>) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open time series {}", path.display()))?;
        Self::from_reader(file, index_col)
            .with_context(|| format!("Failed to parse time series {}", path.display()))
    }

    pub fn from_reader<R: Read>(reader: R, index_col: Option<&str>) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = rdr.headers()?.clone();

        let index_pos = match index_col {
            Some(name) => Some(
                headers
                    .iter()
                    .position(|h| h == name)
                    .ok_or_else(|| anyhow!("Index column '{}' not found", name))?,
            ),
            None => None,
        };

        let names: Vec<&str> = headers
            .iter()
            .enumerate()
            .filter(|(pos, _)| Some(*pos) != index_pos)
            .map(|(_, name)| name)
            .collect();
        let mut index = Vec::new();
        let mut cells: Vec<Vec<String>> = vec![Vec::new(); names.len()];

        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            let key = match index_pos {
                Some(pos) => {
                    let raw = record.get(pos).unwrap_or("");
                    parse_index(raw).ok_or_else(|| {
                        anyhow!("Row {}: invalid index value '{}'", row + 1, raw)
                    })?
                }
                None => row as i64,
            };
            index.push(key);

            let row_cells = record
                .iter()
                .enumerate()
                .filter(|(pos, _)| Some(*pos) != index_pos)
                .map(|(_, cell)| cell);
            for (column, cell) in cells.iter_mut().zip(row_cells) {
                column.push(cell.to_string());
            }
        }

        names.into_iter().zip(cells).try_fold(
            Self::new(index_col.unwrap_or("index"), index),
            |series, (name, cells)| series.with_column(Column::from_cells(name, cells)),
        )
    }
}

fn parse_index(raw: &str) -> Option<i64> {
    if let Ok(v) = raw.parse::<i64>() {
        return Some(v);
    }
    let v = raw.parse::<f64>().ok()?;
    (v.fract() == 0.0 && v.is_finite()).then_some(v as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CSV: &str = "fnum,x,y,cluster\n0,0.5,-0.1,1\n1,0.25,,1\n2,-0.5,0.3,2\n";

    #[test]
    fn test_from_reader_with_index_col() {
        let series = Series::from_reader(CSV.as_bytes(), Some("fnum")).unwrap();
        assert_eq!(series.index_name, "fnum");
        assert_eq!(series.index, vec![0, 1, 2]);
        let names: Vec<&str> = series.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["x", "y", "cluster"]);
        assert_eq!(series.column("x").unwrap(), &[0.5, 0.25, -0.5]);
        assert_eq!(series.column("cluster").unwrap(), &[1.0, 1.0, 2.0]);
        // A missing cell is a gap, not text.
        let y = series.get("y").unwrap();
        assert!(y.values[1].is_nan());
        assert!(y.is_numeric());
    }

    #[test]
    fn test_text_column_keeps_labels() {
        let csv = "t,state,x\n0,walk,1\n1,walk,2\n2,run,3\n3,rest,4\n";
        let series = Series::from_reader(csv.as_bytes(), Some("t")).unwrap();
        let state = series.get("state").unwrap();
        assert!(!state.is_numeric());
        assert_eq!(
            state.categories(),
            vec![
                Category::Text("walk".into()),
                Category::Text("walk".into()),
                Category::Text("run".into()),
                Category::Text("rest".into()),
            ]
        );
        assert!(series.get("x").unwrap().is_numeric());
    }

    #[test]
    fn test_from_reader_defaults_to_row_number() {
        let series = Series::from_reader(CSV.as_bytes(), None).unwrap();
        assert_eq!(series.index, vec![0, 1, 2]);
        assert_eq!(series.columns.len(), 4);
        assert_eq!(series.column("fnum").unwrap(), &[0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_missing_index_column_is_an_error() {
        assert!(Series::from_reader(CSV.as_bytes(), Some("time")).is_err());
    }

    #[test]
    fn test_from_csv_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "t,a\n10,1\n20.0,2\n").unwrap();
        let series = Series::from_csv(file.path(), Some("t")).unwrap();
        assert_eq!(series.index, vec![10, 20]);
        assert_eq!(series.column("a").unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn test_empty_file_gives_empty_series() {
        let series = Series::from_reader("t,a\n".as_bytes(), Some("t")).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.column("a").unwrap().len(), 0);
    }

    #[test]
    fn test_with_column_checks_length() {
        let series = Series::new("i", vec![0, 1]);
        assert!(series.clone().with_column(Column::new("a", vec![1.0])).is_err());
        let series = series.with_column(Column::new("a", vec![1.0, 2.0])).unwrap();
        assert_eq!(series.len(), 2);
    }
}
