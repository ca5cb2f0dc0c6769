/// One row of a time series: the frame time in ps and one value per column.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRow {
    pub time: f64,
    pub values: Vec<f64>,
}

/// Per-frame results of an analysis module, ready for a data writer.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSeries {
    title: String,
    y_label: String,
    columns: Vec<String>,
    rows: Vec<DataRow>,
}

impl DataSeries {
    pub fn new(title: &str, y_label: &str, columns: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            y_label: y_label.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn y_label(&self) -> &str {
        &self.y_label
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[DataRow] {
        &self.rows
    }

    /// # Panics
    ///
    /// Panics when `values` does not have one entry per column.
    pub fn push_row(&mut self, time: f64, values: Vec<f64>) {
        assert_eq!(
            values.len(),
            self.columns.len(),
            "row has {} values for {} columns",
            values.len(),
            self.columns.len()
        );
        self.rows.push(DataRow { time, values });
    }

    /// Mean of each column over all rows; `None` for an empty series.
    pub fn column_means(&self) -> Option<Vec<f64>> {
        if self.rows.is_empty() {
            return None;
        }
        let n = self.rows.len() as f64;
        let mut sums = vec![0.0; self.columns.len()];
        for row in &self.rows {
            for (sum, value) in sums.iter_mut().zip(&row.values) {
                *sum += value;
            }
        }
        Some(sums.into_iter().map(|s| s / n).collect())
    }
}
