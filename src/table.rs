use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    features: Vec<Vec<f64>>,
    labels: Vec<String>,
}

impl Table {
    pub fn new(features: Vec<Vec<f64>>, labels: Vec<String>) -> Result<Self, TableError> {
        if labels.is_empty() {
            return Err(TableError::EmptyTable);
        }

        let rows_len = labels.len();
        if features.iter().any(|c| c.len() != rows_len) {
            return Err(TableError::RowSizeMismatch);
        }

        Ok(Self { features, labels })
    }

    pub fn features_len(&self) -> usize {
        self.features.len()
    }

    pub fn rows_len(&self) -> usize {
        self.labels.len()
    }

    pub fn feature(&self, column_index: usize) -> &[f64] {
        &self.features[column_index]
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Feature values of one row, in column order. The label is not included.
    pub fn row(&self, row_index: usize) -> impl '_ + Iterator<Item = f64> {
        self.features.iter().map(move |c| c[row_index])
    }
}

#[derive(Debug, Error, Clone)]
pub enum TableError {
    #[error("table must have at least one row")]
    EmptyTable,

    #[error("some of columns have a different row count from others")]
    RowSizeMismatch,
}
