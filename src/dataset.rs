//! Loading delimited tables from disk and writing augmented variants back.

use crate::table::{Table, TableError};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Delimiters the loader recognizes, in tie-breaking order.
const DELIMITER_CANDIDATES: &[u8] = b",\t;| ";

/// One source file parsed into a table, remembering enough about the file
/// (base name, extension, delimiter) to serialize variants the same way.
#[derive(Debug, Clone)]
pub struct Dataset {
    name: String,
    extension: String,
    delimiter: u8,
    table: Table,
}

impl Dataset {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DatasetError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = file_name
            .split('.')
            .next()
            .unwrap_or(file_name.as_str())
            .to_owned();
        let extension = if file_name.contains('.') {
            file_name.rsplit('.').next().expect("never fails").to_owned()
        } else {
            String::new()
        };

        let delimiter = sniff_delimiter(&text);
        let table = parse_table(&text, delimiter, path)?;

        Ok(Self {
            name,
            extension,
            delimiter,
            table,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn variant_file_name(&self, iteration: usize) -> String {
        if self.extension.is_empty() {
            format!("{}_{}", self.name, iteration)
        } else {
            format!("{}_{}.{}", self.name, iteration, self.extension)
        }
    }

    /// Writes one variant to `<out_root>/<name>/<name>_<iteration>.<ext>`.
    ///
    /// The variant is serialized to a temporary file in the destination
    /// directory and renamed into place, so an interrupted write never leaves
    /// a partial output file behind.
    pub fn write_variant(
        &self,
        out_root: &Path,
        iteration: usize,
        variant: &Table,
    ) -> Result<PathBuf, DatasetError> {
        let dir = out_root.join(&self.name);
        std::fs::create_dir_all(&dir).map_err(|source| DatasetError::Write {
            path: dir.clone(),
            source,
        })?;
        let target = dir.join(self.variant_file_name(iteration));

        let tmp = NamedTempFile::new_in(&dir).map_err(|source| DatasetError::Write {
            path: target.clone(),
            source,
        })?;
        {
            let mut writer = csv::WriterBuilder::new()
                .delimiter(self.delimiter)
                .from_writer(tmp.as_file());
            for row in 0..variant.rows_len() {
                let record = variant
                    .row(row)
                    .map(|v| v.to_string())
                    .chain(std::iter::once(variant.labels()[row].clone()));
                writer
                    .write_record(record)
                    .map_err(|source| DatasetError::Serialize {
                        path: target.clone(),
                        source,
                    })?;
            }
            writer.flush().map_err(|source| DatasetError::Write {
                path: target.clone(),
                source,
            })?;
        }
        tmp.persist(&target).map_err(|e| DatasetError::Write {
            path: target.clone(),
            source: e.error,
        })?;

        Ok(target)
    }
}

fn sniff_delimiter(text: &str) -> u8 {
    let line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");

    let mut best = b',';
    let mut best_count = 0;
    for &candidate in DELIMITER_CANDIDATES {
        let count = line.bytes().filter(|&b| b == candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

fn parse_table(text: &str, delimiter: u8, path: &Path) -> Result<Table, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut features: Vec<Vec<f64>> = Vec::new();
    let mut labels = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|source| DatasetError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
        if record.is_empty() {
            continue;
        }
        if labels.is_empty() {
            features = vec![Vec::new(); record.len() - 1];
        }

        // The reader is non-flexible, so every record has the same length as
        // the first one.
        let label_index = record.len() - 1;
        for (column, field) in record.iter().enumerate() {
            if column == label_index {
                labels.push(field.to_owned());
            } else {
                let value = field
                    .parse::<f64>()
                    .map_err(|_| DatasetError::NonNumericFeature {
                        path: path.to_path_buf(),
                        line: row + 1,
                        column,
                        value: field.to_owned(),
                    })?;
                features[column].push(value);
            }
        }
    }

    Table::new(features, labels).map_err(|source| DatasetError::Table {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read {}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to serialize {}", path.display())]
    Serialize { path: PathBuf, source: csv::Error },

    #[error("{} is not a rectangular table", path.display())]
    Malformed { path: PathBuf, source: csv::Error },

    #[error("{}: line {line}, column {column}: {value:?} is not numeric", path.display())]
    NonNumericFeature {
        path: PathBuf,
        line: usize,
        column: usize,
        value: String,
    },

    #[error("{}", path.display())]
    Table { path: PathBuf, source: TableError },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::augment::{AugmentOptions, Augmentor};
    use std::num::NonZeroUsize;

    fn write_input(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).expect("never fails");
        path
    }

    #[test]
    fn loads_comma_delimited_files() -> Result<(), anyhow::Error> {
        let dir = tempfile::tempdir()?;
        let path = write_input(dir.path(), "glass.txt", "1.1,2.2,1\n3.3,4.4,2\n");

        let dataset = Dataset::load(&path)?;
        assert_eq!(dataset.name(), "glass");
        assert_eq!(dataset.table().rows_len(), 2);
        assert_eq!(dataset.table().features_len(), 2);
        assert_eq!(dataset.table().feature(0), &[1.1, 3.3]);
        assert_eq!(dataset.table().labels(), &["1".to_owned(), "2".to_owned()]);
        Ok(())
    }

    #[test]
    fn loads_tab_and_space_delimited_files() -> Result<(), anyhow::Error> {
        let dir = tempfile::tempdir()?;

        let tabs = Dataset::load(write_input(dir.path(), "a.tsv", "1\t2\tx\n3\t4\ty\n"))?;
        assert_eq!(tabs.table().features_len(), 2);
        assert_eq!(tabs.table().labels(), &["x".to_owned(), "y".to_owned()]);

        let spaces = Dataset::load(write_input(dir.path(), "b.dat", "1 2 x\n3 4 y\n"))?;
        assert_eq!(spaces.table().features_len(), 2);
        assert_eq!(spaces.table().feature(1), &[2.0, 4.0]);
        Ok(())
    }

    #[test]
    fn rejects_ragged_rows() -> Result<(), anyhow::Error> {
        let dir = tempfile::tempdir()?;
        let path = write_input(dir.path(), "ragged.csv", "1,2,3\n4,5\n");
        assert!(matches!(
            Dataset::load(&path),
            Err(DatasetError::Malformed { .. })
        ));
        Ok(())
    }

    #[test]
    fn rejects_non_numeric_feature_cells() -> Result<(), anyhow::Error> {
        let dir = tempfile::tempdir()?;
        let path = write_input(dir.path(), "bad.csv", "1,2,a\noops,5,b\n");
        assert!(matches!(
            Dataset::load(&path),
            Err(DatasetError::NonNumericFeature { line: 2, column: 0, .. })
        ));
        Ok(())
    }

    #[test]
    fn rejects_empty_files_before_writing_anything() -> Result<(), anyhow::Error> {
        let dir = tempfile::tempdir()?;
        let path = write_input(dir.path(), "empty.csv", "");
        assert!(matches!(
            Dataset::load(&path),
            Err(DatasetError::Table {
                source: TableError::EmptyTable,
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn writes_variants_in_the_source_format() -> Result<(), anyhow::Error> {
        let dir = tempfile::tempdir()?;
        let path = write_input(dir.path(), "iris.data", "1.5\t2.5\tsetosa\n3.5\t4.5\tvirginica\n");
        let out_root = dir.path().join("augmented_datasets");

        let dataset = Dataset::load(&path)?;
        let written = dataset.write_variant(&out_root, 3, dataset.table())?;
        assert_eq!(written, out_root.join("iris").join("iris_3.data"));

        let contents = std::fs::read_to_string(&written)?;
        assert_eq!(contents, "1.5\t2.5\tsetosa\n3.5\t4.5\tvirginica\n");

        // A written variant is itself loadable.
        let reloaded = Dataset::load(&written)?;
        assert_eq!(reloaded.table(), dataset.table());
        Ok(())
    }

    #[test]
    fn augments_a_file_end_to_end() -> Result<(), anyhow::Error> {
        let mut rows = String::new();
        for r in 0..10 {
            rows.push_str(&format!("{0}.5,{0}.25,{0}.125,{0}.0625,{1}\n", r, r % 3));
        }

        let dir = tempfile::tempdir()?;
        let path = write_input(dir.path(), "glass.txt", &rows);
        let out_root = dir.path().join("augmented_datasets");

        let dataset = Dataset::load(&path)?;
        let options = AugmentOptions::new()
            .iterations(NonZeroUsize::new(3).expect("never fails"))
            .seed(7);
        let augmentor = Augmentor::new(dataset.table(), options)?;

        let mut written = Vec::new();
        for (i, variant) in augmentor.enumerate() {
            written.push(dataset.write_variant(&out_root, i + 1, &variant)?);
        }

        assert_eq!(written.len(), 3);
        for (i, path) in written.iter().enumerate() {
            assert_eq!(
                path,
                &out_root.join("glass").join(format!("glass_{}.txt", i + 1))
            );
            let variant = Dataset::load(path)?;
            // floor(10 * 0.02) == 0: no rows removed, labels untouched.
            assert_eq!(variant.table().rows_len(), 10);
            assert_eq!(variant.table().features_len(), 4);
            assert_eq!(variant.table().labels(), dataset.table().labels());
            assert!(variant.table().feature(0) != dataset.table().feature(0));
        }
        Ok(())
    }
}
