//! CSV dataset scanning for the data folder.
//!
//! Reads identity and shape only: header names, row count, missing cells
//! per column and a numeric/text/empty classification per column.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use tabula_core::dataset::{ColumnKind, DatasetSchema, InMemoryDatasets};
use tabula_core::DatasetError;

/// File extensions picked up from the data folder.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["csv"];

/// Cell values treated as missing, compared case-insensitively after trimming.
const MISSING_MARKERS: &[&str] = &["", "na", "n/a", "nan", "null", "none", "#n/a"];

/// Sorted names of the supported files in `dir`. A missing folder is empty.
pub fn list_data_files(dir: &Path) -> Result<Vec<String>, DatasetError> {
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "data folder does not exist");
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file()
            && is_supported(&path)
            && let Some(name) = path.file_name().and_then(|n| n.to_str())
        {
            files.push(name.to_string());
        }
    }
    files.sort();
    Ok(files)
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn is_missing(cell: &str) -> bool {
    let cell = cell.trim();
    MISSING_MARKERS.iter().any(|m| cell.eq_ignore_ascii_case(m))
}

/// Scan one CSV file into a [`DatasetSchema`].
pub fn load_csv_schema(path: &Path) -> Result<DatasetSchema, DatasetError> {
    let file = path.display().to_string();
    let parse_err = |e: csv::Error| DatasetError::Parse {
        file: file.clone(),
        reason: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(parse_err)?;
    let columns: Vec<String> = reader
        .headers()
        .map_err(parse_err)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let width = columns.len();
    let mut nulls = vec![0usize; width];
    let mut numeric = vec![true; width];
    let mut rows = 0usize;

    for record in reader.records() {
        let record = record.map_err(parse_err)?;
        rows += 1;
        for col in 0..width {
            match record.get(col) {
                Some(cell) if !is_missing(cell) => {
                    if cell.trim().parse::<f64>().is_err() {
                        numeric[col] = false;
                    }
                }
                _ => nulls[col] += 1,
            }
        }
    }

    let kinds = (0..width)
        .map(|col| {
            if nulls[col] == rows {
                ColumnKind::Empty
            } else if numeric[col] {
                ColumnKind::Numeric
            } else {
                ColumnKind::Text
            }
        })
        .collect();

    let mut schema = DatasetSchema::new(columns, rows);
    schema.null_counts = nulls;
    schema.kinds = kinds;
    Ok(schema)
}

/// Scan `name` from `dir`, register it and make it active.
///
/// `name` must be a bare file name inside `dir`.
pub fn load_into(
    datasets: &InMemoryDatasets,
    dir: &Path,
    name: &str,
) -> Result<DatasetSchema, DatasetError> {
    let path = resolve(dir, name)?;
    if !is_supported(&path) {
        return Err(DatasetError::Parse {
            file: name.to_string(),
            reason: "unsupported file format".into(),
        });
    }

    let schema = load_csv_schema(&path)?;
    datasets.insert(name, schema.clone())?;
    info!(file = %name, rows = schema.rows, cols = schema.cols, "dataset loaded");
    Ok(schema)
}

fn resolve(dir: &Path, name: &str) -> Result<PathBuf, DatasetError> {
    let bare = Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name);
    let path = dir.join(name);
    if !bare || !path.is_file() {
        return Err(DatasetError::NotFound(format!(
            "File '{name}' not found in data folder"
        )));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::DatasetContextProvider;

    fn write(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    #[test]
    fn list_only_supported_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.csv", "x\n1\n");
        write(dir.path(), "a.CSV", "x\n1\n");
        write(dir.path(), "notes.txt", "hi");
        std::fs::create_dir(dir.path().join("nested.csv")).unwrap();

        assert_eq!(list_data_files(dir.path()).unwrap(), vec!["a.CSV", "b.csv"]);
    }

    #[test]
    fn list_missing_folder_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_data_files(&dir.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn schema_counts_rows_nulls_and_kinds() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "sales.csv",
            "date, sales ,region,notes\n\
             2024-01-01,100,north,\n\
             2024-01-02,NA,south,\n\
             2024-01-03,250.5,,\n",
        );
        let schema = load_csv_schema(&dir.path().join("sales.csv")).unwrap();

        assert_eq!(schema.columns, vec!["date", "sales", "region", "notes"]);
        assert_eq!(schema.rows, 3);
        assert_eq!(schema.cols, 4);
        assert_eq!(schema.null_counts, vec![0, 1, 1, 3]);
        assert_eq!(
            schema.kinds,
            vec![
                ColumnKind::Text,
                ColumnKind::Numeric,
                ColumnKind::Text,
                ColumnKind::Empty
            ]
        );
        assert_eq!(schema.total_missing(), 5);
    }

    #[test]
    fn short_rows_count_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "ragged.csv", "a,b,c\n1,2,3\n4\n");
        let schema = load_csv_schema(&dir.path().join("ragged.csv")).unwrap();
        assert_eq!(schema.rows, 2);
        assert_eq!(schema.null_counts, vec![0, 1, 1]);
    }

    #[test]
    fn header_only_file_has_no_rows() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "empty.csv", "a,b\n");
        let schema = load_csv_schema(&dir.path().join("empty.csv")).unwrap();
        assert_eq!(schema.rows, 0);
        assert_eq!(schema.kinds, vec![ColumnKind::Empty, ColumnKind::Empty]);
    }

    #[test]
    fn invalid_utf8_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bin.csv"), b"a,b\n\xff\xfe,1\n").unwrap();
        let err = load_csv_schema(&dir.path().join("bin.csv")).unwrap_err();
        assert!(matches!(err, DatasetError::Parse { .. }));
    }

    #[test]
    fn load_into_registers_and_activates() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "first.csv", "x\n1\n");
        write(dir.path(), "second.csv", "y,z\n1,2\n");
        let datasets = InMemoryDatasets::new();

        load_into(&datasets, dir.path(), "first.csv").unwrap();
        load_into(&datasets, dir.path(), "second.csv").unwrap();

        assert_eq!(
            datasets.loaded_files().unwrap(),
            vec!["first.csv".to_string(), "second.csv".to_string()]
        );
        assert_eq!(datasets.current_identity().unwrap().as_deref(), Some("second.csv"));
    }

    #[test]
    fn load_into_rejects_missing_and_escaping_names() {
        let dir = tempfile::tempdir().unwrap();
        let datasets = InMemoryDatasets::new();

        for name in ["missing.csv", "../etc/passwd", ""] {
            let err = load_into(&datasets, dir.path(), name).unwrap_err();
            assert!(matches!(err, DatasetError::NotFound(_)), "{name}");
        }
        assert!(!datasets.is_loaded().unwrap());
    }

    #[test]
    fn load_into_rejects_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "report.xlsx", "binary");
        let err = load_into(&InMemoryDatasets::new(), dir.path(), "report.xlsx").unwrap_err();
        assert!(err.to_string().contains("unsupported file format"));
    }
}
