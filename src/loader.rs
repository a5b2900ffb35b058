//! CSV loading into an untyped, row-ordered table.

use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim};
use log::debug;

use crate::error::{ReportError, Result};

/// Columns every input file must provide.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "Name",
    "Affinity",
    "HP",
    "ATK",
    "DEF",
    "CritRate",
    "CritDamage",
    "SPD",
    "ACC",
    "RES",
    "Rank",
    "Level",
];

/// Cell contents read as a missing value rather than as data.
pub const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Whether `cell` is blank or one of the [`MISSING_MARKERS`].
pub fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell.trim())
}

/// Header names and raw cell values in file order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawTable {
    source: PathBuf,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

fn normalize_header(raw: &str) -> String {
    raw.trim().trim_start_matches('\u{feff}').trim().to_string()
}

impl RawTable {
    /// Reads the CSV file at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ReportError::InputNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ReportError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Self::from_reader(file, path)
    }

    /// Reads CSV data from any reader; `source` names it in errors.
    pub fn from_reader<R: io::Read>(reader: R, source: impl AsRef<Path>) -> Result<Self> {
        let source = source.as_ref().to_path_buf();
        let csv_error = |err: csv::Error| ReportError::Csv {
            path: source.clone(),
            source: err,
        };

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(normalize_header)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        debug!(
            "Loaded {} rows with {} columns from {}",
            rows.len(),
            headers.len(),
            source.display()
        );

        Ok(Self {
            source,
            headers,
            rows,
        })
    }

    /// Where the table was read from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Column names in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows in file order.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the column called `name`, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// Index of a column that must be present.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| ReportError::MissingColumn {
                column: name.to_string(),
                path: self.source.clone(),
            })
    }

    /// Fails with [`ReportError::MissingColumn`] for the first absent required column.
    pub fn ensure_required_columns(&self) -> Result<()> {
        for column in REQUIRED_COLUMNS {
            self.require_column(column)?;
        }
        Ok(())
    }

    /// Cell at `row`/`column`; rows are rectangular so this only fails on bad indices.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|values| values.get(column))
            .map(String::as_str)
    }

    /// Inferred value kind of every column, in header order.
    pub fn column_kinds(&self) -> Vec<(String, ColumnKind)> {
        self.headers
            .iter()
            .enumerate()
            .map(|(index, header)| {
                let cells = self.rows.iter().filter_map(|row| row.get(index));
                (header.clone(), ColumnKind::infer(cells.map(String::as_str)))
            })
            .collect()
    }
}

/// Value kind of a raw column, as reported in the type dump after loading.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    Text,
}

impl ColumnKind {
    /// Infers the kind from raw cells. Empty cells are missing values, which force integer
    /// columns to float and leave an all-empty column as float.
    pub fn infer<'a>(cells: impl IntoIterator<Item = &'a str>) -> Self {
        let mut saw_value = false;
        let mut saw_missing = false;
        let mut all_integer = true;

        for cell in cells {
            let cell = cell.trim();
            if is_missing(cell) {
                saw_missing = true;
                continue;
            }
            saw_value = true;
            if cell.parse::<i64>().is_ok() {
                continue;
            }
            if cell.parse::<f64>().is_ok() {
                all_integer = false;
                continue;
            }
            return ColumnKind::Text;
        }

        if saw_value && all_integer && !saw_missing {
            ColumnKind::Integer
        } else {
            ColumnKind::Float
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColumnKind::Integer => "integer",
            ColumnKind::Float => "float",
            ColumnKind::Text => "text",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\u{feff}Name, Affinity ,HP\nAria,1,100\nBryn,2,\n";

    #[test]
    fn reads_headers_and_rows_in_order() {
        let table = RawTable::from_reader(SAMPLE.as_bytes(), "sample.csv").expect("load");
        assert_eq!(table.headers(), ["Name", "Affinity", "HP"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, 0), Some("Aria"));
        assert_eq!(table.cell(1, 2), Some(""));
        assert_eq!(table.column_index("HP"), Some(2));
    }

    #[test]
    fn infers_column_kinds() {
        let table = RawTable::from_reader(SAMPLE.as_bytes(), "sample.csv").expect("load");
        let kinds = table.column_kinds();
        assert_eq!(kinds[0], ("Name".to_string(), ColumnKind::Text));
        assert_eq!(kinds[1], ("Affinity".to_string(), ColumnKind::Integer));
        assert_eq!(kinds[2], ("HP".to_string(), ColumnKind::Float));
        assert_eq!(ColumnKind::infer(Vec::<&str>::new()), ColumnKind::Float);
    }

    #[test]
    fn missing_markers_do_not_make_a_column_text() {
        assert_eq!(ColumnKind::infer(["100", "NA", "250"]), ColumnKind::Float);
        assert_eq!(ColumnKind::infer(["1.5", "null", "N/A", "-NaN"]), ColumnKind::Float);
        assert_eq!(ColumnKind::infer(["100", "n.a."]), ColumnKind::Text);
        assert!(is_missing("  NULL "));
        assert!(!is_missing("none"));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = RawTable::from_reader("A,B\n1,2,3\n".as_bytes(), "ragged.csv").unwrap_err();
        assert!(matches!(err, ReportError::Csv { .. }));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = RawTable::from_path("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, ReportError::InputNotFound { .. }));
    }

    #[test]
    fn missing_required_column_is_named() {
        let table = RawTable::from_reader(SAMPLE.as_bytes(), "sample.csv").expect("load");
        match table.ensure_required_columns() {
            Err(ReportError::MissingColumn { column, .. }) => assert_eq!(column, "ATK"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
