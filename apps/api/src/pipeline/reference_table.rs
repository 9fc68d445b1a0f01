//! Reference table ("scope configuration") — the operator-supplied sizing grid
//! used as grounding for the estimation call.
//!
//! Loaded fresh on every estimation; never written.

use std::fs::File;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Reader};
use thiserror::Error;

/// Extensions searched by `locate_in_dir`, in priority order.
const TABLE_EXTENSIONS: &[&str] = &["xlsx", "xls", "csv"];

#[derive(Debug, Error)]
pub enum TableError {
    #[error("cannot open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("spreadsheet {} has no worksheets", .0.display())]
    NoWorksheet(PathBuf),
}

/// Rows × named columns, all cells as text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReferenceTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ReferenceTable {
    /// Builds a table, padding or cutting each row to the header width.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Loads a `.csv` file, or any other extension as a spreadsheet (first worksheet).
    pub fn load(path: &Path) -> Result<Self, TableError> {
        let file = File::open(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

        if is_csv {
            Self::from_csv(file)
        } else {
            drop(file);
            Self::from_spreadsheet(path)
        }
    }

    fn from_csv(reader: impl std::io::Read) -> Result<Self, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let lossy = |record: &csv::ByteRecord| -> Vec<String> {
            record
                .iter()
                .map(|field| String::from_utf8_lossy(field).trim().to_string())
                .collect()
        };

        let columns = lossy(reader.byte_headers()?);
        let mut rows = Vec::new();
        for record in reader.byte_records() {
            rows.push(lossy(&record?));
        }
        Ok(Self::new(columns, rows))
    }

    fn from_spreadsheet(path: &Path) -> Result<Self, TableError> {
        let mut workbook = open_workbook_auto(path)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| TableError::NoWorksheet(path.to_path_buf()))??;

        let mut rows = range
            .rows()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.to_string().trim().to_string())
                    .collect::<Vec<String>>()
            });
        let columns: Vec<String> = rows.next().unwrap_or_default();
        Ok(Self::new(columns, rows.collect()))
    }

    #[allow(dead_code)]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Keeps the first `n` rows.
    pub fn head(mut self, n: usize) -> Self {
        self.rows.truncate(n);
        self
    }

    /// Keeps only columns whose lowercased name contains one of `keywords`.
    /// Returns the table unchanged when no column matches.
    pub fn retain_matching_columns(self, keywords: &[&str]) -> Self {
        let keep: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, name)| {
                let name = name.to_lowercase();
                keywords.iter().any(|k| name.contains(k))
            })
            .map(|(i, _)| i)
            .collect();

        if keep.is_empty() {
            return self;
        }

        let project = |row: &[String]| keep.iter().map(|&i| row[i].clone()).collect::<Vec<_>>();
        Self {
            columns: project(&self.columns),
            rows: self.rows.iter().map(|r| project(r)).collect(),
        }
    }

    /// Renders the table as an aligned text grid with a leading row index.
    pub fn render(&self) -> String {
        if self.columns.is_empty() {
            return "(empty table)".to_string();
        }

        let index_width = self.rows.len().saturating_sub(1).to_string().len();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                self.rows
                    .iter()
                    .map(|r| r[i].chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let line = |index: &str, cells: &[String]| -> String {
            let mut out = format!("{index:<index_width$}");
            for (cell, &width) in cells.iter().zip(&widths) {
                out.push_str("  ");
                out.push_str(&format!("{cell:<width$}"));
            }
            out.trim_end().to_string()
        };

        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        lines.push(line("", &self.columns));
        for (i, row) in self.rows.iter().enumerate() {
            lines.push(line(&i.to_string(), row));
        }
        lines.join("\n")
    }
}

/// Finds the reference table in `dir`: the first `.xlsx`, else `.xls`, else `.csv` file.
pub fn locate_in_dir(dir: &Path) -> Option<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    TABLE_EXTENSIONS.iter().find_map(|ext| {
        files
            .iter()
            .find(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case(ext))
            })
            .cloned()
    })
}
