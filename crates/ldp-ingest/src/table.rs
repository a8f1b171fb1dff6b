//! In-memory tabular resource
//!
//! A [`Table`] is one parsed CSV resource: a header plus rows of string
//! cells. Cells stay untyped; the schema contract decides what a column
//! means during validation. Each table is owned by exactly one ingestion
//! task and dropped as soon as it is committed or rejected.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;

/// A parsed CSV resource with named columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    /// Parse a headed CSV document.
    ///
    /// Ragged rows are tolerated the way a permissive reader would: short
    /// rows are padded with empty cells, long rows truncated to the header
    /// width.
    pub fn from_csv<R: io::Read>(reader: R) -> Result<Self, csv::Error> {
        let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let columns: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let width = columns.len();
        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(|c| c.to_string()).collect();
            row.resize(width, String::new());
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell value at (row, column index); absent cells read as empty.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// A new table containing only the named columns, in the given order.
    /// Unknown names are ignored.
    pub fn select_columns(&self, names: &[String]) -> Table {
        let indices: Vec<usize> = names
            .iter()
            .filter_map(|n| self.column_index(n))
            .collect();

        let columns = indices.iter().map(|&i| self.columns[i].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();

        Table { columns, rows }
    }

    /// Concatenate tables in order, uniting their columns.
    ///
    /// The combined header is the union of all headers in first-seen order;
    /// cells for columns a table does not carry are null (empty). This is
    /// how partial-column files from different catalog years combine into
    /// one dataset.
    pub fn concat(tables: Vec<Table>) -> Table {
        let mut columns: Vec<String> = Vec::new();
        for table in &tables {
            for col in &table.columns {
                if !columns.contains(col) {
                    columns.push(col.clone());
                }
            }
        }

        let mut rows = Vec::new();
        for table in tables {
            let mapping: Vec<Option<usize>> =
                columns.iter().map(|c| table.column_index(c)).collect();
            for row in &table.rows {
                rows.push(
                    mapping
                        .iter()
                        .map(|idx| idx.map(|i| row[i].clone()).unwrap_or_default())
                        .collect(),
                );
            }
        }

        Table { columns, rows }
    }

    /// Write the table as CSV, optionally including the header row.
    pub fn write_csv<W: io::Write>(&self, writer: W, header: bool) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        if header {
            csv_writer.write_record(&self.columns)?;
        }
        for row in &self.rows {
            csv_writer.write_record(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Append the table's rows to a CSV file, creating it if needed.
    /// The header is written only when `header` is set (first commit).
    pub fn append_to_path(&self, path: &Path, header: bool) -> Result<(), csv::Error> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        self.write_csv(file, header)
    }
}
