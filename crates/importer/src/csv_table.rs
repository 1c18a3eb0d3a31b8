use csv::ReaderBuilder;
use models::table::{RawTables, TableId, TableSnapshot};
use std::{fs::File, io::Read, path::Path};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to (de)serialize table: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0} table has no header row")]
    MissingHeader(TableId),
    #[error("{0} table has not been imported")]
    Missing(TableId),
    #[error(transparent)]
    Edit(#[from] models::table::CellOutOfRange),
}

/// Drops empty trailing fields so stray separators do not become columns
fn trim_record(record: &csv::StringRecord) -> Vec<String> {
    let mut fields: Vec<String> = record.iter().map(str::to_string).collect();
    while fields.last().is_some_and(|f| f.trim().is_empty()) {
        fields.pop();
    }
    fields
}

/// Reads one table from CSV.
///
/// The first non-empty record holds the column headers, every following
/// non-empty record is a row.
///
/// # Arguments
/// * `table` - Which table the data belongs to, used to name the columns
/// * `reader` - Source of the CSV text
///
/// # Returns
/// The parsed [`TableSnapshot`], or an error if the CSV is malformed or has no header
pub fn read_table<R: Read>(table: TableId, reader: R) -> Result<TableSnapshot, TableError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    for result in rdr.records() {
        let fields = trim_record(&result?);
        if !fields.is_empty() {
            records.push(fields);
        }
    }

    let mut records = records.into_iter();
    let headers = records.next().ok_or(TableError::MissingHeader(table))?;

    Ok(TableSnapshot::with_headers(table, &headers, records.collect()))
}

/// Reads one table from the CSV file at `path`
pub fn read_table_file(table: TableId, path: &Path) -> Result<TableSnapshot, TableError> {
    let file = File::open(path)?;
    read_table(table, file)
}

/// Reads all four tables from `dir`, each from its conventional file name
pub fn read_tables_dir(dir: &Path) -> Result<RawTables, TableError> {
    let mut tables = RawTables::default();
    for table in TableId::all() {
        *tables.get_mut(table) = read_table_file(table, &dir.join(table.file_name()))?;
    }

    Ok(tables)
}
