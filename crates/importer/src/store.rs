use crate::csv_table::TableError;
use log::debug;
use models::table::{RawTables, TableId, TableSnapshot};
use std::{
    collections::HashMap,
    fs::{self, File},
    io::{BufReader, BufWriter, ErrorKind, Write},
    path::PathBuf,
};

/// Keyed cache of the last imported version of each table.
///
/// The store is not the system of record: the scheduling backend owns the
/// normalized input once it has been submitted.
pub trait TableStore {
    fn get(&self, table: TableId) -> Result<Option<TableSnapshot>, TableError>;

    fn put(&mut self, table: TableId, snapshot: TableSnapshot) -> Result<(), TableError>;

    fn remove(&mut self, table: TableId) -> Result<(), TableError>;

    /// Changes one cell of a stored table and writes the table back
    fn edit_cell(
        &mut self,
        table: TableId,
        row: usize,
        column: usize,
        value: &str,
    ) -> Result<(), TableError> {
        let mut snapshot = self.get(table)?.ok_or(TableError::Missing(table))?;
        snapshot.set_cell(row, column, value)?;
        self.put(table, snapshot)
    }

    /// Collects all four tables, failing if any has not been imported
    fn raw_tables(&self) -> Result<RawTables, TableError> {
        let mut tables = RawTables::default();
        for table in TableId::all() {
            *tables.get_mut(table) = self.get(table)?.ok_or(TableError::Missing(table))?;
        }

        Ok(tables)
    }
}

/// Tables kept for the lifetime of the session
#[derive(Debug, Clone, Default)]
pub struct MemoryTableStore {
    tables: HashMap<TableId, TableSnapshot>,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TableStore for MemoryTableStore {
    fn get(&self, table: TableId) -> Result<Option<TableSnapshot>, TableError> {
        Ok(self.tables.get(&table).cloned())
    }

    fn put(&mut self, table: TableId, snapshot: TableSnapshot) -> Result<(), TableError> {
        self.tables.insert(table, snapshot);
        Ok(())
    }

    fn remove(&mut self, table: TableId) -> Result<(), TableError> {
        self.tables.remove(&table);
        Ok(())
    }
}

/// Tables written as one JSON file each inside a directory
#[derive(Debug, Clone)]
pub struct FileTableStore {
    dir: PathBuf,
}

impl FileTableStore {
    /// Opens a store rooted at `dir`, creating the directory if necessary
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, TableError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        Ok(Self { dir })
    }

    fn path(&self, table: TableId) -> PathBuf {
        self.dir.join(format!("{}.json", table.as_str()))
    }
}

impl TableStore for FileTableStore {
    fn get(&self, table: TableId) -> Result<Option<TableSnapshot>, TableError> {
        let file = match File::open(self.path(table)) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(serde_json::from_reader(BufReader::new(file))?))
    }

    fn put(&mut self, table: TableId, snapshot: TableSnapshot) -> Result<(), TableError> {
        let path = self.path(table);
        debug!("Writing {} rows of {table} to {}", snapshot.rows.len(), path.display());

        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, &snapshot)?;
        writer.flush()?;
        Ok(())
    }

    fn remove(&mut self, table: TableId) -> Result<(), TableError> {
        match fs::remove_file(self.path(table)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
