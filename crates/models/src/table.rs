use serde::{Deserialize, Serialize};
use std::fmt::{Display as FmtDisplay, Formatter, Result as FmtResult};
use strum::{AsRefStr, Display, EnumIter, EnumProperty, EnumString, IntoEnumIterator};

/// Identifies one of the four imported tables
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    EnumProperty,
)]
pub enum TableId {
    #[strum(props(file = "classes.csv"))]
    Classes,
    #[strum(props(file = "teachers.csv"))]
    Teachers,
    #[strum(props(file = "rooms.csv"))]
    Rooms,
    #[strum(props(file = "student_groups.csv"))]
    StudentGroups,
}

impl TableId {
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }

    /// Conventional file name of the table's CSV source
    pub fn file_name(&self) -> &'static str {
        self.get_str("file").unwrap_or_default()
    }

    /// Accessor names of the table's columns, in positional order
    pub fn accessors(&self) -> &'static [&'static str] {
        match self {
            Self::Classes => &[
                "id",
                "name",
                "teachers",
                "candidate_rooms",
                "student_groups",
                "num_of_students",
            ],
            Self::Teachers => &["id", "name"],
            Self::Rooms => &["id", "name", "capacity"],
            Self::StudentGroups => &["id", "name"],
        }
    }

    pub fn all() -> Vec<TableId> {
        TableId::iter().collect()
    }
}

/// A column of an imported table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Header text as it appeared in the source
    pub header: String,
    /// Stable key the column is addressed by
    pub accessor: String,
}

/// Error returned when editing a cell outside the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellOutOfRange {
    pub row: usize,
    pub column: usize,
}

impl FmtDisplay for CellOutOfRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "No cell at row {}, column {}", self.row, self.column)
    }
}

impl std::error::Error for CellOutOfRange {}

/// Columns and rows of one imported table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
}

impl TableSnapshot {
    pub fn new(columns: Vec<Column>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    /// Builds a snapshot for `table`, pairing `headers` with the table's accessors.
    ///
    /// Headers beyond the known accessors keep a positional accessor (`column_<n>`).
    pub fn with_headers(table: TableId, headers: &[String], rows: Vec<Vec<String>>) -> Self {
        let accessors = table.accessors();
        let columns = headers
            .iter()
            .enumerate()
            .map(|(i, header)| Column {
                header: header.clone(),
                accessor: accessors
                    .get(i)
                    .map_or_else(|| format!("column_{i}"), |a| a.to_string()),
            })
            .collect();

        Self { columns, rows }
    }

    /// Value at (`row`, `column`), if present
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    /// Replaces the value at (`row`, `column`)
    pub fn set_cell(
        &mut self,
        row: usize,
        column: usize,
        value: impl Into<String>,
    ) -> Result<(), CellOutOfRange> {
        let slot = self
            .rows
            .get_mut(row)
            .and_then(|r| r.get_mut(column))
            .ok_or(CellOutOfRange { row, column })?;
        *slot = value.into();

        Ok(())
    }

    /// Position of the column named by `accessor`
    pub fn column_index(&self, accessor: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.accessor == accessor)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The four raw tables the normalizer consumes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTables {
    pub classes: TableSnapshot,
    pub teachers: TableSnapshot,
    pub rooms: TableSnapshot,
    pub student_groups: TableSnapshot,
}

impl RawTables {
    pub fn get(&self, table: TableId) -> &TableSnapshot {
        match table {
            TableId::Classes => &self.classes,
            TableId::Teachers => &self.teachers,
            TableId::Rooms => &self.rooms,
            TableId::StudentGroups => &self.student_groups,
        }
    }

    pub fn get_mut(&mut self, table: TableId) -> &mut TableSnapshot {
        match table {
            TableId::Classes => &mut self.classes,
            TableId::Teachers => &mut self.teachers,
            TableId::Rooms => &mut self.rooms,
            TableId::StudentGroups => &mut self.student_groups,
        }
    }
}
