use log::{info, warn};
use models::{
    entity::{Class, Input, Named, Reference, Room, StudentGroup, Teacher},
    table::{RawTables, TableId, TableSnapshot},
};
use std::str::FromStr;
use thiserror::Error;

/// What to do with a name that matches no entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReferencePolicy {
    /// Keep the `-1` sentinel and report the name in [`Normalized::unresolved`]
    #[default]
    Propagate,
    /// Fail with [`NormalizeError::UnresolvedReference`]
    Reject,
}

/// A name in a class row that did not match any entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    /// Row of the class in the classes table
    pub class_row: usize,
    /// Table the name was looked up in
    pub table: TableId,
    pub name: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("{table} row {row} has no column {column}")]
    MissingColumn {
        table: TableId,
        row: usize,
        column: usize,
    },
    #[error("{table} row {row}, column {column}: '{value}' is not a valid number")]
    InvalidNumber {
        table: TableId,
        row: usize,
        column: usize,
        value: String,
    },
    #[error("class row {} references unknown {} entry '{}'", .0.class_row, .0.table, .0.name)]
    UnresolvedReference(UnresolvedReference),
}

/// Result of a successful normalization
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub input: Input,
    /// Every name that resolved to the `-1` sentinel, in row order
    pub unresolved: Vec<UnresolvedReference>,
}

impl Normalized {
    pub fn is_fully_resolved(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Converts raw tables into entity collections
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    pub policy: ReferencePolicy,
}

/// Normalizes `tables` keeping unresolved names as `-1`
pub fn normalize(tables: &RawTables) -> Result<Normalized, NormalizeError> {
    Normalizer::default().normalize(tables)
}

impl Normalizer {
    pub fn new(policy: ReferencePolicy) -> Self {
        Self { policy }
    }

    /// Builds teachers, rooms and student groups, then the classes that refer to them.
    ///
    /// # Arguments
    /// * `tables` - The four imported tables, header rows already removed
    ///
    /// # Returns
    /// The cross-referenced [`Input`] together with every unresolved name
    pub fn normalize(&self, tables: &RawTables) -> Result<Normalized, NormalizeError> {
        let teachers = build_teachers(&tables.teachers)?;
        let rooms = build_rooms(&tables.rooms)?;
        let student_groups = build_student_groups(&tables.student_groups)?;

        // Classes go last: their name lists resolve against the collections above
        let mut unresolved = Vec::new();
        let mut classes = Vec::with_capacity(tables.classes.rows.len());
        for (index, row) in tables.classes.rows.iter().enumerate() {
            let mut resolver = Resolver {
                class_row: index,
                policy: self.policy,
                unresolved: &mut unresolved,
            };

            classes.push(Class {
                id: parse_number(TableId::Classes, index, row, 0)?,
                index,
                name: field(TableId::Classes, index, row, 1)?.to_string(),
                teacher_indexes: resolver.resolve(
                    TableId::Teachers,
                    &teachers,
                    field(TableId::Classes, index, row, 2)?,
                )?,
                room_candidates_indexes: resolver.resolve(
                    TableId::Rooms,
                    &rooms,
                    field(TableId::Classes, index, row, 3)?,
                )?,
                students_group_indexes: resolver.resolve(
                    TableId::StudentGroups,
                    &student_groups,
                    field(TableId::Classes, index, row, 4)?,
                )?,
                num_of_students: parse_number(TableId::Classes, index, row, 5)?,
            });
        }

        info!(
            "Normalized {} classes, {} teachers, {} rooms, {} student groups",
            classes.len(),
            teachers.len(),
            rooms.len(),
            student_groups.len()
        );
        if !unresolved.is_empty() {
            warn!("{} names could not be resolved", unresolved.len());
        }

        Ok(Normalized {
            input: Input {
                classes,
                rooms,
                student_groups,
                teachers,
            },
            unresolved,
        })
    }
}

/// Resolves the name lists of one class row
struct Resolver<'a> {
    class_row: usize,
    policy: ReferencePolicy,
    unresolved: &'a mut Vec<UnresolvedReference>,
}

impl Resolver<'_> {
    /// Maps a comma separated list of names onto positions in `entities`.
    ///
    /// Names are compared for exact equality. An empty cell is a single empty
    /// name, so it yields one reference like any other unmatched name.
    fn resolve<T: Named>(
        &mut self,
        table: TableId,
        entities: &[T],
        names: &str,
    ) -> Result<Vec<Reference>, NormalizeError> {
        names
            .split(',')
            .map(|name| match entities.iter().position(|e| e.name() == name) {
                Some(index) => Ok(Reference::to(index)),
                None => {
                    let missing = UnresolvedReference {
                        class_row: self.class_row,
                        table,
                        name: name.to_string(),
                    };
                    match self.policy {
                        ReferencePolicy::Reject => Err(NormalizeError::UnresolvedReference(missing)),
                        ReferencePolicy::Propagate => {
                            self.unresolved.push(missing);
                            Ok(Reference::UNRESOLVED)
                        }
                    }
                }
            })
            .collect()
    }
}

fn build_teachers(table: &TableSnapshot) -> Result<Vec<Teacher>, NormalizeError> {
    table
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            Ok(Teacher {
                id: parse_number(TableId::Teachers, index, row, 0)?,
                index,
                name: field(TableId::Teachers, index, row, 1)?.to_string(),
            })
        })
        .collect()
}

fn build_rooms(table: &TableSnapshot) -> Result<Vec<Room>, NormalizeError> {
    table
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            Ok(Room {
                id: parse_number(TableId::Rooms, index, row, 0)?,
                index,
                name: field(TableId::Rooms, index, row, 1)?.to_string(),
                capacity: parse_number(TableId::Rooms, index, row, 2)?,
            })
        })
        .collect()
}

fn build_student_groups(table: &TableSnapshot) -> Result<Vec<StudentGroup>, NormalizeError> {
    table
        .rows
        .iter()
        .enumerate()
        .map(|(index, row)| {
            Ok(StudentGroup {
                id: parse_number(TableId::StudentGroups, index, row, 0)?,
                index,
                name: field(TableId::StudentGroups, index, row, 1)?.to_string(),
            })
        })
        .collect()
}

/// Fetches column `column` of `row`
fn field(table: TableId, row: usize, values: &[String], column: usize) -> Result<&str, NormalizeError> {
    values
        .get(column)
        .map(String::as_str)
        .ok_or(NormalizeError::MissingColumn { table, row, column })
}

/// Parses column `column` of `row` as a number
fn parse_number<N: FromStr>(
    table: TableId,
    row: usize,
    values: &[String],
    column: usize,
) -> Result<N, NormalizeError> {
    let value = field(table, row, values, column)?;

    value.trim().parse().map_err(|_| NormalizeError::InvalidNumber {
        table,
        row,
        column,
        value: value.to_string(),
    })
}
