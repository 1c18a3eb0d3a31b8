use crate::{
    grid::{self, Coordinate, GridShape, Placement},
    violation::ViolationSummary,
};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// A placed class occupying `size` consecutive periods of one room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveCell {
    /// Linear id of the first period the class occupies
    pub id: usize,
    pub room: usize,
    pub period: usize,
    /// Number of periods spanned, at least 1
    pub size: usize,
    /// Position of the class in the imported class collection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_index: Option<usize>,
    pub class_name: String,
    #[serde(default)]
    pub teacher_names: Vec<String>,
    #[serde(default)]
    pub student_group_names: Vec<String>,
    #[serde(default)]
    pub student_count: u64,
    #[serde(default)]
    pub color_hex: Option<String>,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub violations: Option<ViolationSummary>,
}

impl ActiveCell {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.room, self.period)
    }

    /// Whether the cell covers `period` of `room`
    pub fn covers(&self, room: usize, period: usize) -> bool {
        self.room == room && (self.period..self.period.saturating_add(self.size)).contains(&period)
    }

    pub fn is_violated(&self) -> bool {
        self.violations.as_ref().is_some_and(|v| v.is_violated)
    }
}

/// An unoccupied grid region a class can be dropped on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlankCell {
    pub id: usize,
    pub room: usize,
    pub period: usize,
    pub size: usize,
    pub is_visible: bool,
}

impl BlankCell {
    /// A visible one-period blank at `coordinate`
    pub fn unit(coordinate: Coordinate, period_size: usize) -> Self {
        Self {
            id: grid::to_linear_id(coordinate.room, coordinate.period, period_size),
            room: coordinate.room,
            period: coordinate.period,
            size: 1,
            is_visible: true,
        }
    }
}

/// Anything drawn on the grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Cell {
    Active(ActiveCell),
    Blank(BlankCell),
}

impl Cell {
    pub fn id(&self) -> usize {
        match self {
            Self::Active(cell) => cell.id,
            Self::Blank(cell) => cell.id,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        match self {
            Self::Active(cell) => cell.coordinate(),
            Self::Blank(cell) => Coordinate::new(cell.room, cell.period),
        }
    }

    pub fn size(&self) -> usize {
        match self {
            Self::Active(cell) => cell.size,
            Self::Blank(cell) => cell.size,
        }
    }

    pub fn placement(&self) -> Placement {
        grid::placement(self.coordinate(), self.size())
    }

    pub fn as_active(&self) -> Option<&ActiveCell> {
        match self {
            Self::Active(cell) => Some(cell),
            Self::Blank(_) => None,
        }
    }
}

/// Reasons a snapshot is rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// Cells were given for a grid without periods
    EmptyGrid,
    /// The grid has more units than [`grid::MAX_GRID_UNITS`]
    GridTooLarge { room_size: usize, period_size: usize },
    OutOfBounds { id: usize, room: usize, period: usize },
    ZeroSize { id: usize },
    /// The span runs past the last period of the room
    SpanOverflow { id: usize, period: usize, size: usize },
    IdMismatch { id: usize, expected: usize },
    Overlap { first: usize, second: usize, room: usize, period: usize },
    InconsistentViolations { id: usize },
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::EmptyGrid => write!(f, "Snapshot has cells but no periods"),
            Self::GridTooLarge {
                room_size,
                period_size,
            } => write!(
                f,
                "Grid of {room_size} rooms by {period_size} periods exceeds {} units",
                grid::MAX_GRID_UNITS
            ),
            Self::OutOfBounds { id, room, period } => {
                write!(f, "Cell {id} at room {room}, period {period} is outside the grid")
            }
            Self::ZeroSize { id } => write!(f, "Cell {id} spans no periods"),
            Self::SpanOverflow { id, period, size } => {
                write!(f, "Cell {id} starting at period {period} with size {size} overflows the room")
            }
            Self::IdMismatch { id, expected } => {
                write!(f, "Cell id {id} does not match its coordinate (expected {expected})")
            }
            Self::Overlap {
                first,
                second,
                room,
                period,
            } => write!(
                f,
                "Cells {first} and {second} overlap at room {room}, period {period}"
            ),
            Self::InconsistentViolations { id } => {
                write!(f, "Cell {id} has an is_violated flag that disagrees with its violations")
            }
        }
    }
}

impl std::error::Error for SnapshotError {}

/// A complete timetable as returned by the scheduling backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeTable {
    pub class_list: Vec<Option<ActiveCell>>,
    pub room_size: usize,
    pub period_size: usize,
}

impl TimeTable {
    /// An empty timetable of the given shape
    pub fn new(shape: GridShape) -> Self {
        Self {
            class_list: Vec::new(),
            room_size: shape.room_size,
            period_size: shape.period_size,
        }
    }

    pub fn shape(&self) -> GridShape {
        GridShape::new(self.room_size, self.period_size)
    }

    /// Non-null cells in list order
    pub fn active_cells(&self) -> impl Iterator<Item = &ActiveCell> {
        self.class_list.iter().flatten()
    }

    /// Cell whose anchor id is `id`
    pub fn active_cell(&self, id: usize) -> Option<&ActiveCell> {
        self.active_cells().find(|cell| cell.id == id)
    }

    /// For every grid unit, the id of the cell covering it.
    ///
    /// Units outside any span are `None`. Cells lying outside the grid are
    /// skipped; a grid past [`grid::MAX_GRID_UNITS`] has no units at all.
    pub fn occupancy(&self) -> Vec<Option<usize>> {
        let shape = self.shape();
        let mut units = vec![None; shape.bounded_cell_count().unwrap_or_default()];

        for cell in self.active_cells() {
            if cell.room >= shape.room_size {
                continue;
            }
            for id in shape.covered_ids(cell.coordinate(), cell.size) {
                if let Some(unit) = units.get_mut(id) {
                    *unit = Some(cell.id);
                }
            }
        }

        units
    }

    /// Checks the placement invariants of every cell
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let shape = self.shape();
        if self.period_size == 0 && self.active_cells().next().is_some() {
            return Err(SnapshotError::EmptyGrid);
        }

        let count = shape
            .bounded_cell_count()
            .ok_or(SnapshotError::GridTooLarge {
                room_size: self.room_size,
                period_size: self.period_size,
            })?;
        let mut units: Vec<Option<usize>> = vec![None; count];

        for cell in self.active_cells() {
            if !shape.contains(cell.coordinate()) {
                return Err(SnapshotError::OutOfBounds {
                    id: cell.id,
                    room: cell.room,
                    period: cell.period,
                });
            }
            if cell.size == 0 {
                return Err(SnapshotError::ZeroSize { id: cell.id });
            }
            if cell.period.checked_add(cell.size).is_none_or(|end| end > self.period_size) {
                return Err(SnapshotError::SpanOverflow {
                    id: cell.id,
                    period: cell.period,
                    size: cell.size,
                });
            }

            let expected = shape.to_linear_id(cell.coordinate());
            if cell.id != expected {
                return Err(SnapshotError::IdMismatch {
                    id: cell.id,
                    expected,
                });
            }

            if cell.violations.as_ref().is_some_and(|v| !v.is_consistent()) {
                return Err(SnapshotError::InconsistentViolations { id: cell.id });
            }

            for unit in shape.covered_ids(cell.coordinate(), cell.size) {
                if let Some(first) = units[unit] {
                    let at = grid::to_coordinate(unit, self.period_size);
                    return Err(SnapshotError::Overlap {
                        first,
                        second: cell.id,
                        room: at.room,
                        period: at.period,
                    });
                }
                units[unit] = Some(cell.id);
            }
        }

        Ok(())
    }
}
