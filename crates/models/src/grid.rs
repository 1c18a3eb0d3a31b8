//! Mapping between linear cell ids, (room, period) coordinates and the
//! rectangular area a class occupies when rendered.
//!
//! Ids are laid out room-major: `id = room * period_size + period`.

use serde::{Deserialize, Serialize};

/// Grid lines taken by the period label column before the first room
pub const COLUMN_OFFSET: usize = 2;
/// Grid lines taken by the room label row before the first period
pub const ROW_OFFSET: usize = 2;
/// Largest number of grid units a snapshot may describe
pub const MAX_GRID_UNITS: usize = 1 << 20;

/// A (room, period) pair on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    pub room: usize,
    pub period: usize,
}

impl Coordinate {
    pub fn new(room: usize, period: usize) -> Self {
        Self { room, period }
    }
}

/// Converts a coordinate into its linear id
pub fn to_linear_id(room: usize, period: usize, period_size: usize) -> usize {
    room * period_size + period
}

/// Converts a linear id back into a coordinate.
///
/// `period_size` must be non-zero.
pub fn to_coordinate(id: usize, period_size: usize) -> Coordinate {
    Coordinate {
        room: id / period_size,
        period: id % period_size,
    }
}

/// Where a cell is drawn on the display grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub row: usize,
    pub column: usize,
    pub column_span: usize,
}

/// Places a cell starting at `coordinate` spanning `size` periods
pub fn placement(coordinate: Coordinate, size: usize) -> Placement {
    Placement {
        row: coordinate.period + ROW_OFFSET,
        column: coordinate.room + COLUMN_OFFSET,
        column_span: size,
    }
}

/// Dimensions of a room × period grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridShape {
    pub room_size: usize,
    pub period_size: usize,
}

impl GridShape {
    pub fn new(room_size: usize, period_size: usize) -> Self {
        Self {
            room_size,
            period_size,
        }
    }

    /// Number of grid units, saturating at `usize::MAX`
    pub fn cell_count(&self) -> usize {
        self.room_size.saturating_mul(self.period_size)
    }

    /// Number of grid units, or `None` past [`MAX_GRID_UNITS`]
    pub fn bounded_cell_count(&self) -> Option<usize> {
        self.room_size
            .checked_mul(self.period_size)
            .filter(|&count| count <= MAX_GRID_UNITS)
    }

    pub fn contains(&self, coordinate: Coordinate) -> bool {
        coordinate.room < self.room_size && coordinate.period < self.period_size
    }

    pub fn to_linear_id(&self, coordinate: Coordinate) -> usize {
        to_linear_id(coordinate.room, coordinate.period, self.period_size)
    }

    /// Coordinate of `id`, or `None` if the id lies outside the grid
    pub fn to_coordinate(&self, id: usize) -> Option<Coordinate> {
        (id < self.cell_count()).then(|| to_coordinate(id, self.period_size))
    }

    /// Linear ids consumed by a class at `coordinate` spanning `size` periods.
    ///
    /// Periods past the end of the room are not part of the grid and are skipped.
    pub fn covered_ids(&self, coordinate: Coordinate, size: usize) -> impl Iterator<Item = usize> {
        let period_size = self.period_size;
        let end = coordinate.period.saturating_add(size).min(period_size);

        (coordinate.period..end).map(move |period| to_linear_id(coordinate.room, period, period_size))
    }

    /// Every coordinate of the grid in id order
    pub fn coordinates(&self) -> impl Iterator<Item = Coordinate> {
        let period_size = self.period_size;

        (0..self.room_size)
            .flat_map(move |room| (0..period_size).map(move |period| Coordinate { room, period }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_id_round_trip() {
        let shape = GridShape::new(4, 25);
        for coordinate in shape.coordinates() {
            let id = to_linear_id(coordinate.room, coordinate.period, shape.period_size);
            assert_eq!(to_coordinate(id, shape.period_size), coordinate);
        }
    }

    #[test]
    fn test_linear_ids_are_dense() {
        let shape = GridShape::new(3, 5);
        let ids: Vec<usize> = shape.coordinates().map(|c| shape.to_linear_id(c)).collect();
        assert_eq!(ids, (0..15).collect::<Vec<_>>());
    }

    #[test]
    fn test_to_coordinate_out_of_range() {
        let shape = GridShape::new(2, 3);
        assert_eq!(shape.to_coordinate(5), Some(Coordinate::new(1, 2)));
        assert_eq!(shape.to_coordinate(6), None);
    }

    #[test]
    fn test_covered_ids() {
        let shape = GridShape::new(2, 3);
        let ids: Vec<usize> = shape.covered_ids(Coordinate::new(1, 1), 2).collect();
        assert_eq!(ids, vec![4, 5]);

        // A span running past the last period is clipped
        let ids: Vec<usize> = shape.covered_ids(Coordinate::new(0, 2), 3).collect();
        assert_eq!(ids, vec![2]);

        let ids: Vec<usize> = shape.covered_ids(Coordinate::new(0, 1), usize::MAX).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_bounded_cell_count() {
        assert_eq!(GridShape::new(4, 25).bounded_cell_count(), Some(100));
        assert_eq!(GridShape::new(MAX_GRID_UNITS + 1, 1).bounded_cell_count(), None);

        let huge = GridShape::new(usize::MAX / 2, 3);
        assert_eq!(huge.bounded_cell_count(), None);
        assert_eq!(huge.cell_count(), usize::MAX);
    }

    #[test]
    fn test_placement() {
        let p = placement(Coordinate::new(1, 3), 2);
        assert_eq!(
            p,
            Placement {
                row: 5,
                column: 3,
                column_span: 2
            }
        );
    }
}
