use models::{
    grid::{self, GridShape},
    timetable::{ActiveCell, BlankCell, Cell, TimeTable},
};

/// Local copy of the last snapshot the backend returned.
///
/// The only way to change it is [`ViewModel::replace`]; everything shown on
/// the grid is derived from the snapshot on demand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewModel {
    snapshot: TimeTable,
}

impl ViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swaps in a new snapshot wholesale
    pub fn replace(&mut self, snapshot: TimeTable) {
        self.snapshot = snapshot;
    }

    pub fn snapshot(&self) -> &TimeTable {
        &self.snapshot
    }

    pub fn shape(&self) -> GridShape {
        self.snapshot.shape()
    }

    pub fn active_cells(&self) -> impl Iterator<Item = &ActiveCell> {
        self.snapshot.active_cells()
    }

    pub fn active_cell(&self, id: usize) -> Option<&ActiveCell> {
        self.snapshot.active_cell(id)
    }

    /// One-period blanks for every grid unit no active cell covers, in id order
    pub fn blank_cells(&self) -> Vec<BlankCell> {
        let period_size = self.snapshot.period_size;

        self.snapshot
            .occupancy()
            .into_iter()
            .enumerate()
            .filter(|(_, unit)| unit.is_none())
            .map(|(id, _)| BlankCell::unit(grid::to_coordinate(id, period_size), period_size))
            .collect()
    }

    /// Every drawable cell: the active cells followed by the blanks
    pub fn cells(&self) -> Vec<Cell> {
        self.active_cells()
            .cloned()
            .map(Cell::Active)
            .chain(self.blank_cells().into_iter().map(Cell::Blank))
            .collect()
    }

    /// The cell whose id is `id`, whether it anchors a class or is blank.
    ///
    /// Ids covered by the tail of a multi-period class belong to no cell.
    pub fn cell(&self, id: usize) -> Option<Cell> {
        if let Some(active) = self.active_cell(id) {
            return Some(Cell::Active(active.clone()));
        }

        let shape = self.shape();
        let coordinate = shape.to_coordinate(id)?;
        self.snapshot
            .occupancy()
            .get(id)?
            .is_none()
            .then(|| Cell::Blank(BlankCell::unit(coordinate, shape.period_size)))
    }

    /// The current schedule to continue from, or `None` before the first run
    pub fn seed_cells(&self) -> Option<&[Option<ActiveCell>]> {
        let cells = self.snapshot.class_list.as_slice();
        (!cells.is_empty()).then_some(cells)
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.class_list.is_empty()
    }
}

impl From<TimeTable> for ViewModel {
    fn from(snapshot: TimeTable) -> Self {
        Self { snapshot }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::grid::Coordinate;

    fn cell(room: usize, period: usize, size: usize, period_size: usize) -> ActiveCell {
        ActiveCell {
            id: room * period_size + period,
            room,
            period,
            size,
            class_index: None,
            class_name: "Math".into(),
            teacher_names: vec!["T1".into()],
            student_group_names: Vec::new(),
            student_count: 30,
            color_hex: None,
            is_locked: false,
            violations: None,
        }
    }

    fn two_by_three() -> ViewModel {
        let mut timetable = TimeTable::new(GridShape::new(2, 3));
        timetable.class_list = vec![Some(cell(0, 1, 2, 3)), None];
        ViewModel::from(timetable)
    }

    #[test]
    fn test_blank_cells_fill_uncovered_units() {
        let blanks = two_by_three().blank_cells();
        let coordinates: Vec<_> = blanks.iter().map(|b| (b.room, b.period)).collect();

        assert_eq!(coordinates, vec![(0, 0), (1, 0), (1, 1), (1, 2)]);
        assert!(blanks.iter().all(|b| b.size == 1 && b.is_visible));
        assert_eq!(blanks[3].id, 5);
    }

    #[test]
    fn test_cells_partition_the_grid() {
        let view = two_by_three();
        let covered: usize = view.cells().iter().map(Cell::size).sum();

        assert_eq!(covered, view.shape().cell_count());
        assert_eq!(view.cells().len(), 5);
    }

    #[test]
    fn test_cell_lookup() {
        let view = two_by_three();

        assert!(matches!(view.cell(1), Some(Cell::Active(c)) if c.size == 2));
        assert!(view.cell(2).is_none());
        assert_eq!(view.cell(3).unwrap().coordinate(), Coordinate::new(1, 0));
        assert!(view.cell(6).is_none());
    }

    #[test]
    fn test_seed_cells() {
        assert!(ViewModel::new().seed_cells().is_none());
        assert_eq!(two_by_three().seed_cells().map(<[_]>::len), Some(2));
    }

    #[test]
    fn test_replace_is_wholesale() {
        let mut view = two_by_three();
        view.replace(TimeTable::new(GridShape::new(1, 2)));

        assert!(view.is_empty());
        assert_eq!(view.blank_cells().len(), 2);
        assert!(view.active_cell(1).is_none());
    }

    #[test]
    fn test_stray_cell_does_not_break_blanks() {
        let mut stray = cell(0, 0, 1, 3);
        stray.room = 3;
        stray.id = 9;

        let mut view = two_by_three();
        view.replace(TimeTable {
            class_list: vec![Some(stray)],
            room_size: 2,
            period_size: 3,
        });

        assert_eq!(view.blank_cells().len(), 6);
        assert!(view.cell(9).is_some());
        assert!(view.cell(6).is_none());
    }

    #[test]
    fn test_empty_grid_has_no_cells() {
        let view = ViewModel::from(TimeTable::new(GridShape::new(3, 0)));
        assert!(view.cells().is_empty());
    }
}
