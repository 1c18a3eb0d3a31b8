use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Label rendered in place of a name that could not be resolved
pub const UNRESOLVED_LABEL: &str = "?";

/// Position of an entity inside its collection, as referenced from a class.
///
/// On the wire this is a plain integer where `-1` means the referenced name
/// matched nothing during import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reference(i64);

impl Reference {
    /// Sentinel for a name that matched no entity
    pub const UNRESOLVED: Self = Reference(-1);

    /// Creates a reference to the entity at `index`
    pub fn to(index: usize) -> Self {
        Reference(index as i64)
    }

    /// Returns the referenced position, or `None` for an unresolved reference
    pub fn resolved(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }

    pub fn is_unresolved(self) -> bool {
        self.0 < 0
    }

    /// The raw wire value
    pub fn raw(self) -> i64 {
        self.0
    }
}

impl Display for Reference {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.resolved() {
            Some(index) => write!(f, "{index}"),
            None => write!(f, "unresolved"),
        }
    }
}

/// Something that can be looked up by its display name
pub trait Named {
    fn name(&self) -> &str;
}

/// A teacher who can be assigned to classes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: i64,
    /// Position in the imported rows
    pub index: usize,
    pub name: String,
}

/// A room with a seating capacity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,
    /// Position in the imported rows
    pub index: usize,
    pub name: String,
    pub capacity: u64,
}

/// A group of students attending classes together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentGroup {
    pub id: i64,
    /// Position in the imported rows
    pub index: usize,
    pub name: String,
}

impl Named for Teacher {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Room {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for StudentGroup {
    fn name(&self) -> &str {
        &self.name
    }
}

/// A class to be placed on the timetable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    pub id: i64,
    /// Position in the imported rows
    pub index: usize,
    pub name: String,
    pub num_of_students: u64,
    /// Teachers, in the order they were listed
    pub teacher_indexes: Vec<Reference>,
    /// Rooms the class may be held in
    pub room_candidates_indexes: Vec<Reference>,
    /// Student groups attending the class
    pub students_group_indexes: Vec<Reference>,
}

impl Class {
    /// Iterates over every reference held by the class
    pub fn references(&self) -> impl Iterator<Item = Reference> + '_ {
        self.teacher_indexes
            .iter()
            .chain(&self.room_candidates_indexes)
            .chain(&self.students_group_indexes)
            .copied()
    }

    /// Whether every name of the class was resolved on import
    pub fn is_fully_resolved(&self) -> bool {
        self.references().all(|r| !r.is_unresolved())
    }
}

/// The four cross-referenced collections handed to the scheduling backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Input {
    pub classes: Vec<Class>,
    pub rooms: Vec<Room>,
    pub student_groups: Vec<StudentGroup>,
    pub teachers: Vec<Teacher>,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the class at `index`
    pub fn class_name(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(|class| class.name.as_str())
    }

    /// Comma separated teacher names of the class at `index`.
    ///
    /// Unresolved teachers are rendered as [`UNRESOLVED_LABEL`].
    pub fn teacher_names(&self, index: usize) -> Option<String> {
        let class = self.classes.get(index)?;
        let names = resolve_names(&self.teachers, &class.teacher_indexes);

        Some(names.join(","))
    }

    /// Student group names of the class at `index`
    pub fn student_group_names(&self, index: usize) -> Option<Vec<&str>> {
        let class = self.classes.get(index)?;

        Some(resolve_names(&self.student_groups, &class.students_group_indexes))
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
            && self.rooms.is_empty()
            && self.student_groups.is_empty()
            && self.teachers.is_empty()
    }
}

/// Maps each reference onto the name of the entity it points at
fn resolve_names<'a, T: Named>(entities: &'a [T], references: &[Reference]) -> Vec<&'a str> {
    references
        .iter()
        .map(|reference| {
            reference
                .resolved()
                .and_then(|index| entities.get(index))
                .map_or(UNRESOLVED_LABEL, Named::name)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> Input {
        Input {
            classes: vec![Class {
                id: 10,
                index: 0,
                name: "Math".to_string(),
                num_of_students: 30,
                teacher_indexes: vec![Reference::to(1), Reference::UNRESOLVED],
                room_candidates_indexes: vec![Reference::to(0)],
                students_group_indexes: vec![Reference::to(0)],
            }],
            rooms: vec![Room {
                id: 1,
                index: 0,
                name: "R1".to_string(),
                capacity: 40,
            }],
            student_groups: vec![StudentGroup {
                id: 1,
                index: 0,
                name: "G1".to_string(),
            }],
            teachers: vec![
                Teacher {
                    id: 1,
                    index: 0,
                    name: "T1".to_string(),
                },
                Teacher {
                    id: 2,
                    index: 1,
                    name: "T2".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_reference_sentinel() {
        assert_eq!(Reference::to(0).resolved(), Some(0));
        assert!(!Reference::to(0).is_unresolved());
        assert_eq!(Reference::UNRESOLVED.resolved(), None);
        assert!(Reference::UNRESOLVED.is_unresolved());
        assert_ne!(Reference::UNRESOLVED, Reference::to(0));
    }

    #[test]
    fn test_reference_wire_format() {
        let json = serde_json::to_string(&vec![Reference::to(2), Reference::UNRESOLVED]).unwrap();
        assert_eq!(json, "[2,-1]");

        let back: Vec<Reference> = serde_json::from_str("[0,-1]").unwrap();
        assert_eq!(back, vec![Reference::to(0), Reference::UNRESOLVED]);
    }

    #[test]
    fn test_display_projections() {
        let input = sample_input();

        assert_eq!(input.class_name(0), Some("Math"));
        assert_eq!(input.class_name(1), None);
        assert_eq!(input.teacher_names(0).as_deref(), Some("T2,?"));
        assert_eq!(input.student_group_names(0), Some(vec!["G1"]));
    }

    #[test]
    fn test_class_resolution_flag() {
        let mut input = sample_input();
        assert!(!input.classes[0].is_fully_resolved());

        input.classes[0].teacher_indexes = vec![Reference::to(0)];
        assert!(input.classes[0].is_fully_resolved());
    }
}
