use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumProperty, IntoEnumIterator};

/// A single constraint violation: the period it happens in and the rooms involved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub period: usize,
    pub rooms: Vec<usize>,
}

impl Violation {
    pub fn new(period: usize, rooms: Vec<usize>) -> Self {
        Self { period, rooms }
    }
}

/// The independently tracked kinds of violation, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumProperty)]
pub enum ViolationCategory {
    #[strum(props(header = "Same student group at the same time"))]
    SameStudentSameTime,
    #[strum(props(header = "Same teacher at the same time"))]
    SameTeacherSameTime,
    #[strum(props(header = "Room capacity exceeded"))]
    CapacityOver,
    #[strum(props(header = "Class straddles two days"))]
    StraddlesDays,
}

impl ViolationCategory {
    /// Human readable heading of the category
    pub fn header(&self) -> &'static str {
        self.get_str("header").unwrap_or_default()
    }

    pub fn all() -> Vec<ViolationCategory> {
        ViolationCategory::iter().collect()
    }
}

/// Violations attached to one cell
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationSummary {
    pub is_violated: bool,
    #[serde(default)]
    pub same_student_same_time: Vec<Violation>,
    #[serde(default)]
    pub same_teacher_same_time: Vec<Violation>,
    #[serde(default)]
    pub capacity_over: Vec<Violation>,
    #[serde(default, alias = "strabbleDays")]
    pub straddles_days: Vec<Violation>,
}

impl ViolationSummary {
    /// Builds a summary whose `is_violated` flag agrees with its lists
    pub fn new(
        same_student_same_time: Vec<Violation>,
        same_teacher_same_time: Vec<Violation>,
        capacity_over: Vec<Violation>,
        straddles_days: Vec<Violation>,
    ) -> Self {
        let mut summary = Self {
            is_violated: false,
            same_student_same_time,
            same_teacher_same_time,
            capacity_over,
            straddles_days,
        };
        summary.is_violated = summary.has_any();
        summary
    }

    /// Violations of one category
    pub fn category(&self, category: ViolationCategory) -> &[Violation] {
        match category {
            ViolationCategory::SameStudentSameTime => &self.same_student_same_time,
            ViolationCategory::SameTeacherSameTime => &self.same_teacher_same_time,
            ViolationCategory::CapacityOver => &self.capacity_over,
            ViolationCategory::StraddlesDays => &self.straddles_days,
        }
    }

    /// Whether any of the four lists is non-empty
    pub fn has_any(&self) -> bool {
        ViolationCategory::iter().any(|c| !self.category(c).is_empty())
    }

    /// Whether the `is_violated` flag matches the lists
    pub fn is_consistent(&self) -> bool {
        self.is_violated == self.has_any()
    }
}
