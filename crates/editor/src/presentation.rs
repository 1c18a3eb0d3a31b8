use crate::interaction::{Affordance, DragController};
use models::{
    entity::UNRESOLVED_LABEL,
    timetable::{ActiveCell, Cell},
    violation::{ViolationCategory, ViolationSummary},
};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};
use thiserror::Error;

/// An opaque RGB color written as `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HexColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl HexColor {
    pub const WHITE: HexColor = HexColor::rgb(0xff, 0xff, 0xff);

    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

impl Display for HexColor {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid color '{0}', expected #rrggbb")]
pub struct ParseColorError(String);

impl FromStr for HexColor {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseColorError(s.to_string());

        let hex = s.strip_prefix('#').ok_or_else(err)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(err());
        }

        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// Fill of a locked cell
pub const LOCKED_COLOR: HexColor = HexColor::rgb(0xaa, 0xaa, 0xff);
/// Tint of a drop target that accepts the dragged cell
pub const ALLOWED_COLOR: HexColor = HexColor::rgb(0xcc, 0xff, 0xcc);
/// Tint of a drop target that refuses the dragged cell
pub const DISALLOWED_COLOR: HexColor = HexColor::rgb(0xff, 0xcc, 0xcc);

/// White for 0, pure red for 255
pub fn heat_color(intensity: u8) -> HexColor {
    let fade = u8::MAX - intensity;
    HexColor::rgb(u8::MAX, fade, fade)
}

/// Tint of the hovered drop target, `None` while no answer is known
pub fn affordance_color(affordance: Affordance) -> Option<HexColor> {
    match affordance {
        Affordance::Neutral => None,
        Affordance::Allowed => Some(ALLOWED_COLOR),
        Affordance::Disallowed => Some(DISALLOWED_COLOR),
    }
}

/// Fill of an active cell.
///
/// Locked cells always use [`LOCKED_COLOR`]. Otherwise the backend's heat
/// color is used when `show_heat` is set; unparsable colors fall back to white.
pub fn cell_color(cell: &ActiveCell, show_heat: bool) -> HexColor {
    if cell.is_locked {
        return LOCKED_COLOR;
    }
    if !show_heat {
        return HexColor::WHITE;
    }

    cell.color_hex
        .as_deref()
        .and_then(|hex| hex.parse().ok())
        .unwrap_or(HexColor::WHITE)
}

/// Fill of any grid cell while `drag` is in progress.
///
/// The hovered drop target takes the affordance tint once the backend has
/// answered; every other cell keeps its own fill, blanks being white.
pub fn fill_color(cell: &Cell, drag: &DragController, show_heat: bool) -> HexColor {
    let tint = (drag.target() == Some(cell.id()))
        .then(|| affordance_color(drag.affordance()))
        .flatten();

    tint.unwrap_or_else(|| match cell {
        Cell::Active(active) => cell_color(active, show_heat),
        Cell::Blank(_) => HexColor::WHITE,
    })
}

/// Class name on the first line, comma separated teachers on the second
pub fn cell_label(cell: &ActiveCell) -> String {
    let teachers = cell
        .teacher_names
        .iter()
        .map(|name| if name.is_empty() { UNRESOLVED_LABEL } else { name.as_str() })
        .collect::<Vec<_>>()
        .join(",");

    format!("{}\n{}", cell.class_name, teachers)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViolationDisplay {
    pub is_violated: bool,
    /// Empty when there is nothing to report
    pub tooltip: String,
}

/// Builds the hover text for a cell's violations.
///
/// Categories appear in display order, each as its header followed by one
/// `period=<p>, rooms=<r1,r2>` line per violation. Empty categories are left out.
pub fn summarize(violations: Option<&ViolationSummary>) -> ViolationDisplay {
    let Some(summary) = violations else {
        return ViolationDisplay::default();
    };

    let mut lines = Vec::new();
    for category in ViolationCategory::all() {
        let entries = summary.category(category);
        if entries.is_empty() {
            continue;
        }

        lines.push(category.header().to_string());
        for violation in entries {
            let rooms = violation
                .rooms
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            lines.push(format!("period={}, rooms={}", violation.period, rooms));
        }
    }

    ViolationDisplay {
        is_violated: summary.has_any(),
        tooltip: lines.join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::violation::Violation;

    fn math() -> ActiveCell {
        ActiveCell {
            id: 0,
            room: 0,
            period: 0,
            size: 1,
            class_index: Some(0),
            class_name: "Math".into(),
            teacher_names: vec!["T1".into(), String::new()],
            student_group_names: vec!["G1".into()],
            student_count: 30,
            color_hex: Some("#ff8080".into()),
            is_locked: false,
            violations: None,
        }
    }

    #[test]
    fn test_heat_color_bounds() {
        assert_eq!(heat_color(0), HexColor::rgb(255, 255, 255));
        assert_eq!(heat_color(255), HexColor::rgb(255, 0, 0));
        assert_eq!(heat_color(55).to_string(), "#ffc8c8");
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!("#AAAAFF".parse::<HexColor>(), Ok(LOCKED_COLOR));
        assert_eq!(LOCKED_COLOR.to_string(), "#aaaaff");

        for bad in ["aaaaff", "#aaaaf", "#gggggg", "#aaaaffff", "#ééé"] {
            assert!(bad.parse::<HexColor>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn test_cell_color() {
        let mut cell = math();
        assert_eq!(cell_color(&cell, true), HexColor::rgb(0xff, 0x80, 0x80));
        assert_eq!(cell_color(&cell, false), HexColor::WHITE);

        cell.is_locked = true;
        assert_eq!(cell_color(&cell, true), LOCKED_COLOR);
        assert_eq!(cell_color(&cell, false), LOCKED_COLOR);

        cell.is_locked = false;
        cell.color_hex = Some("red".into());
        assert_eq!(cell_color(&cell, true), HexColor::WHITE);
    }

    #[test]
    fn test_cell_label_marks_missing_teacher() {
        assert_eq!(cell_label(&math()), "Math\nT1,?");
    }

    #[test]
    fn test_summarize_orders_categories() {
        let summary = ViolationSummary::new(
            vec![Violation::new(3, vec![0, 2])],
            Vec::new(),
            vec![Violation::new(1, vec![1]), Violation::new(4, vec![1])],
            Vec::new(),
        );

        let display = summarize(Some(&summary));
        assert!(display.is_violated);
        assert_eq!(
            display.tooltip,
            "Same student group at the same time\n\
             period=3, rooms=0,2\n\
             Room capacity exceeded\n\
             period=1, rooms=1\n\
             period=4, rooms=1"
        );
    }

    #[test]
    fn test_summarize_without_violations() {
        let empty = ViolationSummary::new(Vec::new(), Vec::new(), Vec::new(), Vec::new());

        assert_eq!(summarize(Some(&empty)), ViolationDisplay::default());
        assert_eq!(summarize(None), ViolationDisplay::default());
    }

    #[test]
    fn test_affordance_color() {
        assert_eq!(affordance_color(Affordance::Neutral), None);
        assert_eq!(affordance_color(Affordance::Allowed), Some(ALLOWED_COLOR));
        assert_eq!(
            affordance_color(Affordance::Disallowed),
            Some(DISALLOWED_COLOR)
        );
    }

    #[test]
    fn test_fill_color_tints_drop_target() {
        use crate::interaction::Point;
        use models::{grid::Coordinate, timetable::BlankCell};

        let blank = Cell::Blank(BlankCell::unit(Coordinate::new(0, 1), 3));
        let active = Cell::Active(math());
        let mut drag = DragController::new(5.0);

        assert_eq!(fill_color(&blank, &drag, true), HexColor::WHITE);
        assert_eq!(fill_color(&active, &drag, true), HexColor::rgb(0xff, 0x80, 0x80));

        drag.press(0, Point::new(0.0, 0.0));
        drag.move_to(Point::new(20.0, 0.0), Some(1));
        // No answer yet
        assert_eq!(fill_color(&blank, &drag, true), HexColor::WHITE);

        drag.legality_resolved(false);
        assert_eq!(fill_color(&blank, &drag, true), DISALLOWED_COLOR);
        assert_eq!(fill_color(&active, &drag, false), HexColor::WHITE);
    }
}
