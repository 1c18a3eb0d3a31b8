pub mod entity;
pub mod grid;
pub mod table;
pub mod timetable;
pub mod violation;
