//! Interactive timetable editing on top of a remote scheduling backend.
//!
//! The backend owns the schedule; this crate keeps a local view of its last
//! snapshot, turns pointer gestures into backend commands and derives what
//! the grid should show.

pub mod backend;
pub mod config;
pub mod interaction;
pub mod presentation;
pub mod session;
pub mod view_model;
