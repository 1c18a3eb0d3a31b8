//! Turns the four imported tables into the cross-referenced scheduling input.
//!
//! - [`csv_table`] reads a table from CSV
//! - [`store`] keeps the last imported version of each table
//! - [`normalize`] resolves the tables into [`models::entity::Input`]

pub mod csv_table;
pub mod normalize;
pub mod store;
