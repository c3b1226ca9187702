//! Filtering and derived metrics over TIMSS student assessment data.
//!
//! The [`data`] module is usable headlessly; the `timss-explorer` binary is an
//! egui front end over it.

pub mod config;
pub mod data;
