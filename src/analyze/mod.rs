// src/analyze/mod.rs
//! News analysis: validation, scoring and best-candidate selection.

pub mod filter;
pub mod select;

pub use crate::analyze::filter::{NewsFilter, Rejection};
pub use crate::analyze::select::{pick_highest, select_best};
