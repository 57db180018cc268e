//! Core model for nonogram puzzles: cells and grids, line rules, the
//! puzzle itself with its textual grammar, and the compact cache codec.
//!
//! The solving machinery lives in the `solver` crate; this crate is the
//! shared vocabulary between solvers, tools and front-ends.

#![warn(clippy::pedantic)]
#![allow(clippy::similar_names, clippy::missing_errors_doc)]

pub mod cache;
pub mod format;

mod cell;
pub use cell::*;

mod rule;
pub use rule::*;

mod puzzle;
pub use puzzle::*;
