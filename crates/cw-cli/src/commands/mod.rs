//! Command implementations

pub mod archive;
pub mod audit;
pub(crate) mod common;
pub mod deadlines;
pub mod run;
