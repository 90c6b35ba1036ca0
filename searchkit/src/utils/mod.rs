//! Utility functions

pub mod file;
pub mod sql;
