//! Repository implementations for database operations

pub mod traders;

pub use traders::*;
