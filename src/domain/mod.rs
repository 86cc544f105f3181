//! Domain layer for Repo Grader
//!
//! Pure grading vocabulary: criteria, collected sources, deduction events and
//! the persisted grading record. Nothing in here touches the file system, the
//! git client or the database.

pub mod errors;
pub mod grading;

pub use errors::*;
pub use grading::*;
