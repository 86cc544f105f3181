//! Persistence of assignments, criteria and grading history
//!
//! The orchestrator receives a store handle instead of reaching for a global
//! session, so tests can hand it a `MemoryStore`. Both implementations keep
//! the same invariants: assignment names are unique, criteria are replaced
//! rather than appended, and grading results are append-only.

pub mod memory;
pub mod sqlite;

use crate::domain::{Assignment, GraderResult, GradingResult};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Storage operations needed by the grading pipeline
pub trait GradingStore: Send + Sync {
    /// Register a new assignment; fails with `AssignmentAlreadyExists`
    fn create_assignment(&self, name: &str) -> GraderResult<Assignment>;

    fn find_assignment(&self, name: &str) -> GraderResult<Option<Assignment>>;

    /// Return the named assignment, creating it if needed
    fn ensure_assignment(&self, name: &str) -> GraderResult<Assignment> {
        match self.find_assignment(name)? {
            Some(assignment) => Ok(assignment),
            None => self.create_assignment(name),
        }
    }

    /// Store criteria text for an assignment, replacing any previous text
    fn save_criteria(&self, assignment_id: i64, text: &str) -> GraderResult<()>;

    fn load_criteria(&self, assignment_id: i64) -> GraderResult<Option<String>>;

    /// Append a grading result and return its row id
    fn append_result(&self, assignment_id: i64, result: &GradingResult) -> GraderResult<i64>;

    /// Every stored result, oldest first
    fn list_results(&self) -> GraderResult<Vec<GradingResult>>;

    /// Results for one student, oldest first
    fn results_for_student(&self, student_id: &str) -> GraderResult<Vec<GradingResult>>;
}
