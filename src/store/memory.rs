//! In-process grading store

use super::GradingStore;
use crate::domain::{Assignment, GraderError, GraderResult, GradingResult};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MemoryState {
    assignments: Vec<Assignment>,
    criteria: HashMap<i64, String>,
    results: Vec<(i64, GradingResult)>,
}

/// Grading store that keeps everything in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> GraderResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|e| GraderError::storage(format!("memory store lock poisoned: {e}")))
    }
}

impl GradingStore for MemoryStore {
    fn create_assignment(&self, name: &str) -> GraderResult<Assignment> {
        let mut state = self.lock()?;
        if state.assignments.iter().any(|a| a.name == name) {
            return Err(GraderError::AssignmentAlreadyExists {
                name: name.to_string(),
            });
        }

        let assignment = Assignment {
            id: state.assignments.len() as i64 + 1,
            name: name.to_string(),
        };
        state.assignments.push(assignment.clone());
        Ok(assignment)
    }

    fn find_assignment(&self, name: &str) -> GraderResult<Option<Assignment>> {
        let state = self.lock()?;
        Ok(state.assignments.iter().find(|a| a.name == name).cloned())
    }

    fn save_criteria(&self, assignment_id: i64, text: &str) -> GraderResult<()> {
        let mut state = self.lock()?;
        if !state.assignments.iter().any(|a| a.id == assignment_id) {
            return Err(GraderError::storage(format!(
                "no assignment with id {assignment_id}"
            )));
        }
        state.criteria.insert(assignment_id, text.to_string());
        Ok(())
    }

    fn load_criteria(&self, assignment_id: i64) -> GraderResult<Option<String>> {
        Ok(self.lock()?.criteria.get(&assignment_id).cloned())
    }

    fn append_result(&self, assignment_id: i64, result: &GradingResult) -> GraderResult<i64> {
        let mut state = self.lock()?;
        if !state.assignments.iter().any(|a| a.id == assignment_id) {
            return Err(GraderError::storage(format!(
                "no assignment with id {assignment_id}"
            )));
        }
        state.results.push((assignment_id, result.clone()));
        Ok(state.results.len() as i64)
    }

    fn list_results(&self) -> GraderResult<Vec<GradingResult>> {
        let state = self.lock()?;
        Ok(state.results.iter().map(|(_, r)| r.clone()).collect())
    }

    fn results_for_student(&self, student_id: &str) -> GraderResult<Vec<GradingResult>> {
        let state = self.lock()?;
        Ok(state
            .results
            .iter()
            .filter(|(_, r)| r.student_id == student_id)
            .map(|(_, r)| r.clone())
            .collect())
    }
}
