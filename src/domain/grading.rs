//! Core grading models
//!
//! A `CriteriaSet` is the ordered list of deduction rules owned by an
//! assignment. Applying it to the collected `SourceFile`s yields one
//! `DeductionEvent` per matching line, and the events fold into the persisted
//! `GradingResult`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One deduction rule: a regex, the points it costs and the feedback text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    /// Regular expression searched for anywhere in a line
    pub pattern: String,
    /// Points removed per matching line (never negative)
    pub deduction: f64,
    /// Human-readable reason shown in the feedback
    pub message: String,
}

impl Criterion {
    pub fn new(pattern: impl Into<String>, deduction: f64, message: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            deduction,
            message: message.into(),
        }
    }
}

/// Ordered, immutable set of criteria for one grading run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CriteriaSet {
    criteria: Vec<Criterion>,
}

impl CriteriaSet {
    pub fn new(criteria: Vec<Criterion>) -> Self {
        Self { criteria }
    }

    /// Criteria in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Criterion> {
        self.criteria.iter()
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// SHA-256 over every rule in order, used to tie a result to its rules
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for criterion in &self.criteria {
            hasher.update(criterion.pattern.as_bytes());
            hasher.update([0u8]);
            hasher.update(criterion.deduction.to_le_bytes());
            hasher.update(criterion.message.as_bytes());
            hasher.update([0u8]);
        }
        format!("{:x}", hasher.finalize())
    }
}

impl FromIterator<Criterion> for CriteriaSet {
    fn from_iter<I: IntoIterator<Item = Criterion>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A criteria entry dropped during parsing, kept for audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedCriterion {
    /// Zero-based position in the uploaded array
    pub index: usize,
    pub reason: String,
}

/// Textual content of one collected source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path relative to the assignment folder, `/`-separated
    pub path: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Lines in order, without terminators
    pub fn lines(&self) -> std::str::Lines<'_> {
        self.content.lines()
    }
}

/// A single (criterion, file, line) match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeductionEvent {
    /// Index of the matching criterion in its set
    pub criterion_index: usize,
    pub file_path: String,
    /// 1-based line number
    pub line_number: usize,
    pub deduction: f64,
    pub message: String,
}

impl DeductionEvent {
    /// Render the event as one feedback line
    pub fn feedback_line(&self) -> String {
        format!(
            "- {} points: {} in {} on line {}",
            self.deduction, self.message, self.file_path, self.line_number
        )
    }
}

/// Persisted outcome of one grading run for one assignment/student pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingResult {
    pub assignment_name: String,
    pub student_id: String,
    pub grade: f64,
    pub feedback: String,
    pub graded_at: DateTime<Utc>,
}

impl GradingResult {
    pub fn new(
        assignment_name: impl Into<String>,
        student_id: impl Into<String>,
        grade: f64,
        feedback: impl Into<String>,
    ) -> Self {
        Self {
            assignment_name: assignment_name.into(),
            student_id: student_id.into(),
            grade,
            feedback: feedback.into(),
            graded_at: Utc::now(),
        }
    }
}

/// A named assignment as known to the grading store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: i64,
    pub name: String,
}

/// Inbound grading request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingRequest {
    pub assignment_name: String,
    /// https URL of the submission repository
    pub repo_url: String,
    /// Access token embedded into the clone URL
    #[serde(skip_serializing)]
    pub token: String,
    pub student_id: String,
}

impl GradingRequest {
    pub fn new(
        assignment_name: impl Into<String>,
        repo_url: impl Into<String>,
        token: impl Into<String>,
        student_id: impl Into<String>,
    ) -> Self {
        Self {
            assignment_name: assignment_name.into(),
            repo_url: repo_url.into(),
            token: token.into(),
            student_id: student_id.into(),
        }
    }
}

/// Response envelope returned after a successful grading run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradingResponse {
    pub message: String,
    pub assignment_name: String,
    pub grading_result: GradingResult,
    /// Individual matches in feedback order
    pub deductions: Vec<DeductionEvent>,
    pub skipped_criteria: Vec<SkippedCriterion>,
    pub files_graded: usize,
    pub criteria_fingerprint: String,
}

impl GradingResponse {
    pub const COMPLETE_MESSAGE: &'static str = "Assignment analysis complete.";

    /// Total points removed, before any clamping
    pub fn total_deducted(&self) -> f64 {
        self.deductions.iter().map(|d| d.deduction).sum()
    }
}
