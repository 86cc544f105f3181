//! Deduction engine
//!
//! Applies every criterion to every line of every collected file. Iteration
//! order is fixed: files in the order given, criteria in declaration order,
//! lines ascending. That order is the order of the feedback text, so two
//! runs over the same input always produce identical output.
//!
//! All patterns are compiled before the first line is inspected. A pattern
//! that fails to compile aborts the run and names the offending criterion.

use crate::config::GradingConfig;
use crate::domain::{CriteriaSet, DeductionEvent, GraderError, GraderResult, SourceFile};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Score and feedback produced by a grading strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeOutcome {
    pub grade: f64,
    /// Newline-joined feedback lines, trimmed
    pub feedback: String,
    /// Every match, in feedback order
    pub events: Vec<DeductionEvent>,
}

/// A way of turning sources and criteria into a grade
pub trait GradingStrategy: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Grade the files against the criteria
    fn grade(&self, files: &[SourceFile], criteria: &CriteriaSet) -> GraderResult<GradeOutcome>;
}

/// Regex-based deduction engine
#[derive(Debug, Clone)]
pub struct DeductionEngine {
    base_score: f64,
    clamp_at_zero: bool,
}

/// A criterion with its pattern compiled
#[derive(Debug)]
struct CompiledCriterion<'a> {
    index: usize,
    regex: Regex,
    deduction: f64,
    message: &'a str,
}

impl DeductionEngine {
    /// Engine starting from `base_score` with no floor
    pub fn new(base_score: f64) -> Self {
        Self {
            base_score,
            clamp_at_zero: false,
        }
    }

    /// Engine configured from the `grading` section
    pub fn from_config(config: &GradingConfig) -> Self {
        Self {
            base_score: config.base_score,
            clamp_at_zero: config.clamp_at_zero,
        }
    }

    /// Floor the final grade at zero
    pub fn with_clamp_at_zero(mut self, clamp: bool) -> Self {
        self.clamp_at_zero = clamp;
        self
    }

    /// Compile every pattern, failing on the first invalid one
    fn compile<'a>(&self, criteria: &'a CriteriaSet) -> GraderResult<Vec<CompiledCriterion<'a>>> {
        criteria
            .iter()
            .enumerate()
            .map(|(index, criterion)| -> GraderResult<CompiledCriterion<'a>> {
                let regex =
                    Regex::new(&criterion.pattern).map_err(|e| GraderError::InvalidPattern {
                        index,
                        pattern: criterion.pattern.clone(),
                        message: e.to_string(),
                    })?;

                Ok(CompiledCriterion {
                    index,
                    regex,
                    deduction: criterion.deduction,
                    message: &criterion.message,
                })
            })
            .collect()
    }

    /// Collect every (criterion, file, line) match in feedback order
    pub fn find_deductions(
        &self,
        files: &[SourceFile],
        criteria: &CriteriaSet,
    ) -> GraderResult<Vec<DeductionEvent>> {
        let compiled = self.compile(criteria)?;
        let mut events = Vec::new();

        for file in files {
            for criterion in &compiled {
                let before = events.len();

                for (offset, line) in file.lines().enumerate() {
                    if criterion.regex.is_match(line) {
                        events.push(DeductionEvent {
                            criterion_index: criterion.index,
                            file_path: file.path.clone(),
                            line_number: offset + 1,
                            deduction: criterion.deduction,
                            message: criterion.message.to_string(),
                        });
                    }
                }

                tracing::debug!(
                    "Criterion #{} matched {} line(s) in {}",
                    criterion.index,
                    events.len() - before,
                    file.path
                );
            }
        }

        Ok(events)
    }
}

impl Default for DeductionEngine {
    fn default() -> Self {
        Self::from_config(&GradingConfig::default())
    }
}

impl GradingStrategy for DeductionEngine {
    fn name(&self) -> &'static str {
        "regex"
    }

    fn grade(&self, files: &[SourceFile], criteria: &CriteriaSet) -> GraderResult<GradeOutcome> {
        let events = self.find_deductions(files, criteria)?;

        let total: f64 = events.iter().map(|e| e.deduction).sum();
        let mut grade = self.base_score - total;
        if self.clamp_at_zero && grade < 0.0 {
            grade = 0.0;
        }

        let feedback = events
            .iter()
            .map(DeductionEvent::feedback_line)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();

        tracing::debug!(
            "Graded {} file(s) with {} criteria: {} deduction(s), grade {}",
            files.len(),
            criteria.len(),
            events.len(),
            grade
        );

        Ok(GradeOutcome { grade, feedback, events })
    }
}

/// Grade with the default engine (base score 100, no floor)
pub fn grade(files: &[SourceFile], criteria: &CriteriaSet) -> GraderResult<GradeOutcome> {
    DeductionEngine::default().grade(files, criteria)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Criterion;

    fn criteria(rules: &[(&str, f64, &str)]) -> CriteriaSet {
        rules
            .iter()
            .map(|(pattern, deduction, message)| Criterion::new(*pattern, *deduction, *message))
            .collect()
    }

    #[test]
    fn test_single_match_scenario() {
        let files = vec![SourceFile::new("Test.java", "public class Test {}")];
        let set = criteria(&[("Test", 10.0, "Use of Test class")]);

        let outcome = grade(&files, &set).unwrap();

        assert_eq!(outcome.grade, 90.0);
        assert_eq!(outcome.feedback, "- 10 points: Use of Test class in Test.java on line 1");
        assert_eq!(outcome.events.len(), 1);
    }

    #[test]
    fn test_two_criteria_on_one_line_in_declaration_order() {
        let files = vec![SourceFile::new("A.java", "List raw = new ArrayList();")];
        let set = criteria(&[("ArrayList\\(\\)", 5.0, "Raw constructor"), ("^List ", 3.0, "Raw type")]);

        let outcome = grade(&files, &set).unwrap();

        assert_eq!(outcome.grade, 92.0);
        assert_eq!(
            outcome.feedback,
            "- 5 points: Raw constructor in A.java on line 1\n- 3 points: Raw type in A.java on line 1"
        );
    }

    #[test]
    fn test_k_matching_lines_deduct_k_times() {
        let files = vec![
            SourceFile::new("A.java", "System.out.println(1);\nint x;\nSystem.out.println(2);"),
            SourceFile::new("B.java", "System.out.println(3);"),
        ];
        let set = criteria(&[("System\\.out", 2.0, "Console output")]);

        let outcome = grade(&files, &set).unwrap();

        assert_eq!(outcome.events.len(), 3);
        assert_eq!(outcome.grade, 94.0);
        let lines: Vec<_> = outcome.events.iter().map(|e| (e.file_path.as_str(), e.line_number)).collect();
        assert_eq!(lines, vec![("A.java", 1), ("A.java", 3), ("B.java", 1)]);
    }

    #[test]
    fn test_files_outer_criteria_middle_lines_inner() {
        let files = vec![
            SourceFile::new("A.java", "foo\nbar"),
            SourceFile::new("B.java", "bar\nfoo"),
        ];
        let set = criteria(&[("bar", 1.0, "bar"), ("foo", 1.0, "foo")]);

        let outcome = grade(&files, &set).unwrap();
        let order: Vec<_> = outcome
            .events
            .iter()
            .map(|e| format!("{}:{}:{}", e.file_path, e.message, e.line_number))
            .collect();

        assert_eq!(order, vec!["A.java:bar:2", "A.java:foo:1", "B.java:bar:1", "B.java:foo:2"]);
    }

    #[test]
    fn test_non_matching_criterion_contributes_nothing() {
        let files = vec![SourceFile::new("A.java", "class A {}")];
        let set = criteria(&[("goto", 50.0, "Never matches")]);

        let outcome = grade(&files, &set).unwrap();

        assert_eq!(outcome.grade, 100.0);
        assert!(outcome.feedback.is_empty());
        assert!(outcome.events.is_empty());
    }

    #[test]
    fn test_grade_goes_negative_without_clamp() {
        let files = vec![SourceFile::new("A.java", "x\nx\nx")];
        let set = criteria(&[("x", 40.0, "x")]);

        assert_eq!(grade(&files, &set).unwrap().grade, -20.0);

        let clamped = DeductionEngine::new(100.0).with_clamp_at_zero(true);
        assert_eq!(clamped.grade(&files, &set).unwrap().grade, 0.0);
    }

    #[test]
    fn test_invalid_pattern_fails_fast_naming_criterion() {
        let files = vec![SourceFile::new("A.java", "class A {}")];
        let set = criteria(&[("class", 1.0, "ok"), ("(unclosed", 1.0, "bad")]);

        match grade(&files, &set).unwrap_err() {
            GraderError::InvalidPattern { index, pattern, .. } => {
                assert_eq!(index, 1);
                assert_eq!(pattern, "(unclosed");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_grading_is_deterministic() {
        let files = vec![
            SourceFile::new("A.java", "int a = 42;\nint b = 7;"),
            SourceFile::new("pkg/B.java", "double c = 3.14;"),
        ];
        let set = criteria(&[("\\d+", 1.5, "Magic number"), ("int ", 0.5, "Primitive")]);

        let first = grade(&files, &set).unwrap();
        let second = grade(&files, &set).unwrap();

        assert_eq!(first, second);
        let expected: f64 = 100.0 - first.events.iter().map(|e| e.deduction).sum::<f64>();
        assert_eq!(first.grade, expected);
    }

    #[test]
    fn test_line_numbers_past_u16_range() {
        let mut content = "x\n".repeat(70_000);
        content.push_str("System.exit(1);\n");
        let files = vec![SourceFile::new("Big.java", content)];
        let set = criteria(&[("System\\.exit", 1.0, "Exit call")]);

        let outcome = grade(&files, &set).unwrap();

        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.events[0].line_number, 70_001usize);
        assert!(outcome.feedback.ends_with("on line 70001"));
    }

    #[test]
    fn test_partial_line_matches_count() {
        let files = vec![SourceFile::new("A.java", "    private static int counter = 0;")];
        let set = criteria(&[("static", 4.0, "Static state")]);

        assert_eq!(grade(&files, &set).unwrap().grade, 96.0);
    }
}
