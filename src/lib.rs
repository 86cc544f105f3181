//! Repo Grader - criteria-driven grading of student repositories
//!
//! A submission is cloned into a throwaway directory, the assignment folder's
//! source files are scanned line by line against regex deduction rules, and
//! the resulting grade and feedback are appended to the grading history.
//!
//! The library exposes each stage on its own (`criteria`, `collector`,
//! `engine`) and the full pipeline through [`Grader`].

pub mod collector;
pub mod config;
pub mod criteria;
pub mod domain;
pub mod engine;
pub mod fetch;
pub mod grading;
pub mod report;
pub mod store;

// Re-export main types for convenient access
pub use domain::{
    Assignment, CriteriaSet, Criterion, DeductionEvent, GraderError, GraderResult,
    GradingRequest, GradingResponse, GradingResult, SkippedCriterion, SourceFile,
};

pub use config::GraderConfig;

pub use collector::{PathFilter, SourceCollector};

pub use criteria::ParsedCriteria;

pub use engine::{DeductionEngine, GradeOutcome, GradingStrategy};

pub use fetch::{GitCli, RepositoryFetcher};

pub use grading::Grader;

pub use report::{OutputFormat, ReportFormatter, ReportOptions};

pub use store::{GradingStore, MemoryStore, SqliteStore};

use std::path::Path;
use std::sync::Arc;

/// Build a grader backed by the configured SQLite database and the system git
pub fn open_grader(config: &GraderConfig) -> GraderResult<Grader> {
    config.validate()?;
    let store = SqliteStore::open(&config.database.path)?;
    let fetcher = GitCli::from_config(&config.clone);
    Grader::new(config, Arc::new(store), Arc::new(fetcher))
}

/// Build a grader that never touches the configured database
pub fn offline_grader(config: &GraderConfig) -> GraderResult<Grader> {
    config.validate()?;
    let fetcher = GitCli::from_config(&config.clone);
    Grader::new(config, Arc::new(MemoryStore::new()), Arc::new(fetcher))
}

/// Grade a local folder with default settings, without persisting anything
pub fn grade_directory<P: AsRef<Path>>(
    directory: P,
    criteria_text: &str,
) -> GraderResult<GradeOutcome> {
    let parsed = criteria::parse(criteria_text)?;
    let files = SourceCollector::from_config(&config::SourcesConfig::default())?.collect(directory)?;
    DeductionEngine::default().grade(&files, &parsed.criteria)
}
