//! Error taxonomy shared by every grading stage

/// Error types that can occur while uploading criteria or grading a submission
#[derive(Debug, thiserror::Error)]
pub enum GraderError {
    /// Criteria text is not a JSON array of criterion objects
    #[error("Invalid criteria format: {message}")]
    InvalidCriteriaFormat { message: String },

    /// A criterion's pattern failed to compile
    #[error("Invalid pattern in criterion #{index} ('{pattern}'): {message}")]
    InvalidPattern {
        index: usize,
        pattern: String,
        message: String,
    },

    /// The directory handed to the source collector does not exist
    #[error("Assignment path not found: {path}")]
    AssignmentPathNotFound { path: String },

    /// The assignment folder contained no files with a graded extension
    #[error("No source files matching {extensions} found in '{folder}'.")]
    NoSourceFilesFound { folder: String, extensions: String },

    /// The external git client failed or timed out
    #[error("Failed to clone repository: {detail}")]
    CloneFailed { detail: String },

    /// The assignment is unknown or has no stored criteria
    #[error("Grading criteria for '{assignment}' not found.")]
    CriteriaNotFound { assignment: String },

    /// The cloned repository has no folder named after the assignment
    #[error("Assignment folder '{folder}' not found in the repository.")]
    AssignmentFolderNotFound { folder: String },

    /// An assignment with this name is already registered
    #[error("Assignment already exists: {name}")]
    AssignmentAlreadyExists { name: String },

    /// Criteria upload with an extension outside the accepted set
    #[error("Invalid file type '{file_name}'. Only .txt, .docx, and .json files are allowed.")]
    UnsupportedCriteriaFileType { file_name: String },

    /// A grading request is missing a required field
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Configuration file could not be loaded or parsed
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The grading store rejected an operation
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// File could not be read or accessed
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl GraderError {
    /// Create an invalid criteria format error
    pub fn criteria_format(message: impl Into<String>) -> Self {
        Self::InvalidCriteriaFormat {
            message: message.into(),
        }
    }

    /// Create a clone failure carrying the client's diagnostic text
    pub fn clone_failed(detail: impl Into<String>) -> Self {
        Self::CloneFailed {
            detail: detail.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Stable machine-readable code for this error
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidCriteriaFormat { .. } => "invalid_criteria_format",
            Self::InvalidPattern { .. } => "invalid_pattern",
            Self::AssignmentPathNotFound { .. } => "assignment_path_not_found",
            Self::NoSourceFilesFound { .. } => "no_source_files_found",
            Self::CloneFailed { .. } => "clone_failed",
            Self::CriteriaNotFound { .. } => "criteria_not_found",
            Self::AssignmentFolderNotFound { .. } => "assignment_folder_not_found",
            Self::AssignmentAlreadyExists { .. } => "assignment_already_exists",
            Self::UnsupportedCriteriaFileType { .. } => "unsupported_criteria_file_type",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::Configuration { .. } => "configuration",
            Self::Storage { .. } => "storage",
            Self::Io { .. } => "io",
        }
    }

    /// Whether this error means a requested resource is absent
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::AssignmentPathNotFound { .. }
                | Self::NoSourceFilesFound { .. }
                | Self::CriteriaNotFound { .. }
                | Self::AssignmentFolderNotFound { .. }
        )
    }
}

impl From<rusqlite::Error> for GraderError {
    fn from(err: rusqlite::Error) -> Self {
        Self::storage(err.to_string())
    }
}

/// Result type for grading operations
pub type GraderResult<T> = Result<T, GraderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_match_user_facing_wording() {
        let err = GraderError::CriteriaNotFound {
            assignment: "Lab1".to_string(),
        };
        assert_eq!(err.to_string(), "Grading criteria for 'Lab1' not found.");

        let err = GraderError::clone_failed("fatal: repository not found");
        assert_eq!(
            err.to_string(),
            "Failed to clone repository: fatal: repository not found"
        );

        let err = GraderError::UnsupportedCriteriaFileType {
            file_name: "criteria.pdf".to_string(),
        };
        assert!(err.to_string().contains("Only .txt, .docx, and .json files are allowed."));
    }

    #[test]
    fn test_not_found_classification() {
        assert!(GraderError::AssignmentFolderNotFound {
            folder: "Lab1".to_string()
        }
        .is_not_found());
        assert!(!GraderError::clone_failed("boom").is_not_found());
        assert_eq!(GraderError::clone_failed("boom").kind(), "clone_failed");
    }
}
