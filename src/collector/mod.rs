//! Source collection for an assignment folder
//!
//! Walks the folder, keeps files whose name ends with one of the configured
//! extensions, and reads them as text. Invalid UTF-8 is replaced rather than
//! rejected, but a file that cannot be read at all fails the pass. Symlinks
//! are never followed, including a symlinked root, which also rules out
//! directory cycles.

pub mod path_filter;

use crate::config::SourcesConfig;
use crate::domain::{GraderError, GraderResult, SourceFile};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub use path_filter::{to_slash_path, PathFilter};

/// Collects graded source files below a root directory
#[derive(Debug, Clone)]
pub struct SourceCollector {
    /// File name suffixes to include, e.g. ".java"
    extensions: Vec<String>,
    /// Exclusions applied to paths relative to the root
    filter: PathFilter,
}

impl SourceCollector {
    /// Create a collector for the given extensions, with no exclusions
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: extensions.into_iter().map(Into::into).collect(),
            filter: PathFilter::default(),
        }
    }

    /// Create a collector from the `sources` configuration section
    pub fn from_config(config: &SourcesConfig) -> GraderResult<Self> {
        Ok(Self {
            extensions: config.extensions.clone(),
            filter: PathFilter::new(&config.exclude)?,
        })
    }

    /// Replace the exclusion filter
    pub fn with_filter(mut self, filter: PathFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Collect every matching file below `root`, sorted by relative path.
    /// A root that is a symlink is treated as missing.
    pub fn collect<P: AsRef<Path>>(&self, root: P) -> GraderResult<Vec<SourceFile>> {
        let root = root.as_ref();

        let is_real_dir = fs::symlink_metadata(root)
            .map(|meta| meta.file_type().is_dir())
            .unwrap_or(false);
        if !is_real_dir {
            return Err(GraderError::AssignmentPathNotFound {
                path: root.display().to_string(),
            });
        }

        let candidates = self.find_candidates(root)?;
        tracing::debug!("Found {} candidate source files", candidates.len());

        let mut files = read_sources(&candidates)?;
        files.sort_by(|a, b| a.path.cmp(&b.path));

        if files.is_empty() {
            return Err(GraderError::NoSourceFilesFound {
                folder: root
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| root.display().to_string()),
                extensions: self.extensions.join(", "),
            });
        }

        Ok(files)
    }

    /// Walk the tree and return (absolute, relative) pairs for matching files
    fn find_candidates(&self, root: &Path) -> GraderResult<Vec<(PathBuf, String)>> {
        let mut candidates = Vec::new();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || entry
                        .path()
                        .strip_prefix(root)
                        .map(|relative| !self.filter.is_excluded(relative))
                        .unwrap_or(true)
            });

        for entry in walker {
            let entry = entry.map_err(|e| {
                let relative = e
                    .path()
                    .and_then(|p| p.strip_prefix(root).ok())
                    .map(to_slash_path)
                    .unwrap_or_default();
                let reason = e
                    .io_error()
                    .map(|io| io.to_string())
                    .unwrap_or_else(|| "filesystem loop".to_string());
                tracing::warn!("Walk failed at '{}': {}", relative, reason);
                std::io::Error::new(
                    e.io_error().map_or(std::io::ErrorKind::Other, |io| io.kind()),
                    format!("cannot walk '{relative}': {reason}"),
                )
            })?;

            if !entry.file_type().is_file() || !self.has_graded_extension(entry.file_name()) {
                continue;
            }

            if let Ok(relative) = entry.path().strip_prefix(root) {
                candidates.push((entry.path().to_path_buf(), to_slash_path(relative)));
            }
        }

        Ok(candidates)
    }

    fn has_graded_extension(&self, file_name: &std::ffi::OsStr) -> bool {
        let name = file_name.to_string_lossy();
        self.extensions.iter().any(|ext| name.ends_with(ext.as_str()))
    }
}

/// Read every candidate in parallel; any unreadable file fails the pass
fn read_sources(candidates: &[(PathBuf, String)]) -> GraderResult<Vec<SourceFile>> {
    candidates
        .par_iter()
        .map(|(absolute, relative)| match fs::read(absolute) {
            Ok(bytes) => Ok(SourceFile::new(
                relative.clone(),
                String::from_utf8_lossy(&bytes).into_owned(),
            )),
            Err(e) => {
                tracing::warn!("Cannot read source file {}: {}", relative, e);
                Err(GraderError::from(std::io::Error::new(
                    e.kind(),
                    format!("cannot read '{relative}': {e}"),
                )))
            }
        })
        .collect()
}

/// Collect files below `root_directory` whose names end with `extension`
pub fn collect<P: AsRef<Path>>(root_directory: P, extension: &str) -> GraderResult<Vec<SourceFile>> {
    SourceCollector::new([extension]).collect(root_directory)
}
