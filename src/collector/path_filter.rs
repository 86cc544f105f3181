//! Exclusion filtering using .gitignore-style patterns
//!
//! Patterns are evaluated in order against the path relative to the
//! assignment folder; the last matching pattern wins. A leading `!` turns an
//! exclusion into a re-inclusion. Patterns without a `/` match the file name
//! alone, patterns with one match the whole relative path.

use crate::domain::{GraderError, GraderResult};
use std::path::Path;

/// Decides whether a collected path should be skipped
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    patterns: Vec<FilterPattern>,
}

#[derive(Debug, Clone)]
struct FilterPattern {
    pattern: glob::Pattern,
    /// Pattern started with `!`
    is_include: bool,
    /// Pattern contains a `/` and is matched against the full relative path
    anchored: bool,
}

impl PathFilter {
    /// Build a filter from exclusion patterns
    pub fn new<I, S>(patterns: I) -> GraderResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filter = Self::default();
        for pattern in patterns {
            filter.add_pattern(pattern.as_ref())?;
        }
        Ok(filter)
    }

    /// Append a pattern; it takes precedence over earlier ones
    pub fn add_pattern(&mut self, pattern: &str) -> GraderResult<()> {
        let (is_include, raw) = match pattern.strip_prefix('!') {
            Some(stripped) => (true, stripped),
            None => (false, pattern),
        };

        let raw = raw.trim_start_matches('/');
        // "dir/" means everything below dir
        let expanded = match raw.strip_suffix('/') {
            Some(dir) => format!("{dir}/**"),
            None => raw.to_string(),
        };

        let compiled = glob::Pattern::new(&expanded).map_err(|e| {
            GraderError::config(format!("Invalid exclude pattern '{pattern}': {e}"))
        })?;

        self.patterns.push(FilterPattern {
            pattern: compiled,
            is_include,
            anchored: expanded.contains('/'),
        });
        Ok(())
    }

    /// Whether a relative path is excluded
    pub fn is_excluded(&self, relative: &Path) -> bool {
        let full = to_slash_path(relative);
        let file_name = relative
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut excluded = false;
        for pattern in &self.patterns {
            let matches = if pattern.anchored {
                pattern.pattern.matches(&full)
            } else {
                pattern.pattern.matches(&file_name)
                    || relative
                        .components()
                        .any(|c| pattern.pattern.matches(&c.as_os_str().to_string_lossy()))
            };

            if matches {
                excluded = !pattern.is_include;
            }
        }

        excluded
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Render a relative path with forward slashes on every platform
pub fn to_slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
