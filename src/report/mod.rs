//! Report generation with multiple output formats
//!
//! Formatters turn a `GradingResponse` or a grade history into text for a
//! terminal, a machine consumer or a GitHub Actions log.

use crate::domain::{GraderError, GraderResult, GradingResponse, GradingResult};
use serde_json::Value as JsonValue;
use std::io::Write;
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable summary, colored when enabled
    Human,
    /// JSON for programmatic consumption
    Json,
    /// GitHub Actions workflow annotations
    GitHub,
}

impl OutputFormat {
    pub fn all_formats() -> &'static [&'static str] {
        &["human", "json", "github"]
    }
}

impl FromStr for OutputFormat {
    type Err = GraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "github" => Ok(Self::GitHub),
            other => Err(GraderError::config(format!(
                "unknown output format '{}', expected one of: {}",
                other,
                Self::all_formats().join(", ")
            ))),
        }
    }
}

/// Options for customizing report output
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Whether to use colored output (human format only)
    pub use_colors: bool,
    /// Whether to list every deduction or only the summary
    pub show_deductions: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            use_colors: true,
            show_deductions: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Tone {
    Good,
    Bad,
    Warn,
    Dim,
    Strong,
}

/// Renders grading output in the requested format
#[derive(Debug, Clone, Default)]
pub struct ReportFormatter {
    options: ReportOptions,
}

impl ReportFormatter {
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    /// Format the outcome of one grading run
    pub fn format_response(
        &self,
        response: &GradingResponse,
        format: OutputFormat,
    ) -> GraderResult<String> {
        match format {
            OutputFormat::Human => Ok(self.response_human(response)),
            OutputFormat::Json => to_pretty_json(response),
            OutputFormat::GitHub => Ok(self.response_github(response)),
        }
    }

    /// Format a list of stored grading results
    pub fn format_history(
        &self,
        results: &[GradingResult],
        format: OutputFormat,
    ) -> GraderResult<String> {
        match format {
            OutputFormat::Human => Ok(self.history_human(results)),
            OutputFormat::Json => to_pretty_json(&results),
            OutputFormat::GitHub => Ok(self.history_github(results)),
        }
    }

    pub fn write_response<W: Write>(
        &self,
        response: &GradingResponse,
        format: OutputFormat,
        mut writer: W,
    ) -> GraderResult<()> {
        let formatted = self.format_response(response, format)?;
        writer.write_all(formatted.as_bytes())?;
        Ok(())
    }

    fn response_human(&self, response: &GradingResponse) -> String {
        let result = &response.grading_result;
        let mut output = String::new();

        output.push_str(&format!(
            "{} {}\n\n",
            self.paint("Assignment", Tone::Strong),
            response.assignment_name
        ));

        if self.options.show_deductions && !response.deductions.is_empty() {
            for event in &response.deductions {
                output.push_str(&format!(
                    "  {} {}\n",
                    self.paint(&format!("{}:{}", event.file_path, event.line_number), Tone::Dim),
                    self.paint(&format!("-{} {}", event.deduction, event.message), Tone::Warn)
                ));
            }
            output.push('\n');
        }

        for skipped in &response.skipped_criteria {
            output.push_str(&format!(
                "  {} criterion #{}: {}\n",
                self.paint("skipped", Tone::Warn),
                skipped.index,
                skipped.reason
            ));
        }
        if !response.skipped_criteria.is_empty() {
            output.push('\n');
        }

        let tone = if response.deductions.is_empty() {
            Tone::Good
        } else if result.grade < 0.0 {
            Tone::Bad
        } else {
            Tone::Warn
        };
        output.push_str(&format!(
            "{} {} for {} ({} deduction{} in {} file{}, -{} points)\n",
            self.paint("Grade:", Tone::Strong),
            self.paint(&result.grade.to_string(), tone),
            result.student_id,
            response.deductions.len(),
            plural(response.deductions.len()),
            response.files_graded,
            plural(response.files_graded),
            response.total_deducted()
        ));
        output.push_str(&format!("{}\n", response.message));

        output
    }

    fn response_github(&self, response: &GradingResponse) -> String {
        let mut output = String::new();

        for event in &response.deductions {
            output.push_str(&format!(
                "::warning file={}/{},line={},title=-{} points::{}\n",
                response.assignment_name,
                event.file_path,
                event.line_number,
                event.deduction,
                escape_annotation(&event.message)
            ));
        }
        output.push_str(&format!(
            "::notice title=Grade::{} scored {}\n",
            response.assignment_name, response.grading_result.grade
        ));

        output
    }

    fn history_human(&self, results: &[GradingResult]) -> String {
        if results.is_empty() {
            return "No grades recorded\n".to_string();
        }

        let mut output = String::new();
        for result in results {
            output.push_str(&format!(
                "{}  {}  {}  {}\n",
                self.paint(&result.graded_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(), Tone::Dim),
                result.assignment_name,
                result.student_id,
                self.paint(&result.grade.to_string(), Tone::Strong)
            ));
            if !result.feedback.is_empty() {
                for line in result.feedback.lines() {
                    output.push_str(&format!("    {line}\n"));
                }
            }
        }
        output
    }

    fn history_github(&self, results: &[GradingResult]) -> String {
        results
            .iter()
            .map(|r| {
                format!(
                    "::notice title={}::{} scored {}\n",
                    r.assignment_name, r.student_id, r.grade
                )
            })
            .collect()
    }

    #[cfg(feature = "colors")]
    fn paint(&self, text: &str, tone: Tone) -> String {
        use colored::Colorize;

        if !self.options.use_colors {
            return text.to_string();
        }
        match tone {
            Tone::Good => text.green().bold().to_string(),
            Tone::Bad => text.red().bold().to_string(),
            Tone::Warn => text.yellow().to_string(),
            Tone::Dim => text.dimmed().to_string(),
            Tone::Strong => text.bold().to_string(),
        }
    }

    #[cfg(not(feature = "colors"))]
    fn paint(&self, text: &str, _tone: Tone) -> String {
        text.to_string()
    }
}

fn to_pretty_json<T: serde::Serialize + ?Sized>(value: &T) -> GraderResult<String> {
    let json: JsonValue = serde_json::to_value(value)
        .map_err(|e| GraderError::config(format!("JSON serialization failed: {}", e)))?;
    serde_json::to_string_pretty(&json)
        .map_err(|e| GraderError::config(format!("JSON serialization failed: {}", e)))
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Escape workflow command data
fn escape_annotation(s: &str) -> String {
    s.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}
