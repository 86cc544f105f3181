//! Repo Grader CLI
//!
//! Translates commands into `Grader` operations and maps failures to exit
//! codes: 0 on success, 1 on grading or usage errors, 2 when something named
//! on the command line does not exist, 130 when interrupted with Ctrl-C.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use repo_grader::config::DEFAULT_CONFIG_FILES;
use repo_grader::{
    offline_grader, open_grader, Grader, GraderConfig, GraderError, GradingRequest, OutputFormat,
    ReportFormatter, ReportOptions,
};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

/// Repo Grader - criteria-driven grading of student repositories
#[derive(Parser)]
#[command(name = "repo-grader")]
#[command(version)]
#[command(about = "Grade student repositories against regex deduction criteria")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage assignments
    Assignment {
        #[command(subcommand)]
        action: AssignmentCommands,
    },

    /// Manage grading criteria
    Criteria {
        #[command(subcommand)]
        action: CriteriaCommands,
    },

    /// Clone a submission and grade one assignment folder
    Grade {
        /// Assignment name, also the folder graded inside the repository
        assignment: String,

        /// https URL of the submission repository
        #[arg(long)]
        repo: String,

        /// Access token used for the clone
        #[arg(long, env = "GRADER_TOKEN", hide_env_values = true)]
        token: String,

        /// Student the result is recorded for
        #[arg(long, env = "GRADER_STUDENT_ID")]
        student: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormatArg,
    },

    /// Grade a local assignment folder without cloning or recording
    Check {
        /// Assignment folder to grade
        directory: PathBuf,

        /// Criteria file (.json, .txt or .docx)
        #[arg(long)]
        criteria: PathBuf,

        /// Name shown in the report (defaults to the folder name)
        #[arg(long)]
        assignment: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormatArg,
    },

    /// List recorded grades
    Grades {
        /// Only show grades for this student
        #[arg(long)]
        student: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormatArg,
    },

    /// Validate configuration file
    ValidateConfig {
        /// Configuration file to validate
        config_file: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum AssignmentCommands {
    /// Register a new assignment
    Create { name: String },
}

#[derive(Subcommand)]
enum CriteriaCommands {
    /// Upload criteria for an assignment, replacing any existing criteria
    Upload {
        assignment: String,
        /// Criteria file (.json, .txt or .docx)
        file: PathBuf,
    },

    /// Print the stored criteria of an assignment
    Show { assignment: String },
}

#[derive(Copy, Clone, ValueEnum, PartialEq)]
enum OutputFormatArg {
    Human,
    Json,
    Github,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Github => OutputFormat::GitHub,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.log_json);

    match run_until_interrupted(run_command(cli), tokio::signal::ctrl_c()).await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(exit_code_for(&e));
        }
    }
}

async fn run_command(cli: Cli) -> anyhow::Result<i32> {
    if let Commands::ValidateConfig { config_file } = &cli.command {
        return Ok(run_validate_config(config_file.as_deref().or(cli.config.as_deref())));
    }

    let config = GraderConfig::discover(cli.config.as_deref())
        .context("failed to load configuration")?
        .with_env_overrides();
    let formatter = formatter(!cli.no_color);
    let grader = grader_for(&cli.command, &config)?;

    match cli.command {
        Commands::Assignment {
            action: AssignmentCommands::Create { name },
        } => {
            let assignment = grader.create_assignment(&name)?;
            println!("Assignment '{}' created (id {})", assignment.name, assignment.id);
            Ok(0)
        }
        Commands::Criteria { action } => match action {
            CriteriaCommands::Upload { assignment, file } => {
                let parsed = grader.upload_criteria(&assignment, &file)?;
                println!(
                    "Criteria uploaded for '{}': {} rule(s)",
                    assignment,
                    parsed.criteria.len()
                );
                for skipped in &parsed.skipped {
                    println!("  skipped #{}: {}", skipped.index, skipped.reason);
                }
                Ok(0)
            }
            CriteriaCommands::Show { assignment } => {
                println!("{}", grader.criteria_text(&assignment)?);
                Ok(0)
            }
        },
        Commands::Grade {
            assignment,
            repo,
            token,
            student,
            format,
        } => {
            let request = GradingRequest::new(assignment, repo, token, student);
            let response = grader.grade_assignment(&request).await?;
            print!("{}", formatter.format_response(&response, format.into())?);
            Ok(0)
        }
        Commands::Check {
            directory,
            criteria,
            assignment,
            format,
        } => {
            let name = assignment.unwrap_or_else(|| folder_name(&directory));
            let criteria_text = repo_grader::criteria::extract_criteria_text(&criteria)?;
            let response = grader.grade_local(&name, &directory, &criteria_text)?;
            print!("{}", formatter.format_response(&response, format.into())?);
            Ok(0)
        }
        Commands::Grades { student, format } => {
            let results = match student {
                Some(student) => grader.grades_for_student(&student)?,
                None => grader.all_grades()?,
            };
            print!("{}", formatter.format_history(&results, format.into())?);
            Ok(0)
        }
        Commands::ValidateConfig { .. } => Ok(0),
    }
}

/// Exit code reported when Ctrl-C stops a command
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Drive `work` until it finishes or `interrupt` fires. An interrupted command
/// is dropped in place, so its temporary clone directory is removed before
/// the process exits.
async fn run_until_interrupted<F, S>(work: F, interrupt: S) -> anyhow::Result<i32>
where
    F: Future<Output = anyhow::Result<i32>>,
    S: Future<Output = std::io::Result<()>>,
{
    tokio::pin!(work);

    tokio::select! {
        biased;
        result = &mut work => result,
        signal = interrupt => match signal {
            Ok(()) => {
                tracing::warn!("Interrupted, cleaning up");
                Ok(INTERRUPTED_EXIT_CODE)
            }
            Err(e) => {
                tracing::warn!("Cannot listen for Ctrl-C: {}", e);
                work.await
            }
        },
    }
}

/// `check` grades offline and must not create or lock the database
fn grader_for(command: &Commands, config: &GraderConfig) -> repo_grader::GraderResult<Grader> {
    match command {
        Commands::Check { .. } => offline_grader(config),
        _ => open_grader(config),
    }
}

fn run_validate_config(config_path: Option<&Path>) -> i32 {
    let config_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILES[0]));

    println!("Validating configuration: {}", config_path.display());

    match GraderConfig::load_from_file(&config_path) {
        Ok(config) => {
            println!("Configuration is valid");
            println!("  Extensions: {}", config.sources.extensions.join(", "));
            println!("  Excludes: {}", config.sources.exclude.len());
            println!("  Database: {}", config.database.path.display());
            0
        }
        Err(e) => {
            eprintln!("Configuration validation failed: {}", e);
            1
        }
    }
}

fn formatter(use_colors: bool) -> ReportFormatter {
    #[cfg(feature = "colors")]
    {
        if !use_colors {
            colored::control::set_override(false);
        }
    }

    ReportFormatter::new(ReportOptions {
        use_colors,
        ..Default::default()
    })
}

fn folder_name(directory: &Path) -> String {
    directory
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| directory.display().to_string())
}

fn exit_code_for(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<GraderError>() {
        Some(e) if e.is_not_found() => 2,
        _ => 1,
    }
}

fn init_logging(verbose: bool, json: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
