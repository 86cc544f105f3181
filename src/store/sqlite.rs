//! SQLite-backed grading store

use super::GradingStore;
use crate::domain::{Assignment, GraderError, GraderResult, GradingResult};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Milliseconds a writer waits on a locked database before failing
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS assignments (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS criteria (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    assignment_id INTEGER NOT NULL UNIQUE REFERENCES assignments(id),
    text          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS grading_results (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    assignment_id INTEGER NOT NULL REFERENCES assignments(id),
    student_id    TEXT NOT NULL,
    grade         REAL NOT NULL,
    feedback      TEXT NOT NULL,
    graded_at     TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_grading_results_student ON grading_results(student_id);
"#;

const SELECT_RESULTS: &str = r#"
SELECT a.name, r.student_id, r.grade, r.feedback, r.graded_at
FROM grading_results r
JOIN assignments a ON a.id = r.assignment_id
"#;

/// Grading store over a single SQLite connection
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) a database file and apply the schema
    pub fn open<P: AsRef<Path>>(path: P) -> GraderResult<Self> {
        let conn = Connection::open(path.as_ref()).map_err(|e| {
            GraderError::storage(format!(
                "Failed to open database '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_connection(conn)
    }

    /// Private in-memory database, mostly for tests
    pub fn open_in_memory() -> GraderResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> GraderResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn get_conn(&self) -> GraderResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| GraderError::storage(format!("database lock poisoned: {e}")))
    }

    fn query_results(
        &self,
        filter: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> GraderResult<Vec<GradingResult>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!("{SELECT_RESULTS} {filter} ORDER BY r.id"))?;

        let rows = stmt.query_map(args, |row| {
            Ok(GradingResult {
                assignment_name: row.get(0)?,
                student_id: row.get(1)?,
                grade: row.get(2)?,
                feedback: row.get(3)?,
                graded_at: row.get(4)?,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl GradingStore for SqliteStore {
    fn create_assignment(&self, name: &str) -> GraderResult<Assignment> {
        let conn = self.get_conn()?;

        match conn.execute("INSERT INTO assignments (name) VALUES (?1)", params![name]) {
            Ok(_) => Ok(Assignment {
                id: conn.last_insert_rowid(),
                name: name.to_string(),
            }),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(GraderError::AssignmentAlreadyExists {
                    name: name.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn find_assignment(&self, name: &str) -> GraderResult<Option<Assignment>> {
        let conn = self.get_conn()?;
        let assignment = conn
            .query_row(
                "SELECT id, name FROM assignments WHERE name = ?1",
                params![name],
                |row| {
                    Ok(Assignment {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(assignment)
    }

    fn ensure_assignment(&self, name: &str) -> GraderResult<Assignment> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO assignments (name) VALUES (?1)",
            params![name],
        )?;
        let id = conn.query_row(
            "SELECT id FROM assignments WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(Assignment {
            id,
            name: name.to_string(),
        })
    }

    fn save_criteria(&self, assignment_id: i64, text: &str) -> GraderResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO criteria (assignment_id, text) VALUES (?1, ?2)
            ON CONFLICT(assignment_id) DO UPDATE SET text = excluded.text
            "#,
            params![assignment_id, text],
        )?;
        Ok(())
    }

    fn load_criteria(&self, assignment_id: i64) -> GraderResult<Option<String>> {
        let conn = self.get_conn()?;
        let text = conn
            .query_row(
                "SELECT text FROM criteria WHERE assignment_id = ?1",
                params![assignment_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(text)
    }

    fn append_result(&self, assignment_id: i64, result: &GradingResult) -> GraderResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO grading_results (assignment_id, student_id, grade, feedback, graded_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                assignment_id,
                result.student_id,
                result.grade,
                result.feedback,
                result.graded_at,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn list_results(&self) -> GraderResult<Vec<GradingResult>> {
        self.query_results("", &[])
    }

    fn results_for_student(&self, student_id: &str) -> GraderResult<Vec<GradingResult>> {
        self.query_results("WHERE r.student_id = ?1", &[&student_id])
    }
}
