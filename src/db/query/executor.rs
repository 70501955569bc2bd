use std::fs;
use std::path::Path;

use crate::db::session::SqlSession;

use super::{ExecutionUnit, LogEntry, ScriptSummary, UnitKind};

const STATEMENT_PREVIEW_CHARS: usize = 50;
const BLOCK_PREVIEW_CHARS: usize = 30;

pub struct QueryExecutor;

impl QueryExecutor {
    /// First `max_chars` characters of `sql`, never splitting a UTF-8 sequence.
    pub fn preview(sql: &str, max_chars: usize) -> &str {
        match sql.char_indices().nth(max_chars) {
            Some((idx, _)) => &sql[..idx],
            None => sql,
        }
    }

    /// Read a script file and run every unit in it against `session`.
    ///
    /// A read failure is logged and yields an empty summary with
    /// `read_error` set. Nothing is committed here.
    pub fn execute_file<S, F>(session: &mut S, path: &Path, mut log: F) -> ScriptSummary
    where
        S: SqlSession + ?Sized,
        F: FnMut(&LogEntry),
    {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                log(&LogEntry::error(format!("Error reading SQL file: {err}")));
                return ScriptSummary {
                    read_error: true,
                    ..ScriptSummary::default()
                };
            }
        };

        Self::execute_script(session, &text, log)
    }

    pub fn execute_script<S, F>(session: &mut S, text: &str, mut log: F) -> ScriptSummary
    where
        S: SqlSession + ?Sized,
        F: FnMut(&LogEntry),
    {
        let segmentation = Self::segment_script(text);
        let summary = Self::execute_units(session, &segmentation.units, &mut log);

        if let Some(block) = segmentation.dropped_block {
            log(&LogEntry::error(format!(
                "Skipped unterminated block (no closing '/'): {}...",
                Self::preview(&block, BLOCK_PREVIEW_CHARS)
            )));
        }

        summary
    }

    /// Submit units in order. A failing unit is logged and the run moves on.
    pub fn execute_units<S, F>(session: &mut S, units: &[ExecutionUnit], mut log: F) -> ScriptSummary
    where
        S: SqlSession + ?Sized,
        F: FnMut(&LogEntry),
    {
        let mut summary = ScriptSummary::default();

        for unit in units {
            summary.submitted += 1;
            let entry = match session.execute(&unit.sql) {
                Ok(()) => {
                    summary.succeeded += 1;
                    LogEntry::ok(Self::success_message(unit))
                }
                Err(err) => {
                    summary.failed += 1;
                    LogEntry::error(Self::failure_message(unit, &err.to_string()))
                }
            };
            log(&entry);
        }

        summary
    }

    fn success_message(unit: &ExecutionUnit) -> String {
        if unit.is_block() {
            format!(
                "Executed Block: {}...",
                Self::preview(&unit.sql, BLOCK_PREVIEW_CHARS)
            )
        } else {
            format!(
                "Executed: {}...",
                Self::preview(&unit.sql, STATEMENT_PREVIEW_CHARS)
            )
        }
    }

    fn failure_message(unit: &ExecutionUnit, error: &str) -> String {
        match unit.kind {
            UnitKind::Block => format!("Error executing block: {error}"),
            UnitKind::Simple => format!("Error executing SQL: {error}"),
            UnitKind::Remainder => format!("Error executing remaining SQL: {error}"),
        }
    }
}
