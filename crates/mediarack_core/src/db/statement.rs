//! Prepared statements: binding, execution, and typed row access.
//!
//! # Responsibility
//! - Compile one parameterized query against a connection and report
//!   validity as an explicit flag, not an error.
//! - Execute with a bounded retry on transient lock contention.
//! - Expose the engine's per-value runtime typing for column extraction.
//!
//! # Invariants
//! - An invalid statement (failed prepare, or its connection dropped) turns
//!   every operation into a no-op returning a failure sentinel.
//! - Binding a parameter always restarts the logical execution first.
//! - Bound values are copied; the caller's buffer can go away immediately.

use super::connection::{Connection, ConnectionCore};
use super::runtime::{self, RuntimeHandle};
use log::{debug, warn};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, ErrorCode};
use std::rc::{Rc, Weak};
use std::thread;
use std::time::Duration;

/// Attempt limit for transient lock contention in [`Statement::execute`].
const BUSY_ATTEMPTS: u32 = 5;

/// Pause between contention attempts.
const BUSY_PAUSE: Duration = Duration::from_micros(3);

/// Runtime type tag of a single column value.
///
/// The engine types values, not columns: the tag belongs to the value in the
/// current row and can differ between rows of the same column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Null,
    Binary,
    Integer,
    Real,
    Text,
}

/// One prepared, parameterized query plus its execution cursor.
///
/// A statement keeps only a weak reference to its connection. Dropping the
/// connection first is safe: the statement observes the retired reference
/// and degrades to `valid() == false`.
pub struct Statement {
    conn: Weak<ConnectionCore>,
    sql: String,
    valid: bool,
    parameter_count: usize,
    params: Vec<Value>,
    rows: Vec<Vec<Value>>,
    next_row: usize,
    active: bool,
    has_data: bool,
    _runtime: RuntimeHandle,
}

impl Statement {
    /// Compiles `sql` against `conn`.
    ///
    /// Preparation failure is an expected negative result, common for
    /// malformed queries: the statement reports `valid() == false` and the
    /// query text is discarded.
    pub fn prepare(conn: &Connection, sql: &str) -> Self {
        let runtime = runtime::acquire();

        let (valid, parameter_count) = match conn.core().handle() {
            Some(handle) => match handle.prepare(sql) {
                Ok(compiled) => (true, compiled.parameter_count()),
                Err(err) => {
                    debug!("event=stmt_prepare module=db status=invalid error={err}");
                    (false, 0)
                }
            },
            None => (false, 0),
        };

        Self {
            conn: Rc::downgrade(conn.core()),
            sql: if valid { sql.to_string() } else { String::new() },
            valid,
            parameter_count,
            params: vec![Value::Null; parameter_count],
            rows: Vec::new(),
            next_row: 0,
            active: false,
            has_data: false,
            _runtime: runtime,
        }
    }

    /// Reports whether the statement compiled and its connection is alive.
    pub fn valid(&self) -> bool {
        self.valid && self.conn.strong_count() > 0
    }

    /// Runs the statement from its current bindings and cursor position.
    ///
    /// Returns true when the engine completed a step, whether or not a row
    /// was produced; [`Statement::has_data`] distinguishes the two. A "busy"
    /// result from a concurrently locked database is retried a fixed number
    /// of times before giving up; any other engine error fails immediately.
    pub fn execute(&mut self) -> bool {
        if !self.valid() {
            self.has_data = false;
            return false;
        }

        if !self.active {
            return self.run_query();
        }

        if self.next_row < self.rows.len() {
            self.has_data = true;
            self.next_row += 1;
        } else {
            // Result set finished; the next execute re-runs the query.
            self.has_data = false;
            self.active = false;
        }
        true
    }

    /// True exactly when the most recent advance produced a row.
    pub fn has_data(&self) -> bool {
        self.has_data
    }

    /// Rewinds the statement, dropping any pending rows.
    ///
    /// Bindings survive a reset; the compiled query is kept.
    pub fn reset(&mut self) {
        self.has_data = false;
        self.active = false;
        self.next_row = 0;
        self.rows.clear();
    }

    /// Advances to the next row; true while one is available.
    pub fn next_row(&mut self) -> bool {
        self.execute() && self.has_data
    }

    /// Number of columns in the current row, 0 without one.
    pub fn columns(&self) -> usize {
        self.current_row().map_or(0, <[Value]>::len)
    }

    /// Runtime type of `column` in the current row.
    ///
    /// Out-of-range columns and a missing current row read as null.
    pub fn data_type(&self, column: usize) -> DataType {
        match self.value_at(column) {
            Some(Value::Integer(_)) => DataType::Integer,
            Some(Value::Real(_)) => DataType::Real,
            Some(Value::Text(_)) => DataType::Text,
            Some(Value::Blob(_)) => DataType::Binary,
            Some(Value::Null) | None => DataType::Null,
        }
    }

    /// Value of `column` as a byte array, empty when absent or null.
    pub fn column_blob(&self, column: usize) -> Vec<u8> {
        match self.value_at(column) {
            Some(Value::Blob(bytes)) => bytes.clone(),
            Some(Value::Text(text)) => text.clone().into_bytes(),
            Some(Value::Integer(value)) => value.to_string().into_bytes(),
            Some(Value::Real(value)) => real_to_text(*value).into_bytes(),
            Some(Value::Null) | None => Vec::new(),
        }
    }

    /// Value of `column` as an integer, 0 when absent or null.
    pub fn column_integer(&self, column: usize) -> i64 {
        match self.value_at(column) {
            Some(Value::Integer(value)) => *value,
            Some(Value::Real(value)) => *value as i64,
            Some(Value::Text(text)) => integer_prefix(text),
            Some(Value::Blob(bytes)) => integer_prefix(&String::from_utf8_lossy(bytes)),
            Some(Value::Null) | None => 0,
        }
    }

    /// Value of `column` as a float, 0.0 when absent or null.
    pub fn column_real(&self, column: usize) -> f64 {
        match self.value_at(column) {
            Some(Value::Real(value)) => *value,
            Some(Value::Integer(value)) => *value as f64,
            Some(Value::Text(text)) => real_prefix(text),
            Some(Value::Blob(bytes)) => real_prefix(&String::from_utf8_lossy(bytes)),
            Some(Value::Null) | None => 0.0,
        }
    }

    /// Value of `column` as text, empty when absent or null.
    pub fn column_text(&self, column: usize) -> String {
        match self.value_at(column) {
            Some(Value::Text(text)) => text.clone(),
            Some(Value::Integer(value)) => value.to_string(),
            Some(Value::Real(value)) => real_to_text(*value),
            Some(Value::Blob(bytes)) => String::from_utf8_lossy(bytes).into_owned(),
            Some(Value::Null) | None => String::new(),
        }
    }

    /// Binds null to the 1-based parameter `index`.
    pub fn bind_null(&mut self, index: usize) -> bool {
        self.bind_value(index, Value::Null)
    }

    /// Binds a copy of `value` to the 1-based parameter `index`.
    pub fn bind_blob(&mut self, index: usize, value: &[u8]) -> bool {
        self.bind_value(index, Value::Blob(value.to_vec()))
    }

    /// Binds an integer to the 1-based parameter `index`.
    pub fn bind_integer(&mut self, index: usize, value: i64) -> bool {
        self.bind_value(index, Value::Integer(value))
    }

    /// Binds a float to the 1-based parameter `index`.
    pub fn bind_real(&mut self, index: usize, value: f64) -> bool {
        self.bind_value(index, Value::Real(value))
    }

    /// Binds a copy of `value` to the 1-based parameter `index`.
    pub fn bind_text(&mut self, index: usize, value: &str) -> bool {
        self.bind_value(index, Value::Text(value.to_string()))
    }

    fn bind_value(&mut self, index: usize, value: Value) -> bool {
        // New parameters always start a fresh logical execution.
        self.reset();

        if !self.valid() || index == 0 || index > self.parameter_count {
            return false;
        }

        self.params[index - 1] = value;
        true
    }

    fn current_row(&self) -> Option<&[Value]> {
        if !self.has_data {
            return None;
        }
        self.rows.get(self.next_row - 1).map(Vec::as_slice)
    }

    fn value_at(&self, column: usize) -> Option<&Value> {
        self.current_row().and_then(|row| row.get(column))
    }

    fn run_query(&mut self) -> bool {
        let Some(core) = self.conn.upgrade() else {
            self.has_data = false;
            return false;
        };
        let Some(handle) = core.handle() else {
            self.has_data = false;
            return false;
        };

        let mut attempts = BUSY_ATTEMPTS;
        loop {
            match self.fetch_rows(handle) {
                Ok(rows) => {
                    self.rows = rows;
                    if self.rows.is_empty() {
                        self.has_data = false;
                        self.active = false;
                    } else {
                        self.has_data = true;
                        self.active = true;
                        self.next_row = 1;
                    }
                    return true;
                }
                Err(err) if is_busy(&err) && attempts > 1 => {
                    self.has_data = false;
                    attempts -= 1;
                    thread::sleep(BUSY_PAUSE);
                }
                Err(err) => {
                    warn!("event=stmt_execute module=db status=error error={err}");
                    self.has_data = false;
                    return false;
                }
            }
        }
    }

    fn fetch_rows(&self, handle: &rusqlite::Connection) -> rusqlite::Result<Vec<Vec<Value>>> {
        let mut compiled = handle.prepare_cached(&self.sql)?;
        let column_count = compiled.column_count();

        let mut rows = compiled.query(params_from_iter(self.params.iter().cloned()))?;
        let mut fetched = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(column_count);
            for column in 0..column_count {
                values.push(row.get::<_, Value>(column)?);
            }
            fetched.push(values);
        }

        Ok(fetched)
    }
}

fn is_busy(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _) if failure.code == ErrorCode::DatabaseBusy
    )
}

/// Parses the leading integer of `text` the way the engine coerces text:
/// optional sign, decimal digits, everything after is ignored.
fn integer_prefix(text: &str) -> i64 {
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }

    trimmed[..end].parse().unwrap_or(0)
}

/// Parses the leading decimal number of `text`, exponent included.
fn real_prefix(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exponent = end + 1;
        if exponent < bytes.len() && (bytes[exponent] == b'+' || bytes[exponent] == b'-') {
            exponent += 1;
        }
        let digits_start = exponent;
        while exponent < bytes.len() && bytes[exponent].is_ascii_digit() {
            exponent += 1;
        }
        if exponent > digits_start {
            end = exponent;
        }
    }

    trimmed[..end].parse().unwrap_or(0.0)
}

/// Renders a float the way the engine renders real columns as text: always
/// with a decimal point.
fn real_to_text(value: f64) -> String {
    let text = format!("{value}");
    if text.bytes().all(|byte| byte.is_ascii_digit() || byte == b'-') {
        format!("{text}.0")
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::{integer_prefix, real_prefix, real_to_text};

    #[test]
    fn integer_prefix_parses_leading_digits() {
        assert_eq!(integer_prefix("42"), 42);
        assert_eq!(integer_prefix("-17 items"), -17);
        assert_eq!(integer_prefix("  8"), 8);
        assert_eq!(integer_prefix("abc"), 0);
        assert_eq!(integer_prefix("-"), 0);
        assert_eq!(integer_prefix(""), 0);
    }

    #[test]
    fn real_prefix_parses_leading_number() {
        assert_eq!(real_prefix("3.25"), 3.25);
        assert_eq!(real_prefix("-0.5x"), -0.5);
        assert_eq!(real_prefix(".5"), 0.5);
        assert_eq!(real_prefix("2e3"), 2000.0);
        assert_eq!(real_prefix("1e"), 1.0);
        assert_eq!(real_prefix("none"), 0.0);
    }

    #[test]
    fn real_to_text_keeps_decimal_point() {
        assert_eq!(real_to_text(1.0), "1.0");
        assert_eq!(real_to_text(3.25), "3.25");
        assert_eq!(real_to_text(-2.0), "-2.0");
    }
}
