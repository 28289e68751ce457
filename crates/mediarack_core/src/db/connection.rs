//! Database connection handling.
//!
//! # Responsibility
//! - Open file-backed or in-memory databases with an explicit access mode.
//! - Share the engine handle with statements through a weak reference so a
//!   dropped connection invalidates them instead of leaving them dangling.
//!
//! # Invariants
//! - `opened()` is false after an open failure; every other operation stays
//!   legal and returns empty results.
//! - The engine handle is released only once the connection core is
//!   unreachable from every statement handle.

use super::runtime::{self, RuntimeHandle};
use super::statement::Statement;
use log::{info, warn};
use rusqlite::OpenFlags;
use std::path::Path;
use std::rc::Rc;

/// Access mode for [`Connection::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Open an existing database; never create the file.
    ReadOnly,
    /// Open the database, creating the file when absent.
    ReadWrite,
}

/// Shared state behind a connection.
///
/// Statements hold a `Weak` reference to this core. Once the owning
/// [`Connection`] drops, upgrades fail and every statement operation becomes
/// a no-op. The engine finalizes its cached prepared handles before the
/// connection handle itself is released.
pub(crate) struct ConnectionCore {
    handle: Option<rusqlite::Connection>,
}

impl ConnectionCore {
    pub(crate) fn handle(&self) -> Option<&rusqlite::Connection> {
        self.handle.as_ref()
    }
}

/// Owning handle to one embedded database instance.
pub struct Connection {
    core: Rc<ConnectionCore>,
    _runtime: RuntimeHandle,
}

impl Connection {
    /// Opens the database at `location`, or a private in-memory instance
    /// when `location` is empty.
    ///
    /// Open failure is not an error return: it leaves the connection in the
    /// unopened state reported by [`Connection::opened`], and every later
    /// operation degrades to "no data".
    pub fn open(location: impl AsRef<Path>, mode: OpenMode) -> Self {
        let runtime = runtime::acquire();
        let location = location.as_ref();

        let flags = match mode {
            OpenMode::ReadOnly => OpenFlags::SQLITE_OPEN_READ_ONLY,
            OpenMode::ReadWrite => {
                OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
            }
        } | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let opened = if location.as_os_str().is_empty() {
            rusqlite::Connection::open_in_memory_with_flags(flags)
        } else {
            rusqlite::Connection::open_with_flags(location, flags)
        };

        let handle = match opened {
            Ok(handle) => {
                info!(
                    "event=db_open module=db status=ok mode={mode:?} location={}",
                    describe_location(location)
                );
                Some(handle)
            }
            Err(err) => {
                warn!(
                    "event=db_open module=db status=degraded mode={mode:?} location={} error={err}",
                    describe_location(location)
                );
                None
            }
        };

        Self {
            core: Rc::new(ConnectionCore { handle }),
            _runtime: runtime,
        }
    }

    /// Opens a private in-memory database.
    pub fn in_memory() -> Self {
        Self::open("", OpenMode::ReadWrite)
    }

    /// Reports whether the underlying handle is usable.
    pub fn opened(&self) -> bool {
        self.core.handle.is_some()
    }

    /// Names of all user tables in the database, sorted.
    ///
    /// Empty on a fresh database and on an unopened connection.
    pub fn tables(&self) -> Vec<String> {
        let mut stmt = Statement::prepare(
            self,
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
        );

        let mut names = Vec::new();
        while stmt.next_row() {
            names.push(stmt.column_text(0));
        }
        names
    }

    pub(crate) fn core(&self) -> &Rc<ConnectionCore> {
        &self.core
    }
}

fn describe_location(location: &Path) -> String {
    if location.as_os_str().is_empty() {
        ":memory:".to_string()
    } else {
        location.display().to_string()
    }
}
