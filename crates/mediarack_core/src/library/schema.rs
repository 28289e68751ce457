//! Versioned library schema.
//!
//! # Responsibility
//! - Declare the on-disk DDL of the catalog.
//! - Detect version drift and rebuild the schema destructively.
//!
//! # Invariants
//! - After a successful migration the `version` row equals `SCHEMA_VERSION`.
//! - Migration never runs on an unopened connection.
//! - Every concrete media kind is seeded into `types` during migration.

use crate::db::{Connection, Statement};
use log::{info, warn};

/// Schema version the library code expects to find in `version`.
pub(crate) const SCHEMA_VERSION: i64 = 1;

/// Symbolic kinds seeded into `types`; keys are engine-assigned.
const SEED_KINDS: [&str; 2] = ["movie", "music"];

const CREATE_TABLES: [&str; 4] = [
    "CREATE TABLE version (version INTEGER PRIMARY KEY)",
    "CREATE TABLE types (type_id INTEGER PRIMARY KEY AUTOINCREMENT, type TEXT NOT NULL)",
    "CREATE TABLE albums (album_id INTEGER PRIMARY KEY AUTOINCREMENT, album TEXT NOT NULL, \
     thumbnail TEXT DEFAULT NULL)",
    "CREATE TABLE items (item_id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, \
     uri TEXT NOT NULL, thumbnail TEXT DEFAULT NULL, \
     album_id REFERENCES albums(album_id) ON DELETE SET NULL, \
     type_id REFERENCES types(type_id))",
];

// Children first, so the drops satisfy the foreign keys.
const DROP_TABLES: [&str; 4] = [
    "DROP TABLE IF EXISTS items",
    "DROP TABLE IF EXISTS albums",
    "DROP TABLE IF EXISTS types",
    "DROP TABLE IF EXISTS version",
];

/// Brings the connected database to the expected schema version.
///
/// A missing `version` table or a mismatched value is an expected first-run
/// or upgrade condition, answered with a destructive rebuild.
pub(crate) fn ensure(conn: &Connection) {
    if !conn.opened() {
        return;
    }
    if current_version(conn) == Some(SCHEMA_VERSION) {
        return;
    }
    migrate(conn);
}

fn current_version(conn: &Connection) -> Option<i64> {
    // Prepare fails while the table is missing; that is the first-run probe.
    let mut probe = Statement::prepare(conn, "SELECT version FROM version");
    if probe.execute() && probe.has_data() {
        Some(probe.column_integer(0))
    } else {
        None
    }
}

fn migrate(conn: &Connection) {
    info!("event=library_migrate module=library status=start version={SCHEMA_VERSION}");

    for sql in DROP_TABLES.iter().chain(CREATE_TABLES.iter()) {
        if !Statement::prepare(conn, sql).execute() {
            warn!("event=library_migrate module=library status=error sql={sql}");
            return;
        }
    }

    let mut seed = Statement::prepare(conn, "INSERT INTO types (type) VALUES (?1)");
    for kind in SEED_KINDS {
        seed.bind_text(1, kind);
        if !seed.execute() {
            warn!("event=library_migrate module=library status=error kind={kind}");
            return;
        }
    }

    let mut stamp = Statement::prepare(conn, "INSERT INTO version (version) VALUES (?1)");
    stamp.bind_integer(1, SCHEMA_VERSION);
    if !stamp.execute() {
        warn!("event=library_migrate module=library status=error step=version_stamp");
        return;
    }

    info!("event=library_migrate module=library status=ok version={SCHEMA_VERSION}");
}
