//! Media library catalog over the storage layer.
//!
//! # Responsibility
//! - Own the catalog connection and keep its schema current.
//! - Expose typed add/count/list/search operations to the player UI.
//!
//! # Invariants
//! - Results are ordered by album, then item name.
//! - Search terms are parameter-bound, never spliced into SQL text.
//! - An unopened catalog degrades to empty results instead of failing hard.

mod schema;

use crate::db::{Connection, DataType, OpenMode, Statement};
use crate::model::media_item::{MediaItem, MediaKind};
use log::warn;
use std::path::Path;

/// Kind key meaning "match every kind" in the cached query statements.
///
/// Engine surrogate keys start at 1, so 0 never collides with a real key.
const WILDCARD_KEY: i64 = 0;

const ADD_SQL: &str =
    "INSERT INTO items (name, uri, thumbnail, album_id, type_id) VALUES (?1, ?2, ?3, ?4, ?5)";

const COUNT_SQL: &str = "SELECT COUNT(*) FROM items WHERE (?1 = 0 OR type_id = ?1)";

const LIST_SQL: &str = "SELECT items.item_id, items.name, items.uri, items.thumbnail \
     FROM items LEFT JOIN albums ON items.album_id = albums.album_id \
     WHERE (?1 = 0 OR items.type_id = ?1) \
     ORDER BY albums.album, items.name";

const SEARCH_SQL: &str = "SELECT items.item_id, items.name, items.uri, items.thumbnail \
     FROM items LEFT JOIN albums ON items.album_id = albums.album_id \
     WHERE (?1 = 0 OR items.type_id = ?1) \
     AND (items.name LIKE ?2 OR albums.album LIKE ?2) \
     ORDER BY albums.album, items.name";

const TYPE_KEY_SQL: &str = "SELECT type_id FROM types WHERE type = ?1";
const ALBUM_KEY_SQL: &str = "SELECT album_id FROM albums WHERE album = ?1";
const ALBUM_ADD_SQL: &str = "INSERT INTO albums (album) VALUES (?1)";

/// Schema-versioned catalog of the player's media records.
///
/// The catalog owns its connection; frequently used statements are prepared
/// once on first use and rebound per call.
pub struct Library {
    add_stmt: Option<Statement>,
    count_stmt: Option<Statement>,
    list_stmt: Option<Statement>,
    search_stmt: Option<Statement>,
    type_stmt: Option<Statement>,
    album_stmt: Option<Statement>,
    album_add_stmt: Option<Statement>,
    // Declared last: statements drop first, before their connection.
    conn: Connection,
}

impl Library {
    /// Opens the catalog at `location`, or in memory when it is empty, and
    /// brings the schema to the expected version.
    ///
    /// A location that cannot be opened leaves the catalog in the degraded
    /// state reported by [`Library::opened`]: every operation stays legal
    /// and returns empty results.
    pub fn open(location: impl AsRef<Path>) -> Self {
        let conn = Connection::open(location, OpenMode::ReadWrite);
        schema::ensure(&conn);

        Self {
            add_stmt: None,
            count_stmt: None,
            list_stmt: None,
            search_stmt: None,
            type_stmt: None,
            album_stmt: None,
            album_add_stmt: None,
            conn,
        }
    }

    /// Reports whether the underlying database opened successfully.
    pub fn opened(&self) -> bool {
        self.conn.opened()
    }

    /// Records one media item.
    ///
    /// The wildcard kind is caller misuse: the call is logged and ignored
    /// rather than treated as a hard error. A novel album name creates the
    /// album row on first use.
    pub fn add(
        &mut self,
        title: &str,
        uri: &str,
        kind: MediaKind,
        thumbnail: Option<&str>,
        album: Option<&str>,
    ) {
        if kind == MediaKind::All {
            warn!("event=library_add module=library status=rejected reason=wildcard_kind title={title}");
            return;
        }
        if !self.conn.opened() {
            return;
        }

        let type_key = self.kind_key(kind);
        let album_key = album.and_then(|name| self.album_key(name));

        let stmt = cached(&self.conn, &mut self.add_stmt, ADD_SQL);
        stmt.bind_text(1, title);
        stmt.bind_text(2, uri);
        match thumbnail {
            Some(path) => stmt.bind_text(3, path),
            None => stmt.bind_null(3),
        };
        match album_key {
            Some(key) => stmt.bind_integer(4, key),
            None => stmt.bind_null(4),
        };
        stmt.bind_integer(5, type_key);

        if !stmt.execute() {
            warn!("event=library_add module=library status=error title={title}");
        }
    }

    /// Number of items of `kind`; the wildcard counts everything.
    pub fn count(&mut self, kind: MediaKind) -> u64 {
        let key = self.kind_key(kind);
        let stmt = cached(&self.conn, &mut self.count_stmt, COUNT_SQL);
        stmt.bind_integer(1, key);

        if stmt.execute() && stmt.has_data() {
            stmt.column_integer(0).max(0) as u64
        } else {
            0
        }
    }

    /// All items of `kind`, ordered by album then name.
    pub fn list(&mut self, kind: MediaKind) -> Vec<MediaItem> {
        let key = self.kind_key(kind);
        let stmt = cached(&self.conn, &mut self.list_stmt, LIST_SQL);
        stmt.bind_integer(1, key);
        decode_items(stmt)
    }

    /// Items of `kind` whose name or album contains `term`, ordered by album
    /// then name. Matching is a case-insensitive substring comparison.
    pub fn search(&mut self, kind: MediaKind, term: &str) -> Vec<MediaItem> {
        let key = self.kind_key(kind);
        let stmt = cached(&self.conn, &mut self.search_stmt, SEARCH_SQL);
        stmt.bind_integer(1, key);
        stmt.bind_text(2, &like_pattern(term));
        decode_items(stmt)
    }

    /// Resolves a kind to its surrogate key; the wildcard maps to
    /// [`WILDCARD_KEY`].
    ///
    /// A missing seed row resolves to -1, which matches nothing; the schema
    /// seeds every concrete kind, so that only happens on a corrupt catalog.
    fn kind_key(&mut self, kind: MediaKind) -> i64 {
        let Some(name) = kind_to_db(kind) else {
            return WILDCARD_KEY;
        };

        let opened = self.conn.opened();
        let stmt = cached(&self.conn, &mut self.type_stmt, TYPE_KEY_SQL);
        stmt.bind_text(1, name);
        if stmt.execute() && stmt.has_data() {
            stmt.column_integer(0)
        } else {
            if opened {
                warn!("event=library_kind module=library status=missing kind={name}");
            }
            -1
        }
    }

    /// Resolves an album name to its surrogate key, creating the album row
    /// on first use.
    fn album_key(&mut self, name: &str) -> Option<i64> {
        if let Some(key) = self.album_lookup(name) {
            return Some(key);
        }

        let stmt = cached(&self.conn, &mut self.album_add_stmt, ALBUM_ADD_SQL);
        stmt.bind_text(1, name);
        if !stmt.execute() {
            warn!("event=library_album module=library status=error album={name}");
            return None;
        }

        self.album_lookup(name)
    }

    fn album_lookup(&mut self, name: &str) -> Option<i64> {
        let stmt = cached(&self.conn, &mut self.album_stmt, ALBUM_KEY_SQL);
        stmt.bind_text(1, name);
        if stmt.execute() && stmt.has_data() {
            Some(stmt.column_integer(0))
        } else {
            None
        }
    }
}

/// Returns the statement cached in `slot`, preparing it on first use.
fn cached<'a>(conn: &Connection, slot: &'a mut Option<Statement>, sql: &str) -> &'a mut Statement {
    slot.get_or_insert_with(|| Statement::prepare(conn, sql))
}

/// Decodes the remaining rows of an item query.
///
/// The thumbnail column is optional; a null tag selects the bare shape.
fn decode_items(stmt: &mut Statement) -> Vec<MediaItem> {
    let mut items = Vec::new();
    while stmt.next_row() {
        let id = stmt.column_integer(0);
        let title = stmt.column_text(1);
        let uri = stmt.column_text(2);

        let item = if stmt.data_type(3) == DataType::Null {
            MediaItem::new(id, title, uri)
        } else {
            MediaItem::with_thumbnail(id, title, uri, stmt.column_text(3))
        };
        items.push(item);
    }
    items
}

/// Wraps a raw search term for substring matching via parameter binding.
fn like_pattern(term: &str) -> String {
    format!("%{term}%")
}

fn kind_to_db(kind: MediaKind) -> Option<&'static str> {
    match kind {
        MediaKind::All => None,
        MediaKind::Music => Some("music"),
        MediaKind::Movies => Some("movie"),
    }
}

#[cfg(test)]
mod tests {
    use super::{kind_to_db, like_pattern};
    use crate::model::media_item::MediaKind;

    #[test]
    fn like_pattern_wraps_term() {
        assert_eq!(like_pattern("road"), "%road%");
        assert_eq!(like_pattern(""), "%%");
    }

    #[test]
    fn wildcard_kind_has_no_db_name() {
        assert_eq!(kind_to_db(MediaKind::All), None);
        assert_eq!(kind_to_db(MediaKind::Music), Some("music"));
        assert_eq!(kind_to_db(MediaKind::Movies), Some("movie"));
    }
}
