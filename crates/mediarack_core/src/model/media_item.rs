//! Media item value object and kind enumeration.
//!
//! # Responsibility
//! - Carry one playable entry from the catalog to the UI.
//! - Name the symbolic media kinds persisted in the `types` table.
//!
//! # Invariants
//! - A `MediaItem` is only constructed by decoding catalog rows and never
//!   changes after construction.
//! - The thumbnail is optional; its absence is part of the value.

use serde::{Deserialize, Serialize};

/// Engine-assigned surrogate key of a catalog row.
pub type ItemId = i64;

/// Symbolic media category.
///
/// `All` is the query wildcard; only the concrete kinds are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// Matches every concrete kind in queries; rejected for inserts.
    All,
    Music,
    Movies,
}

/// One playable entry decoded from the library's `items` rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    id: ItemId,
    title: String,
    uri: String,
    thumbnail: Option<String>,
}

impl MediaItem {
    /// Builds an item without a thumbnail.
    pub(crate) fn new(id: ItemId, title: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            uri: uri.into(),
            thumbnail: None,
        }
    }

    /// Builds an item carrying a thumbnail path.
    pub(crate) fn with_thumbnail(
        id: ItemId,
        title: impl Into<String>,
        uri: impl Into<String>,
        thumbnail: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            uri: uri.into(),
            thumbnail: Some(thumbnail.into()),
        }
    }

    /// Surrogate key of the catalog row this item was decoded from.
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Display title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Source URI handed to the playback pipeline.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Thumbnail path, when one was stored.
    pub fn thumbnail(&self) -> Option<&str> {
        self.thumbnail.as_deref()
    }
}
