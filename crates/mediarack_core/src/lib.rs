//! Storage core for the mediarack media player.
//! This crate is the single owner of everything the player persists: a
//! connection abstraction over the embedded database, prepared statements
//! with safe invalidation, and the schema-versioned media library built on
//! top of both.

pub mod db;
pub mod library;
pub mod logging;
pub mod model;

pub use db::{Connection, DataType, OpenMode, Statement};
pub use library::Library;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::media_item::{ItemId, MediaItem, MediaKind};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
