//! Domain model for the media library.
//!
//! # Responsibility
//! - Define the value objects the catalog hands to UI callers.
//! - Keep persistence details out of the types the player renders.
//!
//! # Invariants
//! - Model values are immutable snapshots of catalog rows.
//! - Every item is identified by an engine-assigned surrogate key.

pub mod media_item;
