//! Embedded storage layer: connections and prepared statements.
//!
//! # Responsibility
//! - Own the engine handle for one database file or in-memory instance.
//! - Expose prepared, parameterized statements with typed column access.
//!
//! # Invariants
//! - A statement never outlives the validity of its connection reference:
//!   dropping a `Connection` invalidates every statement prepared on it.
//! - Open and prepare failures degrade to "no data"; they never panic and
//!   never surface as hard errors.
//! - Access is single-threaded per connection. Neither `Connection` nor
//!   `Statement` is `Send`, and the layer performs no locking of its own.

mod connection;
mod runtime;
mod statement;

pub use connection::{Connection, OpenMode};
pub use statement::{DataType, Statement};
