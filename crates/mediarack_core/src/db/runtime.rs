//! Process-wide engine lifecycle.
//!
//! # Responsibility
//! - Tie engine bring-up and teardown to the set of live storage objects.
//! - Make both transitions observable in logs.
//!
//! # Invariants
//! - At most one `EngineRuntime` exists at any time.
//! - The runtime is kept alive by the handles held in connections and
//!   statements, never by a hidden global counter.

use log::debug;
use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex, Weak};

static RUNTIME: Lazy<Mutex<Weak<EngineRuntime>>> = Lazy::new(|| Mutex::new(Weak::new()));

/// Shared handle keeping the engine runtime alive.
pub(crate) type RuntimeHandle = Arc<EngineRuntime>;

/// Marker for the engine's process-wide lifecycle.
///
/// The bundled engine initializes itself lazily on first use; this object
/// mirrors that lifecycle so teardown ordering is tied to the last live
/// connection or statement.
pub(crate) struct EngineRuntime;

impl Drop for EngineRuntime {
    fn drop(&mut self) {
        debug!("event=engine_shutdown module=db status=ok");
    }
}

/// Returns the current runtime, creating it when no holder is alive.
pub(crate) fn acquire() -> RuntimeHandle {
    let mut slot = match RUNTIME.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    if let Some(runtime) = slot.upgrade() {
        return runtime;
    }

    debug!("event=engine_init module=db status=ok");
    let runtime = Arc::new(EngineRuntime);
    *slot = Arc::downgrade(&runtime);
    runtime
}

#[cfg(test)]
mod tests {
    use super::acquire;
    use std::sync::Arc;

    #[test]
    fn concurrent_holders_share_one_runtime() {
        let first = acquire();
        let second = acquire();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
