//! Callback trait for transform lifecycle events.
//!
//! Inject an [`Arc<dyn SessionObserver>`] via
//! [`crate::config::SessionConfigBuilder::observer`] to receive events as the
//! session dispatches and resolves transforms. The CLI uses it to drive a
//! spinner; a GUI would use it to enable and disable buttons.
//!
//! # Example
//!
//! ```rust
//! use skrivsmart::{OperationKind, SessionConfig, SessionObserver};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingObserver {
//!     finished: AtomicUsize,
//! }
//!
//! impl SessionObserver for CountingObserver {
//!     fn on_operation_success(&self, kind: OperationKind) {
//!         self.finished.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{kind} done");
//!     }
//! }
//!
//! let observer = Arc::new(CountingObserver { finished: AtomicUsize::new(0) });
//!
//! let config = SessionConfig::builder()
//!     .observer(observer as Arc<dyn SessionObserver>)
//!     .build()
//!     .unwrap();
//! ```

use crate::operation::OperationKind;
use std::sync::Arc;

/// Called by the session around every dispatched transform.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events are emitted outside the session's state lock,
/// so implementations may call back into read-only session accessors.
pub trait SessionObserver: Send + Sync {
    /// The busy lock was taken and the prompt service is about to be called.
    fn on_operation_start(&self, kind: OperationKind) {
        let _ = kind;
    }

    /// The response was validated and applied.
    fn on_operation_success(&self, kind: OperationKind) {
        let _ = kind;
    }

    /// The transform ended in `Failed`.
    ///
    /// # Arguments
    /// * `kind`: the failed transform
    /// * `error`: human-readable error description
    fn on_operation_failure(&self, kind: OperationKind, error: &str) {
        let _ = (kind, error);
    }
}

/// A no-op implementation for callers that don't need events.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// Convenience alias matching the type stored in [`crate::config::SessionConfig`].
pub type ObserverHandle = Arc<dyn SessionObserver>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        starts: AtomicUsize,
        failures: Mutex<Vec<String>>,
    }

    impl SessionObserver for Recorder {
        fn on_operation_start(&self, _kind: OperationKind) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_operation_failure(&self, kind: OperationKind, error: &str) {
            self.failures
                .lock()
                .unwrap()
                .push(format!("{kind}: {error}"));
        }
    }

    #[test]
    fn noop_observer_does_not_panic() {
        let obs = NoopObserver;
        obs.on_operation_start(OperationKind::Rewrite);
        obs.on_operation_success(OperationKind::Rewrite);
        obs.on_operation_failure(OperationKind::Rewrite, "boom");
    }

    #[test]
    fn recorder_receives_events() {
        let rec = Recorder::default();
        rec.on_operation_start(OperationKind::Brainstorm);
        rec.on_operation_failure(OperationKind::Brainstorm, "timeout");
        rec.on_operation_success(OperationKind::Brainstorm);

        assert_eq!(rec.starts.load(Ordering::SeqCst), 1);
        assert_eq!(rec.failures.lock().unwrap().as_slice(), ["brainstorm: timeout"]);
    }

    #[test]
    fn arc_dyn_observer_works() {
        let obs: ObserverHandle = Arc::new(NoopObserver);
        obs.on_operation_start(OperationKind::FactCheck);
    }
}
