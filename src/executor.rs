//! Save executor seam: the host-supplied network save.
//!
//! The engine does not know how a snapshot becomes a server update. The host
//! supplies a [`SaveExecutor`] (a plain closure works) that translates the
//! snapshot into the domain update request and performs the call. The
//! controller guarantees it is invoked single-flight: never while another
//! save from the same engine is outstanding.

use crate::error::SaveError;
use crate::snapshot::Snapshot;

/// Performs the network upsert of a snapshot.
///
/// Implementations must not retry internally; retry policy belongs to the
/// controller and is triggered by the next edit or an explicit flush. On
/// failure the snapshot and its local backup are left untouched so a retry
/// can reuse them.
pub trait SaveExecutor<S: Snapshot> {
    /// Push the snapshot to the server.
    ///
    /// Any rejection is reported as a typed [`SaveError`]; transient failures
    /// and rejections drive different retry behavior upstream.
    fn save(&mut self, snapshot: &S) -> Result<(), SaveError>;
}

impl<S, F> SaveExecutor<S> for F
where
    S: Snapshot,
    F: FnMut(&S) -> Result<(), SaveError>,
{
    fn save(&mut self, snapshot: &S) -> Result<(), SaveError> {
        self(snapshot)
    }
}

/// A save the controller has committed to.
///
/// Handed out by [`AutosaveController::poll`](crate::AutosaveController::poll)
/// once the debounce timer fires with no other save outstanding. The host
/// runs its executor against the carried snapshot and reports settlement via
/// [`complete_save`](crate::AutosaveController::complete_save). While a
/// request is unsettled, the controller will not produce another one.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest<S> {
    snapshot: S,
}

impl<S: Snapshot> SaveRequest<S> {
    pub(crate) fn new(snapshot: S) -> Self {
        Self { snapshot }
    }

    /// The snapshot to persist.
    pub fn snapshot(&self) -> &S {
        &self.snapshot
    }

    /// Consume the request, taking ownership of the snapshot.
    pub fn into_snapshot(self) -> S {
        self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_an_executor() {
        let mut saved = Vec::new();
        let mut executor = |snapshot: &i32| -> Result<(), SaveError> {
            saved.push(*snapshot);
            Ok(())
        };

        assert!(executor.save(&7).is_ok());
        drop(executor);
        assert_eq!(saved, vec![7]);
    }

    #[test]
    fn test_executor_error_propagates() {
        let mut executor =
            |_: &i32| -> Result<(), SaveError> { Err(SaveError::transient("socket closed")) };
        let err = executor.save(&1).unwrap_err();
        assert!(err.is_transient());
    }
}
