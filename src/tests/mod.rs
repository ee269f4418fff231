//! Scenario tests for the autosave engine.
//!
//! These exercise cross-module flows end to end: debounce coalescing, the
//! single-flight save invariant, error retention, suspension, and the
//! crash-recovery round trip. Per-module contracts live in each module's own
//! test block.


use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SaveError;
use crate::executor::SaveExecutor;

/// A stand-in for the host's form snapshot: field name to entered value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ReportForm {
    fields: BTreeMap<String, String>,
}

/// Build a form snapshot from field/value pairs.
fn form(entries: &[(&str, &str)]) -> ReportForm {
    ReportForm {
        fields: entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }
}

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Save executor double: records every snapshot it is asked to push and can
/// be switched into a failing mode.
struct RecordingExecutor {
    saved: Vec<ReportForm>,
    fail_with: Option<SaveError>,
}

impl RecordingExecutor {
    fn new() -> Self {
        Self {
            saved: Vec::new(),
            fail_with: None,
        }
    }

    fn failing(error: SaveError) -> Self {
        Self {
            saved: Vec::new(),
            fail_with: Some(error),
        }
    }

    fn succeed(&mut self) {
        self.fail_with = None;
    }
}

impl SaveExecutor<ReportForm> for RecordingExecutor {
    fn save(&mut self, snapshot: &ReportForm) -> Result<(), SaveError> {
        if let Some(error) = self.fail_with.clone() {
            return Err(error);
        }
        self.saved.push(snapshot.clone());
        Ok(())
    }
}
