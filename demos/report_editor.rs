//! Demo host for the autosave engine.
//!
//! Simulates a report-fill session from the terminal: a "user" types into a
//! findings field in bursts, the engine debounces the edits into saves
//! against a pretend server, one save fails transiently, and the session is
//! recovered and completed. Run with `RUST_LOG=debug` to watch the engine's
//! internal decisions.

use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use web_time::Instant;

use autodraft::{AutosaveController, AutosaveStatus, FileBackupStore, SaveError};

/// The host-owned form snapshot: field name to entered value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ReportForm {
    fields: BTreeMap<String, String>,
}

impl ReportForm {
    fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    fn set(&mut self, field: &str, value: &str) {
        self.fields.insert(field.to_string(), value.to_string());
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let store = FileBackupStore::new(std::env::temp_dir().join("autodraft-demo"));
    let mut engine = AutosaveController::new("inspection-report-42", store)
        .with_debounce_delay(Duration::from_millis(1500));

    // Pretend server: the first push fails with a timeout, the rest succeed.
    let mut attempts = 0u32;
    let mut save_to_server = |snapshot: &ReportForm| {
        attempts += 1;
        if attempts == 1 {
            return Err(SaveError::transient("simulated gateway timeout"));
        }
        println!("  [server] PATCH report 42: {} field(s)", snapshot.fields.len());
        Ok(())
    };

    // Session start: server state is an empty form.
    let server_snapshot = ReportForm::new();
    let mut form = match engine.check_recovery(&server_snapshot) {
        Some(offer) => {
            println!(
                "Recovering draft from a previous run (backed up at {} ms since epoch)",
                offer.saved_at()
            );
            offer.recover()
        }
        None => server_snapshot,
    };

    // A typing burst: each keystroke notifies the engine; the debounce
    // collapses the burst into one save per pause.
    let keystrokes = [
        "c", "co", "cor", "corr", "corro", "corrod", "corrode", "corroded",
    ];
    for text in keystrokes {
        form.set("findings", text);
        engine.notify_change(&form, Instant::now());
        engine.run_pending_save(Instant::now(), &mut save_to_server);
        print_status(&engine);
        thread::sleep(Duration::from_millis(200));
    }

    // The pause lets the timer fire. The first attempt fails transiently;
    // the next edit retries.
    wait_for_settle(&mut engine, &mut save_to_server);
    form.set("findings", "corroded joints on section 3");
    engine.notify_change(&form, Instant::now());
    wait_for_settle(&mut engine, &mut save_to_server);

    // Explicit "save now" before completing the report.
    form.set("signature", "J. Doe");
    engine.notify_change(&form, Instant::now());
    engine.save_now();
    engine.run_pending_save(Instant::now(), &mut save_to_server);
    print_status(&engine);

    engine.complete_session();
    println!("Session completed; draft backup cleared.");
}

/// Tick until the engine leaves the pending/saving states.
fn wait_for_settle<E: FnMut(&ReportForm) -> Result<(), SaveError>>(
    engine: &mut AutosaveController<ReportForm, FileBackupStore>,
    save_to_server: &mut E,
) {
    loop {
        engine.run_pending_save(Instant::now(), &mut *save_to_server);
        print_status(engine);
        match engine.status() {
            AutosaveStatus::Pending | AutosaveStatus::Saving => {
                thread::sleep(Duration::from_millis(250));
            }
            _ => break,
        }
    }
}

fn print_status(engine: &AutosaveController<ReportForm, FileBackupStore>) {
    let error = engine
        .error()
        .map(|e| format!(" ({e})"))
        .unwrap_or_default();
    println!("status: {}{}", engine.status().name(), error);
}
