//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `noties_core` linkage.
//! - Start the core runtime from an optional JSON config file.
//! - Exercise one seal -> save -> reveal -> remove round-trip.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `noties_cli [config.json]`. Without a config, storage stays in
//! memory.

use noties_core::{CoreConfig, CoreRuntime, Note, NoteInput, NoteStoreResult, SqliteNoteStore};
use std::process::ExitCode;

const PROBE_TITLE: &str = "Smoke probe";
const PROBE_BODY: &str = "noties smoke probe";
const PROBE_PASSPHRASE: &str = "smoke-key";

fn main() -> ExitCode {
    println!("noties_core ping={}", noties_core::ping());
    println!("noties_core version={}", noties_core::core_version());

    let config = match load_config(std::env::args().nth(1)) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("noties_core config=error message={message}");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match CoreRuntime::start(config) {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("noties_core start=error message={err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.with_note_store(round_trip) {
        Ok(Ok(note)) if note.decrypted_content == PROBE_BODY => {
            println!("noties_core round_trip=ok");
            ExitCode::SUCCESS
        }
        Ok(Ok(_)) => {
            eprintln!("noties_core round_trip=mismatch");
            ExitCode::FAILURE
        }
        Ok(Err(err)) => {
            eprintln!("noties_core round_trip=error code={}", err.code());
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("noties_core store=error message={err}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<String>) -> Result<CoreConfig, String> {
    let Some(path) = path else {
        return Ok(CoreConfig::in_memory());
    };
    let source =
        std::fs::read_to_string(&path).map_err(|err| format!("cannot read `{path}`: {err}"))?;
    CoreConfig::from_json(&source).map_err(|err| err.to_string())
}

fn round_trip(store: &mut SqliteNoteStore<'_>) -> NoteStoreResult<Note> {
    let probe = store.save(NoteInput::new(PROBE_TITLE, PROBE_BODY, PROBE_PASSPHRASE))?;
    let revealed = store.reveal(probe.id, PROBE_PASSPHRASE);
    store.remove(probe.id)?;
    revealed
}
