//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use movedex_core::{
    codec::{BatchSummary, DirPageSource, ExtractionJob},
    config::ExtractSettings,
};
use std::path::{Path, PathBuf};

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times; subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// The saved wiki pages under `tests/pages`.
#[allow(dead_code)]
pub fn pages_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("pages")
}

/// Bundled defaults with no pause between pages and a threshold the `Tiny` page falls under.
#[allow(dead_code)]
pub fn extract_settings() -> ExtractSettings {
    ExtractSettings {
        min_record_bytes: 1000,
        request_delay_ms: 0,
        ..Default::default()
    }
}

/// Run the batch job over the fixture pages into `out`.
#[allow(dead_code)]
pub async fn extract_fixtures(out: &Path) -> BatchSummary {
    let settings = extract_settings();
    ExtractionJob::new(DirPageSource::new(pages_dir()), &settings, out)
        .run()
        .await
        .expect("batch job runs")
}

/// Write one record of each legacy shape, a duplicate of an extracted character, and a file that
/// is not a record at all.
#[allow(dead_code)]
pub fn write_legacy_records(dir: &Path) {
    std::fs::create_dir_all(dir).unwrap();
    let options = r#"{
        "character": "Nayuki Minase (asleep)",
        "icon": "https://wiki.gbl.gg/images/Nayuki_CSS.png",
        "moveLists": {"options": [{
            "id": 7,
            "name": "Sleepy",
            "sections": [{"name": "Specials", "moves": [
                {
                    "name": "Zzz~",
                    "input": "214*",
                    "data": [{"Damage": 1000, "Startup": "20"}],
                    "notes": ["Falls asleep."],
                    "followUps": [null, {"name": "Zzz~ Wake", "input": "214*~A", "data": [{"Damage": "200"}]}]
                },
                {"name": "Nayu-chan Kick", "input": "623*", "data": [{"Damage": "800"}]},
                {"name": "Nayu Leap", "input": "623D", "data": [{"Damage": "0"}]},
                null
            ]}]
        }]}
    }"#;
    let sections = r#"{
        "name": "Kaori Misaka",
        "sections": [{"name": "Specials", "moves": [
            {
                "moveName": "Spin Kick",
                "input": "214A",
                "data": [{"Damage": "650", "Guard": "Mid"}],
                "versionNotes": {"B": ["Crosses up."]}
            }
        ]}]
    }"#;
    let duplicate = r#"{
        "character": "Akane",
        "sections": [{"name": "Old", "moves": [{"moveName": "Old Jab", "input": "5A"}]}]
    }"#;
    std::fs::write(dir.join("Nayuki_Minase_(asleep).json"), options).unwrap();
    std::fs::write(dir.join("Kaori_Misaka.json"), sections).unwrap();
    std::fs::write(dir.join("Akane.json"), duplicate).unwrap();
    std::fs::write(dir.join("broken.json"), "{ not json").unwrap();
    std::fs::write(dir.join("README.txt"), "not a record").unwrap();
}
