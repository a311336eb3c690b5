//! Shared test utilities: logging and a small extracted character.

use crate::{
    codec::GraphBuilder,
    config::ExtractSettings,
    corpus::Corpus,
    model::Character,
};

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Extraction settings that accept records of any size.
pub fn permissive_settings() -> ExtractSettings {
    ExtractSettings {
        min_record_bytes: 0,
        request_delay_ms: 0,
        ..Default::default()
    }
}

/// A wiki-style move table with a nested frame-data table.
pub fn move_table(name: &str, input: &str, rows: &[(&str, &str)], notes: &[&str]) -> String {
    let body: String = rows
        .iter()
        .map(|(version, damage)| format!("<tr><td>{version}</td><td>{damage}</td><td>12</td></tr>"))
        .collect();
    let items: String = notes.iter().map(|n| format!("<li>{n}</li>")).collect();
    format!(
        r#"<table class="wikitable">
             <tr><th><big>{name}</big><br><small>{input}</small></th></tr>
             <tr><td><table>
               <tr><th>Version</th><th>Damage</th><th>Startup</th></tr>
               {body}
             </table>
             <ul>{items}</ul></td></tr>
           </table>"#
    )
}

/// A two-section page with variants, version notes, a follow-up row table and an input-linked
/// follow-up.
pub fn sample_page() -> String {
    format!(
        r#"<html><head><title>Eternal Fighter Zero/Akane - Wiki</title></head><body>
           <h1 id="firstHeading">Eternal Fighter Zero/Akane</h1>
           <img alt="Akane CSS.png" src="/images/Akane_CSS.png">
           <h2><span class="mw-headline">Normal Moves</span></h2>
           {jab}
           <h2><span class="mw-headline">Special Moves</span></h2>
           {example}
           <table class="wikitable"><tr><th><big>Follow-ups</big></th></tr></table>
           <table class="wikitable">
             <tr><th>Name</th><th>Damage</th></tr>
             <tr><td><b>→ Example</b></td><td>300</td></tr>
           </table>
           {rolling}
           {rolling_kick}
           </body></html>"#,
        jab = move_table("Jab", "5A", &[("-", "300")], &["Fast."]),
        example = move_table(
            "Example Move",
            "236*",
            &[("A", "500"), ("B", "700")],
            &["A: causes knockdown", "General info"]
        ),
        rolling = move_table("Rolling", "41236*", &[("-", "900")], &["B: longer roll"]),
        rolling_kick = move_table("Rolling Kick", "41236*~236A", &[("-", "400")], &[]),
    )
}

pub fn sample_character() -> Character {
    init_logging();
    let settings = permissive_settings();
    let builder = GraphBuilder::new(&settings).expect("builder");
    let (character, _) = builder.build_unchecked(&sample_page(), "Akane");
    character
}

pub fn sample_corpus() -> Corpus {
    vec![sample_character()].into_iter().collect()
}
