//! Loading extracted and legacy records, then resolving and navigating against them.
mod common;

use common::{extract_fixtures, write_legacy_records};
use movedex_core::{
    config::Settings,
    corpus::{self, Corpus},
    navkey::{navigate, MoveListRef, MoveRef, NavAction, NavOutcome, NavToken},
    query::{all_moves, MatchTier, Resolver},
    view::{suggest_characters, suggest_moves, MoveView},
};
use std::path::PathBuf;
use tempfile::TempDir;
use test_log::test;

async fn fixture_dirs() -> (TempDir, Vec<PathBuf>) {
    let root = tempfile::tempdir().unwrap();
    let extracted = root.path().join("characters");
    let legacy = root.path().join("legacy");
    extract_fixtures(&extracted).await;
    write_legacy_records(&legacy);
    (root, vec![extracted, legacy, PathBuf::from("/nonexistent/records")])
}

#[test(tokio::test)]
async fn all_shapes_load_once() {
    let (_root, dirs) = fixture_dirs().await;
    let settings = Settings::builtin().unwrap();
    let corpus = Corpus::load(&dirs, &settings).unwrap();

    let names: Vec<&str> = corpus.characters().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Akane", "Kaori Misaka", "Mio Kouzuki", "Nayuki Minase (asleep)"]
    );
    assert_eq!(corpus.rejected().len(), 1);

    // The extracted Akane was loaded first; the legacy duplicate is dropped.
    let akane = corpus.get("akane").unwrap();
    assert_eq!(akane.movelists[0].moves[0].name, "Standing Jab");

    let nayuki = corpus.get("NAYUKI MINASE (ASLEEP)").unwrap();
    assert_eq!(nayuki.movelists[0].name, "Sleepy");
    let zzz = &nayuki.movelists[0].moves[0];
    assert_eq!(zzz.damage, "1000");
    assert_eq!(zzz.properties.len(), 3, "special case applied on load");
    assert_eq!(zzz.follow_ups.len(), 1);
    assert_eq!(zzz.follow_ups[0].parent.as_deref(), Some("Zzz~"));
    assert_eq!(nayuki.movelists[0].moves.len(), 3);

    let kaori = corpus.get("Kaori Misaka").unwrap();
    let spin = &kaori.movelists[0].moves[0];
    assert_eq!(spin.variants.len(), 1);
    assert_eq!(spin.variants[0].label, "B");
    assert_eq!(spin.variants[0].notes, "Crosses up.");
    assert_eq!(spin.frame_data.guard, "Mid");
}

#[test(tokio::test)]
async fn aliases_and_tiers() {
    let (_root, dirs) = fixture_dirs().await;
    let settings = Settings::builtin().unwrap();
    let corpus = Corpus::load(&dirs, &settings).unwrap();
    let resolver = Resolver::new(&settings);
    let nayuki = corpus.get("nayuki minase (asleep)").unwrap();

    let kick = resolver.resolve(nayuki, "623C");
    assert_eq!(kick.tier, Some(MatchTier::Alias));
    assert_eq!(kick.matches[0].mv.name, "Nayu-chan Kick");
    let kick = resolver.resolve(nayuki, "big kick");
    assert_eq!(kick.matches[0].mv.name, "Nayu-chan Kick");

    let wake = resolver.resolve(nayuki, "214*~A");
    assert_eq!(wake.tier, Some(MatchTier::ExactInput));
    assert_eq!(wake.matches[0].mv.name, "Zzz~ Wake");

    let partial = resolver.resolve(nayuki, "nayu");
    assert_eq!(partial.tier, Some(MatchTier::Partial));
    assert_eq!(partial.matches.len(), 2);

    let akane = corpus.get("akane").unwrap();
    let by_name = resolver.resolve(akane, "Costume Swap");
    assert_eq!(by_name.tier, Some(MatchTier::ExactName));
    assert_eq!(by_name.matches[0].mv.input.as_deref(), Some("22A"));
    let by_part = resolver.resolve(akane, "costume");
    assert_eq!(by_part.tier, Some(MatchTier::Partial));
    assert_eq!(by_part.matches[0].mv.name, "Costume Swap");
    let costume = resolver.resolve(akane, "22a");
    assert_eq!(costume.tier, Some(MatchTier::ExactInput));
    assert_eq!(costume.matches[0].mv.name, "Costume Swap");

    let mio = corpus.get("mio kouzuki").unwrap();
    let both = resolver.resolve(mio, "sketchbook");
    assert_eq!(both.matches.len(), 2);
    let awakened = resolver.select_str(mio, "Sketchbook-1").unwrap();
    assert_eq!(awakened.matched.move_list_id(), 1);
    assert_eq!(
        MoveView::new(mio, &awakened.matched, 0).damage.as_deref(),
        Some("900")
    );
}

#[test(tokio::test)]
async fn every_loaded_input_resolves_to_its_move_first() {
    let (_root, dirs) = fixture_dirs().await;
    let settings = Settings::builtin().unwrap();
    let corpus = Corpus::load(&dirs, &settings).unwrap();
    let resolver = Resolver::new(&settings);

    let mut checked = 0;
    for character in corpus.characters() {
        for candidate in all_moves(character) {
            let Some(input) = candidate.mv.input.as_deref() else {
                continue;
            };
            let resolution = resolver.resolve(character, input);
            assert_eq!(
                resolution.tier,
                Some(MatchTier::ExactInput),
                "{}: {input}",
                character.name
            );
            assert!(
                resolution.matches.iter().any(|m| m.is_same(&candidate)),
                "{}: {input} resolved elsewhere",
                character.name
            );
            checked += 1;
        }
    }
    assert!(checked > 5);
}

#[test(tokio::test)]
async fn tokens_survive_a_reload() {
    let (_root, dirs) = fixture_dirs().await;
    let settings = Settings::builtin().unwrap();

    let loaded = corpus::reload(&dirs, &settings).unwrap();
    assert_eq!(loaded, 4);
    let before = corpus::snapshot();

    let token = NavToken {
        action: NavAction::MoveList,
        character: "Mio Kouzuki".into(),
        move_list: MoveListRef::Name("Awakened Mode".into()),
        target: MoveRef::new("Sketchbook"),
        version: 0,
    };
    let encoded = token.encode().unwrap();

    corpus::reload(&dirs, &settings).unwrap();
    let after = corpus::snapshot();
    assert!(!std::sync::Arc::ptr_eq(&before, &after));
    assert_eq!(before.len(), after.len());

    let resolver = Resolver::new(&settings);
    let decoded: NavToken = encoded.parse().unwrap();
    let NavOutcome::Move { selection, .. } = navigate(&after, &resolver, &decoded).unwrap() else {
        panic!("expected a move");
    };
    assert_eq!(selection.matched.move_list.name, "Awakened Mode");
    assert_eq!(selection.matched.mv.follow_ups[0].name, "Erase");

    let swap: NavToken = "swap_movelist:mio kouzuki:1".parse().unwrap();
    let NavOutcome::MoveList { move_list, .. } = navigate(&after, &resolver, &swap).unwrap() else {
        panic!("expected a move list");
    };
    assert_eq!(move_list, 0);
}

#[test(tokio::test)]
async fn autocomplete() {
    let (_root, dirs) = fixture_dirs().await;
    let settings = Settings::builtin().unwrap();
    let corpus = Corpus::load(&dirs, &settings).unwrap();
    let resolver = Resolver::new(&settings);

    let found: Vec<String> = suggest_characters(&corpus, "mi")
        .into_iter()
        .map(|s| s.value)
        .collect();
    assert_eq!(found, vec!["Kaori Misaka", "Mio Kouzuki", "Nayuki Minase (asleep)"]);

    let mio = corpus.get("Mio Kouzuki").unwrap();
    let moves = suggest_moves(mio, &resolver, "awakened");
    assert_eq!(moves.len(), 1);
    assert_eq!(moves[0].display, "Sketchbook (236A) - Awakened Mode");
    assert_eq!(moves[0].value, "Sketchbook-1");
}
