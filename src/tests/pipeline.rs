//! End-to-end checks over one extracted page: extraction, record round trip, resolution and
//! navigation.
use std::ptr;
use test_log::test;

use super::helpers::{permissive_settings, sample_character, sample_corpus};
use crate::{
    config::Settings,
    navkey::{navigate, NavAction, NavOutcome, NavToken},
    query::{all_moves, MatchTier, Resolver},
    record::{to_record_string, RecordReader},
    view::{controls, MoveView},
};

#[test]
fn sample_page_shape() {
    let akane = sample_character();
    assert_eq!(akane.name, "Akane");
    assert_eq!(
        akane.icon.as_deref(),
        Some("https://wiki.gbl.gg/images/Akane_CSS.png")
    );
    assert!(akane.is_simple());
    let names: Vec<&str> = akane.movelists[0]
        .moves
        .iter()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(names, vec!["Jab", "Example Move", "Rolling"]);

    let example = &akane.movelists[0].moves[1];
    let labels: Vec<(&str, &str)> = example
        .variants
        .iter()
        .map(|v| (v.label.as_str(), v.damage.as_str()))
        .collect();
    assert_eq!(labels, vec![("A", "500"), ("B", "700")]);
    assert_eq!(example.variants[0].notes, "causes knockdown");
    assert_eq!(example.properties, vec!["General info"]);
    assert_eq!(example.follow_ups[0].name, "→ Example");
    assert_eq!(example.follow_ups[0].parent.as_deref(), Some("Example Move"));

    let rolling = &akane.movelists[0].moves[2];
    assert_eq!(rolling.variants.len(), 1);
    assert_eq!(rolling.variants[0].label, "B");
    assert_eq!(rolling.follow_ups[0].name, "Rolling Kick");
    assert_eq!(rolling.follow_ups[0].parent.as_deref(), Some("Rolling"));
}

#[test]
fn record_round_trip() {
    let akane = sample_character();
    let text = to_record_string(&akane).expect("serializes");
    let reader = RecordReader::new(&permissive_settings()).expect("reader");
    let back = reader.read_str(&text, None).expect("reads back");
    assert_eq!(back, akane);
}

#[test]
fn every_input_resolves_to_its_move_first() {
    let akane = sample_character();
    let resolver = Resolver::new(&Settings::builtin().expect("bundled rules"));
    for candidate in all_moves(&akane) {
        let Some(input) = &candidate.mv.input else {
            continue;
        };
        let resolution = resolver.resolve(&akane, input);
        assert_eq!(resolution.tier, Some(MatchTier::ExactInput), "{input}");
        assert!(
            resolution.first().is_some_and(|m| m.is_same(&candidate)),
            "{input} resolved elsewhere"
        );
    }
}

#[test]
fn version_zero_is_the_move_itself() {
    let akane = sample_character();
    for candidate in all_moves(&akane) {
        let base = candidate.mv.version(0);
        assert!(base.is_base());
        assert!(ptr::eq(base.frame_data(), &candidate.mv.frame_data));
    }
}

#[test]
fn substring_results_have_no_duplicates() {
    let akane = sample_character();
    let resolver = Resolver::new(&Settings::default());
    let found = resolver.resolve(&akane, "exa");
    let names: Vec<&str> = found.matches.iter().map(|m| m.mv.name.as_str()).collect();
    assert_eq!(names, vec!["Example Move", "→ Example"]);
}

#[test]
fn controls_navigate_back_to_their_moves() {
    let corpus = sample_corpus();
    let resolver = Resolver::new(&Settings::default());
    let akane = corpus.get("Akane").expect("loaded");
    let selection = resolver.select_str(akane, "Example Move").expect("resolves");
    let shown = controls(akane, &resolver, &selection);

    let follow_up = shown
        .iter()
        .find(|c| c.token.action == NavAction::FollowUp)
        .expect("follow-up control");
    let decoded: NavToken = follow_up
        .custom_id()
        .expect("encodes")
        .parse()
        .expect("decodes");
    let NavOutcome::Move { selection: child, .. } =
        navigate(&corpus, &resolver, &decoded).expect("navigates")
    else {
        panic!("expected a move");
    };
    assert_eq!(child.matched.mv.name, "→ Example");

    let back = controls(akane, &resolver, &child)
        .into_iter()
        .find(|c| c.token.action == NavAction::Parent)
        .expect("parent control");
    let NavOutcome::Move { selection: parent, .. } =
        navigate(&corpus, &resolver, &back.token).expect("navigates")
    else {
        panic!("expected a move");
    };
    assert!(parent.matched.is_same(&selection.matched));

    let version_b = shown
        .iter()
        .find(|c| c.token.action == NavAction::Version && c.token.version == 2)
        .expect("version control");
    let NavOutcome::Move { character, selection } =
        navigate(&corpus, &resolver, &version_b.token).expect("navigates")
    else {
        panic!("expected a move");
    };
    let view = MoveView::new(character, &selection.matched, selection.version);
    assert_eq!(view.version_label, "B");
    assert_eq!(view.damage.as_deref(), Some("700"));
}

#[test]
fn unknown_targets_are_not_found() {
    let corpus = sample_corpus();
    let resolver = Resolver::new(&Settings::default());
    let missing: NavToken = "version:Nobody:0:Jab:1".parse().expect("decodes");
    assert!(navigate(&corpus, &resolver, &missing).is_err());
    let missing: NavToken = "followup:Akane:0:Jab#3:0".parse().expect("decodes");
    assert!(navigate(&corpus, &resolver, &missing).is_err());
}
