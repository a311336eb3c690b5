//! What a front end needs to render a move, a character overview, navigation controls and
//! autocomplete choices. Nothing here knows about any chat platform; these are plain values.
use serde::Serialize;
use std::fmt;

use crate::{
    corpus::Corpus,
    error::MovedexError,
    model::{Character, Version},
    navkey::{MoveListRef, MoveRef, NavAction, NavToken},
    query::{MoveMatch, Resolver, Selection},
};

pub const NOTE_LIMIT: usize = 1000;
pub const SUGGESTION_LIMIT: usize = 25;
pub const SUGGESTION_TEXT_LIMIT: usize = 100;
pub const FOLLOW_UP_CONTROL_LIMIT: usize = 25;
pub const CONTROL_LABEL_LIMIT: usize = 80;
pub const BASE_VERSION_LABEL: &str = "Base Move";

/// Cut `text` to at most `max` characters, ending in `...` when anything was removed.
pub fn truncate_text(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Empty cells and the wiki's "not applicable" markers are not shown.
fn is_shown(value: &str) -> bool {
    !matches!(value.trim(), "" | "/" | "-")
}

fn version_label(label: Option<&str>, index: usize) -> String {
    match label.map(str::trim) {
        None => BASE_VERSION_LABEL.to_string(),
        Some("") => format!("Follow-up {index}"),
        Some(label) => label.to_string(),
    }
}

/// One rendered move at one version.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveView {
    pub title: String,
    pub description: Option<String>,
    pub input: Option<String>,
    pub damage: Option<String>,
    pub frame_data: Vec<(String, String)>,
    pub notes: Option<String>,
    /// `Base Move` followed by one label per variant.
    pub versions: Vec<String>,
    /// Effective version index; out-of-range requests render the base.
    pub version: usize,
    pub version_label: String,
    pub follow_ups: Vec<String>,
    pub image: Option<String>,
    pub footer: String,
}

impl MoveView {
    pub fn new(character: &Character, matched: &MoveMatch<'_>, version: usize) -> MoveView {
        let mv = matched.mv;
        let data = mv.version(version);
        let version = if data.is_base() { 0 } else { version };

        let description = match matched.parent() {
            Some(parent) => Some(match &parent.mv.input {
                Some(input) => format!("Follow-up of {} ({input})", parent.mv.name),
                None => format!("Follow-up of {}", parent.mv.name),
            }),
            None => (!character.is_simple()).then(|| matched.move_list.name.clone()),
        };

        let damage = [data.damage(), data.frame_data().damage.as_str()]
            .into_iter()
            .find(|d| is_shown(d))
            .map(str::to_string);
        let frame_data = data
            .frame_data()
            .fields()
            .into_iter()
            .filter(|(label, value)| *label != "Damage" && is_shown(value))
            .map(|(label, value)| (label.to_string(), value.to_string()))
            .collect();

        let notes = match data {
            Version::Variant(variant) if !variant.notes.trim().is_empty() => variant.notes.clone(),
            _ => mv.properties.join("\n"),
        };
        let notes = (!notes.trim().is_empty()).then(|| truncate_text(&notes, NOTE_LIMIT));

        let versions: Vec<String> = (0..mv.version_count())
            .map(|idx| version_label(mv.version(idx).label(), idx))
            .collect();
        let version_label = versions[version].clone();

        let follow_ups = mv
            .follow_ups
            .iter()
            .map(|f| match &f.input {
                Some(input) => format!("• {} ({input})", f.name),
                None => format!("• {}", f.name),
            })
            .collect();

        let footer = if character.is_simple() {
            format!("{} • {}", character.name, version_label)
        } else {
            format!(
                "{} • {} • {}",
                character.name, matched.move_list.name, version_label
            )
        };

        MoveView {
            title: format!("{} - {}", character.name, mv.name),
            description,
            input: mv.input.clone(),
            damage,
            frame_data,
            notes,
            versions,
            version,
            version_label,
            follow_ups,
            image: mv.image.clone(),
            footer,
        }
    }
}

impl fmt::Display for MoveView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        if let Some(description) = &self.description {
            writeln!(f, "{description}")?;
        }
        if let Some(input) = &self.input {
            writeln!(f, "Input: {input}")?;
        }
        if let Some(damage) = &self.damage {
            writeln!(f, "Damage: {damage}")?;
        }
        for (label, value) in &self.frame_data {
            writeln!(f, "{label}: {value}")?;
        }
        if self.versions.len() > 1 {
            writeln!(f, "Version: {} of [{}]", self.version_label, self.versions.join(", "))?;
        }
        if let Some(notes) = &self.notes {
            writeln!(f, "\n{notes}")?;
        }
        if !self.follow_ups.is_empty() {
            writeln!(f, "\nFollow-ups:")?;
            for line in &self.follow_ups {
                writeln!(f, "{line}")?;
            }
        }
        write!(f, "-- {}", self.footer)
    }
}

/// Move names (with damage where known) grouped per move list. List names are only shown for
/// characters with more than one list.
pub fn character_overview(character: &Character) -> String {
    let mut out = format!("{}\n", character.name);
    for list in &character.movelists {
        if !character.is_simple() {
            out.push_str(&format!("\n[{}]\n", list.name));
        }
        for mv in &list.moves {
            let damage = [mv.damage.as_str(), mv.frame_data.damage.as_str()]
                .into_iter()
                .find(|d| is_shown(d));
            match damage {
                Some(damage) => out.push_str(&format!("{} - {damage}\n", mv.name)),
                None => out.push_str(&format!("{}\n", mv.name)),
            }
        }
    }
    out
}

/// A clickable follow-on action.
#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    pub label: String,
    pub token: NavToken,
    /// The control for what is currently shown.
    pub selected: bool,
}

impl Control {
    fn new(label: &str, token: NavToken, selected: bool) -> Control {
        Control {
            label: truncate_text(label, CONTROL_LABEL_LIMIT),
            token,
            selected,
        }
    }

    /// The token plus a uniqueness suffix, ready to hand to a front end.
    pub fn custom_id(&self) -> Result<String, MovedexError> {
        self.token.encode()
    }
}

/// Controls for a rendered move: back to parent, other move lists, versions and follow-ups.
pub fn controls(character: &Character, resolver: &Resolver, selection: &Selection<'_>) -> Vec<Control> {
    let matched = &selection.matched;
    let list_id = matched.move_list_id();
    let here = MoveRef::of(resolver, matched);
    let token = |action: NavAction, move_list: usize, target: MoveRef, version: usize| NavToken {
        action,
        character: character.name.clone(),
        move_list: MoveListRef::Index(move_list),
        target,
        version,
    };
    let mut out = Vec::new();

    if let Some(parent) = matched.parent() {
        out.push(Control::new(
            &format!("Back to {}", parent.mv.name),
            token(NavAction::Parent, list_id, here.clone(), 0),
            false,
        ));
    }

    let mut seen_lists = vec![list_id];
    for alt in selection.alternatives.iter() {
        if seen_lists.contains(&alt.move_list_id()) || alt.is_follow_up() {
            continue;
        }
        seen_lists.push(alt.move_list_id());
        out.push(Control::new(
            &alt.move_list.name,
            token(
                NavAction::MoveList,
                alt.move_list_id(),
                MoveRef::of(resolver, alt),
                0,
            ),
            false,
        ));
    }

    let mv = matched.mv;
    let shown = if mv.version(selection.version).is_base() {
        0
    } else {
        selection.version
    };
    if mv.version_count() > 1 {
        for idx in 0..mv.version_count() {
            out.push(Control::new(
                &version_label(mv.version(idx).label(), idx),
                token(NavAction::Version, list_id, here.clone(), idx),
                idx == shown,
            ));
        }
    }

    for (idx, follow_up) in mv.follow_ups.iter().take(FOLLOW_UP_CONTROL_LIMIT).enumerate() {
        let mut target = here.clone();
        target.follow_ups.push(idx);
        out.push(Control::new(
            &follow_up.name,
            token(NavAction::FollowUp, list_id, target, 0),
            false,
        ));
    }
    out
}

/// The swap control of a character overview; absent for simple characters.
pub fn overview_controls(character: &Character, move_list: usize) -> Vec<Control> {
    if character.is_simple() {
        return Vec::new();
    }
    let next = (move_list + 1) % character.movelists.len();
    let label = format!("Show {}", character.movelists[next].name);
    vec![Control::new(
        &label,
        NavToken {
            action: NavAction::SwapMoveList,
            character: character.name.clone(),
            move_list: MoveListRef::Index(move_list),
            target: MoveRef::default(),
            version: 0,
        },
        false,
    )]
}

/// An autocomplete choice: what the user sees and what is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub display: String,
    pub value: String,
}

pub fn suggest_characters(corpus: &Corpus, partial: &str) -> Vec<Suggestion> {
    let partial = partial.trim().to_lowercase();
    corpus
        .characters()
        .filter(|c| c.name.to_lowercase().contains(&partial))
        .take(SUGGESTION_LIMIT)
        .map(|c| Suggestion {
            display: truncate_text(&c.name, SUGGESTION_TEXT_LIMIT),
            value: c.name.clone(),
        })
        .collect()
}

/// One suggestion per top-level move. Values use the `name-<list>` form understood by
/// [MoveQuery](crate::query::MoveQuery); reserved-prefix moves are offered by input.
pub fn suggest_moves(character: &Character, resolver: &Resolver, partial: &str) -> Vec<Suggestion> {
    let partial = partial.trim().to_lowercase();
    character
        .top_level_moves()
        .filter_map(|(list_id, list, mv)| {
            let reserved = resolver.is_reserved(mv);
            let mut display = match (&mv.input, reserved) {
                (Some(input), true) => format!("{input} - {}", mv.name),
                (Some(input), false) => format!("{} ({input})", mv.name),
                (None, _) => mv.name.clone(),
            };
            if !character.is_simple() {
                display = format!("{display} - {}", list.name);
            }
            if !display.to_lowercase().contains(&partial) {
                return None;
            }
            let key = match (&mv.input, reserved) {
                (Some(input), true) => input.as_str(),
                _ => mv.name.as_str(),
            };
            Some(Suggestion {
                display: truncate_text(&display, SUGGESTION_TEXT_LIMIT),
                value: format!("{key}-{list_id}"),
            })
        })
        .take(SUGGESTION_LIMIT)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Settings,
        model::{FrameData, Move, MoveList, Variant},
    };

    fn character() -> Character {
        let mut fireball = Move::new("Fireball");
        fireball.input = Some("236*".into());
        fireball.damage = "800".into();
        fireball.frame_data = FrameData {
            startup: "12".into(),
            active: "-".into(),
            recovery: "/".into(),
            ..Default::default()
        };
        fireball.properties = vec!["Projectile.".into()];
        fireball.variants = vec![
            Variant {
                label: "A".into(),
                damage: "700".into(),
                notes: "Slow.".into(),
                ..Default::default()
            },
            Variant::default(),
        ];
        let mut follow = Move::new("Fireball Detonate");
        follow.input = Some("236*~A".into());
        fireball.follow_ups.push(follow);
        let mut costume = Move::new("Costume Change");
        costume.input = Some("22A".into());
        let mut c = Character::new(
            "Akane",
            vec![
                MoveList::new("Normal", vec![fireball, costume]),
                MoveList::new("Awakened", vec![Move::new("Fireball")]),
            ],
        );
        c.link_parents();
        c
    }

    #[test]
    fn truncation() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("abcdefghij", 6), "abc...");
        assert_eq!(truncate_text("ééééé", 4), "é...");
    }

    #[test]
    fn base_and_variant_views() {
        let c = character();
        let resolver = Resolver::new(&Settings::default());
        let sel = resolver.select_str(&c, "236*").expect("resolves");
        let base = MoveView::new(&c, &sel.matched, 0);
        assert_eq!(base.title, "Akane - Fireball");
        assert_eq!(base.description.as_deref(), Some("Normal"));
        assert_eq!(base.damage.as_deref(), Some("800"));
        assert_eq!(base.frame_data, vec![("Startup".to_string(), "12".to_string())]);
        assert_eq!(base.versions, vec!["Base Move", "A", "Follow-up 2"]);
        assert_eq!(base.version_label, "Base Move");
        assert_eq!(base.notes.as_deref(), Some("Projectile."));
        assert_eq!(base.follow_ups, vec!["• Fireball Detonate (236*~A)"]);

        let a = MoveView::new(&c, &sel.matched, 1);
        assert_eq!(a.damage.as_deref(), Some("700"));
        assert_eq!(a.notes.as_deref(), Some("Slow."));

        let out_of_range = MoveView::new(&c, &sel.matched, 9);
        assert_eq!(out_of_range.version, 0);
        assert_eq!(out_of_range.damage.as_deref(), Some("800"));
    }

    #[test]
    fn follow_up_description() {
        let c = character();
        let resolver = Resolver::new(&Settings::default());
        let sel = resolver.select_str(&c, "236*~A").expect("resolves");
        let view = MoveView::new(&c, &sel.matched, 0);
        assert_eq!(view.description.as_deref(), Some("Follow-up of Fireball (236*)"));
    }

    #[test]
    fn move_controls() {
        let c = character();
        let resolver = Resolver::new(&Settings::default());
        let sel = resolver.select_str(&c, "Fireball").expect("resolves");
        let found = controls(&c, &resolver, &sel);
        let labels: Vec<&str> = found.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Awakened", "Base Move", "A", "Follow-up 2", "Fireball Detonate"]
        );
        assert!(found[1].selected);
        assert_eq!(found[0].token.action, NavAction::MoveList);
        assert_eq!(found[4].token.target.follow_ups, vec![0]);
        assert!(found[4]
            .custom_id()
            .is_ok_and(|id| id.starts_with("followup:Akane:0:Fireball#0:0:")));
    }

    #[test]
    fn overview_lists_moves() {
        let c = character();
        let text = character_overview(&c);
        assert!(text.contains("[Normal]"));
        assert!(text.contains("Fireball - 800"));
        assert!(text.contains("Costume Change\n"));
        let swap = overview_controls(&c, 1);
        assert_eq!(swap[0].label, "Show Normal");
    }

    #[test]
    fn move_suggestions() {
        let c = character();
        let resolver = Resolver::new(&Settings::default());
        let found = suggest_moves(&c, &resolver, "fire");
        assert_eq!(
            found,
            vec![
                Suggestion {
                    display: "Fireball (236*) - Normal".into(),
                    value: "Fireball-0".into()
                },
                Suggestion {
                    display: "Fireball - Awakened".into(),
                    value: "Fireball-1".into()
                },
            ]
        );
        let costume = suggest_moves(&c, &resolver, "22a");
        assert_eq!(costume[0].display, "22A - Costume Change - Normal");
        assert_eq!(costume[0].value, "22A-0");
    }
}
