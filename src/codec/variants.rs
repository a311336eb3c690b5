//! Turns a [DraftMove] (raw rows plus classified notes) into a canonical [Move], deriving its
//! variants.
use crate::{
    codec::{notes::ClassifiedNotes, table::normalize_text},
    model::{FrameData, Move, Row, Variant},
};

/// A move as read from markup, before variant derivation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftMove {
    pub name: String,
    pub input: Option<String>,
    pub image: Option<String>,
    pub additional_images: Vec<String>,
    pub rows: Vec<Row>,
    pub notes: ClassifiedNotes,
    pub follow_ups: Vec<DraftMove>,
    pub parent: Option<String>,
}

impl DraftMove {
    pub fn new<S: Into<String>>(name: S) -> DraftMove {
        DraftMove {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn data_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows
            .iter()
            .filter(|row| row.values().any(|v| !v.trim().is_empty()))
    }

    fn base_frame_data(&self) -> FrameData {
        self.data_rows()
            .next()
            .map(frame_data_from_row)
            .unwrap_or_default()
    }
}

fn column_key(header: &str) -> String {
    normalize_text(header).to_lowercase()
}

/// Map a row onto the fixed frame-data fields. Headers match by prefix, so `Startup ¹ ²` fills
/// `startup`. When two headers map to one field the one sorting first wins.
pub fn frame_data_from_row(row: &Row) -> FrameData {
    let mut data = FrameData::default();
    for (header, value) in row {
        let key = column_key(header);
        let slot = if key.starts_with("damage") {
            &mut data.damage
        } else if key.starts_with("guard") {
            &mut data.guard
        } else if key.starts_with("startup") {
            &mut data.startup
        } else if key.starts_with("active") {
            &mut data.active
        } else if key.starts_with("recovery") {
            &mut data.recovery
        } else if key.starts_with("adv hit") || key.starts_with("on hit") {
            &mut data.adv_hit
        } else if key.starts_with("adv block") || key.starts_with("on block") {
            &mut data.adv_block
        } else if key.starts_with("cancel") {
            &mut data.cancel
        } else {
            continue;
        };
        if slot.is_empty() {
            *slot = value.trim().to_string();
        }
    }
    data
}

fn version_column(row: &Row) -> Option<String> {
    row.iter()
        .find(|(header, value)| {
            let key = column_key(header);
            (key == "version" || key == "ver" || key == "ver.") && !value.trim().is_empty()
        })
        .map(|(_, value)| value.trim().to_string())
}

fn scoped_notes(notes: &ClassifiedNotes, label: &str) -> Option<String> {
    notes
        .by_version
        .get(&label.to_uppercase())
        .filter(|n| !n.is_empty())
        .map(|n| n.join("\n\n"))
}

/// A general note written as `<label>: text`, without the prefix.
fn labeled_general_note(notes: &ClassifiedNotes, label: &str) -> Option<String> {
    let prefix = format!("{}:", label.to_lowercase());
    notes.general.iter().find_map(|note| {
        let head = note.get(..prefix.len())?;
        (head.to_lowercase() == prefix).then(|| note[prefix.len()..].trim().to_string())
    })
}

/// Variant derivation, first rule that applies:
/// 1. more than one data row: one variant per row, labeled by its Version column, else by
///    `labels` in order, else `Version N`;
/// 2. version-scoped notes exist: one variant per scoped label sharing the base frame data;
/// 3. the input contains `*` or `/`: one variant per configured label;
/// 4. otherwise none.
pub fn derive_variants(draft: &DraftMove, labels: &[String]) -> Vec<Variant> {
    let rows: Vec<&Row> = draft.data_rows().collect();
    let fallback_note = || draft.notes.general.first().cloned().unwrap_or_default();

    if rows.len() > 1 {
        return rows
            .into_iter()
            .enumerate()
            .map(|(idx, row)| {
                let label = version_column(row)
                    .or_else(|| labels.get(idx).cloned())
                    .unwrap_or_else(|| format!("Version {}", idx + 1));
                let frame_data = frame_data_from_row(row);
                Variant {
                    notes: scoped_notes(&draft.notes, &label).unwrap_or_else(fallback_note),
                    damage: frame_data.damage.clone(),
                    frame_data,
                    label,
                }
            })
            .collect();
    }

    let base = draft.base_frame_data();
    if !draft.notes.by_version.is_empty() {
        return draft
            .notes
            .by_version
            .iter()
            .map(|(label, notes)| Variant {
                label: label.clone(),
                damage: base.damage.clone(),
                frame_data: base.clone(),
                notes: notes.join("\n\n"),
            })
            .collect();
    }

    let versioned_input = draft
        .input
        .as_deref()
        .is_some_and(|input| input.contains('*') || input.contains('/'));
    if versioned_input {
        return labels
            .iter()
            .map(|label| Variant {
                label: label.clone(),
                damage: base.damage.clone(),
                frame_data: base.clone(),
                notes: labeled_general_note(&draft.notes, label).unwrap_or_else(fallback_note),
            })
            .collect();
    }

    Vec::new()
}

/// Build the canonical move, recursing into follow-ups.
pub fn finalize(draft: DraftMove, labels: &[String]) -> Move {
    let variants = derive_variants(&draft, labels);
    let frame_data = draft.base_frame_data();
    let follow_ups = draft
        .follow_ups
        .into_iter()
        .map(|f| finalize(f, labels))
        .collect();
    Move {
        name: draft.name,
        input: draft.input,
        image: draft.image,
        damage: frame_data.damage.clone(),
        frame_data,
        properties: draft.notes.general,
        variants,
        follow_ups,
        parent: draft.parent,
        additional_images: draft.additional_images,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::notes::NoteClassifier;

    fn labels() -> Vec<String> {
        vec!["A".to_string(), "B".to_string(), "C".to_string()]
    }

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn frame_data_by_header_prefix() {
        let data = frame_data_from_row(&row(&[
            ("Damage", "800"),
            ("Startup ¹ ²", "12"),
            ("Adv Hit", "+2"),
            ("Adv Block", "-4"),
            ("Notes", "ignored"),
        ]));
        assert_eq!(data.damage, "800");
        assert_eq!(data.startup, "12");
        assert_eq!(data.adv_hit, "+2");
        assert_eq!(data.adv_block, "-4");
        assert_eq!(data.recovery, "");
    }

    #[test]
    fn multiple_rows_become_variants() {
        let mut draft = DraftMove::new("Fireball");
        draft.input = Some("236*".into());
        draft.rows = vec![
            row(&[("Damage", "800"), ("Startup", "12")]),
            row(&[("Damage", "1000"), ("Startup", "16")]),
        ];
        draft.notes = NoteClassifier::new(&labels())
            .expect("labels")
            .classify(["B: Slower but stronger", "Projectile"]);
        let mv = finalize(draft, &labels());
        assert_eq!(mv.variants.len(), 2);
        assert_eq!(mv.variants[0].label, "A");
        assert_eq!(mv.variants[0].notes, "Projectile");
        assert_eq!(mv.variants[1].label, "B");
        assert_eq!(mv.variants[1].damage, "1000");
        assert_eq!(mv.variants[1].notes, "Slower but stronger");
        assert_eq!(mv.damage, "800");
        assert_eq!(mv.properties, vec!["Projectile"]);
    }

    #[test]
    fn version_column_labels_rows() {
        let mut draft = DraftMove::new("Dash");
        draft.rows = vec![
            row(&[("Version", "Light"), ("Damage", "1")]),
            row(&[("Version", "Heavy"), ("Damage", "2")]),
            row(&[("Damage", "3")]),
            row(&[("Damage", "4")]),
        ];
        let labels: Vec<String> = vec!["A".into()];
        let mv = finalize(draft, &labels);
        let got: Vec<&str> = mv.variants.iter().map(|v| v.label.as_str()).collect();
        assert_eq!(got, vec!["Light", "Heavy", "Version 3", "Version 4"]);
    }

    #[test]
    fn scoped_notes_without_rows() {
        let mut draft = DraftMove::new("Uppercut");
        draft.rows = vec![row(&[("Damage", "500")])];
        draft.notes = NoteClassifier::new(&labels())
            .expect("labels")
            .classify(["C: Invincible", "C: Two hits", "A: Fast"]);
        let mv = finalize(draft, &labels());
        assert_eq!(mv.variants.len(), 2);
        assert_eq!(mv.variants[0].label, "A");
        assert_eq!(mv.variants[1].label, "C");
        assert_eq!(mv.variants[1].notes, "Invincible\n\nTwo hits");
        assert_eq!(mv.variants[1].damage, "500");
        assert!(mv.properties.is_empty());
    }

    #[test]
    fn versioned_input_gets_configured_labels() {
        let mut draft = DraftMove::new("Kick");
        draft.input = Some("623*".into());
        draft.rows = vec![row(&[("Damage", "900")])];
        let mv = finalize(draft, &labels());
        assert_eq!(mv.variants.len(), 3);
        assert!(mv.variants.iter().all(|v| v.damage == "900"));
    }

    #[test]
    fn versioned_input_picks_labeled_general_notes() {
        let mut draft = DraftMove::new("Kick");
        draft.input = Some("623*".into());
        draft.rows = vec![row(&[("Damage", "900")])];
        draft.notes.general = vec!["Knocks down".into(), "b: Wall bounce".into()];
        let mv = finalize(draft, &labels());
        let notes: Vec<&str> = mv.variants.iter().map(|v| v.notes.as_str()).collect();
        assert_eq!(notes, vec!["Knocks down", "Wall bounce", "Knocks down"]);
    }

    #[test]
    fn plain_move_has_no_variants() {
        let mut draft = DraftMove::new("Jab");
        draft.input = Some("5A".into());
        draft.rows = vec![row(&[("Damage", "300")])];
        assert!(finalize(draft, &labels()).variants.is_empty());
    }

    #[test]
    fn follow_ups_finalize_recursively() {
        let mut draft = DraftMove::new("Rekka");
        let mut second = DraftMove::new("Rekka 2");
        second.parent = Some("Rekka".into());
        second.rows = vec![row(&[("Damage", "400")]), row(&[("Damage", "600")])];
        draft.follow_ups.push(second);
        let mv = finalize(draft, &labels());
        assert_eq!(mv.follow_ups[0].parent.as_deref(), Some("Rekka"));
        assert_eq!(mv.follow_ups[0].variants.len(), 2);
    }
}
