//! Reading persisted character records.
//!
//! Three record shapes exist in the wild. All of them normalize into the canonical
//! [Character] here, so nothing downstream branches on shape:
//!
//! - `movelists`: the current shape, `{name, icon, movelists: [{name, moves: [Move]}]}`
//! - `moveLists.options`: `{character, moveLists: {options: [{name, sections: [{moves}]}]}}`
//! - `sections`: `{character, sections: [{name, moves}]}`, one implicit move list
//!
//! The two older shapes store raw scrape output per move (`data` rows, `notes`,
//! `versionNotes`), so their moves go through the same variant derivation as live extraction.
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::{
    codec::{
        notes::NoteClassifier,
        variants::{finalize, DraftMove},
    },
    config::ExtractSettings,
    error::MovedexError,
    model::{lenient, Character, FrameData, Move, MoveList, Row, Variant},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordShape {
    MoveLists,
    LegacyOptions,
    LegacySections,
}

pub fn detect_shape(value: &Value) -> Option<RecordShape> {
    if value.get("movelists").is_some_and(Value::is_array) {
        Some(RecordShape::MoveLists)
    } else if value
        .get("moveLists")
        .and_then(|m| m.get("options"))
        .is_some_and(Value::is_array)
    {
        Some(RecordShape::LegacyOptions)
    } else if value.get("sections").is_some_and(Value::is_array) {
        Some(RecordShape::LegacySections)
    } else {
        None
    }
}

#[derive(Deserialize)]
struct RecordHeader {
    #[serde(alias = "character", default, deserialize_with = "lenient::string")]
    name: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    icon: Option<String>,
}

#[derive(Deserialize)]
struct CurrentList {
    #[serde(default, deserialize_with = "lenient::string")]
    name: String,
    #[serde(default)]
    moves: Vec<Option<Move>>,
}

#[derive(Deserialize)]
struct CurrentRecord {
    #[serde(default)]
    movelists: Vec<CurrentList>,
}

#[derive(Deserialize)]
struct LegacySection {
    #[serde(default)]
    moves: Vec<Option<LegacyMove>>,
}

#[derive(Deserialize)]
struct LegacyOption {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    name: Option<String>,
    #[serde(default)]
    sections: Vec<LegacySection>,
}

#[derive(Deserialize)]
struct LegacyOptions {
    #[serde(default)]
    options: Vec<LegacyOption>,
}

#[derive(Deserialize)]
struct LegacyOptionsRecord {
    #[serde(rename = "moveLists")]
    move_lists: LegacyOptions,
}

#[derive(Deserialize)]
struct LegacySectionsRecord {
    #[serde(default)]
    sections: Vec<LegacySection>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LegacyMove {
    #[serde(alias = "moveName", default, deserialize_with = "lenient::string")]
    name: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    input: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    image: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    damage: String,
    #[serde(default)]
    framedata: Option<FrameData>,
    #[serde(default)]
    data: Vec<BTreeMap<String, Value>>,
    #[serde(default)]
    notes: Value,
    #[serde(default)]
    version_notes: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    follow_ups: Vec<Option<LegacyMove>>,
    #[serde(default)]
    variations: Vec<Variant>,
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn notes_of(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(value_text)
            .filter(|n| !n.is_empty())
            .collect(),
        Value::Object(map) => map.values().flat_map(notes_of).collect(),
        Value::String(s) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn synthesized_row(damage: &str, frame_data: Option<&FrameData>) -> Option<Row> {
    let mut row = Row::new();
    let damage = match frame_data {
        Some(fd) if damage.is_empty() => fd.damage.as_str(),
        _ => damage,
    };
    if !damage.is_empty() {
        row.insert("Damage".to_string(), damage.to_string());
    }
    if let Some(fd) = frame_data {
        for (label, value) in fd.fields().into_iter().skip(1) {
            if !value.is_empty() {
                row.insert(label.to_string(), value.to_string());
            }
        }
    }
    (!row.is_empty()).then_some(row)
}

/// Put the move-level damage and the frame-data damage in agreement.
fn reconcile_damage(mv: &mut Move) {
    if mv.frame_data.damage.is_empty() {
        mv.frame_data.damage = mv.damage.clone();
    } else if mv.damage.is_empty() {
        mv.damage = mv.frame_data.damage.clone();
    }
    for variant in mv.variants.iter_mut() {
        if variant.frame_data.damage.is_empty() {
            variant.frame_data.damage = variant.damage.clone();
        } else if variant.damage.is_empty() {
            variant.damage = variant.frame_data.damage.clone();
        }
    }
    mv.follow_ups.retain(|f| !f.name.trim().is_empty());
    for follow_up in mv.follow_ups.iter_mut() {
        reconcile_damage(follow_up);
    }
}

/// Reads any known record shape into a [Character].
#[derive(Debug, Clone)]
pub struct RecordReader {
    classifier: NoteClassifier,
    labels: Vec<String>,
}

impl RecordReader {
    pub fn new(settings: &ExtractSettings) -> Result<RecordReader, MovedexError> {
        Ok(RecordReader {
            classifier: NoteClassifier::new(&settings.version_labels)?,
            labels: settings.version_labels.clone(),
        })
    }

    /// `fallback_name` is used when the record itself carries no character name.
    pub fn read_str(
        &self,
        text: &str,
        fallback_name: Option<&str>,
    ) -> Result<Character, MovedexError> {
        let value: Value = serde_json::from_str(text)?;
        self.read_value(value, fallback_name)
    }

    pub fn read_value(
        &self,
        value: Value,
        fallback_name: Option<&str>,
    ) -> Result<Character, MovedexError> {
        let shape = detect_shape(&value).ok_or_else(|| {
            MovedexError::CorpusLoad(
                "unrecognized record shape: no movelists, moveLists.options or sections"
                    .to_string(),
            )
        })?;
        let header: RecordHeader = serde_json::from_value(value.clone())?;
        let name = Some(header.name.trim().to_string())
            .filter(|n| !n.is_empty())
            .or_else(|| fallback_name.map(str::to_string))
            .ok_or_else(|| MovedexError::CorpusLoad("record has no character name".to_string()))?;

        let movelists = match shape {
            RecordShape::MoveLists => {
                let record: CurrentRecord = serde_json::from_value(value)?;
                record
                    .movelists
                    .into_iter()
                    .map(|list| {
                        let mut moves: Vec<Move> = list
                            .moves
                            .into_iter()
                            .flatten()
                            .filter(|mv| !mv.name.trim().is_empty())
                            .collect();
                        moves.iter_mut().for_each(reconcile_damage);
                        MoveList::new(list.name, moves)
                    })
                    .collect()
            }
            RecordShape::LegacyOptions => {
                let record: LegacyOptionsRecord = serde_json::from_value(value)?;
                record
                    .move_lists
                    .options
                    .into_iter()
                    .enumerate()
                    .map(|(idx, option)| {
                        let list_name = option
                            .name
                            .unwrap_or_else(|| format!("Movelist {}", idx + 1));
                        MoveList::new(list_name, self.legacy_moves(option.sections))
                    })
                    .collect()
            }
            RecordShape::LegacySections => {
                let record: LegacySectionsRecord = serde_json::from_value(value)?;
                vec![MoveList::new("Moves", self.legacy_moves(record.sections))]
            }
        };

        let mut character = Character {
            name,
            icon: header.icon,
            movelists,
        };
        character.link_parents();
        Ok(character)
    }

    fn legacy_moves(&self, sections: Vec<LegacySection>) -> Vec<Move> {
        sections
            .into_iter()
            .flat_map(|section| section.moves)
            .flatten()
            .filter(|mv| !mv.name.trim().is_empty())
            .map(|mv| self.legacy_move(mv))
            .collect()
    }

    fn legacy_draft(&self, mv: LegacyMove) -> (DraftMove, Vec<Variant>) {
        let mut rows: Vec<Row> = mv
            .data
            .iter()
            .map(|row| row.iter().map(|(k, v)| (k.clone(), value_text(v))).collect())
            .collect();
        let has_data = rows.iter().any(|r| r.values().any(|v| !v.is_empty()));
        if !has_data {
            rows = synthesized_row(&mv.damage, mv.framedata.as_ref())
                .into_iter()
                .collect();
        }

        let mut notes = self.classifier.classify(notes_of(&mv.notes));
        for (label, scoped) in mv.version_notes {
            notes
                .by_version
                .entry(label.to_uppercase())
                .or_default()
                .extend(scoped);
        }

        let follow_ups = mv
            .follow_ups
            .into_iter()
            .flatten()
            .filter(|f| !f.name.trim().is_empty())
            .map(|f| {
                let (draft, _) = self.legacy_draft(f);
                draft
            })
            .collect();

        let draft = DraftMove {
            name: mv.name.trim().to_string(),
            input: mv.input,
            image: mv.image,
            rows,
            notes,
            follow_ups,
            ..Default::default()
        };
        (draft, mv.variations)
    }

    fn legacy_move(&self, mv: LegacyMove) -> Move {
        let (draft, stored_variants) = self.legacy_draft(mv);
        let mut canonical = finalize(draft, &self.labels);
        if !stored_variants.is_empty() {
            canonical.variants = stored_variants;
        }
        reconcile_damage(&mut canonical);
        canonical
    }
}

/// Pretty-printed current-shape record.
pub fn to_record_string(character: &Character) -> Result<String, MovedexError> {
    Ok(serde_json::to_string_pretty(character)?)
}
