//! [crate::model] holds the canonical move record: the normalized shape every extraction path and
//! every legacy record adapter produces, and the only shape the resolver and views consume.
//!
//! Persisted field names follow the published record format (`moveName`, `framedata`,
//! `variations`, `followUps`). Readers are lenient about scalar types because hand-edited records
//! routinely carry numbers where strings are expected.
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// One parsed table row: column header to cell text.
pub type Row = BTreeMap<String, String>;

pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn flatten(value: Option<Value>) -> String {
        match value {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
        }
    }

    pub(crate) fn string<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
        Ok(flatten(Option::<Value>::deserialize(de)?))
    }

    pub(crate) fn opt_string<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
        let text = flatten(Option::<Value>::deserialize(de)?);
        let trimmed = text.trim();
        Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
    }
}

/// The fixed frame-data record. Missing columns are empty strings, never absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FrameData {
    #[serde(deserialize_with = "lenient::string")]
    pub damage: String,
    #[serde(deserialize_with = "lenient::string")]
    pub guard: String,
    #[serde(deserialize_with = "lenient::string")]
    pub startup: String,
    #[serde(deserialize_with = "lenient::string")]
    pub active: String,
    #[serde(deserialize_with = "lenient::string")]
    pub recovery: String,
    #[serde(deserialize_with = "lenient::string")]
    pub adv_hit: String,
    #[serde(deserialize_with = "lenient::string")]
    pub adv_block: String,
    #[serde(deserialize_with = "lenient::string")]
    pub cancel: String,
}

impl FrameData {
    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|(_, v)| v.is_empty())
    }

    /// Display-ordered `(label, value)` pairs.
    pub fn fields(&self) -> [(&'static str, &str); 8] {
        [
            ("Damage", self.damage.as_str()),
            ("Guard", self.guard.as_str()),
            ("Startup", self.startup.as_str()),
            ("Active", self.active.as_str()),
            ("Recovery", self.recovery.as_str()),
            ("Adv Hit", self.adv_hit.as_str()),
            ("Adv Block", self.adv_block.as_str()),
            ("Cancel", self.cancel.as_str()),
        ]
    }
}

/// A labeled alternate data set for a [Move]. Variants are addressed from index 1; index 0 always
/// means the move's own base data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    #[serde(rename = "version", default, deserialize_with = "lenient::string")]
    pub label: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub damage: String,
    #[serde(rename = "framedata", default)]
    pub frame_data: FrameData,
    #[serde(default, deserialize_with = "lenient::string")]
    pub notes: String,
}

/// A canonical move. Follow-ups are moves too; their `parent` names the move they hang off.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Move {
    #[serde(rename = "moveName", alias = "name", default)]
    pub name: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_string"
    )]
    pub input: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_string"
    )]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub damage: String,
    #[serde(rename = "framedata", default)]
    pub frame_data: FrameData,
    #[serde(default)]
    pub properties: Vec<String>,
    #[serde(rename = "variations", default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<Variant>,
    #[serde(rename = "followUps", default, skip_serializing_if = "Vec::is_empty")]
    pub follow_ups: Vec<Move>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Extra images found in the move's table; used for display only and never persisted.
    #[serde(skip)]
    pub additional_images: Vec<String>,
}

/// A borrowed view of one selectable data set of a [Move].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Version<'a> {
    Base(&'a Move),
    Variant(&'a Variant),
}

impl<'a> Version<'a> {
    pub fn damage(&self) -> &'a str {
        match self {
            Version::Base(mv) => &mv.damage,
            Version::Variant(v) => &v.damage,
        }
    }

    pub fn frame_data(&self) -> &'a FrameData {
        match self {
            Version::Base(mv) => &mv.frame_data,
            Version::Variant(v) => &v.frame_data,
        }
    }

    pub fn label(&self) -> Option<&'a str> {
        match self {
            Version::Base(_) => None,
            Version::Variant(v) => Some(&v.label),
        }
    }

    pub fn is_base(&self) -> bool {
        matches!(self, Version::Base(_))
    }
}

impl Move {
    pub fn new<S: Into<String>>(name: S) -> Move {
        Move {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn is_follow_up(&self) -> bool {
        self.parent.is_some()
    }

    /// Number of selectable data sets: the base plus every variant.
    pub fn version_count(&self) -> usize {
        1 + self.variants.len()
    }

    /// Index 0 and any out-of-range index select the base data.
    pub fn version(&self, index: usize) -> Version<'_> {
        match index.checked_sub(1).and_then(|i| self.variants.get(i)) {
            Some(variant) => Version::Variant(variant),
            None => Version::Base(self),
        }
    }

    /// Input notation before the first `*` or `~`, if the move has an input.
    pub fn input_base(&self) -> Option<&str> {
        self.input
            .as_deref()
            .map(|input| input.split(['*', '~']).next().unwrap_or(input))
    }

    pub fn follow_up_at(&self, path: &[usize]) -> Option<&Move> {
        path.iter()
            .try_fold(self, |current, idx| current.follow_ups.get(*idx))
    }

    /// Pre-order walk of this move and every nested follow-up, paired with the follow-up index
    /// path from this move.
    pub fn tree(&self) -> MoveTree<'_> {
        MoveTree {
            stack: vec![(Vec::new(), self)],
        }
    }

    /// Re-derive every follow-up's `parent` from the containment structure.
    pub fn link_parents(&mut self) {
        let name = self.name.clone();
        for follow_up in self.follow_ups.iter_mut() {
            follow_up.parent = Some(name.clone());
            follow_up.link_parents();
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.input {
            Some(input) => write!(f, "{} ({input})", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

pub struct MoveTree<'a> {
    stack: Vec<(Vec<usize>, &'a Move)>,
}

impl<'a> Iterator for MoveTree<'a> {
    type Item = (Vec<usize>, &'a Move);

    fn next(&mut self) -> Option<Self::Item> {
        let (path, mv) = self.stack.pop()?;
        for (idx, child) in mv.follow_ups.iter().enumerate().rev() {
            let mut child_path = path.clone();
            child_path.push(idx);
            self.stack.push((child_path, child));
        }
        Some((path, mv))
    }
}

/// A named, ordered group of top-level moves. Its id is its position within the character.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveList {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default)]
    pub moves: Vec<Move>,
}

impl MoveList {
    pub fn new<S: Into<String>>(name: S, moves: Vec<Move>) -> MoveList {
        MoveList {
            name: name.into(),
            moves,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Character {
    #[serde(alias = "character")]
    pub name: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_string"
    )]
    pub icon: Option<String>,
    #[serde(default)]
    pub movelists: Vec<MoveList>,
}

impl Character {
    pub fn new<S: Into<String>>(name: S, movelists: Vec<MoveList>) -> Character {
        Character {
            name: name.into(),
            icon: None,
            movelists,
        }
    }

    /// Case-insensitive lookup key.
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }

    pub fn is_simple(&self) -> bool {
        self.movelists.len() <= 1
    }

    pub fn move_list(&self, id: usize) -> Option<&MoveList> {
        self.movelists.get(id)
    }

    /// Top-level moves with their move-list id.
    pub fn top_level_moves(&self) -> impl Iterator<Item = (usize, &MoveList, &Move)> {
        self.movelists
            .iter()
            .enumerate()
            .flat_map(|(id, list)| list.moves.iter().map(move |mv| (id, list, mv)))
    }

    pub fn move_count(&self) -> usize {
        self.top_level_moves().map(|(_, _, mv)| mv.tree().count()).sum()
    }

    pub fn link_parents(&mut self) {
        for list in self.movelists.iter_mut() {
            for mv in list.moves.iter_mut() {
                mv.parent = None;
                mv.link_parents();
            }
        }
    }
}
