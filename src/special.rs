//! Per-character corrections applied once when records are loaded.
//!
//! A rule targets one move of one character and can replace its properties, name unlabeled
//! variants by position, and shorten long variant notes. Applying the rules a second time changes
//! nothing.
use serde::{Deserialize, Serialize};

use crate::{
    config::MoveSelector,
    model::{Character, Move},
    view::truncate_text,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialCaseRule {
    pub character: String,
    pub target: MoveSelector,
    /// Replaces the move's properties when it has any.
    pub properties: Vec<String>,
    /// Labels for variants whose label is empty or `-`, by position.
    pub variant_labels: Vec<String>,
    /// Label for positions past `variant_labels`; `{n}` is the 1-based position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_label: Option<String>,
    /// Variant notes longer than this (in characters) are shortened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_limit: Option<usize>,
    /// Shorten to the first sentence when it ends within the first half of `note_limit`.
    pub summarize_notes: bool,
}

fn is_unlabeled(label: &str) -> bool {
    let label = label.trim();
    label.is_empty() || label == "-"
}

impl SpecialCaseRule {
    pub fn applies_to(&self, character: &str) -> bool {
        self.character.to_lowercase() == character.to_lowercase()
    }

    fn label_for(&self, idx: usize) -> Option<String> {
        self.variant_labels.get(idx).cloned().or_else(|| {
            self.fallback_label
                .as_ref()
                .map(|pattern| pattern.replace("{n}", &(idx + 1).to_string()))
        })
    }

    fn shorten(&self, notes: &str, limit: usize) -> String {
        if self.summarize_notes {
            if let Some(end) = notes.find(". ") {
                let head = &notes[..end];
                if end > 0 && head.chars().count() < limit / 2 {
                    return format!("{head}.");
                }
            }
        }
        truncate_text(notes, limit)
    }

    /// Apply to one move. Returns whether anything changed.
    pub fn apply(&self, mv: &mut Move) -> bool {
        let mut changed = false;
        if !self.properties.is_empty()
            && !mv.properties.is_empty()
            && mv.properties != self.properties
        {
            mv.properties = self.properties.clone();
            changed = true;
        }
        for (idx, variant) in mv.variants.iter_mut().enumerate() {
            if is_unlabeled(&variant.label) {
                if let Some(label) = self.label_for(idx) {
                    variant.label = label;
                    changed = true;
                }
            }
            if let Some(limit) = self.note_limit {
                if variant.notes.chars().count() > limit {
                    variant.notes = self.shorten(&variant.notes, limit);
                    changed = true;
                }
            }
        }
        changed
    }
}

fn apply_tree(rules: &[&SpecialCaseRule], mv: &mut Move) -> usize {
    let mut touched = 0;
    for rule in rules {
        if rule.target.matches(mv) && rule.apply(mv) {
            touched += 1;
        }
    }
    for follow_up in mv.follow_ups.iter_mut() {
        touched += apply_tree(rules, follow_up);
    }
    touched
}

#[derive(Debug, Clone, Copy)]
pub struct SpecialCases<'r> {
    rules: &'r [SpecialCaseRule],
}

impl<'r> SpecialCases<'r> {
    pub fn new(rules: &'r [SpecialCaseRule]) -> Self {
        SpecialCases { rules }
    }

    /// Apply every rule for this character to every matching move. Returns how many rule
    /// applications changed a move.
    pub fn apply_to_character(&self, character: &mut Character) -> usize {
        let rules: Vec<&SpecialCaseRule> = self
            .rules
            .iter()
            .filter(|r| r.applies_to(&character.name))
            .collect();
        if rules.is_empty() {
            return 0;
        }
        let touched = character
            .movelists
            .iter_mut()
            .flat_map(|list| list.moves.iter_mut())
            .map(|mv| apply_tree(&rules, mv))
            .sum();
        tracing::debug!("special cases touched {touched} moves of {}", character.name);
        touched
    }
}
