//! Splits free-text notes into general notes and notes scoped to one version label.
use regex::Regex;
use std::collections::BTreeMap;

use crate::{codec::table::normalize_text, error::MovedexError};

/// General notes keep first-seen order and carry no duplicates. Version-scoped notes keep every
/// occurrence in order, keyed by label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedNotes {
    pub general: Vec<String>,
    pub by_version: BTreeMap<String, Vec<String>>,
}

impl ClassifiedNotes {
    pub fn is_empty(&self) -> bool {
        self.general.is_empty() && self.by_version.is_empty()
    }

    pub fn push_general(&mut self, note: String) {
        if !note.is_empty() && !self.general.contains(&note) {
            self.general.push(note);
        }
    }

    pub fn extend(&mut self, other: ClassifiedNotes) {
        for note in other.general {
            self.push_general(note);
        }
        for (label, notes) in other.by_version {
            self.by_version.entry(label).or_default().extend(notes);
        }
    }
}

#[derive(Debug, Clone)]
pub struct NoteClassifier {
    prefix: Regex,
}

impl NoteClassifier {
    /// Recognizes notes starting with `LABEL:` or `Version LABEL:` for any of `labels`.
    pub fn new(labels: &[String]) -> Result<NoteClassifier, MovedexError> {
        if labels.is_empty() {
            return Err(MovedexError::Config(
                "note classifier needs at least one version label".to_string(),
            ));
        }
        let alternatives = labels
            .iter()
            .map(|l| regex::escape(l))
            .collect::<Vec<_>>()
            .join("|");
        let prefix = Regex::new(&format!(r"(?i)^(?:version\s+)?({alternatives})\s*:"))?;
        Ok(NoteClassifier { prefix })
    }

    /// The version label a single note is scoped to, in upper case.
    pub fn label_of(&self, note: &str) -> Option<String> {
        self.split_label(note).map(|(label, _)| label)
    }

    /// The upper-cased label and the note text after its prefix.
    pub fn split_label<'n>(&self, note: &'n str) -> Option<(String, &'n str)> {
        let note = note.trim();
        let caps = self.prefix.captures(note)?;
        let label = caps.get(1)?.as_str().to_uppercase();
        let end = caps.get(0)?.end();
        Some((label, note[end..].trim()))
    }

    pub fn classify<I, S>(&self, notes: I) -> ClassifiedNotes
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut classified = ClassifiedNotes::default();
        for note in notes {
            let note = normalize_text(note.as_ref());
            if note.is_empty() {
                continue;
            }
            match self.split_label(&note) {
                Some((label, rest)) => classified
                    .by_version
                    .entry(label)
                    .or_default()
                    .push(rest.to_string()),
                None => classified.push_general(note),
            }
        }
        classified
    }
}
