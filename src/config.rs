use crate::{error::MovedexError, model::Move, query::AliasRule, special::SpecialCaseRule};
use serde::{Deserialize, Serialize};
use std::{
    fs::{read_to_string, write},
    path::Path,
    str::FromStr,
};

/// Rule data shipped with the crate: the alias and special-case tables for the bundled game.
pub const BUILTIN_RULES: &str = include_str!("../rules/efz.toml");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractSettings {
    /// Prefix for relative image and page links.
    pub base_url: String,
    /// Page title prefix stripped when deriving a character name.
    pub title_prefix: String,
    /// Link prefix identifying character pages on the index page.
    pub character_link_prefix: String,
    /// Serialized records smaller than this are reported as incomplete and not saved.
    pub min_record_bytes: usize,
    /// Pause between page fetches in batch jobs.
    pub request_delay_ms: u64,
    pub follow_up_marker: String,
    /// Big-text marker of a table that announces follow-ups.
    pub follow_up_header: String,
    /// Heading text (case-insensitive) that announces follow-ups instead of a new section.
    pub follow_up_heading: String,
    pub sibling_scan_limit: usize,
    /// Minimum colspan of a table cell that makes its row a note row.
    pub note_colspan: usize,
    pub version_labels: Vec<String>,
    /// Heading words that mark a move-list boundary.
    pub movelist_keywords: Vec<String>,
    /// Alt-text marker of the character icon image.
    pub icon_alt_marker: String,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        ExtractSettings {
            base_url: "https://wiki.gbl.gg".to_string(),
            title_prefix: "Eternal Fighter Zero/".to_string(),
            character_link_prefix: "/w/Eternal_Fighter_Zero/".to_string(),
            min_record_bytes: 2048,
            request_delay_ms: 2000,
            follow_up_marker: "→".to_string(),
            follow_up_header: "Follow-ups".to_string(),
            follow_up_heading: "Follow-up".to_string(),
            sibling_scan_limit: 10,
            note_colspan: 5,
            version_labels: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            movelist_keywords: vec![
                "mode".to_string(),
                "movelist".to_string(),
                "style".to_string(),
            ],
            icon_alt_marker: "CSS.png".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AliasPolicy {
    /// The first matching alias rule wins.
    #[default]
    FirstMatch,
    /// Every matching alias rule contributes a result.
    AllMatches,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveSettings {
    /// Moves whose name starts with this are looked up by input rather than name.
    pub reserved_prefix: String,
    pub alias_policy: AliasPolicy,
}

impl Default for ResolveSettings {
    fn default() -> Self {
        ResolveSettings {
            reserved_prefix: "Costume".to_string(),
            alias_policy: AliasPolicy::default(),
        }
    }
}

/// Picks one move by exact (case-insensitive) input or name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveSelector {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl MoveSelector {
    pub fn matches(&self, mv: &Move) -> bool {
        let by_input = match (&self.input, &mv.input) {
            (Some(want), Some(have)) => want.eq_ignore_ascii_case(have),
            _ => false,
        };
        let by_name = self
            .name
            .as_ref()
            .is_some_and(|want| want.to_lowercase() == mv.name.to_lowercase());
        by_input || by_name
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub extract: ExtractSettings,
    pub resolve: ResolveSettings,
    pub aliases: Vec<AliasRule>,
    pub special_cases: Vec<SpecialCaseRule>,
}

impl Settings {
    /// Defaults plus the bundled rule tables.
    pub fn builtin() -> Result<Settings, MovedexError> {
        BUILTIN_RULES.parse()
    }

    /// Reads settings from `path`, falling back to [Settings::builtin] when the file is absent.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Settings, MovedexError> {
        let path = path.as_ref();
        tracing::debug!("Attempting to read settings from: {:?}", path);
        if !path.exists() {
            tracing::debug!("Settings file not found, using bundled rules.");
            return Settings::builtin();
        }
        get_content(path)?.parse()
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), MovedexError> {
        tracing::debug!("Attempting to write settings to: {:?}", path.as_ref());
        let toml_string = toml::to_string(self)?;
        write(path, toml_string)?;
        Ok(())
    }
}

impl FromStr for Settings {
    type Err = MovedexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let settings: Settings = toml::from_str(s)?;
        if settings.extract.version_labels.is_empty() {
            return Err(MovedexError::Config(
                "extract.version_labels must name at least one label".to_string(),
            ));
        }
        Ok(settings)
    }
}

pub fn get_content<P: AsRef<Path>>(path: P) -> Result<String, MovedexError> {
    tracing::debug!("Reading {:?}", path.as_ref());
    Ok(read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn builtin_rules_parse() {
        let settings = Settings::builtin().expect("bundled rules parse");
        assert_eq!(settings.extract.min_record_bytes, 2048);
        assert_eq!(settings.resolve.reserved_prefix, "Costume");
        assert!(!settings.aliases.is_empty());
        assert!(!settings.special_cases.is_empty());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let settings: Settings = r#"
            [extract]
            min_record_bytes = 10

            [resolve]
            alias_policy = "all-matches"
        "#
        .parse()
        .expect("partial settings parse");
        assert_eq!(settings.extract.min_record_bytes, 10);
        assert_eq!(settings.extract.follow_up_marker, "→");
        assert_eq!(settings.resolve.alias_policy, AliasPolicy::AllMatches);
        assert!(settings.aliases.is_empty());
    }

    #[test]
    fn empty_labels_rejected() {
        let err = "[extract]\nversion_labels = []\n"
            .parse::<Settings>()
            .unwrap_err();
        assert!(matches!(err, MovedexError::Config(_)));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("movedex.toml");
        let settings = Settings::builtin().expect("bundled rules parse");
        settings.save(&path).expect("settings written");
        let reloaded = Settings::load(&path).expect("settings read");
        assert_eq!(settings, reloaded);
    }

    #[test]
    fn selector_matches_input_or_name() {
        let mut mv = Move::new("Nayu-chan Kick");
        mv.input = Some("623*".to_string());
        let by_input = MoveSelector {
            input: Some("623*".into()),
            name: None,
        };
        let by_name = MoveSelector {
            input: None,
            name: Some("nayu-chan kick".into()),
        };
        assert!(by_input.matches(&mv));
        assert!(by_name.matches(&mv));
        assert!(!MoveSelector::default().matches(&mv));
    }
}
