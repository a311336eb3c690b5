//! Builds one [Character] from one character page.
//!
//! The page is walked once in document order over section headings and top-level move tables.
//! Headings open sections (or switch move lists, or announce follow-ups); tables are classified
//! and handed to the [ChainLinker], which decides where each move lands. Sections only exist
//! while building: the finished [MoveList] holds its top-level moves in page order.
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::{
    codec::{
        diagnostic::BuildDiagnostic,
        html::{MarkupReader, TableShape},
        linker::{find_named, ChainLinker, SectionDraft, Slot},
        table::{element_text, nearest_table, selector},
        variants::finalize,
    },
    config::ExtractSettings,
    error::MovedexError,
    model::{Character, MoveList},
};

static WALK: Lazy<Selector> = Lazy::new(|| selector("h2, h3, table.wikitable"));
static HEADLINE: Lazy<Selector> = Lazy::new(|| selector(".mw-headline"));
static TOGGLE_BUTTONS: Lazy<Selector> =
    Lazy::new(|| selector(".movelist-toggles .movelist-toggle-button"));
static HEADINGS: Lazy<Selector> = Lazy::new(|| selector("h2, h3"));

const ACTIVE_TOGGLE_CLASS: &str = "movelist-toggle-on";
const DEFAULT_LIST_NAME: &str = "Moves";

/// How a page splits its moves into move lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveListLayout {
    /// Toggle buttons name the lists; `active` is the one shown on load.
    Toggles { names: Vec<String>, active: usize },
    /// Two or more headings containing a move-list keyword.
    Headings(Vec<String>),
    Single,
}

impl MoveListLayout {
    pub fn names(&self) -> Vec<String> {
        match self {
            MoveListLayout::Toggles { names, .. } | MoveListLayout::Headings(names) => {
                names.clone()
            }
            MoveListLayout::Single => vec![DEFAULT_LIST_NAME.to_string()],
        }
    }

    pub fn initial(&self) -> usize {
        match self {
            MoveListLayout::Toggles { active, .. } => *active,
            _ => 0,
        }
    }

    /// The list a heading switches to, if it is a move-list boundary.
    fn switch_for(&self, heading: &str) -> Option<usize> {
        let heading = heading.to_lowercase();
        match self {
            MoveListLayout::Headings(names) => {
                names.iter().position(|n| n.to_lowercase() == heading)
            }
            MoveListLayout::Toggles { names, .. } => names.iter().position(|n| {
                let n = n.to_lowercase();
                !n.is_empty() && (heading.contains(&n) || n.contains(&heading))
            }),
            MoveListLayout::Single => None,
        }
    }
}

/// Result of building one page.
#[derive(Debug, Clone)]
pub struct CharacterBuild {
    pub character: Character,
    /// Pretty-printed record as it would be persisted.
    pub serialized: String,
    pub diagnostics: Vec<BuildDiagnostic>,
}

fn heading_text(heading: ElementRef<'_>) -> String {
    heading
        .select(&HEADLINE)
        .next()
        .map(element_text)
        .unwrap_or_else(|| element_text(heading))
}

fn following_elements(el: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    el.next_siblings().filter_map(ElementRef::wrap)
}

/// `Eternal_Fighter_Zero/Mio_Kouzuki` -> `Mio Kouzuki`
pub fn name_from_slug(slug: &str) -> String {
    slug.rsplit('/')
        .next()
        .unwrap_or(slug)
        .replace('_', " ")
        .trim()
        .to_string()
}

struct ListDraft {
    name: String,
    sections: Vec<SectionDraft>,
}

pub struct GraphBuilder<'s> {
    reader: MarkupReader<'s>,
}

impl<'s> GraphBuilder<'s> {
    pub fn new(settings: &'s ExtractSettings) -> Result<GraphBuilder<'s>, MovedexError> {
        Ok(GraphBuilder {
            reader: MarkupReader::new(settings)?,
        })
    }

    fn settings(&self) -> &ExtractSettings {
        self.reader.settings()
    }

    pub fn detect_layout(&self, doc: &Html) -> MoveListLayout {
        let buttons: Vec<ElementRef<'_>> = doc.select(&TOGGLE_BUTTONS).collect();
        if !buttons.is_empty() {
            let names = buttons
                .iter()
                .enumerate()
                .map(|(idx, b)| {
                    let text = element_text(*b);
                    if text.is_empty() {
                        format!("Movelist {}", idx + 1)
                    } else {
                        text
                    }
                })
                .collect();
            let active = buttons
                .iter()
                .position(|b| b.value().classes().any(|c| c == ACTIVE_TOGGLE_CLASS))
                .unwrap_or(0);
            return MoveListLayout::Toggles { names, active };
        }

        let keywords: Vec<String> = self
            .settings()
            .movelist_keywords
            .iter()
            .map(|k| k.to_lowercase())
            .collect();
        let names: Vec<String> = doc
            .select(&HEADINGS)
            .map(heading_text)
            .filter(|text| {
                let lower = text.to_lowercase();
                keywords.iter().any(|k| lower.contains(k.as_str()))
            })
            .collect();
        if names.len() > 1 {
            MoveListLayout::Headings(names)
        } else {
            MoveListLayout::Single
        }
    }

    /// Build and size-check a page. Pages whose serialized record is below the configured
    /// minimum fail with [MovedexError::IncompleteExtraction].
    pub fn build(&self, html: &str, slug: &str) -> Result<CharacterBuild, MovedexError> {
        let (character, diagnostics) = self.build_unchecked(html, slug);
        let serialized = serde_json::to_string_pretty(&character)?;
        let minimum = self.settings().min_record_bytes;
        if serialized.len() < minimum {
            tracing::warn!(
                "[GraphBuilder::build] {} produced {} bytes (< {minimum}), likely incomplete",
                character.name,
                serialized.len()
            );
            return Err(MovedexError::IncompleteExtraction {
                character: character.name,
                bytes: serialized.len(),
                minimum,
            });
        }
        tracing::info!(
            "[GraphBuilder::build] {}: {} move lists, {} moves, {} diagnostics",
            character.name,
            character.movelists.len(),
            character.move_count(),
            diagnostics.len()
        );
        Ok(CharacterBuild {
            character,
            serialized,
            diagnostics,
        })
    }

    /// Build without the size check.
    pub fn build_unchecked(&self, html: &str, slug: &str) -> (Character, Vec<BuildDiagnostic>) {
        let doc = Html::parse_document(html);
        let mut diagnostics = Vec::new();

        tracing::debug!("Phase 1: page metadata and move-list layout");
        let name = self
            .reader
            .page_title(&doc)
            .unwrap_or_else(|| name_from_slug(slug));
        let icon = self.reader.character_icon(&doc);
        let layout = self.detect_layout(&doc);
        let mut lists: Vec<ListDraft> = layout
            .names()
            .into_iter()
            .map(|name| ListDraft {
                name,
                sections: Vec::new(),
            })
            .collect();
        let mut active = layout.initial().min(lists.len().saturating_sub(1));

        tracing::debug!("Phase 2: walk headings and tables ({:?})", layout);
        let settings = self.settings();
        let mut linker = ChainLinker::new(settings.follow_up_marker.clone());
        let mut consumed = HashSet::new();
        for el in doc.select(&WALK) {
            if consumed.contains(&el.id()) {
                continue;
            }
            let sections = &mut lists[active].sections;
            if el.value().name() != "table" {
                let text = heading_text(el);
                if text.is_empty() {
                    continue;
                }
                if let Some(idx) = layout.switch_for(&text) {
                    active = idx;
                    linker.reset();
                } else if self.reader.is_follow_up_heading(&text) {
                    match find_named(sections, &text).or_else(|| linker.cursor().cloned()) {
                        Some(target) => linker.expect_follow_ups(target),
                        None => diagnostics.push(BuildDiagnostic::warning(format!(
                            "follow-up heading {text:?} has no move to attach to"
                        ))),
                    }
                } else {
                    sections.push(SectionDraft::new(text));
                    linker.reset();
                }
                continue;
            }

            if nearest_table(el).is_some() {
                continue;
            }
            match self.reader.classify(el) {
                TableShape::Move => {
                    let mut draft = match self.reader.read_move_table(el) {
                        Ok(draft) => draft,
                        Err(diag) => {
                            diagnostics.push(diag);
                            continue;
                        }
                    };
                    let mut row_tables = Vec::new();
                    let mut headings_seen = Vec::new();
                    for sibling in following_elements(el).take(settings.sibling_scan_limit) {
                        match sibling.value().name() {
                            "ul" => {
                                draft.notes.extend(self.reader.read_list_notes(sibling));
                                consumed.insert(sibling.id());
                            }
                            "table" => {
                                if self.reader.classify(sibling) != TableShape::FollowUpRows {
                                    break;
                                }
                                consumed.insert(sibling.id());
                                consumed.extend(headings_seen.drain(..));
                                row_tables.push(sibling);
                            }
                            "h1" | "h2" | "h3" | "h4" | "h5" => {
                                if !self.reader.is_follow_up_heading(&heading_text(sibling)) {
                                    break;
                                }
                                headings_seen.push(sibling.id());
                            }
                            _ => {}
                        }
                    }
                    let slot = linker.link(sections, draft, &mut diagnostics);
                    for table in row_tables {
                        self.attach_rows(sections, &slot, table, &mut diagnostics);
                    }
                }
                TableShape::FollowUpHeader { title } => {
                    let Some(target) = find_named(sections, &title)
                        .filter(|_| title.trim() != settings.follow_up_header)
                        .or_else(|| linker.cursor().cloned())
                    else {
                        diagnostics.push(BuildDiagnostic::warning(format!(
                            "follow-up header {title:?} has no move to attach to"
                        )));
                        continue;
                    };
                    let mut took_rows = false;
                    for sibling in following_elements(el).take(settings.sibling_scan_limit) {
                        if sibling.value().name() != "table" {
                            continue;
                        }
                        if self.reader.classify(sibling) != TableShape::FollowUpRows {
                            break;
                        }
                        consumed.insert(sibling.id());
                        self.attach_rows(sections, &target, sibling, &mut diagnostics);
                        took_rows = true;
                    }
                    if !took_rows {
                        linker.expect_follow_ups(target);
                    }
                }
                TableShape::FollowUpRows => match linker.cursor().cloned() {
                    Some(target) => self.attach_rows(sections, &target, el, &mut diagnostics),
                    None => {
                        for draft in self.reader.read_follow_up_rows(el, &mut diagnostics) {
                            diagnostics.push(BuildDiagnostic::OrphanFollowUp(draft.name.clone()));
                            linker.link(sections, draft, &mut diagnostics);
                        }
                    }
                },
                TableShape::Unknown => {
                    diagnostics.push(BuildDiagnostic::info("skipped a table with no move name"))
                }
            }
        }

        tracing::debug!("Phase 3: finalize moves and drop empty sections and lists");
        let labels = &settings.version_labels;
        let movelists = lists
            .into_iter()
            .filter_map(|list| {
                let moves: Vec<_> = list
                    .sections
                    .into_iter()
                    .flat_map(|section| section.moves)
                    .map(|draft| finalize(draft, labels))
                    .collect();
                (!moves.is_empty()).then(|| MoveList::new(list.name, moves))
            })
            .collect();
        let mut character = Character {
            name,
            icon,
            movelists,
        };
        character.link_parents();
        (character, diagnostics)
    }

    fn attach_rows(
        &self,
        sections: &mut [SectionDraft],
        target: &Slot,
        table: ElementRef<'_>,
        diagnostics: &mut Vec<BuildDiagnostic>,
    ) {
        for draft in self.reader.read_follow_up_rows(table, diagnostics) {
            if let Err(draft) = ChainLinker::attach(sections, target, draft) {
                diagnostics.push(BuildDiagnostic::OrphanFollowUp(draft.name));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ExtractSettings {
        ExtractSettings {
            min_record_bytes: 0,
            ..Default::default()
        }
    }

    fn move_table(name: &str, input: &str, damage: &str) -> String {
        format!(
            r#"<table class="wikitable">
                 <tr><th><big>{name}</big><br><small>{input}</small></th></tr>
                 <tr><td><table>
                   <tr><th>Damage</th><th>Guard</th></tr>
                   <tr><td>{damage}</td><td>Mid</td></tr>
                 </table></td></tr>
               </table>"#
        )
    }

    #[test]
    fn header_table_then_rows_attach_to_cursor() {
        let html = format!(
            r#"<html><body><h1 id="firstHeading">Eternal Fighter Zero/Test</h1>
               <h2><span class="mw-headline">Special Moves</span></h2>
               {}
               <table class="wikitable"><tr><th><big>Follow-ups</big></th></tr></table>
               <table class="wikitable">
                 <tr><th>Name</th><th>Damage</th></tr>
                 <tr><td><b>→ Example</b></td><td>300</td></tr>
               </table>
               {}
               </body></html>"#,
            move_table("Example Move", "236A", "800"),
            move_table("Other Move", "214A", "500")
        );
        let settings = settings();
        let builder = GraphBuilder::new(&settings).expect("builder");
        let (character, diags) = builder.build_unchecked(&html, "Test");
        assert_eq!(character.name, "Test");
        assert!(character.is_simple());
        let moves = &character.movelists[0].moves;
        assert_eq!(moves.len(), 2);
        assert_eq!(moves[0].follow_ups.len(), 1);
        assert_eq!(moves[0].follow_ups[0].name, "→ Example");
        assert_eq!(
            moves[0].follow_ups[0].parent.as_deref(),
            Some("Example Move")
        );
        assert!(moves[1].follow_ups.is_empty());
        assert!(diags.iter().all(|d| !d.is_problem()), "{diags:?}");
    }

    #[test]
    fn marker_tables_and_heading_reset() {
        let html = format!(
            "<html><body><h2>Specials</h2>{}{}<h2>Supers</h2>{}</body></html>",
            move_table("Rekka", "236A", "400"),
            move_table("→ Rekka 2", "236A", "500"),
            move_table("→ Stray", "", "100"),
        );
        let settings = settings();
        let builder = GraphBuilder::new(&settings).expect("builder");
        let (character, diags) = builder.build_unchecked(&html, "Tester");
        let moves = &character.movelists[0].moves;
        assert_eq!(moves.len(), 2);
        assert_eq!(moves[0].follow_ups[0].name, "→ Rekka 2");
        assert_eq!(moves[1].name, "→ Stray");
        assert!(diags
            .iter()
            .any(|d| matches!(d, BuildDiagnostic::OrphanFollowUp(n) if n == "→ Stray")));
    }

    #[test]
    fn heading_move_lists() {
        let html = format!(
            "<html><body><h2>Normal Mode</h2><h3>Specials</h3>{}<h2>Awakened Mode</h2><h3>Specials</h3>{}<h2>Empty Style</h2></body></html>",
            move_table("Punch", "5A", "300"),
            move_table("Big Punch", "5A", "600"),
        );
        let settings = settings();
        let builder = GraphBuilder::new(&settings).expect("builder");
        let (character, _) = builder.build_unchecked(&html, "Mode_Test");
        assert_eq!(character.name, "Mode Test");
        let names: Vec<&str> = character.movelists.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Normal Mode", "Awakened Mode"]);
        assert_eq!(character.movelists[1].moves[0].damage, "600");
    }

    #[test]
    fn toggle_move_lists_start_at_active() {
        let html = format!(
            r#"<html><body>
               <div class="movelist-toggles">
                 <div class="movelist-toggle-button">Human</div>
                 <div class="movelist-toggle-button movelist-toggle-on">Doll</div>
               </div>
               {}
               <h2>Human</h2>
               {}
               </body></html>"#,
            move_table("Doll Strike", "5A", "200"),
            move_table("Human Strike", "5A", "100"),
        );
        let settings = settings();
        let builder = GraphBuilder::new(&settings).expect("builder");
        let doc = Html::parse_document(&html);
        assert_eq!(
            builder.detect_layout(&doc),
            MoveListLayout::Toggles {
                names: vec!["Human".to_string(), "Doll".to_string()],
                active: 1
            }
        );
        let (character, _) = builder.build_unchecked(&html, "Toggle");
        assert_eq!(character.movelists[0].name, "Human");
        assert_eq!(character.movelists[0].moves[0].name, "Human Strike");
        assert_eq!(character.movelists[1].moves[0].name, "Doll Strike");
    }

    #[test]
    fn small_record_is_incomplete() {
        let settings = ExtractSettings::default();
        let builder = GraphBuilder::new(&settings).expect("builder");
        let html = format!("<html><body>{}</body></html>", move_table("Jab", "5A", "1"));
        let err = builder.build(&html, "Tiny").unwrap_err();
        match err {
            MovedexError::IncompleteExtraction {
                character, minimum, ..
            } => {
                assert_eq!(character, "Tiny");
                assert_eq!(minimum, 2048);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn slug_names() {
        assert_eq!(name_from_slug("Eternal_Fighter_Zero/Mio_Kouzuki"), "Mio Kouzuki");
        assert_eq!(name_from_slug("Akane"), "Akane");
    }
}
