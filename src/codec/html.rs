//! Reads wiki markup: move tables, follow-up row tables and page metadata.
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::{
    codec::{
        diagnostic::BuildDiagnostic,
        notes::{ClassifiedNotes, NoteClassifier},
        table::{
            colspan, element_text, extract_table, normalize_text, own_rows, row_cells, selector,
        },
        variants::DraftMove,
    },
    config::ExtractSettings,
    error::MovedexError,
    model::Row,
};

static BIG: Lazy<Selector> = Lazy::new(|| selector("big"));
static SMALL: Lazy<Selector> = Lazy::new(|| selector("small"));
static TH: Lazy<Selector> = Lazy::new(|| selector("th"));
static TABLE: Lazy<Selector> = Lazy::new(|| selector("table"));
static IMG: Lazy<Selector> = Lazy::new(|| selector("img"));
static LI: Lazy<Selector> = Lazy::new(|| selector("li"));
static ROW_NAME: Lazy<Selector> = Lazy::new(|| selector("big, b, strong"));
static FIRST_HEADING: Lazy<Selector> = Lazy::new(|| selector("h1#firstHeading, h1"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("title"));

/// Text of `cell` without its `<ul>`/`<ol>` lists, whose items are read one by one.
fn text_outside_lists(cell: ElementRef<'_>) -> String {
    let mut out = String::new();
    for child in cell.children() {
        match ElementRef::wrap(child) {
            Some(el) if matches!(el.value().name(), "ul" | "ol") => {}
            Some(el) => {
                out.push(' ');
                out.push_str(&element_text(el));
            }
            None => {
                if let Some(text) = child.value().as_text() {
                    out.push_str(text);
                }
            }
        }
    }
    normalize_text(&out)
}

static INPUT_IN_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+\*?~\d+[ABC])").expect("static regex parses"));

/// What a top-level table on a character page is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableShape {
    /// Announces that the following table(s) are follow-ups; `title` may name the parent.
    FollowUpHeader { title: String },
    /// A single move: name in `<big>`, input in `<small>`, a nested frame-data table.
    Move,
    /// One follow-up per data row under a header row of column names.
    FollowUpRows,
    Unknown,
}

fn is_inside(el: ElementRef<'_>, container: Option<ElementRef<'_>>) -> bool {
    match container {
        Some(container) => el.ancestors().any(|a| a.id() == container.id()),
        None => false,
    }
}

/// Markup reader bound to one set of extraction settings.
#[derive(Debug, Clone)]
pub struct MarkupReader<'s> {
    settings: &'s ExtractSettings,
    classifier: NoteClassifier,
}

impl<'s> MarkupReader<'s> {
    pub fn new(settings: &'s ExtractSettings) -> Result<MarkupReader<'s>, MovedexError> {
        Ok(MarkupReader {
            settings,
            classifier: NoteClassifier::new(&settings.version_labels)?,
        })
    }

    pub fn settings(&self) -> &ExtractSettings {
        self.settings
    }

    pub fn classifier(&self) -> &NoteClassifier {
        &self.classifier
    }

    /// Resolve an `src`/`href` against the configured base URL.
    pub fn absolute_url(&self, src: &str) -> String {
        let src = src.trim();
        let base = self.settings.base_url.trim_end_matches('/');
        if src.starts_with("http://") || src.starts_with("https://") {
            src.to_string()
        } else if let Some(rest) = src.strip_prefix("//") {
            format!("https://{rest}")
        } else if src.starts_with('/') {
            format!("{base}{src}")
        } else {
            format!("{base}/{src}")
        }
    }

    pub fn classify(&self, table: ElementRef<'_>) -> TableShape {
        let rows = own_rows(table);
        if let Some(first) = rows.first() {
            let cells = row_cells(*first);
            let header_row = cells.len() >= 2 && cells.iter().all(|c| c.value().name() == "th");
            let has_data = rows
                .iter()
                .skip(1)
                .any(|r| row_cells(*r).iter().any(|c| c.value().name() == "td"));
            if header_row && has_data {
                return TableShape::FollowUpRows;
            }
        }
        match table.select(&BIG).next().map(element_text) {
            Some(title) if title.contains(&self.settings.follow_up_header) => {
                TableShape::FollowUpHeader { title }
            }
            Some(_) => TableShape::Move,
            None => TableShape::Unknown,
        }
    }

    /// Whether a heading announces follow-ups rather than starting a section.
    pub fn is_follow_up_heading(&self, text: &str) -> bool {
        let marker = self.settings.follow_up_heading.to_lowercase();
        !marker.is_empty() && text.to_lowercase().contains(&marker)
    }

    pub fn read_move_table(&self, table: ElementRef<'_>) -> Result<DraftMove, BuildDiagnostic> {
        let name = table
            .select(&BIG)
            .next()
            .map(element_text)
            .unwrap_or_default();
        if name.is_empty() {
            return Err(BuildDiagnostic::malformed(
                "move table",
                "no move name in <big>",
            ));
        }

        let header = table.select(&TH).next();
        let input = header
            .and_then(|th| th.select(&SMALL).last())
            .map(element_text)
            .filter(|i| !i.is_empty())
            .or_else(|| {
                let text = header.map(element_text)?;
                if !text.contains('~') {
                    return None;
                }
                INPUT_IN_TEXT
                    .captures(&text)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str().to_string())
            });

        let mut images = table
            .select(&IMG)
            .filter_map(|img| img.value().attr("src"))
            .map(|src| self.absolute_url(src));
        let image = images.next();
        let additional_images = images.collect();

        let data_table = table.select(&TABLE).next();
        let extracted = data_table
            .map(|t| extract_table(t, self.settings.note_colspan))
            .unwrap_or_default();
        let list_notes: Vec<String> = table
            .select(&LI)
            .filter(|li| !is_inside(*li, data_table))
            .map(element_text)
            .collect();

        let notes = self
            .classifier
            .classify(extracted.notes.iter().chain(list_notes.iter()));
        Ok(DraftMove {
            name,
            input,
            image,
            additional_images,
            rows: extracted.rows,
            notes,
            ..Default::default()
        })
    }

    /// Notes from a `<ul>` found next to a move table.
    pub fn read_list_notes(&self, list: ElementRef<'_>) -> ClassifiedNotes {
        self.classifier
            .classify(list.select(&LI).map(element_text))
    }

    fn is_note_row(&self, cells: &[ElementRef<'_>]) -> bool {
        cells.len() == 1 || cells.iter().any(|c| colspan(*c) >= self.settings.note_colspan)
    }

    /// One follow-up per data row. A row directly below a data row whose cell spans columns
    /// carries that follow-up's notes.
    pub fn read_follow_up_rows(
        &self,
        table: ElementRef<'_>,
        diagnostics: &mut Vec<BuildDiagnostic>,
    ) -> Vec<DraftMove> {
        let rows = own_rows(table);
        let Some((header_row, body)) = rows.split_first() else {
            return Vec::new();
        };
        let headers: Vec<String> = row_cells(*header_row)
            .into_iter()
            .map(element_text)
            .collect();

        let mut drafts = Vec::new();
        for (idx, row) in body.iter().enumerate() {
            let cells: Vec<ElementRef<'_>> = row_cells(*row)
                .into_iter()
                .filter(|c| c.value().name() == "td")
                .collect();
            if cells.is_empty() || self.is_note_row(&cells) {
                continue;
            }

            let name_cell = cells[0];
            let name = name_cell
                .select(&ROW_NAME)
                .next()
                .map(element_text)
                .filter(|n| !n.is_empty())
                .or_else(|| {
                    name_cell
                        .children()
                        .filter_map(|n| n.value().as_text().map(|t| t.trim().to_string()))
                        .find(|t| !t.is_empty())
                })
                .unwrap_or_default();
            if name.is_empty() {
                diagnostics.push(BuildDiagnostic::malformed(
                    "follow-up row",
                    format!("row {} has no name", idx + 1),
                ));
                continue;
            }

            let input = name_cell
                .select(&SMALL)
                .next()
                .map(element_text)
                .filter(|i| !i.is_empty());
            let image = name_cell
                .select(&IMG)
                .next()
                .and_then(|img| img.value().attr("src"))
                .map(|src| self.absolute_url(src));

            let mut data = Row::new();
            for (cell_idx, cell) in cells.iter().enumerate().skip(1) {
                let Some(header) = headers.get(cell_idx).filter(|h| !h.is_empty()) else {
                    continue;
                };
                let text = element_text(*cell);
                if !text.is_empty() {
                    data.insert(header.clone(), text);
                }
            }

            let mut raw_notes = Vec::new();
            if let Some(next) = body.get(idx + 1) {
                let next_cells = row_cells(*next);
                if let Some(note_cell) = next_cells
                    .iter()
                    .find(|c| c.value().name() == "td" && c.value().attr("colspan").is_some())
                {
                    raw_notes.push(text_outside_lists(*note_cell));
                    raw_notes.extend(note_cell.select(&LI).map(element_text));
                }
            }

            drafts.push(DraftMove {
                name,
                input,
                image,
                rows: vec![data],
                notes: self.classifier.classify(raw_notes),
                ..Default::default()
            });
        }
        drafts
    }

    /// Page title with the configured prefix removed.
    pub fn page_title(&self, doc: &Html) -> Option<String> {
        let raw = doc
            .select(&FIRST_HEADING)
            .next()
            .map(element_text)
            .filter(|t| !t.is_empty())
            .or_else(|| {
                let title = doc.select(&TITLE).next().map(element_text)?;
                title.split(" - ").next().map(|t| t.trim().to_string())
            })?;
        let name = raw
            .strip_prefix(&self.settings.title_prefix)
            .unwrap_or(&raw)
            .trim()
            .to_string();
        (!name.is_empty()).then_some(name)
    }

    /// The character select icon, identified by its alt text or file name.
    pub fn character_icon(&self, doc: &Html) -> Option<String> {
        let marker = &self.settings.icon_alt_marker;
        if marker.is_empty() {
            return None;
        }
        doc.select(&IMG)
            .find(|img| {
                let el = img.value();
                el.attr("alt").is_some_and(|alt| alt.contains(marker.as_str()))
                    || el.attr("src").is_some_and(|src| src.contains(marker.as_str()))
            })
            .and_then(|img| img.value().attr("src"))
            .map(|src| self.absolute_url(src))
    }
}
