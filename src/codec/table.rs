//! Generic table reading: header row, data rows keyed by header, and note rows.
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};

use crate::model::Row;

pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector parses")
}

static TABLE: Lazy<Selector> = Lazy::new(|| selector("table"));
static ROWS: Lazy<Selector> = Lazy::new(|| selector("tr"));

/// The contents of one table. `rows` preserves document order and may contain empty rows when a
/// row had cells but no text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
    pub notes: Vec<String>,
}

impl ExtractedTable {
    /// Rows with at least one non-empty cell.
    pub fn data_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows
            .iter()
            .filter(|row| row.values().any(|v| !v.is_empty()))
    }

    pub fn is_empty(&self) -> bool {
        self.data_rows().next().is_none() && self.notes.is_empty()
    }
}

/// Collapse every whitespace run to one space and trim.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized text content of an element. Line breaks count as whitespace.
pub fn element_text(el: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in el.descendants() {
        match node.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(e) if e.name() == "br" => out.push(' '),
            _ => {}
        }
    }
    normalize_text(&out)
}

pub(crate) fn colspan(cell: ElementRef<'_>) -> usize {
    cell.value()
        .attr("colspan")
        .and_then(|span| span.trim().parse().ok())
        .unwrap_or(1)
}

pub(crate) fn nearest_table(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "table")
}

/// Rows that belong to `table` itself and not to a table nested inside one of its cells.
pub(crate) fn own_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    table
        .select(&ROWS)
        .filter(|row| nearest_table(*row).map(|t| t.id()) == Some(table.id()))
        .collect()
}

pub(crate) fn row_cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|c| matches!(c.value().name(), "th" | "td"))
        .collect()
}

/// Read a table. The first row gives the headers. A row whose only cell, or any cell, spans at
/// least `note_colspan` columns is a note row. Cells past the header row's width are keyed
/// `col{index}`.
pub fn extract_table(table: ElementRef<'_>, note_colspan: usize) -> ExtractedTable {
    let mut extracted = ExtractedTable::default();
    for (idx, row) in own_rows(table).into_iter().enumerate() {
        let cells = row_cells(row);
        if idx == 0 {
            extracted.headers = cells.into_iter().map(element_text).collect();
            continue;
        }
        if cells.is_empty() {
            continue;
        }
        let is_note = cells.len() == 1 || cells.iter().any(|c| colspan(*c) >= note_colspan);
        if is_note {
            let text = element_text(row);
            if !text.is_empty() {
                extracted.notes.push(text);
            }
            continue;
        }
        let mut data = Row::new();
        for (cell_idx, cell) in cells.into_iter().enumerate() {
            let key = extracted
                .headers
                .get(cell_idx)
                .filter(|h| !h.is_empty())
                .cloned()
                .unwrap_or_else(|| format!("col{cell_idx}"));
            data.insert(key, element_text(cell));
        }
        extracted.rows.push(data);
    }
    extracted
}

/// Read the first table found in an HTML fragment; no table reads as empty.
pub fn extract_table_html(html: &str, note_colspan: usize) -> ExtractedTable {
    let fragment = Html::parse_fragment(html);
    fragment
        .select(&TABLE)
        .next()
        .map(|table| extract_table(table, note_colspan))
        .unwrap_or_default()
}
