//! Page extraction: wiki markup in, canonical [`Character`](crate::model::Character) records out.
//!
//! ## Key Components
//!
//! - [`extract_table`](table::extract_table) - Reads one table into headers, keyed rows and note rows
//! - [`NoteClassifier`] - Splits notes into general notes and version-scoped notes (`A: ...`)
//! - [`MarkupReader`] - Classifies top-level tables and reads move tables and follow-up rows
//! - [`ChainLinker`] - Decides whether each parsed move is top-level or a follow-up, and of what
//! - [`GraphBuilder`] - Walks a whole character page and produces a [`CharacterBuild`]
//! - [`ExtractionJob`] - Runs the builder over every character found on the index page
//! - [`BuildDiagnostic`] - Non-fatal problems found while reading a page
//!
//! ## Page Walk
//!
//! A character page is processed in one pass over its section headings and top-level move
//! tables, in document order:
//!
//! 1. **Layout**: move lists come from toggle buttons, from two or more headings that contain a
//!    move-list keyword, or default to a single list named `Moves`.
//! 2. **Walk**: headings open sections, switch lists or announce follow-ups. Tables are
//!    classified as a move, a follow-ups header, a follow-up rows table, or something else.
//! 3. **Finalize**: drafts become canonical moves with derived variants; empty sections and
//!    lists are dropped.
//!
//! A record whose serialized size is below
//! [`min_record_bytes`](crate::config::ExtractSettings::min_record_bytes) is reported as
//! [`IncompleteExtraction`](crate::MovedexError::IncompleteExtraction) and never persisted.
//!
//! ```rust
//! use movedex_core::{codec::GraphBuilder, config::ExtractSettings};
//!
//! let settings = ExtractSettings { min_record_bytes: 0, ..Default::default() };
//! let builder = GraphBuilder::new(&settings).unwrap();
//! let html = r#"<h2>Specials</h2>
//! <table class="wikitable"><tr><th><big>Fireball</big><small>236A</small></th></tr></table>"#;
//! let (character, _diagnostics) = builder.build_unchecked(html, "Demo");
//! assert_eq!(character.movelists[0].moves[0].input.as_deref(), Some("236A"));
//! ```

pub mod batch;
pub mod builder;
pub mod diagnostic;
pub mod html;
pub mod index;
pub mod linker;
pub mod notes;
pub mod table;
pub mod variants;

pub use batch::{BatchSummary, DirPageSource, ExtractionJob, PageSource};
pub use builder::{CharacterBuild, GraphBuilder, MoveListLayout};
pub use diagnostic::BuildDiagnostic;
pub use html::{MarkupReader, TableShape};
pub use index::discover_characters;
pub use linker::ChainLinker;
pub use notes::{ClassifiedNotes, NoteClassifier};
pub use table::{extract_table, extract_table_html, ExtractedTable};
pub use variants::{finalize, DraftMove};
