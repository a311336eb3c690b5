//! # movedex-core
//!
//! Move-data normalization and lookup for 2D fighting games.
//!
//! ## Overview
//!
//! movedex-core turns character pages of a fighting-game wiki into one canonical record per
//! character, and answers "what does move X of character Y do?" against a corpus of such
//! records. Source pages are irregular: moves live in nested tables, variants hide in extra rows
//! or `A:`-prefixed notes, and follow-ups are only recognizable from document position and input
//! notation. Corpora accumulated over time come in three record shapes.
//!
//! ### Key Features
//!
//! - **Tolerant extraction**: Malformed markup is skipped with a diagnostic, never a failed page
//! - **Follow-up chains**: Follow-ups are linked by marker glyph, header table, heading or input prefix
//! - **Variant derivation**: Version rows, version-scoped notes and bundled inputs become variants
//! - **Tiered resolution**: Exact input, data-driven aliases, exact name, then substring
//! - **Stateless navigation**: Every control carries a token that re-resolves its move from scratch
//!
//! ## Architecture
//!
//! - **[`model`]**: The canonical `Character` / `MoveList` / `Move` / `Variant` record
//! - **[`codec`]**: Page extraction (`GraphBuilder`, `ChainLinker`, `ExtractionJob`)
//! - **[`record`]**: Readers for the current and legacy persisted record shapes
//! - **[`corpus`]**: The loaded character set and its process-wide snapshot
//! - **[`query`]**: Move resolution (`Resolver`, `MoveQuery`)
//! - **[`special`]**: Per-character record corrections
//! - **[`navkey`]**: Navigation tokens and `navigate`
//! - **[`view`]**: Display values, controls and autocomplete
//! - **[`config`]**: TOML settings and the bundled rule tables
//!
//! ## Quick Start
//!
//! ```rust
//! use movedex_core::{
//!     config::Settings,
//!     corpus::Corpus,
//!     model::{Character, Move, MoveList},
//!     query::Resolver,
//!     view::MoveView,
//! };
//!
//! let mut fireball = Move::new("Fireball");
//! fireball.input = Some("236A".to_string());
//! let corpus: Corpus = vec![Character::new("Akane", vec![MoveList::new("Moves", vec![fireball])])]
//!     .into_iter()
//!     .collect();
//!
//! let resolver = Resolver::new(&Settings::default());
//! let akane = corpus.get("akane").unwrap();
//! let selection = resolver.select_str(akane, "236a").unwrap();
//! let view = MoveView::new(akane, &selection.matched, selection.version);
//! assert_eq!(view.title, "Akane - Fireball");
//! ```

pub mod codec;
pub mod config;
pub mod corpus;
pub mod error;
pub mod model;
pub mod navkey;
pub mod query;
pub mod record;
pub mod special;
#[cfg(test)]
mod tests;
pub mod view;

pub use error::*;
