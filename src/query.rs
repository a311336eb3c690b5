//! Free-text move lookup against one character.
//!
//! Resolution is tiered; the first tier with any hit wins and its hits are returned in
//! move-list order (top-level move, then its follow-ups depth first):
//!
//! 1. **Exact input**: the query equals a move's input, case-insensitively.
//! 2. **Alias**: a per-character alias rule redirects the query to a configured move.
//! 3. **Exact name**: the query equals a move's name. Moves whose name starts with the reserved
//!    prefix (costume moves share one name) also match by their full input or the input before
//!    the first `*` or `~`.
//! 4. **Partial**: the query is contained in a move's name or input.
//!
//! A full input always resolves to its own move, even when an alias rule would also fire.
use serde::{Deserialize, Serialize};
use std::{fmt, ptr};

use crate::{
    config::{AliasPolicy, MoveSelector, Settings},
    model::{Character, Move, MoveList},
};

/// Redirects matching queries for one character to one move.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AliasRule {
    pub character: String,
    /// Fires when the lower-cased query contains any of these.
    pub contains: Vec<String>,
    /// Fires when the lower-cased query equals any of these.
    pub exact: Vec<String>,
    /// Only look in this move list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_list: Option<usize>,
    pub target: MoveSelector,
}

impl AliasRule {
    pub fn applies_to(&self, character: &str) -> bool {
        self.character.to_lowercase() == character.to_lowercase()
    }

    /// `query` must already be lower-cased.
    pub fn triggers(&self, query: &str) -> bool {
        self.exact.iter().any(|e| e.to_lowercase() == query)
            || self
                .contains
                .iter()
                .any(|c| !c.is_empty() && query.contains(&c.to_lowercase()))
    }
}

/// Location of a move: move list, top-level index, then follow-up indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MovePath {
    pub move_list: usize,
    pub index: usize,
    pub follow_ups: Vec<usize>,
}

impl MovePath {
    pub fn parent(&self) -> Option<MovePath> {
        let (_, rest) = self.follow_ups.split_last()?;
        Some(MovePath {
            move_list: self.move_list,
            index: self.index,
            follow_ups: rest.to_vec(),
        })
    }

    pub fn child(&self, idx: usize) -> MovePath {
        let mut follow_ups = self.follow_ups.clone();
        follow_ups.push(idx);
        MovePath {
            move_list: self.move_list,
            index: self.index,
            follow_ups,
        }
    }
}

/// A resolved move with everything needed to render it or navigate from it.
#[derive(Debug, Clone)]
pub struct MoveMatch<'a> {
    pub mv: &'a Move,
    /// The top-level move this one hangs off (itself when top-level).
    pub root: &'a Move,
    pub move_list: &'a MoveList,
    pub path: MovePath,
}

impl<'a> MoveMatch<'a> {
    pub fn move_list_id(&self) -> usize {
        self.path.move_list
    }

    pub fn is_follow_up(&self) -> bool {
        !self.path.follow_ups.is_empty()
    }

    pub fn is_same(&self, other: &MoveMatch<'_>) -> bool {
        ptr::eq(self.mv, other.mv)
    }

    /// The match for this move's direct parent, if it is a follow-up.
    pub fn parent(&self) -> Option<MoveMatch<'a>> {
        let path = self.path.parent()?;
        let mv = self.root.follow_up_at(&path.follow_ups)?;
        Some(MoveMatch {
            mv,
            root: self.root,
            move_list: self.move_list,
            path,
        })
    }

    pub fn follow_up(&self, idx: usize) -> Option<MoveMatch<'a>> {
        let mv = self.mv.follow_ups.get(idx)?;
        Some(MoveMatch {
            mv,
            root: self.root,
            move_list: self.move_list,
            path: self.path.child(idx),
        })
    }

    /// Walk `follow_ups` down from this match.
    pub fn descend(&self, follow_ups: &[usize]) -> Option<MoveMatch<'a>> {
        follow_ups
            .iter()
            .try_fold(self.clone(), |current, idx| current.follow_up(*idx))
    }
}

/// Every move of a character, follow-ups included, in resolution order.
pub fn all_moves(character: &Character) -> Vec<MoveMatch<'_>> {
    let mut out = Vec::new();
    for (list_id, list) in character.movelists.iter().enumerate() {
        for (index, root) in list.moves.iter().enumerate() {
            for (follow_ups, mv) in root.tree() {
                out.push(MoveMatch {
                    mv,
                    root,
                    move_list: list,
                    path: MovePath {
                        move_list: list_id,
                        index,
                        follow_ups,
                    },
                });
            }
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    ExactInput,
    Alias,
    ExactName,
    Partial,
}

#[derive(Debug, Clone, Default)]
pub struct Resolution<'a> {
    pub tier: Option<MatchTier>,
    pub matches: Vec<MoveMatch<'a>>,
}

impl<'a> Resolution<'a> {
    fn from_tier(tier: MatchTier, matches: Vec<MoveMatch<'a>>) -> Option<Resolution<'a>> {
        (!matches.is_empty()).then_some(Resolution {
            tier: Some(tier),
            matches,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn first(&self) -> Option<&MoveMatch<'a>> {
        self.matches.first()
    }

    pub fn into_matches(self) -> Vec<MoveMatch<'a>> {
        self.matches
    }
}

fn push_unique<'a>(out: &mut Vec<MoveMatch<'a>>, candidate: &MoveMatch<'a>) {
    if !out.iter().any(|m| m.is_same(candidate)) {
        out.push(candidate.clone());
    }
}

/// `name`, `name-<move list>` or `name-<move list>-<version>`: the shape of autocomplete values
/// and of typed queries that pin a move list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveQuery {
    pub text: String,
    pub move_list: Option<usize>,
    pub version: Option<usize>,
}

impl MoveQuery {
    pub fn plain<S: Into<String>>(text: S) -> MoveQuery {
        MoveQuery {
            text: text.into(),
            move_list: None,
            version: None,
        }
    }

    pub fn parse(raw: &str) -> MoveQuery {
        let raw = raw.trim();
        let numeric_tail = |s: &str| -> Option<(String, usize)> {
            let (head, tail) = s.rsplit_once('-')?;
            let value = tail.trim().parse::<usize>().ok()?;
            (!head.trim().is_empty()).then(|| (head.to_string(), value))
        };
        match numeric_tail(raw) {
            None => MoveQuery::plain(raw),
            Some((head, last)) => match numeric_tail(&head) {
                Some((text, move_list)) => MoveQuery {
                    text: text.trim().to_string(),
                    move_list: Some(move_list),
                    version: Some(last),
                },
                None => MoveQuery {
                    text: head.trim().to_string(),
                    move_list: Some(last),
                    version: None,
                },
            },
        }
    }

    pub fn is_structured(&self) -> bool {
        self.move_list.is_some()
    }
}

impl fmt::Display for MoveQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)?;
        if let Some(list) = self.move_list {
            write!(f, "-{list}")?;
            if let Some(version) = self.version {
                write!(f, "-{version}")?;
            }
        }
        Ok(())
    }
}

/// One move picked out of a resolution, plus the version to show and the other candidates (used
/// for move-list switch controls).
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    pub matched: MoveMatch<'a>,
    pub version: usize,
    pub alternatives: Vec<MoveMatch<'a>>,
}

#[derive(Debug, Clone)]
pub struct Resolver {
    reserved_prefix: String,
    policy: AliasPolicy,
    aliases: Vec<AliasRule>,
}

impl Resolver {
    pub fn new(settings: &Settings) -> Resolver {
        Resolver {
            reserved_prefix: settings.resolve.reserved_prefix.to_lowercase(),
            policy: settings.resolve.alias_policy,
            aliases: settings.aliases.clone(),
        }
    }

    pub fn is_reserved(&self, mv: &Move) -> bool {
        !self.reserved_prefix.is_empty() && mv.name.to_lowercase().starts_with(&self.reserved_prefix)
    }

    /// Resolve `raw` against every move of `character`, follow-ups included.
    ///
    /// Alias rules are consulted after the exact-input tier rather than ahead of every tier, so
    /// an alias can never shadow a move's own input.
    pub fn resolve<'a>(&self, character: &'a Character, raw: &str) -> Resolution<'a> {
        let query = raw.trim().to_lowercase();
        if query.is_empty() {
            return Resolution::default();
        }
        let candidates = all_moves(character);
        let lower_input = |m: &MoveMatch<'_>| m.mv.input.as_deref().map(str::to_lowercase);

        let exact_input: Vec<MoveMatch<'a>> = candidates
            .iter()
            .filter(|m| lower_input(m).is_some_and(|i| i == query))
            .cloned()
            .collect();
        if let Some(found) = Resolution::from_tier(MatchTier::ExactInput, exact_input) {
            return found;
        }

        let aliased = self.alias_matches(character, &query, &candidates);
        if let Some(found) = Resolution::from_tier(MatchTier::Alias, aliased) {
            tracing::debug!("alias rule redirected {raw:?} for {}", character.name);
            return found;
        }

        let mut exact_name = Vec::new();
        for m in candidates.iter() {
            let hit = m.mv.name.to_lowercase() == query
                || (self.is_reserved(m.mv)
                    && (lower_input(m).is_some_and(|i| i == query)
                        || m.mv.input_base().is_some_and(|b| b.to_lowercase() == query)));
            if hit {
                push_unique(&mut exact_name, m);
            }
        }
        if let Some(found) = Resolution::from_tier(MatchTier::ExactName, exact_name) {
            return found;
        }

        let mut partial = Vec::new();
        for m in candidates.iter() {
            let hit = m.mv.name.to_lowercase().contains(&query)
                || lower_input(m).is_some_and(|i| i.contains(&query));
            if hit {
                push_unique(&mut partial, m);
            }
        }
        Resolution::from_tier(MatchTier::Partial, partial).unwrap_or_default()
    }

    fn alias_matches<'a>(
        &self,
        character: &Character,
        query: &str,
        candidates: &[MoveMatch<'a>],
    ) -> Vec<MoveMatch<'a>> {
        let mut out = Vec::new();
        for rule in self
            .aliases
            .iter()
            .filter(|r| r.applies_to(&character.name) && r.triggers(query))
        {
            let in_scope = |m: &&MoveMatch<'a>| {
                rule.move_list.is_none_or(|id| id == m.move_list_id()) && rule.target.matches(m.mv)
            };
            let hit = candidates
                .iter()
                .filter(|m| !m.is_follow_up())
                .find(in_scope)
                .or_else(|| candidates.iter().find(in_scope));
            if let Some(hit) = hit {
                push_unique(&mut out, hit);
                if self.policy == AliasPolicy::FirstMatch {
                    break;
                }
            }
        }
        out
    }

    /// Resolve a possibly structured query to one move. The pinned move list is preferred; any
    /// other hit is used when no hit lives there. A structured query that resolves nothing is
    /// retried as plain text.
    pub fn select<'a>(&self, character: &'a Character, query: &MoveQuery) -> Option<Selection<'a>> {
        let mut matches = self.resolve(character, &query.text).into_matches();
        if matches.is_empty() && query.is_structured() {
            matches = self.resolve(character, &query.to_string()).into_matches();
        }
        let pick = query
            .move_list
            .and_then(|id| matches.iter().position(|m| m.move_list_id() == id))
            .unwrap_or(0);
        let matched = matches.get(pick)?.clone();
        Some(Selection {
            matched,
            version: query.version.unwrap_or(0),
            alternatives: matches,
        })
    }

    pub fn select_str<'a>(&self, character: &'a Character, raw: &str) -> Option<Selection<'a>> {
        self.select(character, &MoveQuery::parse(raw))
    }
}
