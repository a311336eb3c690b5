/// [crate::navkey] holds [NavToken], the self-contained state carried by every navigation
/// control, and [navigate], which follows one against a loaded [Corpus].
///
/// A token reads `{action}:{character}:{move list}:{move ref}:{version}`. [NavToken::encode]
/// appends `:{millis}:{random}` so that otherwise identical controls get distinct identifiers;
/// decoding ignores everything after the fifth field. `%`, `:` and `#` inside names are
/// percent-escaped.
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
    time::{SystemTime, UNIX_EPOCH},
};

use crate::{
    corpus::Corpus,
    error::MovedexError,
    model::Character,
    query::{MoveMatch, Resolver, Selection},
};

const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const SUFFIX_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavAction {
    /// Show the same move in another move list.
    MoveList,
    Version,
    FollowUp,
    Parent,
    /// Cycle the overview to the next move list.
    SwapMoveList,
}

impl NavAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            NavAction::MoveList => "character",
            NavAction::Version => "version",
            NavAction::FollowUp => "followup",
            NavAction::Parent => "parent",
            NavAction::SwapMoveList => "swap_movelist",
        }
    }
}

impl FromStr for NavAction {
    type Err = MovedexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "character" => Ok(NavAction::MoveList),
            "version" => Ok(NavAction::Version),
            "followup" => Ok(NavAction::FollowUp),
            "parent" => Ok(NavAction::Parent),
            "swap_movelist" => Ok(NavAction::SwapMoveList),
            other => Err(MovedexError::InvalidToken(format!(
                "unknown navigation action '{other}'"
            ))),
        }
    }
}

impl Display for NavAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn escape(raw: &str) -> String {
    raw.replace('%', "%25")
        .replace(':', "%3A")
        .replace('#', "%23")
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let code = rest.get(pos + 1..pos + 3);
        let decoded = match code {
            Some("25") => Some('%'),
            Some(c) if c.eq_ignore_ascii_case("3A") => Some(':'),
            Some("23") => Some('#'),
            _ => None,
        };
        match decoded {
            Some(ch) => {
                out.push(ch);
                rest = &rest[pos + 3..];
            }
            None => {
                out.push('%');
                rest = &rest[pos + 1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// A move list given by position or by name. Tokens written by this crate always use the
/// position; names are accepted when decoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveListRef {
    Index(usize),
    Name(String),
}

impl Default for MoveListRef {
    fn default() -> Self {
        MoveListRef::Index(0)
    }
}

impl MoveListRef {
    pub fn parse(raw: &str) -> MoveListRef {
        match raw.trim().parse::<usize>() {
            Ok(idx) => MoveListRef::Index(idx),
            Err(_) => MoveListRef::Name(unescape(raw)),
        }
    }

    /// Position of the referenced list within `character`, if it exists.
    pub fn position(&self, character: &Character) -> Option<usize> {
        match self {
            MoveListRef::Index(idx) => (*idx < character.movelists.len()).then_some(*idx),
            MoveListRef::Name(name) => character
                .movelists
                .iter()
                .position(|l| l.name.eq_ignore_ascii_case(name.trim())),
        }
    }
}

impl Display for MoveListRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MoveListRef::Index(idx) => write!(f, "{idx}"),
            MoveListRef::Name(name) => write!(f, "{}", escape(name)),
        }
    }
}

/// A top-level move (by name, or by input for reserved-prefix moves) plus the follow-up index
/// chain below it. Written as `key#0#1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveRef {
    pub key: String,
    pub follow_ups: Vec<usize>,
}

impl MoveRef {
    pub fn new<S: Into<String>>(key: S) -> MoveRef {
        MoveRef {
            key: key.into(),
            follow_ups: Vec::new(),
        }
    }

    pub fn of(resolver: &Resolver, matched: &MoveMatch<'_>) -> MoveRef {
        let root = matched.root;
        let key = match (&root.input, resolver.is_reserved(root)) {
            (Some(input), true) => input.clone(),
            _ => root.name.clone(),
        };
        MoveRef {
            key,
            follow_ups: matched.path.follow_ups.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.key.trim().is_empty()
    }
}

impl Display for MoveRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", escape(&self.key))?;
        for idx in &self.follow_ups {
            write!(f, "#{idx}")?;
        }
        Ok(())
    }
}

impl FromStr for MoveRef {
    type Err = MovedexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('#');
        let key = unescape(parts.next().unwrap_or_default());
        let follow_ups = parts
            .map(|p| {
                p.trim().parse::<usize>().map_err(|_| {
                    MovedexError::InvalidToken(format!("bad follow-up index '{p}' in '{s}'"))
                })
            })
            .collect::<Result<Vec<usize>, MovedexError>>()?;
        Ok(MoveRef { key, follow_ups })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NavToken {
    pub action: NavAction,
    pub character: String,
    pub move_list: MoveListRef,
    pub target: MoveRef,
    pub version: usize,
}

impl NavToken {
    /// The canonical form plus a `:{millis}:{random}` uniqueness suffix.
    pub fn encode(&self) -> Result<String, MovedexError> {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let mut bytes = [0u8; SUFFIX_LEN];
        getrandom::getrandom(&mut bytes)?;
        let random: String = bytes
            .iter()
            .map(|b| SUFFIX_ALPHABET[*b as usize % SUFFIX_ALPHABET.len()] as char)
            .collect();
        Ok(format!("{self}:{millis}:{random}"))
    }
}

impl Display for NavToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}:{}",
            self.action,
            escape(&self.character),
            self.move_list,
            self.target,
            self.version
        )
    }
}

impl FromStr for NavToken {
    type Err = MovedexError;

    /// Missing move and version fields default to empty and 0; an unparseable version is 0.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() < 3 {
            return Err(MovedexError::InvalidToken(format!(
                "expected at least action, character and move list in '{s}'"
            )));
        }
        let character = unescape(parts[1]);
        if character.trim().is_empty() {
            return Err(MovedexError::InvalidToken(format!("no character in '{s}'")));
        }
        Ok(NavToken {
            action: parts[0].parse()?,
            character,
            move_list: MoveListRef::parse(parts[2]),
            target: match parts.get(3) {
                Some(raw) => raw.parse()?,
                None => MoveRef::default(),
            },
            version: parts
                .get(4)
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or_default(),
        })
    }
}

/// Where following a token leads.
#[derive(Debug, Clone)]
pub enum NavOutcome<'a> {
    Move {
        character: &'a Character,
        selection: Selection<'a>,
    },
    MoveList {
        character: &'a Character,
        move_list: usize,
    },
}

impl<'a> NavOutcome<'a> {
    pub fn character(&self) -> &'a Character {
        match self {
            NavOutcome::Move { character, .. } | NavOutcome::MoveList { character, .. } => {
                character
            }
        }
    }
}

/// Re-resolve a token from scratch against `corpus`. Every failure is
/// [NotFound](MovedexError::NotFound).
pub fn navigate<'a>(
    corpus: &'a Corpus,
    resolver: &Resolver,
    token: &NavToken,
) -> Result<NavOutcome<'a>, MovedexError> {
    let character = corpus
        .get(&token.character)
        .ok_or_else(|| MovedexError::NotFound(format!("character '{}'", token.character)))?;
    let list_id = token.move_list.position(character);

    if token.action == NavAction::SwapMoveList {
        let count = character.movelists.len();
        if count == 0 {
            return Err(MovedexError::NotFound(format!(
                "{} has no move lists",
                character.name
            )));
        }
        return Ok(NavOutcome::MoveList {
            character,
            move_list: (list_id.unwrap_or_default() + 1) % count,
        });
    }

    if token.target.is_empty() {
        return Err(MovedexError::NotFound(format!(
            "{} token names no move",
            token.action
        )));
    }
    let matches = resolver.resolve(character, &token.target.key).into_matches();
    let in_list = |m: &&MoveMatch<'_>| Some(m.move_list_id()) == list_id;
    let root = matches
        .iter()
        .filter(|m| !m.is_follow_up())
        .find(in_list)
        .or_else(|| matches.iter().find(in_list))
        .or_else(|| matches.iter().find(|m| !m.is_follow_up()))
        .or_else(|| matches.first())
        .ok_or_else(|| {
            MovedexError::NotFound(format!(
                "move '{}' of {}",
                token.target.key, character.name
            ))
        })?;
    let mut matched = root.descend(&token.target.follow_ups).ok_or_else(|| {
        MovedexError::NotFound(format!("follow-up {} of {}", token.target, character.name))
    })?;

    let version = match token.action {
        NavAction::Version => token.version,
        NavAction::Parent => {
            matched = matched.parent().ok_or_else(|| {
                MovedexError::NotFound(format!("parent of {}", matched.mv.name))
            })?;
            0
        }
        _ => 0,
    };
    tracing::debug!("{} -> {} ({})", token, matched.mv.name, matched.move_list.name);
    Ok(NavOutcome::Move {
        character,
        selection: Selection {
            matched,
            version,
            alternatives: matches,
        },
    })
}
