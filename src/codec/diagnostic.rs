//! Diagnostic types for page extraction.
//!
//! Extraction never aborts on a single bad table. Problems that do not invalidate the whole page
//! are collected as [BuildDiagnostic]s and returned next to the built character.

/// Diagnostic information produced while building a character from page markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildDiagnostic {
    /// A table or row could not be read as move data and was skipped
    MalformedMarkup {
        /// What was being read (e.g. "move table", "follow-up row")
        element: String,
        /// Description of what went wrong
        reason: String,
    },

    /// More than one existing move could parent a follow-up by input prefix
    ///
    /// The chosen parent is the exact input match if any, else the longest input.
    AmbiguousAttachment {
        follow_up: String,
        chosen: String,
        candidates: Vec<String>,
    },

    /// A follow-up appeared with no move before it to attach to; it was kept as a top-level move
    OrphanFollowUp(String),

    /// A warning message about the page
    Warning(String),

    /// An informational message about the page
    Info(String),
}

impl BuildDiagnostic {
    pub fn malformed(element: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedMarkup {
            element: element.into(),
            reason: reason.into(),
        }
    }

    pub fn ambiguous(
        follow_up: impl Into<String>,
        chosen: impl Into<String>,
        candidates: Vec<String>,
    ) -> Self {
        Self::AmbiguousAttachment {
            follow_up: follow_up.into(),
            chosen: chosen.into(),
            candidates,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::Warning(message.into())
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::Info(message.into())
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedMarkup { .. })
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::AmbiguousAttachment { .. })
    }

    /// Get the follow-up name and chosen parent if this is an ambiguous attachment
    pub fn as_ambiguous(&self) -> Option<(&str, &str)> {
        match self {
            Self::AmbiguousAttachment {
                follow_up, chosen, ..
            } => Some((follow_up.as_str(), chosen.as_str())),
            _ => None,
        }
    }

    /// Warnings and worse; info is excluded.
    pub fn is_problem(&self) -> bool {
        !matches!(self, Self::Info(_))
    }
}

impl std::fmt::Display for BuildDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedMarkup { element, reason } => {
                write!(f, "Malformed {element}: {reason}")
            }
            Self::AmbiguousAttachment {
                follow_up,
                chosen,
                candidates,
            } => write!(
                f,
                "Ambiguous parent for follow-up {follow_up:?}: chose {chosen:?} out of {candidates:?}"
            ),
            Self::OrphanFollowUp(name) => {
                write!(f, "Follow-up {name:?} has no preceding move; kept top-level")
            }
            Self::Warning(msg) => write!(f, "Warning: {msg}"),
            Self::Info(msg) => write!(f, "Info: {msg}"),
        }
    }
}
