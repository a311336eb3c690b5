use std::{fmt, io, path::StripPrefixError};

use regex::Error as RegexError;
use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum MovedexError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Corpus load error: {0}")]
    CorpusLoad(String),
    #[error("Duplicate character '{0}': the first loaded record is kept")]
    DuplicateCharacter(String),
    #[error(
        "Incomplete extraction for '{character}': serialized record is {bytes} bytes, minimum is {minimum}"
    )]
    IncompleteExtraction {
        character: String,
        bytes: usize,
        minimum: usize,
    },
    #[error("Invalid navigation token: {0}")]
    InvalidToken(String),
    #[error("File System error: {0}")]
    Io(String),
    #[error("Markup error: {0}")]
    Markup(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
    #[error("Page source error: {0}")]
    Source(String),
}

impl MovedexError {
    /// Soft failures are reported and skipped by batch jobs; everything else aborts the item.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            MovedexError::IncompleteExtraction { .. } | MovedexError::DuplicateCharacter(_)
        )
    }
}

impl From<StripPrefixError> for MovedexError {
    fn from(src: StripPrefixError) -> MovedexError {
        MovedexError::NotFound(format!("Strip prefix failed for path. Error: {src}"))
    }
}

impl From<toml::de::Error> for MovedexError {
    fn from(src: toml::de::Error) -> MovedexError {
        MovedexError::Config(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for MovedexError {
    fn from(src: toml::ser::Error) -> MovedexError {
        MovedexError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<JsonError> for MovedexError {
    fn from(src: JsonError) -> MovedexError {
        MovedexError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<io::Error> for MovedexError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => MovedexError::NotFound(format!("{x}")),
            _ => MovedexError::Io(format!("IOError: {}: {x}", x.kind())),
        }
    }
}

impl From<walkdir::Error> for MovedexError {
    fn from(x: walkdir::Error) -> Self {
        MovedexError::Io(format!("directory walk failed: {x}"))
    }
}

impl From<fmt::Error> for MovedexError {
    fn from(x: fmt::Error) -> Self {
        MovedexError::Serialization(format!("{x}"))
    }
}

impl From<RegexError> for MovedexError {
    fn from(x: RegexError) -> Self {
        MovedexError::Config(format!("Regex parse failed: {x}"))
    }
}

impl From<getrandom::Error> for MovedexError {
    fn from(x: getrandom::Error) -> Self {
        MovedexError::Io(format!("random source unavailable: {x}"))
    }
}
