//! The loaded set of characters and the process-wide snapshot of it.
//!
//! A [Corpus] is built once from record directories and never mutated afterwards. The global
//! snapshot is an `Arc` behind a lock: [snapshot] hands out the current `Arc`, [install] swaps in
//! a whole new corpus. A reader holding an old snapshot keeps seeing the old corpus in full.
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};
use walkdir::WalkDir;

use crate::{
    config::{get_content, Settings},
    error::MovedexError,
    model::Character,
    record::RecordReader,
    special::SpecialCases,
};

static CORPUS: Lazy<RwLock<Arc<Corpus>>> = Lazy::new(|| RwLock::new(Arc::new(Corpus::default())));

/// The current corpus. Empty until something is installed.
pub fn snapshot() -> Arc<Corpus> {
    CORPUS.read().clone()
}

/// Replace the global corpus, returning the previous one.
pub fn install(corpus: Corpus) -> Arc<Corpus> {
    let next = Arc::new(corpus);
    std::mem::replace(&mut *CORPUS.write(), next)
}

/// Load `dirs` and install the result. Returns the number of characters now loaded.
pub fn reload<P: AsRef<Path>>(dirs: &[P], settings: &Settings) -> Result<usize, MovedexError> {
    let corpus = Corpus::load(dirs, settings)?;
    let count = corpus.len();
    install(corpus);
    tracing::info!("Corpus reloaded: {count} characters");
    Ok(count)
}

/// `Mio_Kouzuki.json` -> `Mio Kouzuki`
fn name_from_file(path: &Path) -> Option<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().replace('_', " "))
}

/// Characters keyed by lower-cased name.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    characters: BTreeMap<String, Character>,
    /// Files skipped because they did not parse.
    rejected: Vec<(PathBuf, MovedexError)>,
}

impl Corpus {
    /// Add a character unless one with the same name is already present.
    pub fn insert(&mut self, character: Character) -> Result<(), MovedexError> {
        let key = character.key();
        if self.characters.contains_key(&key) {
            return Err(MovedexError::DuplicateCharacter(character.name));
        }
        self.characters.insert(key, character);
        Ok(())
    }

    /// Read every `*.json` record in `dirs`, in directory order then file-name order. An
    /// unreadable directory or record is logged and skipped.
    pub fn load<P: AsRef<Path>>(dirs: &[P], settings: &Settings) -> Result<Corpus, MovedexError> {
        let reader = RecordReader::new(&settings.extract)?;
        let special = SpecialCases::new(&settings.special_cases);
        let mut corpus = Corpus::default();
        for dir in dirs {
            let dir = dir.as_ref();
            if !dir.is_dir() {
                tracing::warn!("Record directory {:?} is not readable, skipping", dir);
                continue;
            }
            let walker = WalkDir::new(dir)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name();
            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        tracing::warn!("Failed to list {:?}: {err}", dir);
                        continue;
                    }
                };
                let path = entry.path();
                if !entry.file_type().is_file() || path.extension().is_none_or(|e| e != "json") {
                    continue;
                }
                match Corpus::read_record(&reader, path) {
                    Ok(mut character) => {
                        special.apply_to_character(&mut character);
                        character.link_parents();
                        if let Err(err) = corpus.insert(character) {
                            tracing::debug!("{:?}: {err}", path);
                        }
                    }
                    Err(err) => {
                        tracing::warn!("Skipping record {:?}: {err}", path);
                        corpus.rejected.push((path.to_path_buf(), err));
                    }
                }
            }
        }
        tracing::info!("Loaded {} characters", corpus.len());
        Ok(corpus)
    }

    fn read_record(reader: &RecordReader, path: &Path) -> Result<Character, MovedexError> {
        let text = get_content(path)?;
        let fallback = name_from_file(path);
        reader.read_str(&text, fallback.as_deref())
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&Character> {
        self.characters.get(&name.trim().to_lowercase())
    }

    /// Characters in name order.
    pub fn characters(&self) -> impl Iterator<Item = &Character> {
        self.characters.values()
    }

    pub fn rejected(&self) -> &[(PathBuf, MovedexError)] {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}

impl FromIterator<Character> for Corpus {
    fn from_iter<I: IntoIterator<Item = Character>>(iter: I) -> Self {
        let mut corpus = Corpus::default();
        for mut character in iter {
            character.link_parents();
            corpus.insert(character).ok();
        }
        corpus
    }
}
