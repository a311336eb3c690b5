//! Batch extraction: discover character pages, build each one, persist the records that pass the
//! size check.
use std::{
    collections::BTreeSet,
    fs::{create_dir_all, remove_file, write},
    future::Future,
    path::{Path, PathBuf},
    time::Duration,
};
use walkdir::WalkDir;

use crate::{
    codec::{builder::GraphBuilder, diagnostic::BuildDiagnostic, index::discover_characters},
    config::{get_content, ExtractSettings},
    error::MovedexError,
};

pub const INDEX_PAGE: &str = "index.html";

/// Where page markup comes from. Network fetching lives outside this crate; implementors only
/// need to hand back HTML.
pub trait PageSource: Sync {
    fn index_page(&self) -> impl Future<Output = Result<String, MovedexError>> + Send;

    fn character_page(&self, slug: &str)
        -> impl Future<Output = Result<String, MovedexError>> + Send;
}

/// Pages saved to a directory: `index.html` plus one `<slug>.html` per character.
#[derive(Debug, Clone)]
pub struct DirPageSource {
    root: PathBuf,
}

impl DirPageSource {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        DirPageSource { root: root.into() }
    }

    pub fn page_path(&self, slug: &str) -> PathBuf {
        self.root.join(format!("{}.html", slug.replace('/', "_")))
    }
}

impl PageSource for DirPageSource {
    fn index_page(&self) -> impl Future<Output = Result<String, MovedexError>> + Send {
        let path = self.root.join(INDEX_PAGE);
        async move { get_content(path) }
    }

    fn character_page(
        &self,
        slug: &str,
    ) -> impl Future<Output = Result<String, MovedexError>> + Send {
        let path = self.page_path(slug);
        async move { get_content(path) }
    }
}

/// `Mio Kouzuki` -> `Mio_Kouzuki.json`
pub fn record_file_name(character: &str) -> String {
    format!("{}.json", character.split_whitespace().collect::<Vec<_>>().join("_"))
}

/// Delete `.json` records in `dir` (not recursive) smaller than `min_bytes`.
pub fn cleanup_small_files<P: AsRef<Path>>(
    dir: P,
    min_bytes: usize,
) -> Result<Vec<PathBuf>, MovedexError> {
    let mut removed = Vec::new();
    if !dir.as_ref().exists() {
        return Ok(removed);
    }
    for entry in WalkDir::new(dir.as_ref()).min_depth(1).max_depth(1) {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }
        let size = entry.metadata()?.len();
        if size < min_bytes as u64 {
            tracing::info!("Removing undersized record {:?} ({size} bytes)", path);
            remove_file(path)?;
            removed.push(path.to_path_buf());
        }
    }
    Ok(removed)
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub saved: Vec<PathBuf>,
    /// Pages that built but were below the size threshold.
    pub incomplete: Vec<(String, MovedexError)>,
    pub failed: Vec<(String, MovedexError)>,
    /// Pages whose character was already saved earlier in the same run; not written.
    pub duplicates: Vec<(String, MovedexError)>,
    /// Undersized records deleted before and after the run.
    pub removed: Vec<PathBuf>,
    pub diagnostics: Vec<(String, BuildDiagnostic)>,
}

impl BatchSummary {
    pub fn attempted(&self) -> usize {
        self.saved.len() + self.incomplete.len() + self.failed.len() + self.duplicates.len()
    }
}

pub struct ExtractionJob<'s, S: PageSource> {
    source: S,
    settings: &'s ExtractSettings,
    output: PathBuf,
}

impl<'s, S: PageSource> ExtractionJob<'s, S> {
    pub fn new<P: Into<PathBuf>>(source: S, settings: &'s ExtractSettings, output: P) -> Self {
        ExtractionJob {
            source,
            settings,
            output: output.into(),
        }
    }

    pub async fn run(&self) -> Result<BatchSummary, MovedexError> {
        let mut summary = BatchSummary::default();
        create_dir_all(&self.output)?;
        summary.removed = cleanup_small_files(&self.output, self.settings.min_record_bytes)?;

        let index = self.source.index_page().await?;
        let slugs = discover_characters(&index, self.settings);
        if slugs.is_empty() {
            tracing::warn!("No characters found on the index page");
            return Ok(summary);
        }
        tracing::info!("Found {} characters to extract", slugs.len());

        let builder = GraphBuilder::new(self.settings)?;
        let delay = Duration::from_millis(self.settings.request_delay_ms);
        let mut written = BTreeSet::new();
        for (idx, slug) in slugs.iter().enumerate() {
            if idx > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let outcome = self
                .extract_one(&builder, slug, &mut written, &mut summary.diagnostics)
                .await;
            match outcome {
                Ok(path) => summary.saved.push(path),
                Err(err @ MovedexError::DuplicateCharacter(_)) => {
                    tracing::warn!("{slug}: {err}");
                    summary.duplicates.push((slug.clone(), err));
                }
                Err(err) if err.is_soft() => {
                    tracing::warn!("{slug}: {err}");
                    summary.incomplete.push((slug.clone(), err));
                }
                Err(err) => {
                    tracing::error!("{slug}: {err}");
                    summary.failed.push((slug.clone(), err));
                }
            }
        }

        summary
            .removed
            .extend(cleanup_small_files(&self.output, self.settings.min_record_bytes)?);
        tracing::info!(
            "Extraction complete: {} saved, {} incomplete, {} failed, {} duplicates",
            summary.saved.len(),
            summary.incomplete.len(),
            summary.failed.len(),
            summary.duplicates.len()
        );
        Ok(summary)
    }

    /// Fetch, build and persist one character page. `written` holds the lower-cased names saved
    /// so far; a page for one of them is rejected with `DuplicateCharacter` and not written.
    pub async fn extract_one(
        &self,
        builder: &GraphBuilder<'_>,
        slug: &str,
        written: &mut BTreeSet<String>,
        diagnostics: &mut Vec<(String, BuildDiagnostic)>,
    ) -> Result<PathBuf, MovedexError> {
        let html = self.source.character_page(slug).await?;
        let build = builder.build(&html, slug)?;
        for diag in build.diagnostics {
            if diag.is_problem() {
                tracing::warn!("{slug}: {diag}");
            } else {
                tracing::debug!("{slug}: {diag}");
            }
            diagnostics.push((slug.to_string(), diag));
        }
        if !written.insert(build.character.name.to_lowercase()) {
            return Err(MovedexError::DuplicateCharacter(build.character.name));
        }
        let path = self.output.join(record_file_name(&build.character.name));
        write(&path, build.serialized)?;
        tracing::info!("Saved {} to {:?}", build.character.name, path);
        Ok(path)
    }
}
