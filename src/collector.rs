//! Document collection: license gate, enumeration, normalization, thresholds.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::{BuildConfig, SourceSpec};
use crate::constants::collector::SKIP_UNREADABLE_MSG;
use crate::data::CollectedRecord;
use crate::errors::CorpusError;
use crate::hash::{content_hash, record_id};
use crate::taxonomy::Classifier;
use crate::transport::fs::{GlobFilter, MarkdownWalk, join_logical};
use crate::utils::{
    char_count, first_heading, is_readme_like, normalize_document, token_set, word_count,
};

/// Why a scanned markdown file did not become a record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCounts {
    /// Below `min_words`.
    pub too_few_words: usize,
    /// Below `min_chars`.
    pub too_few_chars: usize,
    /// Not valid UTF-8 or otherwise unreadable.
    pub unreadable: usize,
    /// Rejected by the include/exclude globs.
    pub excluded: usize,
}

impl FilterCounts {
    /// Files filtered for any reason.
    pub fn total(&self) -> usize {
        self.too_few_words + self.too_few_chars + self.unreadable + self.excluded
    }
}

/// Aggregate counts produced by one collection pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollectStats {
    /// Sources in the configuration.
    pub sources_considered: usize,
    /// Sources that passed the license gate and were scanned.
    pub sources_included: usize,
    /// Sources skipped by the license allowlist.
    pub sources_skipped_license: usize,
    /// Markdown files found under included roots.
    pub files_scanned: usize,
    /// Files that became records.
    pub files_kept: usize,
    /// Per-reason filter counts.
    pub filtered: FilterCounts,
}

/// Notification sent after each source finishes (or is skipped).
#[derive(Clone, Debug)]
pub struct SourceProgress<'a> {
    /// Source name.
    pub source_id: &'a str,
    /// 1-based position in configuration order.
    pub position: usize,
    /// Number of configured sources.
    pub total_sources: usize,
    /// Files that became records.
    pub files_kept: usize,
    /// True when the license gate skipped the source.
    pub skipped_license: bool,
}

/// Callback receiving per-source progress; never affects control flow.
pub type ProgressFn<'a> = &'a mut dyn FnMut(&SourceProgress<'_>);

/// Turns resolved sources into [`CollectedRecord`]s.
pub struct Collector<'a> {
    config: &'a BuildConfig,
    classifier: Classifier,
}

impl<'a> Collector<'a> {
    /// Collector using `config` thresholds and `classifier` labels.
    pub fn new(config: &'a BuildConfig, classifier: Classifier) -> Self {
        Self { config, classifier }
    }

    /// Collect every allowed source in order.
    ///
    /// `resolve` maps a source to its local root and is only called for sources
    /// whose license passes the allowlist.
    pub fn collect<R>(
        &self,
        sources: &[SourceSpec],
        mut resolve: R,
        mut progress: Option<ProgressFn<'_>>,
    ) -> Result<(Vec<CollectedRecord>, CollectStats), CorpusError>
    where
        R: FnMut(&SourceSpec) -> Result<PathBuf, CorpusError>,
    {
        let mut records = Vec::new();
        let mut stats = CollectStats {
            sources_considered: sources.len(),
            ..CollectStats::default()
        };
        for (idx, source) in sources.iter().enumerate() {
            let allowed = self.config.license_allowed(&source.license);
            let before = records.len();
            if allowed {
                let root = resolve(source)?;
                self.collect_source(source, &root, &mut records, &mut stats)?;
                stats.sources_included += 1;
            } else {
                info!(
                    source_id = %source.name,
                    license = %source.license,
                    "skipping source with license outside the allowlist"
                );
                stats.sources_skipped_license += 1;
            }
            if let Some(callback) = progress.as_deref_mut() {
                callback(&SourceProgress {
                    source_id: &source.name,
                    position: idx + 1,
                    total_sources: sources.len(),
                    files_kept: records.len() - before,
                    skipped_license: !allowed,
                });
            }
        }
        Ok((records, stats))
    }

    fn collect_source(
        &self,
        source: &SourceSpec,
        root: &Path,
        records: &mut Vec<CollectedRecord>,
        stats: &mut CollectStats,
    ) -> Result<(), CorpusError> {
        let filter = GlobFilter::new(&source.include, &source.exclude)?;
        let prefix = source.logical_prefix();
        let files = MarkdownWalk::new(root).files()?;
        debug!(source_id = %source.name, files = files.len(), "scanning source");
        for file in files {
            stats.files_scanned += 1;
            let logical = join_logical(&prefix, &file.relative);
            if !filter.allows(&logical) {
                stats.filtered.excluded += 1;
                continue;
            }
            let raw = match fs::read_to_string(&file.path) {
                Ok(raw) => raw,
                Err(err) => {
                    warn!(
                        source_id = %source.name,
                        path = %file.path.display(),
                        error = %err,
                        "{SKIP_UNREADABLE_MSG}"
                    );
                    stats.filtered.unreadable += 1;
                    continue;
                }
            };
            let text = normalize_document(raw);
            let words = word_count(&text);
            if words < self.config.min_words {
                stats.filtered.too_few_words += 1;
                continue;
            }
            let chars = char_count(&text);
            if chars < self.config.min_chars {
                stats.filtered.too_few_chars += 1;
                continue;
            }
            records.push(self.build_record(source, logical, text, words, chars));
            stats.files_kept += 1;
        }
        Ok(())
    }

    fn build_record(
        &self,
        source: &SourceSpec,
        path: String,
        text: String,
        word_count: usize,
        char_count: usize,
    ) -> CollectedRecord {
        let hash = content_hash(&text);
        let heading = first_heading(&text);
        let category = (self.classifier)(&path, heading.as_deref());
        CollectedRecord {
            id: record_id(&source.name, &path, &hash),
            source: source.name.clone(),
            repo: source.repo.clone(),
            revision: source.revision.clone(),
            license: source.license.clone(),
            readme_like: is_readme_like(Path::new(&path)),
            path,
            category,
            split: None,
            word_count,
            char_count,
            content_hash: hash,
            tokens: token_set(&text),
            text,
        }
    }
}
