use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::errors::CorpusError;
use crate::splits::SplitLabel;
use crate::taxonomy::Category;

pub use crate::types::{ContentHash, PathString, RecordId, Revision, SourceId};

/// One collected document plus its computed metadata.
///
/// `text` and `tokens` exist only for near-duplicate comparison and never reach
/// persisted output.
#[derive(Clone, Debug)]
pub struct CollectedRecord {
    /// Content-addressed id (source name + logical path + content hash).
    pub id: RecordId,
    /// Source name.
    pub source: SourceId,
    /// Repository locator as configured; empty for local sources.
    pub repo: String,
    /// Pinned revision; empty for local sources.
    pub revision: Revision,
    /// License declared by the source.
    pub license: String,
    /// Logical path within the source.
    pub path: PathString,
    /// Classifier label.
    pub category: Category,
    /// Assigned by the split stage.
    pub split: Option<SplitLabel>,
    /// Whitespace-separated words.
    pub word_count: usize,
    /// Unicode scalar values.
    pub char_count: usize,
    /// SHA-256 of the normalized text.
    pub content_hash: ContentHash,
    /// Normalized document text.
    pub text: String,
    /// Token set for Jaccard comparison.
    pub tokens: HashSet<String>,
    /// File stem starts with `readme`.
    pub readme_like: bool,
}

/// Persisted view of a surviving record (no raw text, no token set).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRecord {
    /// Content-addressed record id.
    pub id: RecordId,
    /// Source name.
    pub source: SourceId,
    /// Repository locator as configured; empty for local sources.
    pub repo: String,
    /// Pinned revision; empty for local sources.
    pub revision: Revision,
    /// License declared by the source.
    pub license: String,
    /// Logical path within the source.
    pub path: PathString,
    /// Classifier label.
    pub category: Category,
    /// Assigned split.
    pub split: SplitLabel,
    /// Whitespace-separated words.
    pub word_count: usize,
    /// Unicode scalar values.
    pub char_count: usize,
    /// SHA-256 of the normalized text.
    pub content_hash: ContentHash,
    /// File stem starts with `readme`.
    pub readme_like: bool,
}

impl TryFrom<&CollectedRecord> for ManifestRecord {
    type Error = CorpusError;

    fn try_from(record: &CollectedRecord) -> Result<Self, Self::Error> {
        let split = record.split.ok_or_else(|| CorpusError::UnassignedSplit {
            record_id: record.id.clone(),
        })?;
        Ok(Self {
            id: record.id.clone(),
            source: record.source.clone(),
            repo: record.repo.clone(),
            revision: record.revision.clone(),
            license: record.license.clone(),
            path: record.path.clone(),
            category: record.category,
            split,
            word_count: record.word_count,
            char_count: record.char_count,
            content_hash: record.content_hash.clone(),
            readme_like: record.readme_like,
        })
    }
}

/// Bounded, deterministically chosen manifest entry for human review.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaSampleRecord {
    /// Manifest record id.
    pub record_id: RecordId,
    /// Category assigned by the classifier.
    pub predicted_category: Category,
    /// Source name.
    pub source: SourceId,
    /// Logical path within the source.
    pub path: PathString,
}

/// Human-assigned category for one sampled record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaAnnotation {
    /// Manifest record id.
    pub record_id: RecordId,
    /// Category assigned by the reviewer.
    pub actual_category: Category,
}
