use std::io;

use thiserror::Error;

use crate::types::{RecordId, SourceId};

/// Error type for configuration, source resolution, IO, and evaluation failures.
#[derive(Debug, Error)]
pub enum CorpusError {
    /// Invalid or incomplete build configuration. Raised before any IO.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A local root, or a sub-root inside a checkout, does not exist.
    #[error("source '{source_id}': local root '{path}' does not exist")]
    LocalRootNotFound {
        /// Source name.
        source_id: SourceId,
        /// Missing path.
        path: String,
    },
    /// The remote repository is missing or inaccessible.
    #[error(
        "source '{source_id}': repository '{remote}' was not found (check the URL and your access rights)"
    )]
    RepositoryNotFound {
        /// Source name.
        source_id: SourceId,
        /// Canonical remote.
        remote: String,
    },
    /// The pinned revision does not exist in the remote.
    #[error(
        "source '{source_id}': revision '{revision}' does not exist in the remote (check the pinned revision)"
    )]
    RevisionNotFound {
        /// Source name.
        source_id: SourceId,
        /// Pinned revision.
        revision: String,
    },
    /// The remote could not be reached.
    #[error("source '{source_id}': network failure while fetching ({details}); retry when online")]
    Network {
        /// Source name.
        source_id: SourceId,
        /// Transport output.
        details: String,
    },
    /// Offline resolution needed a mirror or revision that is not cached.
    #[error(
        "source '{source_id}': revision '{revision}' is not in the local cache; fetch sources before building"
    )]
    RevisionNotCached {
        /// Source name.
        source_id: SourceId,
        /// Pinned revision.
        revision: String,
    },
    /// Any other failed `git` invocation.
    #[error("source '{source_id}': `{command}` failed: {stderr}")]
    Git {
        /// Source name.
        source_id: SourceId,
        /// Command line that failed.
        command: String,
        /// Captured stderr.
        stderr: String,
    },
    /// A record reached manifest conversion before split assignment.
    #[error("record '{record_id}' reached the manifest without a split label")]
    UnassignedSplit {
        /// Offending record.
        record_id: RecordId,
    },
    /// QA or drift inputs are empty, disjoint, or unreadable.
    #[error("evaluation error: {0}")]
    Evaluation(String),
    /// A malformed annotation row.
    #[error("malformed annotation on line {line}: {details}")]
    AnnotationFormat {
        /// 1-based line number.
        line: usize,
        /// What was wrong with the row.
        details: String,
    },
    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// JSON encoding or decoding failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// TOML decoding failure.
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}
