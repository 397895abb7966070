/// Constants used by source resolution and the on-disk mirror cache.
pub mod resolver {
    /// Default cache directory for bare source mirrors.
    pub const DEFAULT_CACHE_DIR: &str = ".corpus_cache";
    /// Number of hex characters kept from the remote digest for cache keys.
    pub const CACHE_KEY_LEN: usize = 16;
    /// Scheme applied to remotes given without one (and to ssh remotes).
    pub const DEFAULT_REMOTE_SCHEME: &str = "https://";
    /// Suffix appended to canonical remotes.
    pub const GIT_SUFFIX: &str = ".git";
    /// Logical root meaning "the whole checkout".
    pub const CHECKOUT_ROOT: &str = ".";
}

/// Constants used by document collection.
pub mod collector {
    /// File extensions (case-insensitive) treated as markdown documents.
    pub const MARKDOWN_EXTENSIONS: [&str; 3] = ["md", "markdown", "mdx"];
    /// File stem prefix (case-insensitive) marking readme-like documents.
    pub const README_STEM_PREFIX: &str = "readme";
    /// Version-control metadata directory never scanned for documents.
    pub const VCS_DIR: &str = ".git";
    /// Log message used when unreadable files are skipped.
    pub const SKIP_UNREADABLE_MSG: &str = "skipping unreadable document";
}

/// Constants used by deduplication and balancing.
pub mod balance {
    /// Tolerance applied to share arithmetic before floor/ceil.
    pub const SHARE_EPSILON: f64 = 1e-9;
    /// Diagnostic emitted when every record was dropped.
    pub const NO_RECORDS_VIOLATION: &str = "no records remain after filtering";
}

/// Constants used by split assignment and QA sampling.
pub mod splits {
    use crate::splits::SplitLabel;

    /// Canonical split iteration order.
    pub const ALL_SPLITS: [SplitLabel; 3] = [SplitLabel::Train, SplitLabel::Dev, SplitLabel::Test];
    /// Minimum group size for which dev/test membership is guaranteed.
    pub const MIN_GROUP_FOR_HOLDOUT: usize = 3;
    /// Denominator used for the dev and test shares (one tenth each).
    pub const HOLDOUT_DIVISOR: usize = 10;
}

/// Defaults applied to optional build configuration fields.
pub mod defaults {
    /// Split and QA sampling seed.
    pub const SEED: u64 = 42;
    /// Minimum words per document.
    pub const MIN_WORDS: usize = 50;
    /// Minimum characters per document.
    pub const MIN_CHARS: usize = 200;
    /// Jaccard similarity treated as a near duplicate.
    pub const NEAR_DUPLICATE_THRESHOLD: f64 = 0.9;
    /// Maximum share of readme-like records.
    pub const MAX_README_SHARE: f64 = 0.2;
    /// QA sample size per category.
    pub const QA_PER_CATEGORY: usize = 20;
}

/// Constants used by QA annotation parsing.
pub mod qa {
    /// Optional header row of the annotation file.
    pub const ANNOTATION_HEADER: [&str; 2] = ["record_id", "actual_category"];
    /// Column delimiter of the annotation file.
    pub const ANNOTATION_DELIMITER: u8 = b',';
}
