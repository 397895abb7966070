#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Build configuration types and TOML loading.
pub mod config;
/// Centralized constants used across resolver, collector, balancing, and splits.
pub mod constants;
/// Record types for collected, persisted, and sampled documents.
pub mod data;
/// Deduplication, readme cap, and category balance stages.
pub mod dedup;
/// Category-share and volume comparison between builds.
pub mod drift;
/// Stable SHA-256 helpers for ids, cache keys, and seeded ordering.
pub mod hash;
/// Category share helpers.
pub mod metrics;
/// Build orchestrator.
pub mod pipeline;
/// JSONL and JSON persistence helpers.
pub mod persist;
/// QA annotation parsing and evaluation.
pub mod qa;
/// Build report types.
pub mod report;
/// Source resolution through cached git mirrors.
pub mod source;
/// Deterministic split assignment and QA sampling.
pub mod splits;
/// Fixed category set and the default classifier.
pub mod taxonomy;
/// Input transports used by the collector (filesystem today).
pub mod transport;
/// Shared type aliases.
pub mod types;
/// Text normalization helpers.
pub mod utils;

mod collector;
mod errors;

pub use collector::{CollectStats, Collector, FilterCounts, ProgressFn, SourceProgress};
pub use config::{BalanceRange, BuildConfig, SourceSpec};
pub use data::{CollectedRecord, ManifestRecord, QaAnnotation, QaSampleRecord};
pub use dedup::StageOutcome;
pub use drift::{CategoryDrift, DriftReport, SplitDrift};
pub use errors::CorpusError;
pub use pipeline::{BuildOutput, build};
pub use qa::{CategoryScore, QaReport, evaluate, parse_annotations};
pub use report::{BuildReport, DropCounts};
pub use source::{FetchPolicy, GitFailure, GitRunner, SourceResolver, SystemGit};
pub use splits::{SplitLabel, SplitSizes};
pub use taxonomy::{Category, Classifier, default_classifier};
pub use types::{ContentHash, PathString, RecordId, RemoteUrl, Revision, SourceId};
