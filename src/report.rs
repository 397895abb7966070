//! Aggregate build report.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::collector::CollectStats;
pub use crate::collector::FilterCounts;
use crate::config::{BalanceRange, BuildConfig};
use crate::data::ManifestRecord;
use crate::metrics::{category_counts, share};
use crate::splits::{SplitLabel, split_counts};
use crate::taxonomy::Category;
use crate::types::ViolationMessage;

/// Records removed by each post-collection stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropCounts {
    /// Dropped as byte-identical after normalization.
    pub exact_duplicates: usize,
    /// Dropped by Jaccard similarity.
    pub near_duplicates: usize,
    /// Dropped by category caps.
    pub balance: usize,
    /// Dropped by the readme share cap.
    pub readme_cap: usize,
}

impl DropCounts {
    /// Records dropped across all stages.
    pub fn total(&self) -> usize {
        self.exact_duplicates + self.near_duplicates + self.balance + self.readme_cap
    }
}

/// Summary of one build. Created once and never mutated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuildReport {
    /// Dataset version label from the configuration.
    pub dataset_version: String,
    /// `YYYY-MM-DD`.
    pub collection_date: String,
    /// Seed used for splits and the QA sample.
    pub seed: u64,
    /// Sources in the configuration.
    pub sources_considered: usize,
    /// Sources scanned after the license gate.
    pub sources_included: usize,
    /// Sources skipped by the license allowlist.
    pub sources_skipped_license: usize,
    /// Markdown files found under included roots.
    pub files_scanned: usize,
    /// Files that passed the collection thresholds (before dedup and balancing).
    pub files_kept: usize,
    /// Files rejected during collection, by reason.
    pub files_filtered: FilterCounts,
    /// Records removed after collection, by stage.
    pub dropped: DropCounts,
    /// Manifest size.
    pub total_records: usize,
    /// Manifest records per category (every category present).
    pub category_counts: BTreeMap<Category, usize>,
    /// Manifest records per split (every split present).
    pub split_counts: BTreeMap<SplitLabel, usize>,
    /// Configured balance ranges.
    pub balance_ranges: BTreeMap<Category, BalanceRange>,
    /// Sorted; informational only.
    pub balance_violations: Vec<ViolationMessage>,
    /// Share of readme-like records in the manifest.
    pub readme_share: f64,
}

impl BuildReport {
    /// Assemble the report from collection stats, stage drops and the final manifest.
    pub fn new(
        config: &BuildConfig,
        balance_ranges: BTreeMap<Category, BalanceRange>,
        stats: &CollectStats,
        dropped: DropCounts,
        manifest: &[ManifestRecord],
        balance_violations: Vec<ViolationMessage>,
    ) -> Self {
        let readmes = manifest.iter().filter(|record| record.readme_like).count();
        Self {
            dataset_version: config.dataset_version.clone(),
            collection_date: config.collection_date.clone(),
            seed: config.seed,
            sources_considered: stats.sources_considered,
            sources_included: stats.sources_included,
            sources_skipped_license: stats.sources_skipped_license,
            files_scanned: stats.files_scanned,
            files_kept: stats.files_kept,
            files_filtered: stats.filtered,
            dropped,
            total_records: manifest.len(),
            category_counts: category_counts(manifest.iter().map(|record| record.category)),
            split_counts: split_counts(manifest.iter().map(|record| record.split)),
            balance_ranges,
            balance_violations,
            readme_share: share(readmes, manifest.len()),
        }
    }

    /// Share of `category` in the manifest (zero when the manifest is empty).
    pub fn category_share(&self, category: Category) -> f64 {
        share(
            self.category_counts.get(&category).copied().unwrap_or_default(),
            self.total_records,
        )
    }
}
