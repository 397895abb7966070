//! Category-share and volume drift between two build reports.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::report::BuildReport;
use crate::splits::SplitLabel;
use crate::taxonomy::Category;

/// Baseline vs. candidate figures for one category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryDrift {
    /// Count in the baseline build.
    pub baseline_count: usize,
    /// Count in the candidate build.
    pub candidate_count: usize,
    /// `candidate_count - baseline_count`.
    pub delta_count: i64,
    /// Share of the baseline manifest.
    pub baseline_share: f64,
    /// Share of the candidate manifest.
    pub candidate_share: f64,
    /// `candidate_share - baseline_share`.
    pub delta_share: f64,
}

/// Baseline vs. candidate counts for one split.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitDrift {
    /// Count in the baseline build.
    pub baseline_count: usize,
    /// Count in the candidate build.
    pub candidate_count: usize,
    /// `candidate_count - baseline_count`.
    pub delta_count: i64,
}

/// Differences between two builds. Holds no record-level data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    /// Dataset version of the baseline build.
    pub baseline_version: String,
    /// Dataset version of the candidate build.
    pub candidate_version: String,
    /// `files_kept` of the baseline build.
    pub baseline_total: usize,
    /// `files_kept` of the candidate build.
    pub candidate_total: usize,
    /// Change in `files_kept`.
    pub delta_total: i64,
    /// Change in manifest size.
    pub delta_records: i64,
    /// Union of categories from both reports.
    pub categories: BTreeMap<Category, CategoryDrift>,
    /// Union of splits from both reports.
    pub splits: BTreeMap<SplitLabel, SplitDrift>,
    /// Change in readme share.
    pub delta_readme_share: f64,
}

fn delta(baseline: usize, candidate: usize) -> i64 {
    candidate as i64 - baseline as i64
}

/// Compare `candidate` against `baseline`.
///
/// Categories and splits cover the union of keys in either report. Shares are
/// taken against each report's own record total; a zero total yields zero.
pub fn compare(baseline: &BuildReport, candidate: &BuildReport) -> DriftReport {
    let category_keys: BTreeSet<Category> = baseline
        .category_counts
        .keys()
        .chain(candidate.category_counts.keys())
        .copied()
        .collect();
    let categories = category_keys
        .into_iter()
        .map(|category| {
            let baseline_count = baseline.category_counts.get(&category).copied().unwrap_or(0);
            let candidate_count = candidate.category_counts.get(&category).copied().unwrap_or(0);
            let baseline_share = baseline.category_share(category);
            let candidate_share = candidate.category_share(category);
            let drift = CategoryDrift {
                baseline_count,
                candidate_count,
                delta_count: delta(baseline_count, candidate_count),
                baseline_share,
                candidate_share,
                delta_share: candidate_share - baseline_share,
            };
            (category, drift)
        })
        .collect();

    let split_keys: BTreeSet<SplitLabel> = baseline
        .split_counts
        .keys()
        .chain(candidate.split_counts.keys())
        .copied()
        .collect();
    let splits = split_keys
        .into_iter()
        .map(|label| {
            let baseline_count = baseline.split_counts.get(&label).copied().unwrap_or(0);
            let candidate_count = candidate.split_counts.get(&label).copied().unwrap_or(0);
            let drift = SplitDrift {
                baseline_count,
                candidate_count,
                delta_count: delta(baseline_count, candidate_count),
            };
            (label, drift)
        })
        .collect();

    DriftReport {
        baseline_version: baseline.dataset_version.clone(),
        candidate_version: candidate.dataset_version.clone(),
        baseline_total: baseline.files_kept,
        candidate_total: candidate.files_kept,
        delta_total: delta(baseline.files_kept, candidate.files_kept),
        delta_records: delta(baseline.total_records, candidate.total_records),
        categories,
        splits,
        delta_readme_share: candidate.readme_share - baseline.readme_share,
    }
}
