//! Deduplication and balancing stages.
//!
//! Every stage is a pure function from a record slice to a [`StageOutcome`];
//! stages are order-sensitive and compose left to right.
//!
//! Near-duplicate detection compares each candidate against every record kept
//! so far, which is quadratic in the corpus size. That is an accepted limit at
//! the corpus sizes this crate targets; a larger corpus should index candidates
//! (for example with MinHash/LSH) without changing the comparison semantics.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, warn};

use crate::config::BalanceRange;
use crate::constants::balance::{NO_RECORDS_VIOLATION, SHARE_EPSILON};
use crate::data::CollectedRecord;
use crate::metrics::{category_counts, share};
use crate::taxonomy::Category;
use crate::types::{RecordId, ViolationMessage};

/// Survivors of one stage plus how many records it dropped.
#[derive(Clone, Debug)]
pub struct StageOutcome {
    /// Kept records in input order.
    pub survivors: Vec<CollectedRecord>,
    /// Records removed by the stage.
    pub dropped: usize,
}

impl StageOutcome {
    fn from_filter(records: &[CollectedRecord], keep: impl Fn(&CollectedRecord) -> bool) -> Self {
        let survivors: Vec<CollectedRecord> = records
            .iter()
            .filter(|record| keep(*record))
            .cloned()
            .collect();
        Self {
            dropped: records.len() - survivors.len(),
            survivors,
        }
    }
}

/// First-seen-wins by content hash; input order is preserved.
pub fn exact_dedup(records: &[CollectedRecord]) -> StageOutcome {
    let mut seen = HashSet::new();
    let mut survivors = Vec::with_capacity(records.len());
    for record in records {
        if seen.insert(record.content_hash.as_str()) {
            survivors.push(record.clone());
        }
    }
    StageOutcome {
        dropped: records.len() - survivors.len(),
        survivors,
    }
}

/// Jaccard similarity of two token sets; `0.0` when either set is empty.
pub fn jaccard(left: &HashSet<String>, right: &HashSet<String>) -> f64 {
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let (small, large) = if left.len() <= right.len() {
        (left, right)
    } else {
        (right, left)
    };
    let intersection = small.iter().filter(|token| large.contains(*token)).count();
    let union = left.len() + right.len() - intersection;
    intersection as f64 / union as f64
}

/// Drop any record whose similarity to an already kept record is `>= threshold`.
///
/// Records with an empty token set never match.
pub fn near_dedup(records: &[CollectedRecord], threshold: f64) -> StageOutcome {
    let mut survivors: Vec<CollectedRecord> = Vec::with_capacity(records.len());
    for record in records {
        let duplicate = !record.tokens.is_empty()
            && survivors
                .iter()
                .any(|kept| jaccard(&record.tokens, &kept.tokens) >= threshold);
        if duplicate {
            debug!(record_id = %record.id, path = %record.path, "dropping near duplicate");
        } else {
            survivors.push(record.clone());
        }
    }
    StageOutcome {
        dropped: records.len() - survivors.len(),
        survivors,
    }
}

/// Number of readme-like records allowed next to `non_readme` others.
///
/// Returns `None` when the cap is inactive (`max_share` outside `(0, 1)`).
/// Otherwise `floor(max_share * non_readme / (1 - max_share))`, at least 1.
pub fn readme_allowance(non_readme: usize, max_share: f64) -> Option<usize> {
    if !(max_share > 0.0 && max_share < 1.0) {
        return None;
    }
    let allowed = (max_share * non_readme as f64 / (1.0 - max_share) + SHARE_EPSILON).floor();
    Some((allowed as usize).max(1))
}

/// Cap the readme-like share; the lowest ids are kept.
pub fn cap_readme_share(records: &[CollectedRecord], max_share: f64) -> StageOutcome {
    let readmes: Vec<&RecordId> = records
        .iter()
        .filter(|record| record.readme_like)
        .map(|record| &record.id)
        .collect();
    let allowed = match readme_allowance(records.len() - readmes.len(), max_share) {
        Some(allowed) if readmes.len() > allowed => allowed,
        _ => return StageOutcome::from_filter(records, |_| true),
    };
    let keep = lowest_ids(readmes, allowed);
    StageOutcome::from_filter(records, |record| !record.readme_like || keep.contains(&record.id))
}

/// Cap each category with a configured maximum share at `ceil(max * total)`.
///
/// Categories are processed once each in canonical order; `total` is the
/// running survivor count at the moment the category is processed, so a later
/// category sees the totals left by earlier caps. Within a category the lowest
/// ids are kept.
pub fn enforce_balance(
    records: &[CollectedRecord],
    ranges: &BTreeMap<Category, BalanceRange>,
) -> StageOutcome {
    let mut survivors = records.to_vec();
    for (category, range) in ranges {
        let total = survivors.len();
        if total == 0 {
            break;
        }
        let cap = ((range.max * total as f64 - SHARE_EPSILON).ceil() as usize).max(1);
        let members: Vec<&RecordId> = survivors
            .iter()
            .filter(|record| record.category == *category)
            .map(|record| &record.id)
            .collect();
        if members.len() <= cap {
            continue;
        }
        debug!(category = %category, members = members.len(), cap, "capping category");
        let keep = lowest_ids(members, cap);
        survivors.retain(|record| record.category != *category || keep.contains(&record.id));
    }
    StageOutcome {
        dropped: records.len() - survivors.len(),
        survivors,
    }
}

/// Categories whose final share falls outside their configured range, sorted.
///
/// An empty record set yields the single [`NO_RECORDS_VIOLATION`] entry.
pub fn balance_violations(
    records: &[CollectedRecord],
    ranges: &BTreeMap<Category, BalanceRange>,
) -> Vec<ViolationMessage> {
    if records.is_empty() {
        warn!("{NO_RECORDS_VIOLATION}");
        return vec![NO_RECORDS_VIOLATION.to_string()];
    }
    let counts = category_counts(records.iter().map(|record| record.category));
    let mut violations: Vec<ViolationMessage> = ranges
        .iter()
        .filter_map(|(category, range)| {
            let value = share(counts[category], records.len());
            let inside = value >= range.min - SHARE_EPSILON && value <= range.max + SHARE_EPSILON;
            (!inside).then(|| {
                format!(
                    "category '{category}' share {value:.4} outside [{:.4}, {:.4}]",
                    range.min, range.max
                )
            })
        })
        .collect();
    violations.sort();
    for violation in &violations {
        warn!(violation = %violation, "balance range violated");
    }
    violations
}

fn lowest_ids(mut ids: Vec<&RecordId>, keep: usize) -> HashSet<RecordId> {
    ids.sort();
    ids.into_iter().take(keep).cloned().collect()
}
