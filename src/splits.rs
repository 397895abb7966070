//! Deterministic train/dev/test assignment and QA sampling.
//!
//! Ordering inside every category group comes from [`stable_order_key`] over
//! `(seed, record id)` with the record id as tie-breaker, so identical inputs
//! produce identical splits on every machine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::constants::splits::{ALL_SPLITS, HOLDOUT_DIVISOR, MIN_GROUP_FOR_HOLDOUT};
use crate::data::{CollectedRecord, ManifestRecord, QaSampleRecord};
use crate::hash::stable_order_key;
use crate::taxonomy::Category;
use crate::types::RecordId;

/// Logical dataset partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitLabel {
    /// Training split.
    Train,
    /// Development (validation) split.
    Dev,
    /// Test split.
    Test,
}

impl fmt::Display for SplitLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SplitLabel::Train => "train",
            SplitLabel::Dev => "dev",
            SplitLabel::Test => "test",
        })
    }
}

/// Per-group split sizes: 80/10/10 by floor division with a small-group correction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SplitSizes {
    /// Records labelled train.
    pub train: usize,
    /// Records labelled dev.
    pub dev: usize,
    /// Records labelled test.
    pub test: usize,
}

impl SplitSizes {
    /// Sizes for a category group of `total` records.
    ///
    /// Groups of at least three always get one dev and one test record,
    /// taken from train. Smaller groups may have neither.
    pub fn for_group(total: usize) -> Self {
        let mut dev = total / HOLDOUT_DIVISOR;
        let mut test = total / HOLDOUT_DIVISOR;
        let mut train = total - dev - test;
        if total >= MIN_GROUP_FOR_HOLDOUT && dev == 0 {
            dev = 1;
            train -= 1;
        }
        if total >= MIN_GROUP_FOR_HOLDOUT && test == 0 {
            test = 1;
            train -= 1;
        }
        Self { train, dev, test }
    }

    fn label_at(&self, position: usize) -> SplitLabel {
        if position < self.train {
            SplitLabel::Train
        } else if position < self.train + self.dev {
            SplitLabel::Dev
        } else {
            SplitLabel::Test
        }
    }
}

/// Sort ids by the seeded order key, ties broken by id ascending.
fn seeded_sort<T>(items: &mut [T], seed: u64, id: impl Fn(&T) -> RecordId) {
    items.sort_by_cached_key(|item| {
        let id = id(item);
        (stable_order_key(seed, &id), id)
    });
}

/// Assign a split label to every record; input order is preserved.
pub fn assign_splits(mut records: Vec<CollectedRecord>, seed: u64) -> Vec<CollectedRecord> {
    let mut groups: BTreeMap<Category, Vec<usize>> = BTreeMap::new();
    for (idx, record) in records.iter().enumerate() {
        groups.entry(record.category).or_default().push(idx);
    }
    for indices in groups.values_mut() {
        seeded_sort(indices, seed, |idx| records[*idx].id.clone());
        let sizes = SplitSizes::for_group(indices.len());
        for (position, idx) in indices.iter().enumerate() {
            records[*idx].split = Some(sizes.label_at(position));
        }
    }
    records
}

/// Pick up to `per_category` records per category in seeded order.
///
/// Categories are visited in canonical order; the combined sample is then
/// sorted by (category, record id).
pub fn qa_sample(
    manifest: &[ManifestRecord],
    per_category: usize,
    seed: u64,
) -> Vec<QaSampleRecord> {
    let mut sample = Vec::new();
    for category in Category::ALL {
        let mut group: Vec<&ManifestRecord> = manifest
            .iter()
            .filter(|record| record.category == category)
            .collect();
        seeded_sort(&mut group, seed, |record| record.id.clone());
        sample.extend(group.into_iter().take(per_category).map(|record| QaSampleRecord {
            record_id: record.id.clone(),
            predicted_category: record.category,
            source: record.source.clone(),
            path: record.path.clone(),
        }));
    }
    sample.sort_by(|a, b| {
        a.predicted_category
            .cmp(&b.predicted_category)
            .then_with(|| a.record_id.cmp(&b.record_id))
    });
    sample
}

/// Count records per split label (every label present, zero when empty).
pub fn split_counts(labels: impl IntoIterator<Item = SplitLabel>) -> BTreeMap<SplitLabel, usize> {
    let mut counts: BTreeMap<SplitLabel, usize> = ALL_SPLITS
        .into_iter()
        .map(|label| (label, 0))
        .collect();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn record(id: &str, category: Category) -> CollectedRecord {
        CollectedRecord {
            id: id.to_string(),
            source: "src".into(),
            repo: String::new(),
            revision: String::new(),
            license: "MIT".into(),
            path: format!("{id}.md"),
            category,
            split: None,
            word_count: 10,
            char_count: 50,
            content_hash: format!("hash-{id}"),
            text: String::new(),
            tokens: HashSet::new(),
            readme_like: false,
        }
    }

    fn manifest_of(records: &[CollectedRecord]) -> Vec<ManifestRecord> {
        records
            .iter()
            .map(|record| ManifestRecord::try_from(record).unwrap())
            .collect()
    }

    #[test]
    fn sizes_follow_eighty_ten_ten() {
        assert_eq!(
            SplitSizes::for_group(20),
            SplitSizes { train: 16, dev: 2, test: 2 }
        );
        assert_eq!(
            SplitSizes::for_group(25),
            SplitSizes { train: 21, dev: 2, test: 2 }
        );
    }

    #[test]
    fn small_groups_get_one_dev_and_one_test() {
        assert_eq!(SplitSizes::for_group(3), SplitSizes { train: 1, dev: 1, test: 1 });
        assert_eq!(SplitSizes::for_group(9), SplitSizes { train: 7, dev: 1, test: 1 });
    }

    #[test]
    fn groups_below_three_may_skip_holdout() {
        assert_eq!(SplitSizes::for_group(2), SplitSizes { train: 2, dev: 0, test: 0 });
        assert_eq!(SplitSizes::for_group(1), SplitSizes { train: 1, dev: 0, test: 0 });
        assert_eq!(SplitSizes::for_group(0), SplitSizes { train: 0, dev: 0, test: 0 });
    }

    #[test]
    fn every_record_gets_a_split_and_groups_have_holdout() {
        let mut records = Vec::new();
        for idx in 0..12 {
            records.push(record(&format!("ref-{idx:02}"), Category::Reference));
        }
        for idx in 0..3 {
            records.push(record(&format!("tut-{idx}"), Category::Tutorial));
        }
        let assigned = assign_splits(records, 7);
        assert!(assigned.iter().all(|record| record.split.is_some()));
        for category in [Category::Reference, Category::Tutorial] {
            let labels: Vec<SplitLabel> = assigned
                .iter()
                .filter(|record| record.category == category)
                .filter_map(|record| record.split)
                .collect();
            let counts = split_counts(labels);
            assert!(counts[&SplitLabel::Dev] >= 1);
            assert!(counts[&SplitLabel::Test] >= 1);
        }
    }

    #[test]
    fn assignment_is_independent_of_input_order() {
        let records: Vec<CollectedRecord> = (0..30)
            .map(|idx| record(&format!("r{idx}"), Category::Concept))
            .collect();
        let mut reversed = records.clone();
        reversed.reverse();
        let forward = assign_splits(records, 11);
        let backward = assign_splits(reversed, 11);
        for record in &forward {
            let twin = backward.iter().find(|other| other.id == record.id).unwrap();
            assert_eq!(record.split, twin.split);
        }
    }

    #[test]
    fn different_seeds_shuffle_assignment() {
        let records: Vec<CollectedRecord> = (0..40)
            .map(|idx| record(&format!("r{idx}"), Category::Concept))
            .collect();
        let first = assign_splits(records.clone(), 1);
        let second = assign_splits(records, 2);
        let differs = first
            .iter()
            .zip(&second)
            .any(|(left, right)| left.split != right.split);
        assert!(differs);
    }

    #[test]
    fn qa_sample_is_bounded_per_category_and_sorted() {
        let mut records = Vec::new();
        for idx in 0..5 {
            records.push(record(&format!("how-{idx}"), Category::HowTo));
        }
        records.push(record("tut-0", Category::Tutorial));
        let manifest = manifest_of(&assign_splits(records, 3));
        let sample = qa_sample(&manifest, 2, 3);
        assert_eq!(sample.len(), 3);
        assert_eq!(sample[0].predicted_category, Category::Tutorial);
        assert!(sample[1..].iter().all(|row| row.predicted_category == Category::HowTo));
        assert!(sample[1].record_id < sample[2].record_id);
        assert_eq!(sample, qa_sample(&manifest, 2, 3));
    }
}
