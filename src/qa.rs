//! Manual-label quality evaluation of a QA sample.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};

use crate::constants::qa::{ANNOTATION_DELIMITER, ANNOTATION_HEADER};
use crate::data::{QaAnnotation, QaSampleRecord};
use crate::errors::CorpusError;
use crate::metrics::share;
use crate::taxonomy::Category;
use crate::types::RecordId;

/// Parse `record_id,actual_category` CSV rows.
///
/// A leading header row is optional, blank lines are skipped and fields may
/// be quoted. Any other malformed row, unknown category or repeated record id
/// is fatal and reports its 1-based line.
pub fn parse_annotations(raw: &str) -> Result<Vec<QaAnnotation>, CorpusError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(false)
        .trim(Trim::All)
        .delimiter(ANNOTATION_DELIMITER)
        .from_reader(raw.as_bytes());
    let mut annotations = Vec::new();
    let mut seen = HashSet::new();
    for (idx, result) in reader.records().enumerate() {
        let row = result.map_err(|err| CorpusError::AnnotationFormat {
            line: err.position().map_or(idx + 1, |pos| pos.line() as usize),
            details: err.to_string(),
        })?;
        let line = row.position().map_or(idx + 1, |pos| pos.line() as usize);
        if idx == 0 && row.iter().eq(ANNOTATION_HEADER) {
            continue;
        }
        let (Some(record_id), Some(category), 2) = (row.get(0), row.get(1), row.len()) else {
            return Err(CorpusError::AnnotationFormat {
                line,
                details: format!("expected 2 fields, found {}", row.len()),
            });
        };
        if record_id.is_empty() {
            return Err(CorpusError::AnnotationFormat {
                line,
                details: "record id is empty".into(),
            });
        }
        let actual_category: Category =
            category.parse().map_err(|_| CorpusError::AnnotationFormat {
                line,
                details: format!("unknown category '{category}'"),
            })?;
        if !seen.insert(record_id.to_string()) {
            return Err(CorpusError::AnnotationFormat {
                line,
                details: format!("duplicate record id '{record_id}'"),
            });
        }
        annotations.push(QaAnnotation {
            record_id: record_id.to_string(),
            actual_category,
        });
    }
    Ok(annotations)
}

/// Hit/miss counts and derived scores for one category.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    /// Predicted and annotated as this category.
    pub true_positives: usize,
    /// Predicted as this category, annotated otherwise.
    pub false_positives: usize,
    /// Annotated as this category, predicted otherwise.
    pub false_negatives: usize,
    /// Times the category was predicted among compared records.
    pub predicted: usize,
    /// Times the category was the annotated label among compared records.
    pub actual: usize,
    /// `tp / (tp + fp)`, or 0.
    pub precision: f64,
    /// `tp / (tp + fn)`, or 0.
    pub recall: f64,
}

/// Result of comparing a QA sample against manual annotations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QaReport {
    /// Records present in both inputs.
    pub compared: usize,
    /// Compared records whose prediction matched.
    pub matches: usize,
    /// `matches / compared`.
    pub agreement: f64,
    /// Scores for every category seen on either side.
    pub per_category: BTreeMap<Category, CategoryScore>,
    /// Sampled ids with no annotation, sorted.
    pub missing_annotations: Vec<RecordId>,
    /// Annotated ids absent from the sample, sorted.
    pub unmatched_annotations: Vec<RecordId>,
}

/// Score predicted categories against annotated ones.
///
/// Fails when either input is empty or when no record id appears in both.
pub fn evaluate(
    sample: &[QaSampleRecord],
    annotations: &[QaAnnotation],
) -> Result<QaReport, CorpusError> {
    if sample.is_empty() {
        return Err(CorpusError::Evaluation("QA sample is empty".into()));
    }
    if annotations.is_empty() {
        return Err(CorpusError::Evaluation("annotation set is empty".into()));
    }
    let actual_by_id: HashMap<&str, Category> = annotations
        .iter()
        .map(|annotation| (annotation.record_id.as_str(), annotation.actual_category))
        .collect();
    let sampled: BTreeSet<&str> = sample.iter().map(|record| record.record_id.as_str()).collect();

    let mut per_category: BTreeMap<Category, CategoryScore> = BTreeMap::new();
    let mut compared = 0;
    let mut matches = 0;
    let mut missing = BTreeSet::new();
    for record in sample {
        let Some(actual) = actual_by_id.get(record.record_id.as_str()).copied() else {
            missing.insert(record.record_id.clone());
            continue;
        };
        let predicted = record.predicted_category;
        compared += 1;
        per_category.entry(predicted).or_default().predicted += 1;
        per_category.entry(actual).or_default().actual += 1;
        if predicted == actual {
            matches += 1;
            per_category.entry(predicted).or_default().true_positives += 1;
        } else {
            per_category.entry(predicted).or_default().false_positives += 1;
            per_category.entry(actual).or_default().false_negatives += 1;
        }
    }
    if compared == 0 {
        return Err(CorpusError::Evaluation(
            "no record ids overlap between sample and annotations".into(),
        ));
    }
    for score in per_category.values_mut() {
        score.precision = share(score.true_positives, score.true_positives + score.false_positives);
        score.recall = share(score.true_positives, score.true_positives + score.false_negatives);
    }
    let unmatched: BTreeSet<RecordId> = annotations
        .iter()
        .filter(|annotation| !sampled.contains(annotation.record_id.as_str()))
        .map(|annotation| annotation.record_id.clone())
        .collect();

    Ok(QaReport {
        compared,
        matches,
        agreement: share(matches, compared),
        per_category,
        missing_annotations: missing.into_iter().collect(),
        unmatched_annotations: unmatched.into_iter().collect(),
    })
}
