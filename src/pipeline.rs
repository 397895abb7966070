//! Build orchestrator.
//!
//! collect → exact dedup → near dedup → balance → readme cap → violations →
//! splits → manifest (sorted by id) → report → QA sample. Any error aborts the
//! build; no partial output is returned.

use tracing::info;

use crate::collector::{Collector, ProgressFn};
use crate::config::BuildConfig;
use crate::data::{ManifestRecord, QaSampleRecord};
use crate::dedup::{balance_violations, cap_readme_share, enforce_balance, exact_dedup, near_dedup};
use crate::errors::CorpusError;
use crate::report::{BuildReport, DropCounts};
use crate::source::{GitRunner, SourceResolver};
use crate::splits::{assign_splits, qa_sample};
use crate::taxonomy::Classifier;

/// Everything one build produces.
#[derive(Clone, Debug)]
pub struct BuildOutput {
    /// Surviving records sorted by id.
    pub manifest: Vec<ManifestRecord>,
    /// Aggregate counts and diagnostics.
    pub report: BuildReport,
    /// Per-category QA sample sorted by (category, id).
    pub qa_sample: Vec<QaSampleRecord>,
}

/// Run the full pipeline for `config`.
pub fn build<G: GitRunner>(
    config: &BuildConfig,
    classifier: Classifier,
    resolver: &SourceResolver<G>,
    progress: Option<ProgressFn<'_>>,
) -> Result<BuildOutput, CorpusError> {
    config.validate()?;
    let ranges = config.balance_ranges()?;

    let collector = Collector::new(config, classifier);
    let (collected, stats) = collector.collect(
        &config.sources,
        |source| resolver.resolve(source, &config.cache_dir),
        progress,
    )?;
    info!(
        files_scanned = stats.files_scanned,
        files_kept = stats.files_kept,
        filtered = stats.filtered.total(),
        "collection finished"
    );

    let mut dropped = DropCounts::default();

    let exact = exact_dedup(&collected);
    dropped.exact_duplicates = exact.dropped;
    info!(dropped = exact.dropped, remaining = exact.survivors.len(), "exact dedup");

    let near = near_dedup(&exact.survivors, config.near_duplicate_threshold);
    dropped.near_duplicates = near.dropped;
    info!(dropped = near.dropped, remaining = near.survivors.len(), "near dedup");

    let balanced = enforce_balance(&near.survivors, &ranges);
    dropped.balance = balanced.dropped;
    info!(dropped = balanced.dropped, remaining = balanced.survivors.len(), "category balance");

    let capped = cap_readme_share(&balanced.survivors, config.max_readme_share);
    dropped.readme_cap = capped.dropped;
    info!(dropped = capped.dropped, remaining = capped.survivors.len(), "readme cap");

    let violations = balance_violations(&capped.survivors, &ranges);

    let assigned = assign_splits(capped.survivors, config.seed);
    let mut manifest = assigned
        .iter()
        .map(ManifestRecord::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    manifest.sort_by(|a, b| a.id.cmp(&b.id));

    let report = BuildReport::new(config, ranges, &stats, dropped, &manifest, violations);
    let qa_sample = qa_sample(&manifest, config.qa_per_category, config.seed);
    info!(
        dataset_version = %config.dataset_version,
        records = manifest.len(),
        dropped = report.dropped.total(),
        qa_sample = qa_sample.len(),
        violations = report.balance_violations.len(),
        "build finished"
    );

    Ok(BuildOutput {
        manifest,
        report,
        qa_sample,
    })
}
