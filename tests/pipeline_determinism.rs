use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use tempfile::{TempDir, tempdir};

use corpora::persist::{write_manifest, write_qa_sample, write_report};
use corpora::{
    BalanceRange, BuildConfig, Category, CorpusError, ProgressFn, SourceProgress, SourceResolver,
    SourceSpec, SplitLabel, SystemGit, build, default_classifier,
};

/// Twelve tokens no other generated document shares.
fn body(tag: &str) -> String {
    (0..12)
        .map(|idx| format!("{tag}w{idx}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn write(root: &Path, relative: &str, text: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn fixture() -> TempDir {
    let dir = tempdir().unwrap();
    let root = dir.path();
    for idx in 0..7 {
        write(root, &format!("tutorial/t{idx}.md"), &body(&format!("tut{idx}")));
    }
    // 12/13 token overlap with t0, so a near duplicate at 0.9.
    write(root, "tutorial/t_near.md", &format!("{} extraword", body("tut0")));
    for idx in 0..4 {
        write(root, &format!("reference/r{idx}.md"), &body(&format!("ref{idx}")));
    }
    write(root, "reference/copy.md", &body("ref0"));
    write(root, "README.md", &body("readmeroot"));
    write(root, "notes/README.md", &body("readmenotes"));
    write(root, "tiny.md", "too short");
    dir
}

fn config(root: &Path) -> BuildConfig {
    BuildConfig {
        dataset_version: "2024.06".into(),
        collection_date: "2024-06-01".into(),
        seed: 7,
        min_words: 5,
        min_chars: 20,
        near_duplicate_threshold: 0.9,
        max_readme_share: 0.1,
        qa_per_category: 2,
        license_allowlist: vec!["MIT".into()],
        cache_dir: root.join("cache"),
        sources: vec![
            SourceSpec::local("docs", root, "mit"),
            SourceSpec::local("restricted", root.join("does-not-exist"), "GPL-3.0"),
        ],
        balance: BTreeMap::from([
            ("tutorial".to_string(), BalanceRange::new(0.0, 0.4)),
            ("reference".to_string(), BalanceRange::new(0.0, 1.0)),
        ]),
    }
}

#[test]
fn build_applies_every_stage_in_order() {
    let docs = fixture();
    let cache = tempdir().unwrap();
    let config = config_with_cache(docs.path(), cache.path());
    let resolver = SourceResolver::new(SystemGit);
    let output = build(&config, default_classifier(), &resolver, None).unwrap();
    let report = &output.report;

    assert_eq!(report.sources_considered, 2);
    assert_eq!(report.sources_included, 1);
    assert_eq!(report.sources_skipped_license, 1);
    assert_eq!(report.files_scanned, 16);
    assert_eq!(report.files_kept, 15);
    assert_eq!(report.files_filtered.too_few_words, 1);
    assert_eq!(report.dropped.exact_duplicates, 1);
    assert_eq!(report.dropped.near_duplicates, 1);
    // ceil(0.4 * 13) = 6 tutorials survive.
    assert_eq!(report.dropped.balance, 1);
    // floor(0.1 * 10 / 0.9) = 1 readme survives.
    assert_eq!(report.dropped.readme_cap, 1);
    assert_eq!(report.dropped.total(), 4);
    assert_eq!(report.total_records, 11);
    assert_eq!(output.manifest.len(), 11);

    assert_eq!(report.category_counts[&Category::Tutorial], 6);
    assert_eq!(report.category_counts[&Category::Reference], 4);
    assert_eq!(report.category_counts[&Category::Other], 1);

    // 6/11 tutorials is still above 0.4 after the readme cap shrank the total.
    assert_eq!(report.balance_violations.len(), 1);
    assert!(report.balance_violations[0].contains("tutorial"));

    let ids: Vec<&str> = output.manifest.iter().map(|record| record.id.as_str()).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
    let hashes: HashSet<&str> = output
        .manifest
        .iter()
        .map(|record| record.content_hash.as_str())
        .collect();
    assert_eq!(hashes.len(), output.manifest.len());
    assert_eq!(
        output.manifest.iter().filter(|record| record.readme_like).count(),
        1
    );
}

fn config_with_cache(root: &Path, cache: &Path) -> BuildConfig {
    BuildConfig {
        cache_dir: cache.to_path_buf(),
        ..config(root)
    }
}

#[test]
fn splits_follow_per_category_sizes() {
    let docs = fixture();
    let cache = tempdir().unwrap();
    let config = config_with_cache(docs.path(), cache.path());
    let resolver = SourceResolver::new(SystemGit);
    let output = build(&config, default_classifier(), &resolver, None).unwrap();

    let count = |category: Category, split: SplitLabel| {
        output
            .manifest
            .iter()
            .filter(|record| record.category == category && record.split == split)
            .count()
    };
    // Six tutorials: the small-group correction takes one dev and one test from train.
    assert_eq!(count(Category::Tutorial, SplitLabel::Train), 4);
    assert_eq!(count(Category::Tutorial, SplitLabel::Dev), 1);
    assert_eq!(count(Category::Tutorial, SplitLabel::Test), 1);
    assert_eq!(count(Category::Reference, SplitLabel::Train), 2);
    assert_eq!(count(Category::Other, SplitLabel::Train), 1);
    assert_eq!(output.report.split_counts[&SplitLabel::Train], 7);

    let qa: Vec<(Category, &str)> = output
        .qa_sample
        .iter()
        .map(|record| (record.predicted_category, record.record_id.as_str()))
        .collect();
    assert_eq!(qa.len(), 5);
    let mut sorted = qa.clone();
    sorted.sort();
    assert_eq!(qa, sorted);
}

#[test]
fn identical_inputs_produce_identical_bytes() {
    let docs = fixture();
    let cache = tempdir().unwrap();
    let out = tempdir().unwrap();
    let config = config_with_cache(docs.path(), cache.path());
    let resolver = SourceResolver::new(SystemGit);

    for run in ["first", "second"] {
        let output = build(&config, default_classifier(), &resolver, None).unwrap();
        let dir = out.path().join(run);
        write_manifest(dir.join("manifest.jsonl"), &output.manifest).unwrap();
        write_report(dir.join("report.json"), &output.report).unwrap();
        write_qa_sample(dir.join("qa_sample.jsonl"), &output.qa_sample).unwrap();
    }
    for file in ["manifest.jsonl", "report.json", "qa_sample.jsonl"] {
        let first = fs::read(out.path().join("first").join(file)).unwrap();
        let second = fs::read(out.path().join("second").join(file)).unwrap();
        assert_eq!(first, second, "{file} differs between runs");
    }
}

#[test]
fn progress_reports_each_source_in_order() {
    let docs = fixture();
    let cache = tempdir().unwrap();
    let config = config_with_cache(docs.path(), cache.path());
    let mut seen = Vec::new();
    let mut on_progress = |progress: &SourceProgress<'_>| {
        seen.push((progress.source_id.to_string(), progress.skipped_license));
    };
    let progress: ProgressFn<'_> = &mut on_progress;
    build(
        &config,
        default_classifier(),
        &SourceResolver::new(SystemGit),
        Some(progress),
    )
    .unwrap();
    assert_eq!(
        seen,
        vec![("docs".to_string(), false), ("restricted".to_string(), true)]
    );
}

#[test]
fn configuration_errors_fail_before_any_io() {
    let docs = fixture();
    let mut config = config(docs.path());
    config.collection_date = "06/01/2024".into();
    let resolver = SourceResolver::new(SystemGit);
    let err = build(&config, default_classifier(), &resolver, None).unwrap_err();
    assert!(matches!(err, CorpusError::Configuration(_)));
    assert!(!docs.path().join("cache").exists());
}

#[test]
fn missing_local_root_aborts_the_build() {
    let docs = fixture();
    let mut config = config(docs.path());
    config.sources[1].license = "MIT".into();
    let resolver = SourceResolver::new(SystemGit);
    let err = build(&config, default_classifier(), &resolver, None).unwrap_err();
    assert!(matches!(err, CorpusError::LocalRootNotFound { .. }));
}
