use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use crate::constants::defaults;
use crate::constants::resolver::{CHECKOUT_ROOT, DEFAULT_CACHE_DIR};
use crate::errors::CorpusError;
use crate::taxonomy::Category;
use crate::types::{Revision, SourceId};

/// One pinned source: a local absolute root, or a remote repository at a revision.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Unique source name.
    pub name: SourceId,
    /// Remote locator (any supported spelling); empty for local sources.
    #[serde(default)]
    pub repo: String,
    /// Pinned revision; empty for local sources.
    #[serde(default)]
    pub revision: Revision,
    /// Declared license, checked against the allowlist.
    pub license: String,
    /// Absolute local path, or a sub-root inside the checkout (`.` for all of it).
    #[serde(default = "default_root")]
    pub root: String,
    /// Include globs over logical paths; empty means everything.
    #[serde(default)]
    pub include: Vec<String>,
    /// Exclude globs over logical paths.
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_root() -> String {
    CHECKOUT_ROOT.to_string()
}

impl SourceSpec {
    /// Source backed by an absolute local path (no caching or network).
    pub fn local(
        name: impl Into<SourceId>,
        root: impl AsRef<Path>,
        license: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            repo: String::new(),
            revision: String::new(),
            license: license.into(),
            root: root.as_ref().to_string_lossy().into_owned(),
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }

    /// Source backed by a remote repository pinned at `revision`.
    pub fn remote(
        name: impl Into<SourceId>,
        repo: impl Into<String>,
        revision: impl Into<Revision>,
        license: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            repo: repo.into(),
            revision: revision.into(),
            license: license.into(),
            root: default_root(),
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }

    /// Restrict a remote source to a sub-root of the checkout.
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    /// Replace the include globs.
    pub fn with_include(mut self, include: Vec<String>) -> Self {
        self.include = include;
        self
    }

    /// Replace the exclude globs.
    pub fn with_exclude(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        self
    }

    /// True when `root` is an absolute local path.
    pub fn is_local(&self) -> bool {
        Path::new(&self.root).is_absolute()
    }

    /// Logical path prefix applied to discovered files; empty for local and whole-checkout roots.
    pub fn logical_prefix(&self) -> String {
        if self.is_local() {
            return String::new();
        }
        let mut prefix = self.root.trim();
        while let Some(rest) = prefix.strip_prefix("./") {
            prefix = rest;
        }
        let prefix = prefix.trim_matches('/');
        if prefix == CHECKOUT_ROOT {
            String::new()
        } else {
            prefix.to_string()
        }
    }

    fn validate(&self) -> Result<(), CorpusError> {
        if self.name.trim().is_empty() {
            return Err(CorpusError::Configuration("source name must not be empty".into()));
        }
        if self.license.trim().is_empty() {
            return Err(CorpusError::Configuration(format!(
                "source '{}' is missing a license",
                self.name
            )));
        }
        if self.root.trim().is_empty() {
            return Err(CorpusError::Configuration(format!(
                "source '{}' is missing a root",
                self.name
            )));
        }
        if !self.is_local() {
            if self.repo.trim().is_empty() {
                return Err(CorpusError::Configuration(format!(
                    "source '{}' has a relative root but no repository",
                    self.name
                )));
            }
            if self.revision.trim().is_empty() {
                return Err(CorpusError::Configuration(format!(
                    "source '{}' is missing a pinned revision",
                    self.name
                )));
            }
        }
        for pattern in self.include.iter().chain(&self.exclude) {
            glob::Pattern::new(pattern).map_err(|err| {
                CorpusError::Configuration(format!(
                    "source '{}' has an invalid glob '{pattern}': {err}",
                    self.name
                ))
            })?;
        }
        Ok(())
    }
}

/// Acceptable `[min, max]` share of the final record count for one category.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BalanceRange {
    /// Lowest acceptable share.
    pub min: f64,
    /// Highest acceptable share; also the balance cap.
    pub max: f64,
}

impl BalanceRange {
    /// Range `[min, max]`; checked by [`BuildConfig::validate`].
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// True when `share` lies inside the range.
    pub fn contains(&self, share: f64) -> bool {
        share >= self.min && share <= self.max
    }
}

/// Top-level build configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Dataset version label recorded in the report.
    pub dataset_version: String,
    /// Collection date (`YYYY-MM-DD`).
    pub collection_date: String,
    /// Seed for split assignment and QA sampling order.
    pub seed: u64,
    /// Minimum whitespace-separated words for a document to be kept.
    pub min_words: usize,
    /// Minimum characters for a document to be kept.
    pub min_chars: usize,
    /// Jaccard similarity at or above which a document is a near duplicate.
    pub near_duplicate_threshold: f64,
    /// Maximum share of readme-like records; values outside (0, 1) disable the cap.
    pub max_readme_share: f64,
    /// QA sample size per category.
    pub qa_per_category: usize,
    /// Accepted licenses (case-insensitive, trimmed).
    pub license_allowlist: Vec<String>,
    /// Directory holding cached source mirrors.
    pub cache_dir: PathBuf,
    /// Pinned sources, resolved in this order.
    pub sources: Vec<SourceSpec>,
    /// Per-category balance ranges keyed by category name.
    pub balance: BTreeMap<String, BalanceRange>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            dataset_version: String::new(),
            collection_date: String::new(),
            seed: defaults::SEED,
            min_words: defaults::MIN_WORDS,
            min_chars: defaults::MIN_CHARS,
            near_duplicate_threshold: defaults::NEAR_DUPLICATE_THRESHOLD,
            max_readme_share: defaults::MAX_README_SHARE,
            qa_per_category: defaults::QA_PER_CATEGORY,
            license_allowlist: Vec::new(),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            sources: Vec::new(),
            balance: BTreeMap::new(),
        }
    }
}

impl BuildConfig {
    /// Parse and validate a TOML configuration document.
    pub fn from_toml_str(raw: &str) -> Result<Self, CorpusError> {
        let config: BuildConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CorpusError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    /// Check every configuration invariant. Runs before any IO.
    pub fn validate(&self) -> Result<(), CorpusError> {
        if self.dataset_version.trim().is_empty() {
            return Err(CorpusError::Configuration("dataset_version must not be empty".into()));
        }
        NaiveDate::parse_from_str(&self.collection_date, "%Y-%m-%d").map_err(|_| {
            CorpusError::Configuration(format!(
                "collection_date '{}' is not a YYYY-MM-DD date",
                self.collection_date
            ))
        })?;
        if !(0.0..=1.0).contains(&self.near_duplicate_threshold) {
            return Err(CorpusError::Configuration(
                "near_duplicate_threshold must be within [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.max_readme_share) {
            return Err(CorpusError::Configuration(
                "max_readme_share must be within [0, 1]".into(),
            ));
        }
        if self.license_allowlist.iter().all(|license| license.trim().is_empty()) {
            return Err(CorpusError::Configuration(
                "license_allowlist must not be empty".into(),
            ));
        }
        let mut seen = HashSet::new();
        for source in &self.sources {
            source.validate()?;
            if !seen.insert(source.name.as_str()) {
                return Err(CorpusError::Configuration(format!(
                    "duplicate source name '{}'",
                    source.name
                )));
            }
        }
        self.balance_ranges()?;
        Ok(())
    }

    /// Balance ranges keyed by parsed category.
    pub fn balance_ranges(&self) -> Result<BTreeMap<Category, BalanceRange>, CorpusError> {
        let mut ranges = BTreeMap::new();
        for (name, range) in &self.balance {
            let category: Category = name.parse()?;
            let in_unit = |value: f64| (0.0..=1.0).contains(&value);
            if !in_unit(range.min) || !in_unit(range.max) || range.min > range.max {
                return Err(CorpusError::Configuration(format!(
                    "balance range for '{category}' must satisfy 0 <= min <= max <= 1"
                )));
            }
            ranges.insert(category, *range);
        }
        Ok(ranges)
    }

    /// True when `license` is on the allowlist (case-insensitive, trimmed).
    pub fn license_allowed(&self, license: &str) -> bool {
        let license = license.trim().to_lowercase();
        self.license_allowlist
            .iter()
            .any(|allowed| allowed.trim().to_lowercase() == license)
    }
}
