//! Fixed category set and the heuristic classifier contract.
//!
//! Classification is a plain string-matching decision table over the logical
//! path and first heading. Callers may substitute their own table through the
//! [`Classifier`] callback; the pipeline only depends on the contract.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::errors::CorpusError;

/// Document category. Declaration order is the canonical category order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Step-by-step learning material.
    Tutorial,
    /// Task-focused guides.
    HowTo,
    /// API, CLI and configuration reference.
    Reference,
    /// Explanations and architecture overviews.
    Concept,
    /// FAQs and known problems.
    Troubleshooting,
    /// Changelogs and release notes.
    ReleaseNotes,
    /// Anything no rule matched.
    Other,
}

impl Category {
    /// Every category in canonical order.
    pub const ALL: [Category; 7] = [
        Category::Tutorial,
        Category::HowTo,
        Category::Reference,
        Category::Concept,
        Category::Troubleshooting,
        Category::ReleaseNotes,
        Category::Other,
    ];

    /// Stable snake_case label (matches the serialized form).
    pub const fn as_str(&self) -> &'static str {
        match self {
            Category::Tutorial => "tutorial",
            Category::HowTo => "how_to",
            Category::Reference => "reference",
            Category::Concept => "concept",
            Category::Troubleshooting => "troubleshooting",
            Category::ReleaseNotes => "release_notes",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CorpusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let needle = value.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == needle)
            .ok_or_else(|| CorpusError::Configuration(format!("unknown category '{value}'")))
    }
}

/// Maps a logical path and optional first heading to a category.
pub type Classifier = Arc<dyn Fn(&str, Option<&str>) -> Category + Send + Sync + 'static>;

/// Default classifier backed by [`classify_document`].
pub fn default_classifier() -> Classifier {
    Arc::new(classify_document)
}

const PATH_RULES: &[(&[&str], Category)] = &[
    (&["changelog", "release-notes", "release_notes", "releases", "news"], Category::ReleaseNotes),
    (&["troubleshoot", "faq", "debugging", "known-issues"], Category::Troubleshooting),
    (
        &["tutorial", "getting-started", "getting_started", "quickstart", "learn"],
        Category::Tutorial,
    ),
    (&["how-to", "howto", "how_to", "guides", "recipes", "cookbook"], Category::HowTo),
    (&["reference", "/api/", "api-reference", "cli", "config"], Category::Reference),
    (&["concept", "architecture", "overview", "explanation", "design"], Category::Concept),
];

const HEADING_RULES: &[(&[&str], Category)] = &[
    (&["changelog", "release notes", "what's new"], Category::ReleaseNotes),
    (&["troubleshooting", "faq", "common errors"], Category::Troubleshooting),
    (&["tutorial", "getting started", "quickstart"], Category::Tutorial),
    (&["how to", "how-to"], Category::HowTo),
    (&["reference", "api", "options"], Category::Reference),
    (&["overview", "architecture", "concepts", "introduction"], Category::Concept),
];

/// First-match decision table: path rules, then heading rules, then `Other`.
pub fn classify_document(path: &str, heading: Option<&str>) -> Category {
    let path = format!("/{}", path.to_lowercase());
    if let Some(category) = first_match(&path, PATH_RULES) {
        return category;
    }
    heading
        .map(str::to_lowercase)
        .and_then(|heading| first_match(&heading, HEADING_RULES))
        .unwrap_or(Category::Other)
}

fn first_match(haystack: &str, rules: &[(&[&str], Category)]) -> Option<Category> {
    rules
        .iter()
        .find(|(needles, _)| needles.iter().any(|needle| haystack.contains(needle)))
        .map(|(_, category)| *category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_labels_round_trip_through_from_str() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert!(" How_To ".parse::<Category>().is_ok());
        assert!("poetry".parse::<Category>().is_err());
    }

    #[test]
    fn canonical_order_follows_declaration() {
        let mut sorted = Category::ALL;
        sorted.sort();
        assert_eq!(sorted, Category::ALL);
    }

    #[test]
    fn path_rules_take_precedence_over_heading() {
        assert_eq!(
            classify_document("docs/CHANGELOG.md", Some("Getting started")),
            Category::ReleaseNotes
        );
        assert_eq!(
            classify_document("docs/guides/deploy.md", None),
            Category::HowTo
        );
    }

    #[test]
    fn heading_rules_apply_when_path_is_neutral() {
        assert_eq!(
            classify_document("docs/misc/page.md", Some("Troubleshooting builds")),
            Category::Troubleshooting
        );
        assert_eq!(classify_document("docs/misc/page.md", None), Category::Other);
    }

    #[test]
    fn category_serializes_as_snake_case() {
        let json = serde_json::to_string(&Category::ReleaseNotes).unwrap();
        assert_eq!(json, "\"release_notes\"");
    }
}
