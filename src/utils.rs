//! Text normalization helpers shared by the collector and deduplicator.

use std::collections::HashSet;
use std::path::Path;

use crate::constants::collector::README_STEM_PREFIX;

/// CRLF to LF, strip trailing whitespace per line, trim the whole document.
pub fn normalize_document<T: AsRef<str>>(text: T) -> String {
    let unified = text.as_ref().replace("\r\n", "\n");
    let lines: Vec<&str> = unified.lines().map(str::trim_end).collect();
    lines.join("\n").trim().to_string()
}

/// Whitespace-separated word count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Unicode scalar count.
pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

/// Lower-cased alphanumeric runs, used for Jaccard comparison.
pub fn token_set(text: &str) -> HashSet<String> {
    text.split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Text of the first ATX heading (`# Title`), if any.
pub fn first_heading(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim_start)
        .find(|line| line.starts_with('#'))
        .map(|line| {
            line.trim_start_matches('#')
                .trim()
                .trim_end_matches('#')
                .trim()
                .to_string()
        })
        .filter(|heading| !heading.is_empty())
}

/// True for `README*` style file names.
pub fn is_readme_like(path: &Path) -> bool {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| stem.to_lowercase().starts_with(README_STEM_PREFIX))
        .unwrap_or(false)
}
