use std::collections::BTreeMap;

use crate::taxonomy::Category;

/// Fraction `count / total`, or `0.0` when `total` is zero.
pub fn share(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

/// Per-category counts with every known category present.
pub fn category_counts(
    categories: impl IntoIterator<Item = Category>,
) -> BTreeMap<Category, usize> {
    let mut counts: BTreeMap<Category, usize> =
        Category::ALL.into_iter().map(|category| (category, 0)).collect();
    for category in categories {
        *counts.entry(category).or_default() += 1;
    }
    counts
}
