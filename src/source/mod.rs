//! Source resolution: pinned remote repositories and local roots.
//!
//! Ownership model:
//! - `GitRunner` is the only seam that touches version control.
//! - `SourceResolver` owns cache layout and fetch decisions; the cache
//!   directory is passed into every call rather than held globally.

/// Version-control capability and failure classification.
pub mod git;
/// Mirror cache resolution of source specs.
pub mod resolver;

pub use git::{GitFailure, GitRunner, SystemGit};
pub use resolver::{FetchPolicy, SourceResolver, normalize_remote};
