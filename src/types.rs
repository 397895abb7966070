/// Content-addressed record identifier (stable across builds).
/// Example: `3f1c0a9e...` (64 hex chars)
pub type RecordId = String;
/// Unique source name from the build configuration.
/// Examples: `rust-book`, `tokio-docs`
pub type SourceId = String;
/// Hex SHA-256 digest of a normalized document body.
pub type ContentHash = String;
/// Pinned version-control revision (commit, tag, or branch name).
/// Examples: `5f2b1c4`, `v1.2.0`
pub type Revision = String;
/// Logical, `/`-separated path of a document inside its source.
/// Example: `src/ch01-02-hello-world.md`
pub type PathString = String;
/// Canonical scheme-qualified remote locator.
/// Example: `https://github.com/rust-lang/book.git`
pub type RemoteUrl = String;
/// Human-readable balance diagnostic.
/// Example: `category 'reference' share 0.4500 outside [0.1000, 0.4000]`
pub type ViolationMessage = String;
