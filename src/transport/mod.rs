/// Filesystem enumeration of markdown documents.
pub mod fs;
