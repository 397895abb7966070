use glob::Pattern;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::constants::collector::{MARKDOWN_EXTENSIONS, VCS_DIR};
use crate::errors::CorpusError;
use crate::types::PathString;

/// A markdown file found under a resolved root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Absolute (or root-joined) filesystem path.
    pub path: PathBuf,
    /// `/`-separated path relative to the scanned root.
    pub relative: PathString,
}

/// Filesystem transport that enumerates markdown documents under a root.
pub struct MarkdownWalk {
    root: PathBuf,
}

impl MarkdownWalk {
    /// Create a walker rooted at `root` (a directory or a single file).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Markdown files in file-name order, skipping `.git` directories; a file root
    /// yields itself when it matches.
    pub fn files(&self) -> Result<Vec<DiscoveredFile>, CorpusError> {
        if self.root.is_file() {
            let relative = self
                .root
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            return Ok(is_markdown_file(&self.root)
                .then(|| DiscoveredFile {
                    path: self.root.clone(),
                    relative,
                })
                .into_iter()
                .collect());
        }
        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || entry.file_name() != VCS_DIR);
        for entry in walker {
            let entry = entry.map_err(|err| {
                CorpusError::Io(err.into_io_error().unwrap_or_else(|| {
                    std::io::Error::other(format!("walk failed under {}", self.root.display()))
                }))
            })?;
            if !entry.file_type().is_file() || !is_markdown_file(entry.path()) {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .map(to_logical_path)
                .unwrap_or_else(|_| to_logical_path(entry.path()));
            files.push(DiscoveredFile {
                path: entry.path().to_path_buf(),
                relative,
            });
        }
        Ok(files)
    }
}

/// True if the path has a markdown extension (case-insensitive).
pub fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            MARKDOWN_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Join path components with `/` regardless of platform.
pub fn to_logical_path(path: &Path) -> PathString {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Prefix a root-relative path with the source's logical prefix.
pub fn join_logical(prefix: &str, relative: &str) -> PathString {
    if prefix.is_empty() {
        relative.to_string()
    } else if relative.is_empty() {
        prefix.to_string()
    } else {
        format!("{prefix}/{relative}")
    }
}

/// Include/exclude glob filter over logical paths.
#[derive(Clone, Debug, Default)]
pub struct GlobFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl GlobFilter {
    /// Compile include and exclude patterns.
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, CorpusError> {
        let compile = |patterns: &[String]| {
            patterns
                .iter()
                .map(|pattern| {
                    Pattern::new(pattern).map_err(|err| {
                        CorpusError::Configuration(format!("invalid glob '{pattern}': {err}"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()
        };
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    /// True when the path matches some include (or none are set) and no exclude.
    pub fn allows(&self, logical_path: &str) -> bool {
        let included = self.include.is_empty()
            || self
                .include
                .iter()
                .any(|pattern| pattern.matches(logical_path));
        included
            && !self
                .exclude
                .iter()
                .any(|pattern| pattern.matches(logical_path))
    }
}
