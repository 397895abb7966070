use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::SourceSpec;
use crate::constants::resolver::{DEFAULT_REMOTE_SCHEME, GIT_SUFFIX};
use crate::errors::CorpusError;
use crate::hash::cache_key;
use crate::source::git::{GitFailure, GitRunner};
use crate::types::RemoteUrl;

/// Whether resolution may touch the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FetchPolicy {
    /// Clone and fetch as needed.
    #[default]
    Allow,
    /// Only use mirrors and revisions already present in the cache.
    Offline,
}

/// Canonical, scheme-qualified, `.git`-suffixed form of a remote locator.
///
/// `github.com/org/repo`, `https://github.com/org/repo`, and
/// `git@github.com:org/repo.git` all map to `https://github.com/org/repo.git`.
pub fn normalize_remote(repo: &str) -> Result<RemoteUrl, CorpusError> {
    let trimmed = repo.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(CorpusError::Configuration(
            "repository locator must not be empty".into(),
        ));
    }
    if trimmed.starts_with("file://") {
        return Ok(trimmed.to_string());
    }
    let qualified = if let Some(rest) = trimmed.strip_prefix("ssh://") {
        let rest = rest.split_once('@').map(|(_, tail)| tail).unwrap_or(rest);
        let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
        let host = authority.split(':').next().unwrap_or(authority);
        format!("{DEFAULT_REMOTE_SCHEME}{host}/{path}")
    } else if let Some(rest) = scp_like(trimmed) {
        let (host, path) = rest;
        format!("{DEFAULT_REMOTE_SCHEME}{host}/{}", path.trim_start_matches('/'))
    } else if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        trimmed.to_string()
    } else {
        format!("{DEFAULT_REMOTE_SCHEME}{trimmed}")
    };
    let qualified = qualified.trim_end_matches('/');
    if qualified.ends_with(GIT_SUFFIX) {
        Ok(qualified.to_string())
    } else {
        Ok(format!("{qualified}{GIT_SUFFIX}"))
    }
}

/// Split `user@host:path` into `(host, path)`.
fn scp_like(value: &str) -> Option<(&str, &str)> {
    if value.contains("://") {
        return None;
    }
    let (user_host, path) = value.split_once(':')?;
    let (_, host) = user_host.split_once('@')?;
    Some((host, path))
}

/// Resolves source specs to local directories through a mirror cache.
///
/// Local sources are used as-is. Remote sources are cloned once per canonical
/// remote into `<cache_dir>/<cache_key>`, fetched only when the pinned
/// revision is missing, and force-checked-out (detached) to that revision on
/// every resolution. Checkout is local, so a warm cache never touches the
/// network.
pub struct SourceResolver<G: GitRunner> {
    git: G,
    policy: FetchPolicy,
}

impl<G: GitRunner> SourceResolver<G> {
    /// Create a resolver over `git` with the default fetch policy.
    pub fn new(git: G) -> Self {
        Self {
            git,
            policy: FetchPolicy::default(),
        }
    }

    /// Override the fetch policy.
    pub fn with_policy(mut self, policy: FetchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Local directory holding `source`'s configured root at its pinned revision.
    pub fn resolve(&self, source: &SourceSpec, cache_dir: &Path) -> Result<PathBuf, CorpusError> {
        if source.is_local() {
            let root = PathBuf::from(&source.root);
            if !root.exists() {
                return Err(CorpusError::LocalRootNotFound {
                    source_id: source.name.clone(),
                    path: source.root.clone(),
                });
            }
            debug!(source_id = %source.name, root = %root.display(), "using local source root");
            return Ok(root);
        }

        let remote = normalize_remote(&source.repo)?;
        let mirror = cache_dir.join(cache_key(&remote));
        let revision = source.revision.trim();

        if !mirror.join(".git").exists() {
            self.require_network(source)?;
            fs::create_dir_all(cache_dir)?;
            info!(
                source_id = %source.name,
                remote = %remote,
                mirror = %mirror.display(),
                "cloning source mirror"
            );
            let target = mirror.to_string_lossy();
            self.git
                .run(&["clone", "--no-checkout", remote.as_str(), target.as_ref()], None)
                .map_err(|failure| map_failure(source, &remote, failure))?;
        }

        let commit = match self.local_commit(&mirror, revision)? {
            Some(commit) => {
                debug!(source_id = %source.name, revision, "pinned revision already cached");
                commit
            }
            None => {
                self.require_network(source)?;
                info!(source_id = %source.name, revision, "fetching pinned revision");
                let refspec = format!("+{revision}:{}", pinned_ref(revision));
                self.git
                    .run(
                        &["fetch", "--depth", "1", "origin", refspec.as_str()],
                        Some(&mirror),
                    )
                    .map_err(|failure| map_failure(source, &remote, failure))?;
                self.local_commit(&mirror, revision)?
                    .ok_or_else(|| CorpusError::RevisionNotFound {
                        source_id: source.name.clone(),
                        revision: revision.to_string(),
                    })?
            }
        };

        // A `--no-checkout` clone leaves HEAD on the default branch with an empty
        // work tree, so a matching HEAD says nothing about the files on disk.
        debug!(source_id = %source.name, commit = %commit, "checking out pinned revision");
        self.git
            .run(&["checkout", "--force", "--detach", commit.as_str()], Some(&mirror))
            .map_err(|failure| map_failure(source, &remote, failure))?;

        let root = mirror.join(source.logical_prefix());
        if !root.exists() {
            return Err(CorpusError::LocalRootNotFound {
                source_id: source.name.clone(),
                path: root.to_string_lossy().into_owned(),
            });
        }
        Ok(root)
    }

    fn require_network(&self, source: &SourceSpec) -> Result<(), CorpusError> {
        match self.policy {
            FetchPolicy::Allow => Ok(()),
            FetchPolicy::Offline => Err(CorpusError::RevisionNotCached {
                source_id: source.name.clone(),
                revision: source.revision.clone(),
            }),
        }
    }

    /// Commit id for `revision` if the mirror already holds it.
    fn local_commit(&self, mirror: &Path, revision: &str) -> Result<Option<String>, CorpusError> {
        for candidate in [revision.to_string(), pinned_ref(revision)] {
            let spec = format!("{candidate}^{{commit}}");
            match self
                .git
                .run(&["rev-parse", "--verify", "--quiet", spec.as_str()], Some(mirror))
            {
                Ok(commit) if !commit.is_empty() => return Ok(Some(commit)),
                Ok(_) => continue,
                Err(GitFailure::Io(err)) => return Err(CorpusError::Io(err)),
                Err(_) => continue,
            }
        }
        Ok(None)
    }
}

/// Local ref that keeps a fetched revision reachable across builds.
fn pinned_ref(revision: &str) -> String {
    format!("refs/corpus-pins/{revision}")
}

fn map_failure(source: &SourceSpec, remote: &str, failure: GitFailure) -> CorpusError {
    match failure {
        GitFailure::RepositoryMissing { .. } => CorpusError::RepositoryNotFound {
            source_id: source.name.clone(),
            remote: remote.to_string(),
        },
        GitFailure::RevisionMissing { .. } => CorpusError::RevisionNotFound {
            source_id: source.name.clone(),
            revision: source.revision.clone(),
        },
        GitFailure::Network { stderr } => CorpusError::Network {
            source_id: source.name.clone(),
            details: stderr,
        },
        GitFailure::Command {
            command, stderr, ..
        } => CorpusError::Git {
            source_id: source.name.clone(),
            command,
            stderr,
        },
        GitFailure::Io(err) => CorpusError::Io(err),
    }
}
