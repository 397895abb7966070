use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tempfile::tempdir;

use corpora::source::normalize_remote;
use corpora::{CorpusError, FetchPolicy, GitFailure, GitRunner, SourceResolver, SourceSpec};

const COMMIT: &str = "0123456789abcdef0123456789abcdef01234567";

#[derive(Default)]
struct MirrorState {
    calls: Vec<Vec<String>>,
    fetched: bool,
}

/// Records every invocation and simulates a mirror that only learns the
/// pinned revision after a fetch.
#[derive(Clone, Default)]
struct RecordingGit {
    state: Rc<RefCell<MirrorState>>,
}

impl RecordingGit {
    fn calls(&self) -> Vec<Vec<String>> {
        self.state.borrow().calls.clone()
    }

    fn count(&self, verb: &str) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| call.first().map(String::as_str) == Some(verb))
            .count()
    }
}

impl GitRunner for RecordingGit {
    fn run(&self, args: &[&str], cwd: Option<&Path>) -> Result<String, GitFailure> {
        let mut state = self.state.borrow_mut();
        state.calls.push(args.iter().map(|arg| arg.to_string()).collect());
        match args {
            // Like real git, nothing reaches the work tree until checkout.
            ["clone", "--no-checkout", _, target] => {
                fs::create_dir_all(Path::new(target).join(".git"))?;
                Ok(String::new())
            }
            ["fetch", ..] => {
                state.fetched = true;
                Ok(String::new())
            }
            ["rev-parse", "--verify", "--quiet", _] if state.fetched => Ok(COMMIT.to_string()),
            ["rev-parse", "--verify", "--quiet", _] => Err(GitFailure::Command {
                command: args.join(" "),
                stderr: String::new(),
                exit_code: Some(1),
            }),
            ["checkout", "--force", "--detach", commit] => {
                assert_eq!(*commit, COMMIT);
                let mirror = cwd.expect("checkout runs inside the mirror");
                fs::create_dir_all(mirror.join("docs"))?;
                Ok(String::new())
            }
            other => panic!("unexpected git call: {other:?}"),
        }
    }
}

fn spec(repo: &str) -> SourceSpec {
    SourceSpec::remote("book", repo, "v1.2.0", "MIT").with_root("docs")
}

#[test]
fn second_resolution_reuses_the_cached_mirror() {
    let cache = tempdir().unwrap();
    let git = RecordingGit::default();
    let resolver = SourceResolver::new(git.clone());

    let first = resolver.resolve(&spec("github.com/org/book"), cache.path()).unwrap();
    assert_eq!(git.count("clone"), 1);
    assert_eq!(git.count("fetch"), 1);
    assert_eq!(git.count("checkout"), 1);
    assert!(first.ends_with("docs"));

    let before = git.calls().len();
    let second = resolver.resolve(&spec("github.com/org/book"), cache.path()).unwrap();
    assert_eq!(first, second);
    let repeat: Vec<Vec<String>> = git.calls()[before..].to_vec();
    assert!(
        repeat
            .iter()
            .all(|call| call[0] == "rev-parse" || call[0] == "checkout"),
        "unexpected calls on cache hit: {repeat:?}"
    );
    assert_eq!(git.count("clone"), 1);
    assert_eq!(git.count("fetch"), 1);
}

#[test]
fn checkout_runs_when_the_clone_already_has_the_revision() {
    let cache = tempdir().unwrap();
    let git = RecordingGit::default();
    // The pinned commit is the clone's HEAD, so no fetch is needed.
    git.state.borrow_mut().fetched = true;
    let root = SourceResolver::new(git.clone())
        .resolve(&spec("github.com/org/book"), cache.path())
        .unwrap();
    assert_eq!(git.count("fetch"), 0);
    assert_eq!(git.count("checkout"), 1);
    assert!(root.is_dir());
}

#[test]
fn equivalent_remote_spellings_share_one_mirror() {
    let cache = tempdir().unwrap();
    let git = RecordingGit::default();
    let resolver = SourceResolver::new(git.clone());

    let https = resolver
        .resolve(&spec("https://github.com/org/book"), cache.path())
        .unwrap();
    let scp = resolver
        .resolve(&spec("git@github.com:org/book.git"), cache.path())
        .unwrap();
    assert_eq!(https, scp);
    assert_eq!(git.count("clone"), 1);

    let clone = &git.calls()[0];
    assert_eq!(clone[2], normalize_remote("github.com/org/book").unwrap());
    let mirrors: Vec<PathBuf> = fs::read_dir(cache.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(mirrors.len(), 1);
}

#[test]
fn fetch_pins_the_revision_under_a_local_ref() {
    let cache = tempdir().unwrap();
    let git = RecordingGit::default();
    SourceResolver::new(git.clone())
        .resolve(&spec("github.com/org/book"), cache.path())
        .unwrap();
    let fetch = git
        .calls()
        .into_iter()
        .find(|call| call[0] == "fetch")
        .unwrap();
    assert_eq!(fetch.last().unwrap(), "+v1.2.0:refs/corpus-pins/v1.2.0");
}

#[test]
fn offline_resolution_uses_a_warm_cache_only() {
    let cache = tempdir().unwrap();
    let git = RecordingGit::default();

    let cold = SourceResolver::new(git.clone())
        .with_policy(FetchPolicy::Offline)
        .resolve(&spec("github.com/org/book"), cache.path())
        .unwrap_err();
    assert!(matches!(cold, CorpusError::RevisionNotCached { .. }));
    assert!(git.calls().is_empty());

    let warm = SourceResolver::new(git.clone())
        .resolve(&spec("github.com/org/book"), cache.path())
        .unwrap();
    let offline = SourceResolver::new(git.clone())
        .with_policy(FetchPolicy::Offline)
        .resolve(&spec("github.com/org/book"), cache.path())
        .unwrap();
    assert_eq!(warm, offline);
    assert_eq!(git.count("clone"), 1);
    assert_eq!(git.count("fetch"), 1);
}

#[test]
fn missing_root_inside_checkout_is_reported() {
    let cache = tempdir().unwrap();
    let resolver = SourceResolver::new(RecordingGit::default());
    let spec = SourceSpec::remote("book", "github.com/org/book", "v1.2.0", "MIT").with_root("site");
    let err = resolver.resolve(&spec, cache.path()).unwrap_err();
    assert!(matches!(err, CorpusError::LocalRootNotFound { .. }));
}
