//! Parallel repository discovery.
//!
//! Each root is walked with `ignore`'s parallel walker. The per-directory
//! visitor returns a [`Visit`]; `PruneSubtree` stops descent immediately, so
//! hidden directories and the insides of repositories are never read.
//! Workers hand discovered repositories to the consumer through a bounded
//! channel, and the consumer may stop at any time by dropping the
//! [`RepoWalk`].

use ignore::{DirEntry, WalkBuilder, WalkState};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, trace};

use super::RepositoryRecord;
use crate::error::{Error, Result};

/// Default capacity of the discovery channel
pub const DEFAULT_CHANNEL_CAPACITY: usize = 8;

/// Default entry marking a repository boundary
pub const DEFAULT_MARKER: &str = ".git";

/// Walker settings
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Entry names whose presence makes a directory a repository
    pub markers: Vec<String>,
    /// Worker threads per root (0 = choose automatically)
    pub threads: usize,
    /// Capacity of the discovery channel
    pub channel_capacity: usize,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            markers: vec![DEFAULT_MARKER.to_string()],
            threads: 0,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// What the walker should do after visiting a directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// Descend into the directory
    Continue,
    /// Do not read anything below this directory
    PruneSubtree,
}

impl From<Visit> for WalkState {
    fn from(visit: Visit) -> Self {
        match visit {
            Visit::Continue => WalkState::Continue,
            Visit::PruneSubtree => WalkState::Skip,
        }
    }
}

/// Classification of one directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirKind {
    /// Name starts with a dot (never applies to the root itself)
    Hidden,
    /// Contains a repository marker
    Repository,
    Plain,
}

/// Classify a directory at `depth` below its workspace root.
///
/// Hidden directories are pruned before the marker check, so `.cache/x/.git`
/// is never found.
pub fn classify_dir(path: &Path, depth: usize, markers: &[String]) -> DirKind {
    let hidden = depth > 0
        && path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with('.'));
    if hidden {
        DirKind::Hidden
    } else if markers.iter().any(|marker| path.join(marker).exists()) {
        DirKind::Repository
    } else {
        DirKind::Plain
    }
}

/// Iterator over repositories discovered by a background walk.
///
/// Dropping it stops the walk: workers see the closed channel, quit, and
/// the walk thread is joined.
pub struct RepoWalk {
    rx: Option<Receiver<Result<RepositoryRecord>>>,
    handle: Option<JoinHandle<()>>,
}

impl Iterator for RepoWalk {
    type Item = Result<RepositoryRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rx.as_ref()?.recv().ok()
    }
}

impl Drop for RepoWalk {
    fn drop(&mut self) {
        drop(self.rx.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Start walking `roots` in order on a background thread.
///
/// An I/O error under one root is delivered as [`Error::WalkFailure`] and
/// ends that root's walk; the next root is still walked.
pub fn walk_repositories(roots: Vec<PathBuf>, options: WalkOptions) -> RepoWalk {
    let (tx, rx) = mpsc::sync_channel(options.channel_capacity.max(1));

    let handle = thread::spawn(move || {
        for root in &roots {
            if !walk_root(root, &options, &tx) {
                debug!("repository walk cancelled");
                break;
            }
        }
    });

    RepoWalk {
        rx: Some(rx),
        handle: Some(handle),
    }
}

/// Walk one root. Returns false once the consumer has gone away.
fn walk_root(root: &Path, options: &WalkOptions, tx: &SyncSender<Result<RepositoryRecord>>) -> bool {
    debug!(root = %root.display(), "walking workspace root");

    let disconnected = Arc::new(AtomicBool::new(false));
    let markers: Arc<[String]> = options.markers.clone().into();

    WalkBuilder::new(root)
        .hidden(false)
        .ignore(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .parents(false)
        .follow_links(false)
        .threads(options.threads)
        .build_parallel()
        .run(|| {
            let tx = tx.clone();
            let root = root.to_path_buf();
            let markers = Arc::clone(&markers);
            let disconnected = Arc::clone(&disconnected);

            Box::new(move |result: std::result::Result<DirEntry, ignore::Error>| {
                if disconnected.load(Ordering::Relaxed) {
                    return WalkState::Quit;
                }

                let entry = match result {
                    Ok(entry) => entry,
                    Err(source) => {
                        let failure = Error::WalkFailure {
                            root: root.clone(),
                            source,
                        };
                        if tx.send(Err(failure)).is_err() {
                            disconnected.store(true, Ordering::Relaxed);
                        }
                        return WalkState::Quit;
                    }
                };

                if !entry.file_type().is_some_and(|ft| ft.is_dir()) {
                    return WalkState::Continue;
                }

                let visit = match classify_dir(entry.path(), entry.depth(), &markers) {
                    DirKind::Plain => Visit::Continue,
                    DirKind::Hidden => {
                        trace!(path = %entry.path().display(), "skipping hidden directory");
                        Visit::PruneSubtree
                    }
                    DirKind::Repository => {
                        let record = RepositoryRecord::new(&root, entry.path());
                        debug!(repo = %record.relative_name, "found repository");
                        if tx.send(Ok(record)).is_err() {
                            disconnected.store(true, Ordering::Relaxed);
                            return WalkState::Quit;
                        }
                        Visit::PruneSubtree
                    }
                };
                visit.into()
            })
        });

    !disconnected.load(Ordering::Relaxed)
}
