// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Filesystem port: the one seam the staleness oracle and executors use to
//! ask "does this target exist, and when was it last modified".

use std::time::UNIX_EPOCH;

/// Minimal `stat`-based filesystem access. The core never reads file
/// contents — only existence and modification time, at nanosecond
/// granularity where the backing implementation can provide it.
pub trait FileSystem: Send + Sync {
    /// Whether `target` currently exists.
    fn exists(&self, target: &str) -> bool;

    /// The modification time of `target`, in nanoseconds since the Unix
    /// epoch, or `None` if it does not exist (or its mtime cannot be read).
    fn mtime_ns(&self, target: &str) -> Option<i128>;
}

/// The real filesystem, backed by `std::fs::metadata`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn exists(&self, target: &str) -> bool {
        std::path::Path::new(target).is_file()
    }

    fn mtime_ns(&self, target: &str) -> Option<i128> {
        let metadata = std::fs::metadata(target).ok()?;
        let modified = metadata.modified().ok()?;
        let since_epoch = modified.duration_since(UNIX_EPOCH).ok()?;
        Some(since_epoch.as_nanos() as i128)
    }
}

/// A test double with an in-memory table of `target -> mtime`. A target is
/// considered to exist iff it has an entry.
#[derive(Debug, Default, Clone)]
pub struct FakeFileSystem {
    mtimes: std::collections::HashMap<String, i128>,
}

impl FakeFileSystem {
    /// Creates an empty fake filesystem (nothing exists yet).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a fake filesystem from `(target, mtime_ns)` pairs.
    #[must_use]
    pub fn with_mtimes(entries: impl IntoIterator<Item = (&'static str, i128)>) -> Self {
        let mut fs = Self::new();
        for (target, mtime) in entries {
            fs.set_mtime(target, mtime);
        }
        fs
    }

    /// Records that `target` exists with the given modification time.
    pub fn set_mtime(&mut self, target: &str, mtime_ns: i128) {
        self.mtimes.insert(target.to_string(), mtime_ns);
    }

    /// Removes `target`, as if it had never been built.
    pub fn remove(&mut self, target: &str) {
        self.mtimes.remove(target);
    }
}

impl FileSystem for FakeFileSystem {
    fn exists(&self, target: &str) -> bool {
        self.mtimes.contains_key(target)
    }

    fn mtime_ns(&self, target: &str) -> Option<i128> {
        self.mtimes.get(target).copied()
    }
}
