// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Decides whether a target must rebuild given its deps and filesystem state.

use crate::action::Action;
use crate::fs::FileSystem;
use crate::resolver::{ResolutionEntry, ResolutionMap};

/// Returns true iff `target` must be (re)built.
///
/// A target is stale when:
/// - it does not exist on disk, or
/// - `always_make` is set and the target has any dep or an action (a leaf
///   entry with neither is never force-rebuilt), or
/// - any non-task dep is newer than the target.
///
/// Tasks are never consulted as a staleness source: a task dep is always
/// treated as up to date for the purposes of this check.
#[must_use]
pub fn should_build(
    target: &str,
    entry: &ResolutionEntry,
    map: &ResolutionMap,
    fs: &dyn FileSystem,
    always_make: bool,
) -> bool {
    if !fs.exists(target) {
        return true;
    }

    if always_make {
        return !entry.depends.is_empty() || entry.action.is_some();
    }

    let Some(target_mtime) = fs.mtime_ns(target) else {
        return true;
    };

    entry.depends.iter().any(|dep| {
        let dep_is_task = map.get(dep).and_then(|e| e.action.as_ref()).is_some_and(Action::is_task);
        !dep_is_task && fs.mtime_ns(dep).is_some_and(|dep_mtime| dep_mtime > target_mtime)
    })
}
