// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Building a resolved target: the sequential (DFS) and parallel
//! (ready-queue worker pool) executors, and the single-target action step
//! they both drive.

mod parallel;
mod sequential;

pub use parallel::execute_parallel;
pub use sequential::execute;

use tracing::info;

use crate::action::Action;
use crate::error::TasksError;
use crate::fs::FileSystem;
use crate::resolver::ResolutionMap;
use crate::staleness::should_build;

/// Builds `target` in isolation: if stale, runs its bound action; a
/// non-task target is then checked again and must no longer read as stale,
/// or the action is considered broken.
///
/// # Errors
///
/// - [`TasksError::NotFound`] if `target` is absent from `map`.
/// - [`TasksError::NoAction`] if `target` is stale but has no bound action.
/// - [`TasksError::ActionFailed`] if the bound action callback errors.
/// - [`TasksError::ActionNoResult`] if, after a successful non-task action,
///   the target still reads as stale.
pub(crate) fn run_target_action(
    target: &str,
    map: &ResolutionMap,
    fs: &dyn FileSystem,
    always_make: bool,
) -> Result<(), TasksError> {
    let entry = map.get(target).ok_or_else(|| TasksError::NotFound(target.to_string()))?;
    info!(target, "execute.begin");

    if should_build(target, entry, map, fs, always_make) {
        let Some(action) = &entry.action else {
            return Err(TasksError::NoAction { target: target.to_string() });
        };

        info!(target, action = action.name(), "execute.action");
        action
            .call(&entry.env, &entry.depends, &entry.bindings)
            .map_err(|cause| TasksError::ActionFailed { target: target.to_string(), cause })?;
    }

    let is_task = entry.action.as_ref().is_some_and(Action::is_task);
    if !is_task && should_build(target, entry, map, fs, false) {
        return Err(TasksError::ActionNoResult { target: target.to_string() });
    }

    info!(target, "execute.finish");
    Ok(())
}
