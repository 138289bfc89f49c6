// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Single-threaded depth-first executor.

use std::collections::HashSet;

use super::run_target_action;
use crate::error::TasksError;
use crate::fs::FileSystem;
use crate::resolver::ResolutionMap;

/// Builds `target` and, transitively, every dependency it resolved to, each
/// visited at most once, depth first.
///
/// # Errors
///
/// Propagates whatever [`super::run_target_action`] returns for the first
/// target that fails.
pub fn execute(target: &str, map: &ResolutionMap, fs: &dyn FileSystem, always_make: bool) -> Result<(), TasksError> {
    let mut visited = HashSet::new();
    visit(target, map, fs, always_make, &mut visited)
}

fn visit(
    target: &str,
    map: &ResolutionMap,
    fs: &dyn FileSystem,
    always_make: bool,
    visited: &mut HashSet<String>,
) -> Result<(), TasksError> {
    visited.insert(target.to_string());

    let entry = map.get(target).ok_or_else(|| TasksError::NotFound(target.to_string()))?;
    for dep in &entry.depends {
        if !visited.contains(dep) {
            visit(dep, map, fs, always_make, visited)?;
        }
    }

    run_target_action(target, map, fs, always_make)
}
