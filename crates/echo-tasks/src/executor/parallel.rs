// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Ready-queue worker-pool executor: targets become eligible to run as soon
//! as every dependency they are waiting on has finished.

use std::collections::{HashMap, HashSet};
use std::sync::mpsc;

use rayon::ThreadPoolBuilder;
use tracing::{debug, error};

use super::run_target_action;
use crate::error::TasksError;
use crate::fs::FileSystem;
use crate::resolver::ResolutionMap;

/// Tracks readiness for a fan-out build of `map`: which targets are still
/// waiting on dependencies, which dependents a finished target should wake,
/// and which targets are currently eligible to run.
struct Controller<'a> {
    map: &'a ResolutionMap,
    waiting: HashMap<String, HashSet<String>>,
    rev_waiting: HashMap<String, HashSet<String>>,
    pending: Vec<String>,
}

impl<'a> Controller<'a> {
    fn new(map: &'a ResolutionMap) -> Self {
        Self { map, waiting: HashMap::new(), rev_waiting: HashMap::new(), pending: Vec::new() }
    }

    /// Registers `target` and, transitively, every dependency it resolved
    /// to. A target already registered (waiting or pending) is a no-op.
    fn add_target(&mut self, target: &str) {
        if self.waiting.contains_key(target) || self.pending.iter().any(|t| t == target) {
            return;
        }
        let Some(entry) = self.map.get(target) else { return };
        let depends = entry.depends.clone();

        self.waiting.insert(target.to_string(), depends.iter().cloned().collect());
        for dep in &depends {
            self.rev_waiting.entry(dep.clone()).or_default().insert(target.to_string());
            self.add_target(dep);
        }

        self.check_depends(target);
    }

    /// Moves `target` from waiting to pending once it has no outstanding
    /// dependency left to wait on.
    fn check_depends(&mut self, target: &str) {
        if self.waiting.get(target).is_some_and(HashSet::is_empty) {
            self.waiting.remove(target);
            debug!(target, "execute.pending");
            self.pending.push(target.to_string());
        }
    }

    /// Wakes every target that was waiting on `target`.
    fn action_done(&mut self, target: &str) {
        let Some(rev_deps) = self.rev_waiting.remove(target) else { return };
        for rev_dep in rev_deps {
            if let Some(set) = self.waiting.get_mut(&rev_dep) {
                set.remove(target);
            }
            self.check_depends(&rev_dep);
        }
    }

    /// Drains ready targets across a bounded worker pool until none remain
    /// or one fails.
    ///
    /// A failure stops further submission and its error is returned once
    /// the targets already in flight finish; rayon gives no way to abort a
    /// task already running, so in-flight work always runs to completion.
    fn start(&mut self, fs: &(dyn FileSystem), jobs: usize, always_make: bool) -> Result<(), TasksError> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .map_err(|e| TasksError::Scheduler { reason: e.to_string() })?;

        let map = self.map;
        let (tx, rx) = mpsc::channel::<(String, Result<(), TasksError>)>();

        pool.scope(move |scope| {
            let mut in_flight = 0_usize;
            let mut first_error = None;

            loop {
                if first_error.is_none() {
                    for target in std::mem::take(&mut self.pending) {
                        debug!(target = %target, "execute.submit");
                        let tx = tx.clone();
                        in_flight += 1;
                        scope.spawn(move |_| {
                            let result = run_target_action(&target, map, fs, always_make);
                            let _ = tx.send((target, result));
                        });
                    }
                }

                if in_flight == 0 {
                    break;
                }

                let Ok((done_target, outcome)) = rx.recv() else { break };
                in_flight -= 1;

                match outcome {
                    Ok(()) => self.action_done(&done_target),
                    Err(err) => {
                        error!(target = %done_target, "execute.stop_all");
                        self.pending.clear();
                        first_error.get_or_insert(err);
                    }
                }
            }

            match first_error {
                Some(err) => Err(err),
                None => Ok(()),
            }
        })
    }
}

/// Builds `target` and its full dependency graph across up to `jobs`
/// concurrent workers, running every target as soon as its dependencies are
/// satisfied rather than in a single fixed order.
///
/// # Errors
///
/// - [`TasksError::Scheduler`] if the worker pool could not be created.
/// - Otherwise, the first error any worker's [`super::run_target_action`]
///   call returned.
pub fn execute_parallel(
    target: &str,
    map: &ResolutionMap,
    fs: &dyn FileSystem,
    jobs: usize,
    always_make: bool,
) -> Result<(), TasksError> {
    let mut controller = Controller::new(map);
    controller.add_target(target);
    controller.start(fs, jobs, always_make)
}
