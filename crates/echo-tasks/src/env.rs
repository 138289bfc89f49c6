// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Parent-chained, copy-on-read scoped environment.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use indexmap::IndexMap;

use crate::error::TasksError;
use crate::value::Value;

#[derive(Default)]
struct EnvState {
    local: IndexMap<String, Value>,
    removed: HashSet<String>,
}

/// A scoped key/value store with parent chaining and copy-on-read for
/// mutable container values.
///
/// Every resolved target gets its own child `Env`; resolver callbacks read
/// and write it freely, and those writes are visible only to that target's
/// own subtree (its children, created after the write, see it through the
/// parent chain; siblings created from a different ancestor never do).
pub struct Env {
    state: Mutex<EnvState>,
    parent: Option<Arc<Env>>,
}

impl Env {
    /// Creates a fresh root environment with no parent.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(EnvState::default()),
            parent: None,
        })
    }

    /// Creates a root environment pre-populated with `entries`.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = (String, Value)>) -> Arc<Self> {
        let env = Self::new();
        for (k, v) in entries {
            env.set(&k, v);
        }
        env
    }

    /// Returns a fresh child of this environment.
    #[must_use]
    pub fn make_child(self: &Arc<Self>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(EnvState::default()),
            parent: Some(Arc::clone(self)),
        })
    }

    /// Looks up `key`, walking the parent chain if not found locally.
    ///
    /// If `key` is tombstoned in this scope, lookup fails even if a parent
    /// still has a live entry. If the value is resolved through a parent and
    /// is a mutable container ([`Value::is_mutable`]), a shallow copy is
    /// cached in this scope before being returned, so later mutation (via
    /// [`Env::set`] after reading) is isolated from the parent and from
    /// sibling scopes.
    ///
    /// # Errors
    ///
    /// Returns [`TasksError::NotFound`] if `key` is tombstoned locally, or is
    /// absent from this scope and every ancestor.
    pub fn get(&self, key: &str) -> Result<Value, TasksError> {
        {
            let state = self.lock();
            if state.removed.contains(key) {
                return Err(TasksError::NotFound(key.to_string()));
            }
            if let Some(v) = state.local.get(key) {
                return Ok(v.clone());
            }
        }

        let Some(parent) = &self.parent else {
            return Err(TasksError::NotFound(key.to_string()));
        };
        let value = parent.get(key)?;
        if value.is_mutable() {
            self.lock().local.insert(key.to_string(), value.clone());
        }
        Ok(value)
    }

    /// Writes `value` into this scope, clearing any tombstone for `key`.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let mut state = self.lock();
        state.removed.remove(key);
        state.local.insert(key.to_string(), value.into());
    }

    /// Tombstones `key` in this scope: subsequent lookups fail even though
    /// an ancestor may still carry a live value.
    pub fn delete(&self, key: &str) {
        let mut state = self.lock();
        state.local.shift_remove(key);
        state.removed.insert(key.to_string());
    }

    /// Reads `key` (performing copy-on-read as [`Env::get`] does), applies
    /// `f` to a mutable borrow, and writes the result back into this scope.
    /// Missing keys start from `default`. A convenience for the common
    /// `env[k] += [...]` style of resolver callback.
    pub fn update(&self, key: &str, default: impl FnOnce() -> Value, f: impl FnOnce(&mut Value)) {
        let mut value = self.get(key).unwrap_or_else(|_| default());
        f(&mut value);
        self.set(key, value);
    }

    /// All entries visible from this scope: local entries, shadowing
    /// whatever an ancestor defines for the same key, plus any live
    /// ancestor entry not shadowed or tombstoned here.
    #[must_use]
    pub fn items(&self) -> IndexMap<String, Value> {
        let (mut result, removed) = {
            let state = self.lock();
            (state.local.clone(), state.removed.clone())
        };
        if let Some(parent) = &self.parent {
            for (k, v) in parent.items() {
                if !removed.contains(&k) {
                    result.entry(k).or_insert(v);
                }
            }
        }
        result
    }

    /// Entries that differ from this scope's parent, plus tombstones
    /// (reported as `None`). On a root scope every local entry counts as
    /// differing.
    #[must_use]
    pub fn local_items(&self) -> Vec<(String, Option<Value>)> {
        let state = self.lock();
        let mut out = Vec::with_capacity(state.local.len() + state.removed.len());
        for (k, v) in &state.local {
            let differs = match &self.parent {
                Some(parent) => parent.get(k).ok().as_ref() != Some(v),
                None => true,
            };
            if differs {
                out.push((k.clone(), Some(v.clone())));
            }
        }
        for k in &state.removed {
            out.push((k.clone(), None));
        }
        out
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, EnvState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("Env")
            .field("local_keys", &state.local.keys().collect::<Vec<_>>())
            .field("tombstones", &state.removed)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}
