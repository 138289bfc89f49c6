// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Callback contracts and the action wrapper bundled into a resolution.

use std::borrow::Cow;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::env::Env;
use crate::error::CallbackError;

/// A resolver callback: given the target's env, the dependency list to
/// append to, and its matched parameter bindings, may mutate `env` and must
/// append any dependencies it wants visited.
pub type DepsFn =
    dyn Fn(&Arc<Env>, &mut Vec<String>, &IndexMap<String, String>) -> Result<(), CallbackError>
        + Send
        + Sync;

/// An action callback: given the target's env, its (already-resolved)
/// dependency list, and its matched parameter bindings, produces the
/// target's output or performs its side effect. Its return value is
/// otherwise ignored.
pub type ActionFn =
    dyn Fn(&Arc<Env>, &[String], &IndexMap<String, String>) -> Result<(), CallbackError>
        + Send
        + Sync;

/// A registered action: the callback itself, whether it is a task (no
/// expected file output — never a staleness source), and a name for logging.
#[derive(Clone)]
pub struct Action {
    callback: Arc<ActionFn>,
    is_task: bool,
    name: Cow<'static, str>,
}

impl Action {
    /// Wraps `callback` as a non-task (file-producing) action.
    #[must_use]
    pub fn file(name: impl Into<Cow<'static, str>>, callback: Arc<ActionFn>) -> Self {
        Self { callback, is_task: false, name: name.into() }
    }

    /// Wraps `callback` as a task (side-effect-only, no file output).
    #[must_use]
    pub fn task(name: impl Into<Cow<'static, str>>, callback: Arc<ActionFn>) -> Self {
        Self { callback, is_task: true, name: name.into() }
    }

    /// Whether this action's timestamp should never be consulted for
    /// staleness.
    #[must_use]
    pub fn is_task(&self) -> bool {
        self.is_task
    }

    /// The callback's registered name, used in logging.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invokes the wrapped callback.
    ///
    /// # Errors
    ///
    /// Propagates whatever the callback itself returns.
    pub fn call(
        &self,
        env: &Arc<Env>,
        depends: &[String],
        bindings: &IndexMap<String, String>,
    ) -> Result<(), CallbackError> {
        (self.callback)(env, depends, bindings)
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("is_task", &self.is_task)
            .finish_non_exhaustive()
    }
}
