// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Registry that a build-file loader writes rule bindings into.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::info;

use crate::action::{Action, ActionFn, DepsFn};
use crate::env::Env;
use crate::error::TasksError;
use crate::rule::Rule;

/// One rule's pair of optional callback slots: a resolver and an action.
/// Either slot may be filled independently; filling an already-filled slot
/// is a hard error.
#[derive(Default, Clone)]
pub struct RuleSlots {
    /// The dependency-resolver callback, if bound.
    pub resolver: Option<Arc<DepsFn>>,
    /// The action callback, if bound.
    pub action: Option<Action>,
}

/// The ordered rule table produced by loading one build file: declaration
/// order is preserved because it governs tie-breaking when several rules
/// match the same target (§4.4 of the resolver).
pub type RuleTable = IndexMap<Rule, RuleSlots>;

/// Registry that a build-file loader writes `(pattern -> callbacks)`
/// bindings into, plus the working environment the loader mutates.
///
/// Loading a build file is single-threaded; `Context` carries no internal
/// synchronization.
pub struct Context {
    env: Arc<Env>,
    rules: RuleTable,
}

impl Context {
    /// Creates a context whose working env is a fresh child of `init_env`.
    #[must_use]
    pub fn new(init_env: &Arc<Env>) -> Self {
        Self { env: init_env.make_child(), rules: RuleTable::new() }
    }

    /// The working env, for the loader to read or mutate (e.g. `CC = "gcc"`).
    #[must_use]
    pub fn get_env(&self) -> &Arc<Env> {
        &self.env
    }

    /// Binds `callback` as the dependency resolver for `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`TasksError::InvalidRule`] if `pattern` fails to compile, or
    /// [`TasksError::DuplicatedRule`] if a resolver is already bound for this
    /// exact pattern.
    pub fn deps(&mut self, pattern: &str, callback: Arc<DepsFn>) -> Result<(), TasksError> {
        let rule = Rule::new(pattern)?;
        let slots = self.rules.entry(rule).or_default();
        if slots.resolver.is_some() {
            return Err(TasksError::DuplicatedRule { pattern: pattern.to_string() });
        }
        slots.resolver = Some(callback);
        info!(rule = pattern, "load.read_deps");
        Ok(())
    }

    /// Binds `callback` as the non-task (file-producing) action for
    /// `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`TasksError::InvalidRule`] or [`TasksError::DuplicatedRule`]
    /// as [`Context::deps`] does.
    pub fn action(
        &mut self,
        pattern: &str,
        callback: Arc<ActionFn>,
    ) -> Result<(), TasksError> {
        self.bind_action(pattern, Action::file(pattern.to_string(), callback))
    }

    /// Binds `callback` as the task (side-effect-only) action for `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`TasksError::InvalidRule`] or [`TasksError::DuplicatedRule`]
    /// as [`Context::deps`] does.
    pub fn task(&mut self, pattern: &str, callback: Arc<ActionFn>) -> Result<(), TasksError> {
        self.bind_action(pattern, Action::task(pattern.to_string(), callback))
    }

    fn bind_action(&mut self, pattern: &str, action: Action) -> Result<(), TasksError> {
        let rule = Rule::new(pattern)?;
        let slots = self.rules.entry(rule).or_default();
        if slots.action.is_some() {
            return Err(TasksError::DuplicatedRule { pattern: pattern.to_string() });
        }
        info!(rule = pattern, is_task = action.is_task(), "load.read_action");
        slots.action = Some(action);
        Ok(())
    }

    /// Consumes the context, returning its rule table and working env.
    #[must_use]
    pub fn finish(self) -> (RuleTable, Arc<Env>) {
        (self.rules, self.env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_deps() -> Arc<DepsFn> {
        Arc::new(|_env, _deps, _bindings| Ok(()))
    }

    fn noop_action() -> Arc<ActionFn> {
        Arc::new(|_env, _deps, _bindings| Ok(()))
    }

    #[test]
    fn duplicate_resolver_binding_is_rejected() {
        let mut ctx = Context::new(&Env::new());
        ctx.deps("x", noop_deps()).expect("first bind succeeds");
        let err = ctx.deps("x", noop_deps()).expect_err("second bind must fail");
        assert!(matches!(err, TasksError::DuplicatedRule { pattern } if pattern == "x"));
    }

    #[test]
    fn resolver_and_action_slots_are_independent() {
        let mut ctx = Context::new(&Env::new());
        ctx.deps("x", noop_deps()).expect("resolver binds");
        ctx.action("x", noop_action()).expect("action binds independently");
    }

    #[test]
    fn rules_are_kept_in_declaration_order() {
        let mut ctx = Context::new(&Env::new());
        ctx.deps("a", noop_deps()).expect("binds");
        ctx.deps("b", noop_deps()).expect("binds");
        ctx.deps("c", noop_deps()).expect("binds");
        let (table, _env) = ctx.finish();
        let order: Vec<_> = table.keys().map(Rule::template).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }
}
