// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Breadth-first expansion of a target into its full dependency graph.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, info, instrument};

use crate::action::Action;
use crate::context::RuleTable;
use crate::env::Env;
use crate::error::TasksError;

/// Everything the resolver learned about one target: its (ordered,
/// possibly duplicate-free is not guaranteed) dependency list, the env
/// scoped to it, the single action bound to it (if any), and the parameter
/// bindings that action was matched with.
pub struct ResolutionEntry {
    /// Targets this target depends on, in the order resolver callbacks
    /// appended them.
    pub depends: Vec<String>,
    /// The env scoped to this target (a child of its resolving parent's
    /// env).
    pub env: Arc<Env>,
    /// The action bound to this target, if any rule supplied one.
    pub action: Option<Action>,
    /// Parameter bindings the action's rule matched with. Empty when
    /// `action` is `None`.
    pub bindings: IndexMap<String, String>,
}

/// An insertion-ordered `target -> ResolutionEntry` map; a target appears
/// exactly once, in resolution (breadth-first) order.
pub type ResolutionMap = IndexMap<String, ResolutionEntry>;

/// Expands `target` into its full dependency graph against `rules`,
/// starting from `env`.
///
/// For each queued target, every rule is checked in declaration order: a
/// matching rule's resolver callback (if bound) runs and may append further
/// dependencies and mutate the target's env; a matching rule's action
/// callback (if bound) is recorded, and it is an error for more than one
/// matching rule to supply an action for the same target. Each target is
/// enqueued and resolved exactly once.
///
/// # Errors
///
/// - [`TasksError::ResolveFailed`] if a resolver callback returns an error.
/// - [`TasksError::MultipleActions`] if more than one rule supplies an
///   action for the same target.
#[instrument(skip(rules, env))]
pub fn resolve(target: &str, rules: &RuleTable, env: &Arc<Env>) -> Result<ResolutionMap, TasksError> {
    let mut result = ResolutionMap::new();
    let mut pending: VecDeque<(String, Arc<Env>)> = VecDeque::new();
    let mut pending_set: HashSet<String> = HashSet::new();

    pending.push_back((target.to_string(), env.make_child()));
    pending_set.insert(target.to_string());

    while let Some((target, subenv)) = pending.pop_front() {
        pending_set.remove(&target);
        debug_assert!(!result.contains_key(&target), "target resolved twice: {target}");
        info!(target = %target, "resolve.begin");

        let mut depends: Vec<String> = Vec::new();
        let mut only_action: Option<Action> = None;
        let mut action_bindings = IndexMap::new();

        for (rule, slots) in rules {
            let Some(bindings) = rule.match_target(&target) else {
                continue;
            };
            debug!(target = %target, rule = %rule, "resolve.matching");

            if let Some(resolver) = &slots.resolver {
                resolver(&subenv, &mut depends, &bindings).map_err(|cause| {
                    TasksError::ResolveFailed {
                        target: target.clone(),
                        rule: rule.template().to_string(),
                        cause,
                    }
                })?;
            }

            if let Some(action) = &slots.action {
                if only_action.is_some() {
                    return Err(TasksError::MultipleActions { target: target.clone() });
                }
                only_action = Some(action.clone());
                action_bindings = bindings;
            }
        }

        debug!(
            target = %target,
            deps = ?depends,
            action = only_action.as_ref().map(Action::name),
            "resolve.result"
        );

        for dep in &depends {
            if !result.contains_key(dep) && !pending_set.contains(dep) {
                pending.push_back((dep.clone(), subenv.make_child()));
                pending_set.insert(dep.clone());
            }
        }

        result.insert(
            target,
            ResolutionEntry { depends, env: subenv, action: only_action, bindings: action_bindings },
        );
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;

    #[test]
    fn every_dependency_appears_in_the_result() {
        let mut ctx = Context::new(&Env::new());
        ctx.deps("{name}.o", Arc::new(|_env, deps, b| {
            deps.push(format!("{}.c", &b["name"]));
            Ok(())
        }))
        .expect("binds");
        let (rules, env) = ctx.finish();

        let result = resolve("main.o", &rules, &env).expect("resolves");
        for entry in result.values() {
            for dep in &entry.depends {
                assert!(result.contains_key(dep), "missing dep {dep} in result");
            }
        }
        assert!(result.contains_key("main.o"));
        assert!(result.contains_key("main.c"));
    }

    #[test]
    fn duplicate_actions_for_one_target_are_rejected() {
        let mut ctx = Context::new(&Env::new());
        ctx.action("dup", Arc::new(|_e, _d, _b| Ok(()))).expect("binds");
        // A second, distinct-template rule that happens to also match "dup".
        ctx.action("{p}", Arc::new(|_e, _d, _b| Ok(()))).expect("binds");
        let (rules, env) = ctx.finish();

        let err = resolve("dup", &rules, &env).expect_err("must fail");
        assert!(matches!(err, TasksError::MultipleActions { target } if target == "dup"));
    }

    #[test]
    fn resolver_failure_is_wrapped_with_target_and_rule() {
        let mut ctx = Context::new(&Env::new());
        ctx.deps("boom", Arc::new(|_e, _d, _b| Err("kaboom".into())))
            .expect("binds");
        let (rules, env) = ctx.finish();

        let err = resolve("boom", &rules, &env).expect_err("must fail");
        match err {
            TasksError::ResolveFailed { target, rule, .. } => {
                assert_eq!(target, "boom");
                assert_eq!(rule, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
