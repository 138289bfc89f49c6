// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error taxonomy for rule loading, resolution, and execution.

use std::error::Error as StdError;
use thiserror::Error;

/// A callback's own failure, boxed so the crate does not need to know the
/// concrete error type user code raises from a resolver or action callback.
pub type CallbackError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors that can surface from rule construction, registration, resolution,
/// or execution.
#[derive(Debug, Error)]
pub enum TasksError {
    /// A rule's template string failed to parse (malformed placeholder, or a
    /// parameter name that is not identifier-like).
    #[error("invalid rule `{pattern}`: {reason}")]
    InvalidRule {
        /// The offending template string.
        pattern: String,
        /// Human-readable reason the pattern was rejected.
        reason: String,
    },

    /// The same rule had the same callback slot (resolver or action) bound
    /// twice during registration.
    #[error("rule `{pattern}` already has this slot bound")]
    DuplicatedRule {
        /// The rule's template string.
        pattern: String,
    },

    /// More than one matching rule for a target supplied an action callback.
    #[error("target `{target}` matched more than one rule with an action")]
    MultipleActions {
        /// The target that matched two actions.
        target: String,
    },

    /// A resolver callback raised while expanding `target` against `rule`.
    #[error("resolving `{target}` via rule `{rule}` failed: {cause}")]
    ResolveFailed {
        /// The target being resolved when the callback failed.
        target: String,
        /// The template string of the rule whose resolver callback failed.
        rule: String,
        /// The callback's own error.
        #[source]
        cause: CallbackError,
    },

    /// A target was stale but no rule bound an action for it.
    #[error("no action bound for stale target `{target}`")]
    NoAction {
        /// The target with no action.
        target: String,
    },

    /// An action callback raised while building `target`.
    #[error("action for `{target}` failed: {cause}")]
    ActionFailed {
        /// The target whose action failed.
        target: String,
        /// The callback's own error.
        #[source]
        cause: CallbackError,
    },

    /// A non-task action ran successfully but its target still reads as
    /// stale afterward (the action did not produce its declared output).
    #[error("action for `{target}` did not produce its output")]
    ActionNoResult {
        /// The target whose action produced no result.
        target: String,
    },

    /// An `Env` lookup found neither a live local entry nor a live parent
    /// entry for the given key (or the key was tombstoned locally).
    #[error("key not found: `{0}`")]
    NotFound(String),

    /// Wraps an I/O failure observed while consulting the filesystem for
    /// staleness (e.g. a `stat` call that failed for a reason other than
    /// "does not exist").
    #[error("filesystem error for `{path}`: {source}")]
    Io {
        /// The path being queried.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The parallel executor's worker pool could not be created.
    #[error("failed to start worker pool: {reason}")]
    Scheduler {
        /// The pool builder's own error message.
        reason: String,
    },
}

/// Convenience alias for fallible operations in this crate.
pub type Result<T> = std::result::Result<T, TasksError>;
