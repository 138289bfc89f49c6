// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The value type stored in [`Env`](crate::env::Env) scopes.

use indexmap::IndexMap;

/// A value held by an [`Env`](crate::env::Env) scope.
///
/// `Str`, `Int`, and `Bool` are immutable from the env's point of view: they
/// are returned by reference-count-free clone without triggering
/// copy-on-read. `List` and `Map` are the mutable container kinds the
/// copy-on-read invariant exists to protect; see [`Value::is_mutable`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A single string.
    Str(String),
    /// An ordered sequence of values (e.g. `CFLAGS`).
    List(Vec<Value>),
    /// An ordered string-keyed map.
    Map(IndexMap<String, Value>),
    /// A boolean flag.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// The absence of a meaningful value (used in `local_items` to report a
    /// tombstone alongside its key).
    Unit,
}

impl Value {
    /// Returns whether this value is a mutable container kind. Mutable
    /// values are the ones the [`Env`](crate::env::Env) copy-on-read
    /// invariant must shallow-copy before handing back to a child scope so
    /// that sibling scopes cannot observe each other's mutations.
    #[must_use]
    pub fn is_mutable(&self) -> bool {
        matches!(self, Value::List(_) | Value::Map(_))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items.into_iter().map(Value::Str).collect())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}
