// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Pattern templates that bind target strings to named parameter captures.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::IndexMap;
use regex::Regex;

use crate::error::TasksError;

/// Characters a parameter may capture: non-empty, no path separators.
const CAPTURE_CLASS: &str = "[A-Za-z0-9_-]+";

/// A parameter name must look like an identifier.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A compiled target-pattern template, e.g. `test_{name}.o`.
///
/// Two rules are equal, and hash identically, iff their template strings are
/// equal — the compiled matcher is derived state, not part of identity.
#[derive(Clone)]
pub struct Rule {
    template: String,
    words: Vec<String>,
    params: Vec<String>,
    matcher: Arc<Regex>,
}

impl Rule {
    /// Parses and compiles `template` into a `Rule`.
    ///
    /// # Errors
    ///
    /// Returns [`TasksError::InvalidRule`] if a placeholder name is not
    /// identifier-like, or if the template is otherwise malformed.
    pub fn new(template: impl Into<String>) -> Result<Self, TasksError> {
        let template = template.into();
        let (words, params) = Self::parse(&template)?;

        let mut pattern = String::from("^");
        for (i, word) in words.iter().enumerate() {
            pattern.push_str(&regex::escape(word));
            if i + 1 < words.len() {
                pattern.push('(');
                pattern.push_str(CAPTURE_CLASS);
                pattern.push(')');
            }
        }
        pattern.push('$');

        let matcher = Regex::new(&pattern).map_err(|e| TasksError::InvalidRule {
            pattern: template.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            template,
            words,
            params,
            matcher: Arc::new(matcher),
        })
    }

    /// Splits `template` on `{name}` placeholders, returning the literal
    /// words (one more than the number of placeholders) and the ordered
    /// placeholder names.
    fn parse(template: &str) -> Result<(Vec<String>, Vec<String>), TasksError> {
        let mut words = Vec::new();
        let mut params = Vec::new();
        let mut rest = template;
        let mut current = String::new();

        loop {
            match rest.find('{') {
                None => {
                    current.push_str(rest);
                    words.push(current);
                    break;
                }
                Some(open) => {
                    current.push_str(&rest[..open]);
                    let after_open = &rest[open + 1..];
                    let close = after_open.find('}').ok_or_else(|| TasksError::InvalidRule {
                        pattern: template.to_string(),
                        reason: "unterminated `{` placeholder".to_string(),
                    })?;
                    let name = &after_open[..close];
                    if !is_identifier(name) {
                        return Err(TasksError::InvalidRule {
                            pattern: template.to_string(),
                            reason: format!("`{name}` is not a valid parameter name"),
                        });
                    }
                    words.push(std::mem::take(&mut current));
                    params.push(name.to_string());
                    rest = &after_open[close + 1..];
                }
            }
        }

        debug_assert_eq!(params.len() + 1, words.len());
        Ok((words, params))
    }

    /// The original template string.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The literal word segments between placeholders.
    #[must_use]
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// The placeholder names, in declaration order.
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Attempts to match `target` against this rule's template, returning
    /// the captured parameter bindings in declaration order on success.
    #[must_use]
    pub fn match_target(&self, target: &str) -> Option<IndexMap<String, String>> {
        let caps = self.matcher.captures(target)?;
        let mut bindings = IndexMap::with_capacity(self.params.len());
        for (name, cap) in self.params.iter().zip(caps.iter().skip(1)) {
            let cap = cap?;
            bindings.insert(name.clone(), cap.as_str().to_string());
        }
        Some(bindings)
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.template == other.template
    }
}

impl Eq for Rule {}

impl Hash for Rule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.template.hash(state);
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rule({:?})", self.template)
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.template)
    }
}
