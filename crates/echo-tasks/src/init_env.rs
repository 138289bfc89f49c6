// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Seeds a root [`Env`] from the process environment, the way a shell-driven
//! build tool inherits `CC`, `CFLAGS`, and friends from its caller.

use std::sync::Arc;

use crate::env::Env;
use crate::value::Value;

/// Defaults applied for keys the process environment does not already set.
const DEFAULT_ENV: &[(&str, &str)] = &[("CC", "cc"), ("CXX", "c++")];

/// `*FLAGS`-suffixed keys that default to an empty list rather than a
/// missing entry.
const DEFAULT_FLAGS: &[&str] = &["CFLAGS", "CXXFLAGS", "LDFLAGS"];

/// A small, dependency-free `shlex.split` equivalent: splits on
/// unquoted whitespace, honoring single and double quotes.
fn shlex_split(raw: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    in_word = true;
                }
                c if c.is_whitespace() => {
                    if in_word {
                        words.push(std::mem::take(&mut current));
                        in_word = false;
                    }
                }
                c => {
                    current.push(c);
                    in_word = true;
                }
            },
        }
    }
    if in_word {
        words.push(current);
    }
    words
}

/// Builds a root environment from the process's environment variables: any
/// key ending in `FLAGS` is split on whitespace into a list, and `CC`,
/// `CXX`, `CFLAGS`, `CXXFLAGS`, `LDFLAGS` fall back to sensible defaults when
/// the process does not already define them.
#[must_use]
pub fn create_init_env() -> Arc<Env> {
    let env = Env::new();

    for (key, value) in std::env::vars() {
        if key.ends_with("FLAGS") {
            env.set(&key, shlex_split(&value));
        } else {
            env.set(&key, value);
        }
    }

    for (key, default) in DEFAULT_ENV {
        if env.get(key).is_err() {
            env.set(key, *default);
        }
    }
    for key in DEFAULT_FLAGS {
        if env.get(key).is_err() {
            env.set(key, Value::List(vec![]));
        }
    }

    env
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_unquoted_whitespace() {
        assert_eq!(shlex_split("-O2 -Wall"), vec!["-O2".to_string(), "-Wall".to_string()]);
    }

    #[test]
    fn keeps_single_quoted_segments_together() {
        assert_eq!(shlex_split("-I'my dir' -O2"), vec!["-Imy dir".to_string(), "-O2".to_string()]);
    }

    #[test]
    fn empty_string_splits_to_no_words() {
        assert_eq!(shlex_split(""), Vec::<String>::new());
    }

    #[test]
    fn unset_flags_default_to_an_empty_list() {
        // SAFETY-free: only reads env state this test itself does not set,
        // relying on CFLAGS not being defined in the test runner's shell.
        let env = create_init_env();
        assert_eq!(env.get("CC").expect("defaulted"), Value::from("cc"));
        assert_eq!(env.get("CXXFLAGS").expect("defaulted"), Value::List(vec![]));
    }
}
