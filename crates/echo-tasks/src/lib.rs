// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! A rule-based, `make`-alike dependency engine.
//!
//! A build file populates a [`Context`] with target-pattern [`Rule`]s, each
//! carrying an optional dependency resolver and an optional action.
//! [`resolve`] expands one target into its full dependency graph by walking
//! rules breadth first; [`execute`] and [`execute_parallel`] then build that
//! graph, consulting a [`FileSystem`] to skip targets that are already
//! up to date.
//!
//! ```no_run
//! use std::sync::Arc;
//! use echo_tasks::{create_init_env, Context, StdFileSystem, execute, resolve};
//!
//! let mut ctx = Context::new(&create_init_env());
//! ctx.deps("{name}.o", Arc::new(|_env, deps, bindings| {
//!     deps.push(format!("{}.c", &bindings["name"]));
//!     Ok(())
//! }))?;
//! ctx.action("{name}.o", Arc::new(|_env, depends, _bindings| {
//!     println!("compiling from {depends:?}");
//!     Ok(())
//! }))?;
//!
//! let (rules, env) = ctx.finish();
//! let graph = resolve("main.o", &rules, &env)?;
//! execute("main.o", &graph, &StdFileSystem, false)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod action;
mod context;
mod env;
mod error;
mod executor;
mod fs;
mod init_env;
mod resolver;
mod rule;
mod staleness;
mod value;

pub use action::{Action, ActionFn, DepsFn};
pub use context::{Context, RuleSlots, RuleTable};
pub use env::Env;
pub use error::{CallbackError, Result, TasksError};
pub use executor::{execute, execute_parallel};
pub use fs::{FakeFileSystem, FileSystem, StdFileSystem};
pub use init_env::create_init_env;
pub use resolver::{resolve, ResolutionEntry, ResolutionMap};
pub use rule::Rule;
pub use staleness::should_build;
pub use value::Value;
