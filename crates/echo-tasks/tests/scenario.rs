// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! End-to-end scenarios against the C-compile-style rule set: a `test_{name}`
//! binary built from `{name}.o` and its own `test_{name}.o`, each object
//! built from a `.c` source, plus a `clean` task.

use std::sync::{Arc, Mutex};

use echo_tasks::{
    execute, execute_parallel, resolve, Context, Env, FakeFileSystem, TasksError, Value,
};

fn compile_rules(ctx: &mut Context, calls: &Arc<Mutex<Vec<String>>>) {
    ctx.deps(
        "test_{name}",
        Arc::new(|env, deps, bindings| {
            let name = &bindings["name"];
            deps.push(format!("test_{name}.o"));
            deps.push(format!("{name}.o"));
            env.update("CFLAGS", || Value::List(vec![]), |v| {
                if let Value::List(items) = v {
                    items.push(Value::from("-DRUN_TEST"));
                }
            });
            Ok(())
        }),
    )
    .expect("binds");

    let action_calls = Arc::clone(calls);
    ctx.action(
        "test_{name}",
        Arc::new(move |_env, _deps, bindings| {
            action_calls.lock().expect("lock").push(bindings["name"].clone());
            Ok(())
        }),
    )
    .expect("binds");

    ctx.deps(
        "{name}.o",
        Arc::new(|_env, deps, bindings| {
            deps.push(format!("{}.c", &bindings["name"]));
            Ok(())
        }),
    )
    .expect("binds");

    let object_calls = Arc::clone(calls);
    ctx.action(
        "{name}.o",
        Arc::new(move |_env, _deps, bindings| {
            object_calls.lock().expect("lock").push(format!("{}.o", &bindings["name"]));
            Ok(())
        }),
    )
    .expect("binds");

    ctx.deps(
        "{name}.c",
        Arc::new(|env, _deps, _bindings| {
            env.set("haha", "haha");
            Ok(())
        }),
    )
    .expect("binds");

    ctx.task("clean", Arc::new(|_env, _deps, _bindings| Ok(()))).expect("binds");
}

fn build_init_env() -> Arc<Env> {
    Env::from_entries([
        ("CC".to_string(), Value::from("cc")),
        ("CFLAGS".to_string(), Value::from(vec!["-Wall".to_string()])),
    ])
}

#[test]
fn s1_resolve_yields_the_full_graph_in_breadth_first_order() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut ctx = Context::new(&build_init_env());
    compile_rules(&mut ctx, &calls);
    let (rules, env) = ctx.finish();

    let graph = resolve("test_asdf", &rules, &env).expect("resolves");
    let keys: Vec<_> = graph.keys().cloned().collect();
    assert_eq!(
        keys,
        vec!["test_asdf", "test_asdf.o", "asdf.o", "test_asdf.c", "asdf.c"]
    );

    assert_eq!(graph["test_asdf"].depends, vec!["test_asdf.o", "asdf.o"]);
    assert_eq!(graph["test_asdf.o"].depends, vec!["test_asdf.c"]);
    assert_eq!(graph["asdf.o"].depends, vec!["asdf.c"]);
    assert!(graph["test_asdf.c"].depends.is_empty());
    assert!(graph["asdf.c"].depends.is_empty());
}

#[test]
fn s2_envs_are_scoped_and_isolated_by_copy_on_read() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut ctx = Context::new(&build_init_env());
    compile_rules(&mut ctx, &calls);

    ctx.get_env().set("CC", "gcc");
    ctx.get_env().update("CFLAGS", || Value::List(vec![]), |v| {
        if let Value::List(items) = v {
            items.push(Value::from("-O2"));
        }
    });

    let (rules, env) = ctx.finish();
    let graph = resolve("test_asdf", &rules, &env).expect("resolves");

    assert_eq!(
        graph["test_asdf"].env.get("CFLAGS").expect("present"),
        Value::List(vec![Value::from("-Wall"), Value::from("-O2"), Value::from("-DRUN_TEST")])
    );
    assert_eq!(graph["asdf.c"].env.get("haha").expect("present"), Value::from("haha"));
    assert_eq!(
        env.get("CFLAGS").expect("present"),
        Value::List(vec![Value::from("-Wall"), Value::from("-O2")])
    );
}

#[test]
fn s3_sequential_execute_rebuilds_only_stale_intermediates() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut ctx = Context::new(&build_init_env());
    compile_rules(&mut ctx, &calls);
    let (rules, env) = ctx.finish();
    let graph = resolve("test_asdf", &rules, &env).expect("resolves");

    let fs = FakeFileSystem::with_mtimes([
        ("asdf.c", 300),
        ("asdf.o", 200),
        ("test_asdf.c", 50),
        ("test_asdf.o", 100),
        ("test_asdf", 10),
    ]);

    execute("test_asdf", &graph, &fs, false).expect("builds");

    let ran = calls.lock().expect("lock");
    assert!(ran.contains(&"asdf.o".to_string()));
    assert!(ran.contains(&"asdf".to_string()));
    assert!(!ran.contains(&"test_asdf.o".to_string()));
}

#[test]
fn s4_duplicate_resolver_registration_is_rejected() {
    let mut ctx = Context::new(&Env::new());
    ctx.deps("x", Arc::new(|_e, _d, _b| Ok(()))).expect("first bind");
    let err = ctx.deps("x", Arc::new(|_e, _d, _b| Ok(()))).expect_err("second bind must fail");
    assert!(matches!(err, TasksError::DuplicatedRule { pattern } if pattern == "x"));
}

#[test]
fn s5_a_stale_target_with_no_action_fails() {
    let mut ctx = Context::new(&Env::new());
    ctx.deps("root", Arc::new(|_e, deps, _b| {
        deps.push("leaf".to_string());
        Ok(())
    }))
    .expect("binds");
    ctx.action("root", Arc::new(|_e, _d, _b| Ok(()))).expect("binds");
    // "leaf" resolves with no bound action.
    let (rules, env) = ctx.finish();
    let graph = resolve("root", &rules, &env).expect("resolves");
    let fs = FakeFileSystem::new();

    let err = execute("root", &graph, &fs, false).expect_err("must fail");
    assert!(matches!(err, TasksError::NoAction { target } if target == "leaf"));
}

#[test]
fn s6_parallel_failure_surfaces_once_and_blocks_dependents() {
    let ran = Arc::new(Mutex::new(Vec::new()));

    let mut ctx = Context::new(&Env::new());
    ctx.deps("root", Arc::new(|_e, deps, _b| {
        deps.push("ok_branch".to_string());
        deps.push("bad_branch".to_string());
        Ok(())
    }))
    .expect("binds");

    let root_ran = Arc::clone(&ran);
    ctx.action(
        "root",
        Arc::new(move |_e, _d, _b| {
            root_ran.lock().expect("lock").push("root".to_string());
            Ok(())
        }),
    )
    .expect("binds");

    let ok_ran = Arc::clone(&ran);
    ctx.action(
        "ok_branch",
        Arc::new(move |_e, _d, _b| {
            ok_ran.lock().expect("lock").push("ok_branch".to_string());
            Ok(())
        }),
    )
    .expect("binds");

    ctx.action("bad_branch", Arc::new(|_e, _d, _b| Err("kaboom".into()))).expect("binds");

    let (rules, env) = ctx.finish();
    let graph = resolve("root", &rules, &env).expect("resolves");
    let fs = FakeFileSystem::new();

    let err = execute_parallel("root", &graph, &fs, 4, false).expect_err("must fail");
    assert!(matches!(err, TasksError::ActionFailed { target, .. } if target == "bad_branch"));
    assert!(!ran.lock().expect("lock").contains(&"root".to_string()));
}
