//! Composition and injection tests: many slices, one root tree.

use std::sync::Arc;

use futures::FutureExt;
use serde_json::{json, Value};
use stateflow_action::{Action, PayloadCreator};
use stateflow_compose::Composer;
use stateflow_slice::{InjectConfig, PhaseHandlers, Slice, SliceBuilder};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Counter {
    value: i64,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Journal {
    entries: Vec<String>,
}

fn counter_slice() -> Slice<Counter> {
    SliceBuilder::new("counter")
        .initial_state(Counter::default())
        .reducer("increment", |state: &mut Counter, _| state.value += 1)
        .reducer("addBy", |state: &mut Counter, action: &Action| {
            state.value += action.payload.as_i64().unwrap_or(0);
        })
        .selector("selectValue", |state: &Counter| json!(state.value))
        .build()
        .expect("counter slice builds")
}

fn journal_slice() -> Slice<Journal> {
    SliceBuilder::new("journal")
        .initial_state(Journal::default())
        .reducer("note", |state: &mut Journal, action: &Action| {
            if let Some(text) = action.payload.as_str() {
                state.entries.push(text.to_string());
            }
        })
        .build()
        .expect("journal slice builds")
}

// ---------------------------------------------------------------------------
// Static composition
// ---------------------------------------------------------------------------

#[test]
fn actions_route_to_every_slice_but_only_handlers_change_state() -> anyhow::Result<()> {
    init_tracing();
    let counter = counter_slice();
    let journal = journal_slice();
    let mut composer = Composer::new();
    composer.register(&counter);
    composer.register(&journal);

    let root = composer.initial_root()?;
    assert_eq!(root.get_as::<Counter>("counter"), Some(&Counter { value: 0 }));
    assert_eq!(root.get_as::<Journal>("journal"), Some(&Journal::default()));

    let bump = counter.action("increment").expect("creator exposed");
    let root = composer.reduce(root, &bump.as_creator().expect("plain creator").action_empty())?;
    assert_eq!(counter.select_slice(&root)?.value, 1);
    assert_eq!(journal.select_slice(&root)?, Journal::default());

    let note = journal.action("note").expect("creator exposed");
    let root = composer.reduce(root, &note.action(json!("hello")))?;
    assert_eq!(journal.select_slice(&root)?.entries, vec!["hello".to_string()]);
    assert_eq!(counter.select_slice(&root)?.value, 1);
    Ok(())
}

// ---------------------------------------------------------------------------
// Injection
// ---------------------------------------------------------------------------

#[test]
fn injected_slice_mounts_under_the_remapped_path() {
    init_tracing();
    let slice = counter_slice();
    let mut composer = Composer::new();
    let injected = slice
        .inject_into(
            &mut composer,
            InjectConfig {
                mount_path: Some("feature/counter".to_string()),
            },
        )
        .expect("inject");

    // Before any dispatch the branch is absent; the injected handle falls
    // back to the initial state.
    let empty = stateflow_slice::RootState::new();
    assert_eq!(injected.select_slice(&empty).expect("fallback"), Counter::default());

    let root = composer
        .reduce(empty, &injected.action("addBy").expect("creator").action(json!(7)))
        .expect("reduce");
    assert_eq!(injected.select_slice(&root).expect("branch").value, 7);
    assert_eq!(
        injected.selectors()["selectValue"].call(&root).expect("selects"),
        json!(7)
    );
    assert!(root.contains("feature/counter"));
    assert!(!root.contains("counter"));
}

#[test]
fn injecting_the_same_slice_twice_is_idempotent() {
    init_tracing();
    let slice = counter_slice();
    let mut composer = Composer::new();
    slice
        .inject_into(&mut composer, InjectConfig::default())
        .expect("first inject");
    slice
        .inject_into(&mut composer, InjectConfig::default())
        .expect("second inject");
    assert_eq!(composer.len(), 1);
}

// ---------------------------------------------------------------------------
// End-to-end async lifecycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default)]
struct Session {
    loading: bool,
    user: Option<String>,
    attempts: u32,
}

fn fetch_user() -> PayloadCreator {
    Arc::new(|arg: Value| {
        async move {
            match arg.as_str() {
                Some(name) => Ok(json!(name.to_uppercase())),
                None => Err(json!("missing name")),
            }
        }
        .boxed()
    })
}

fn session_slice() -> Slice<Session> {
    SliceBuilder::new("session")
        .initial_state(Session::default())
        .async_op(
            "fetchUser",
            fetch_user(),
            PhaseHandlers::new()
                .pending(|state: &mut Session, _| state.loading = true)
                .fulfilled(|state: &mut Session, action: &Action| {
                    state.user = action.payload.as_str().map(str::to_string);
                })
                .settled(|state: &mut Session, _| {
                    state.loading = false;
                    state.attempts += 1;
                }),
        )
        .build()
        .expect("session slice builds")
}

#[tokio::test]
async fn lifecycle_drives_the_composed_tree_through_all_phases() {
    init_tracing();
    let session = session_slice();
    let mut composer = Composer::new();
    composer.register(&session);

    let lifecycle = session
        .action("fetchUser")
        .and_then(|surface| surface.as_lifecycle())
        .cloned()
        .expect("lifecycle exposed");

    let run = lifecycle.begin(json!("ada")).expect("run begins");
    let root = composer.initial_root().expect("initial root");
    let root = composer.reduce(root, &run.pending).expect("pending dispatch");
    let mid = session.select_slice(&root).expect("branch");
    assert!(mid.loading);
    assert_eq!(mid.attempts, 0);

    let terminal = run.settle().await;
    assert_eq!(terminal.kind, "session/fetchUser/fulfilled");
    let root = composer.reduce(root, &terminal).expect("terminal dispatch");
    let done = session.select_slice(&root).expect("branch");
    assert_eq!(done, Session {
        loading: false,
        user: Some("ADA".to_string()),
        attempts: 1,
    });
}

#[tokio::test]
async fn rejected_run_still_settles() {
    init_tracing();
    let session = session_slice();
    let mut composer = Composer::new();
    composer.register(&session);

    let lifecycle = session
        .action("fetchUser")
        .and_then(|surface| surface.as_lifecycle())
        .cloned()
        .expect("lifecycle exposed");

    let run = lifecycle.begin(Value::Null).expect("run begins");
    let root = composer.initial_root().expect("initial root");
    let root = composer.reduce(root, &run.pending).expect("pending dispatch");

    let terminal = run.settle().await;
    assert_eq!(terminal.kind, "session/fetchUser/rejected");
    assert!(terminal.error);
    let root = composer.reduce(root, &terminal).expect("terminal dispatch");
    let done = session.select_slice(&root).expect("branch");
    assert_eq!(done.user, None);
    assert!(!done.loading);
    assert_eq!(done.attempts, 1);
}
