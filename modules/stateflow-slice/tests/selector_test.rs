//! Selector binding, caching, and state-resolution tests.

use std::sync::Arc;

use serde_json::{json, Value};
use stateflow_slice::{
    state_accessor, InjectConfig, ReducerEntry, RootState, Slice, SliceBuilder, SliceError,
    SliceHost,
};

#[derive(Debug, Clone, PartialEq, Default)]
struct Counter {
    value: i64,
}

/// Host double: accepts every injection and remembers the mount paths.
#[derive(Default)]
struct RecordingHost {
    injected: Vec<String>,
}

impl SliceHost for RecordingHost {
    fn inject(&mut self, entry: ReducerEntry, _config: &InjectConfig) -> Result<(), SliceError> {
        self.injected.push(entry.mount_path);
        Ok(())
    }
}

fn counter_slice() -> Slice<Counter> {
    SliceBuilder::new("counter")
        .initial_state(Counter::default())
        .reducer("increment", |state: &mut Counter, _| state.value += 1)
        .selector("selectValue", |state: &Counter| json!(state.value))
        .selector("selectDouble", |state: &Counter| json!(state.value * 2))
        .build()
        .expect("counter slice builds")
}

// ---------------------------------------------------------------------------
// Cache identity
// ---------------------------------------------------------------------------

#[test]
fn same_accessor_yields_identical_selector_set() {
    let slice = counter_slice();
    let accessor = state_accessor(|root| Some(root));
    let first = slice.get_selectors_with(&accessor);
    let second = slice.get_selectors_with(&accessor);
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn distinct_accessors_yield_independent_sets() {
    let slice = counter_slice();
    let a = state_accessor(|root| Some(root));
    let b = state_accessor(|root| Some(root));
    let first = slice.get_selectors_with(&a);
    let second = slice.get_selectors_with(&b);
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn no_argument_forms_are_cached_per_handle() {
    let slice = counter_slice();
    assert!(Arc::ptr_eq(&slice.get_selectors(), &slice.get_selectors()));
    assert!(Arc::ptr_eq(&slice.selectors(), &slice.selectors()));
    // The identity form and the mount-path form are different accessors.
    assert!(!Arc::ptr_eq(&slice.get_selectors(), &slice.selectors()));
}

#[test]
fn cache_releases_accessors_dropped_by_the_caller() {
    let slice = counter_slice();
    let accessor = state_accessor(|root| Some(root));
    let weak = Arc::downgrade(&accessor);
    let set = slice.get_selectors_with(&accessor);
    assert_eq!(set.len(), 2);
    drop(set);
    drop(accessor);
    // Neither the cache entry nor the bound closures hold the accessor.
    assert!(weak.upgrade().is_none());
}

#[test]
fn set_outliving_its_accessor_resolves_as_absent_branch() {
    let slice = counter_slice();
    let accessor = state_accessor(|root| Some(root));
    let set = slice.get_selectors_with(&accessor);
    drop(accessor);
    let state = Counter { value: 4 };
    let err = set["selectValue"].call(&state);
    assert!(matches!(err, Err(SliceError::MissingSliceState(name)) if name == "counter"));
}

#[test]
fn injected_variant_has_its_own_cache() {
    let slice = counter_slice();
    let mut host = RecordingHost::default();
    let injected = slice
        .inject_into(&mut host, InjectConfig::default())
        .expect("inject");
    assert!(!Arc::ptr_eq(&slice.selectors(), &injected.selectors()));
}

// ---------------------------------------------------------------------------
// State resolution
// ---------------------------------------------------------------------------

#[test]
fn identity_bound_selectors_take_the_slice_state() {
    let slice = counter_slice();
    let selectors = slice.get_selectors();
    let state = Counter { value: 21 };
    let value = selectors["selectDouble"].call(&state).expect("selects");
    assert_eq!(value, json!(42));
}

#[test]
fn mount_bound_selectors_read_the_root_tree() {
    let slice = counter_slice();
    let mut root = RootState::new();
    root.insert("counter", Box::new(Counter { value: 3 }));
    let selectors = slice.selectors();
    assert_eq!(selectors["selectValue"].call(&root).expect("selects"), json!(3));
}

#[test]
fn missing_branch_errors_for_static_slice() {
    let slice = counter_slice();
    let root = RootState::new();
    let err = slice.selectors()["selectValue"].call(&root);
    assert!(matches!(err, Err(SliceError::MissingSliceState(name)) if name == "counter"));
    let err = slice.select_slice(&root);
    assert!(matches!(err, Err(SliceError::MissingSliceState(_))));
}

#[test]
fn missing_branch_falls_back_to_initial_for_injected_slice() {
    let slice = SliceBuilder::new("tally")
        .initial_state(0i64)
        .selector("selectSelf", |state: &i64| json!(*state))
        .build()
        .expect("tally slice builds");
    let mut host = RecordingHost::default();
    let injected = slice
        .inject_into(&mut host, InjectConfig::default())
        .expect("inject");

    let root = RootState::new();
    assert_eq!(injected.select_slice(&root).expect("fallback"), 0);
    assert_eq!(
        injected.selectors()["selectSelf"].call(&root).expect("fallback"),
        json!(0)
    );

    // The original, statically mounted handle still treats absence as an
    // error.
    assert!(slice.select_slice(&root).is_err());
}

#[test]
fn injection_can_remap_the_mount_path() {
    let slice = counter_slice();
    let mut host = RecordingHost::default();
    let injected = slice
        .inject_into(
            &mut host,
            InjectConfig {
                mount_path: Some("nested/counter".to_string()),
            },
        )
        .expect("inject");
    assert_eq!(injected.mount_path(), "nested/counter");
    assert_eq!(slice.mount_path(), "counter");
    assert_eq!(host.injected, vec!["nested/counter".to_string()]);

    let mut root = RootState::new();
    root.insert("nested/counter", Box::new(Counter { value: 9 }));
    assert_eq!(injected.select_slice(&root).expect("reads remapped"), Counter { value: 9 });
    assert_eq!(
        injected.selectors()["selectValue"].call(&root).expect("selects"),
        json!(9)
    );
}

#[test]
fn bound_selectors_expose_the_unwrapped_selector() {
    let slice = counter_slice();
    let selectors = slice.get_selectors();
    let unwrapped = selectors["selectValue"].unwrapped().clone();
    let state = Counter { value: 5 };
    let state_ref: &dyn std::any::Any = &state;
    assert_eq!(unwrapped(state_ref).expect("runs raw"), json!(5));
}

#[test]
fn selector_value_is_forwarded_unchanged() {
    let slice = SliceBuilder::new("doc")
        .initial_state(String::from("hello"))
        .selector("selectLen", |state: &String| {
            json!({"len": state.len(), "text": state})
        })
        .build()
        .expect("doc slice builds");
    let selectors = slice.get_selectors();
    let state = String::from("hello");
    let value: Value = selectors["selectLen"].call(&state).expect("selects");
    assert_eq!(value, json!({"len": 5, "text": "hello"}));
}
