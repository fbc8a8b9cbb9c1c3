//! Selector binding and the per-accessor cache.
//!
//! A bound selector navigates from a caller-supplied root value to this
//! slice's state, then runs the user selector on it. Binding is cached per
//! accessor identity so repeated `get_selectors` calls with the same
//! accessor return the same selector set (and the same per-name function
//! identities). Accessors are held weakly on both sides: the cache key is a
//! `Weak`, and the bound closures navigate through a `Weak` too, so neither
//! the cache nor a cached set keeps an accessor alive. Dead entries are
//! pruned on access; a set that outlives its accessor resolves every call
//! as if the state branch were absent.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use serde_json::Value;

use crate::error::SliceError;

/// Navigates from a root value to a slice's state branch, borrowing from
/// the root. `None` means the branch is absent.
pub type StateAccessor =
    Arc<dyn for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync>;

type AccessorFn = dyn for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync;

/// Wrap a closure as a [`StateAccessor`]. Keeps higher-ranked lifetime
/// inference out of caller code.
pub fn state_accessor(
    f: impl for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync + 'static,
) -> StateAccessor {
    Arc::new(f)
}

/// A user selector erased over the slice state type: takes the slice state,
/// returns a value.
pub type ErasedSelector = Arc<dyn Fn(&dyn Any) -> Result<Value, SliceError> + Send + Sync>;

/// A user selector bound to one accessor and one slice's state-resolution
/// rule.
#[derive(Clone)]
pub struct BoundSelector {
    bound: Arc<dyn Fn(&dyn Any) -> Result<Value, SliceError> + Send + Sync>,
    original: ErasedSelector,
}

impl BoundSelector {
    pub(crate) fn new(
        bound: Arc<dyn Fn(&dyn Any) -> Result<Value, SliceError> + Send + Sync>,
        original: ErasedSelector,
    ) -> Self {
        Self { bound, original }
    }

    /// Run against a root value (or, for identity-bound sets, the slice
    /// state itself).
    pub fn call(&self, root: &dyn Any) -> Result<Value, SliceError> {
        (self.bound)(root)
    }

    /// The unwrapped user selector, for introspection and tests.
    pub fn unwrapped(&self) -> &ErasedSelector {
        &self.original
    }
}

/// Name → bound selector, shared so repeated lookups return the same
/// mapping object.
pub type SelectorSet = HashMap<String, BoundSelector>;

/// Accessor-identity cache for one slice handle. The outer cache level of
/// the design is the handle itself: every handle (including each injected
/// variant) owns one of these, so distinct handles never share entries.
pub(crate) struct SelectorCache {
    entries: Mutex<Vec<(Weak<AccessorFn>, Arc<SelectorSet>)>>,
}

impl SelectorCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Look up by accessor pointer identity, building and remembering the
    /// set on a miss. Dead accessor entries are pruned first.
    pub fn get_or_insert(
        &self,
        accessor: &StateAccessor,
        build: impl FnOnce() -> SelectorSet,
    ) -> Arc<SelectorSet> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        entries.retain(|(weak, _)| weak.strong_count() > 0);
        for (weak, set) in entries.iter() {
            if let Some(held) = weak.upgrade() {
                if Arc::ptr_eq(&held, accessor) {
                    return Arc::clone(set);
                }
            }
        }
        let set = Arc::new(build());
        entries.push((Arc::downgrade(accessor), Arc::clone(&set)));
        set
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A one-selector set bound the way production binding does it: the
    /// closure navigates through a `Weak` to the accessor.
    fn bound_set(accessor: &StateAccessor) -> SelectorSet {
        let navigate = Arc::downgrade(accessor);
        let bound: Arc<dyn Fn(&dyn Any) -> Result<Value, SliceError> + Send + Sync> =
            Arc::new(move |root| {
                match navigate.upgrade().and_then(|navigate| navigate(root)) {
                    Some(_) => Ok(Value::Bool(true)),
                    None => Err(SliceError::MissingSliceState("orphan".to_string())),
                }
            });
        let original: ErasedSelector = Arc::new(|_| Ok(Value::Null));
        let mut set = SelectorSet::new();
        set.insert("selectAny".to_string(), BoundSelector::new(bound, original));
        set
    }

    #[test]
    fn same_accessor_returns_same_set() {
        let cache = SelectorCache::new();
        let accessor = state_accessor(|root| Some(root));
        let a = cache.get_or_insert(&accessor, || bound_set(&accessor));
        let b = cache.get_or_insert(&accessor, || bound_set(&accessor));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_accessors_get_distinct_sets() {
        let cache = SelectorCache::new();
        let first = state_accessor(|root| Some(root));
        let second = state_accessor(|root| Some(root));
        let a = cache.get_or_insert(&first, || bound_set(&first));
        let b = cache.get_or_insert(&second, || bound_set(&second));
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn dropped_accessors_are_pruned() {
        let cache = SelectorCache::new();
        {
            let short_lived = state_accessor(|root| Some(root));
            let set = cache.get_or_insert(&short_lived, || bound_set(&short_lived));
            assert_eq!(set.len(), 1);
            assert_eq!(cache.len(), 1);
        }
        let survivor = state_accessor(|root| Some(root));
        cache.get_or_insert(&survivor, || bound_set(&survivor));
        assert_eq!(cache.len(), 1);
    }
}
