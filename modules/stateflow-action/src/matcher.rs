//! Predicate matchers over actions.
//!
//! A matcher reducer fires for any action its predicate accepts, independent
//! of type-keyed case matching. Matchers are shared closures so the building
//! context and the compiled pipeline can both hold them.

use std::sync::Arc;

use crate::action::Action;

/// Shared action predicate.
pub type MatcherFn = Arc<dyn Fn(&Action) -> bool + Send + Sync>;

/// Wrap a plain closure as a [`MatcherFn`].
pub fn from_fn(f: impl Fn(&Action) -> bool + Send + Sync + 'static) -> MatcherFn {
    Arc::new(f)
}

/// Matcher accepting exactly one action type.
pub fn kind_is(kind: impl Into<String>) -> MatcherFn {
    let kind = kind.into();
    Arc::new(move |action| action.kind == kind)
}

/// Matcher accepting any of the given action types.
pub fn any_of(kinds: impl IntoIterator<Item = impl Into<String>>) -> MatcherFn {
    let kinds: Vec<String> = kinds.into_iter().map(Into::into).collect();
    Arc::new(move |action| kinds.iter().any(|k| action.kind == *k))
}
