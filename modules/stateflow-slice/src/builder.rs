//! The external reducer-extension builder.
//!
//! A slice may accept extra case handlers for actions it does not own
//! (other slices' actions, lifecycle phases of foreign operations). Those
//! arrive through a builder callback evaluated eagerly at construction
//! time. The protocol is ordered: cases first, then matchers, then at most
//! one default case; violations are construction-time errors.

use std::collections::HashMap;
use std::marker::PhantomData;

use stateflow_action::{Action, MatcherFn};

use crate::context::IntoActionKind;
use crate::error::SliceError;
use crate::state::CaseReducer;

pub struct ReducerBuilder<S> {
    cases: HashMap<String, CaseReducer>,
    matchers: Vec<(MatcherFn, CaseReducer)>,
    default: Option<CaseReducer>,
    _marker: PhantomData<fn(&mut S)>,
}

impl<S: 'static> ReducerBuilder<S> {
    pub(crate) fn new() -> Self {
        Self {
            cases: HashMap::new(),
            matchers: Vec::new(),
            default: None,
            _marker: PhantomData,
        }
    }

    /// Add a case handler for one action type. Must precede any matcher or
    /// default registration; duplicate and empty types are errors.
    pub fn add_case(
        &mut self,
        kind: impl IntoActionKind,
        f: impl Fn(&mut S, &Action) + Send + Sync + 'static,
    ) -> Result<&mut Self, SliceError> {
        if !self.matchers.is_empty() || self.default.is_some() {
            return Err(SliceError::CaseAfterMatcher);
        }
        let kind = kind.into_action_kind();
        if kind.is_empty() {
            return Err(SliceError::EmptyActionKind);
        }
        if self.cases.contains_key(&kind) {
            return Err(SliceError::DuplicateCase(kind));
        }
        self.cases.insert(kind, CaseReducer::typed(f));
        Ok(self)
    }

    /// Add a matcher handler. Must precede the default registration.
    pub fn add_matcher(
        &mut self,
        matcher: impl Fn(&Action) -> bool + Send + Sync + 'static,
        f: impl Fn(&mut S, &Action) + Send + Sync + 'static,
    ) -> Result<&mut Self, SliceError> {
        if self.default.is_some() {
            return Err(SliceError::MatcherAfterDefault);
        }
        self.matchers
            .push((std::sync::Arc::new(matcher), CaseReducer::typed(f)));
        Ok(self)
    }

    /// Set the default case, invoked only when no case and no matcher
    /// matched. At most one.
    pub fn add_default(
        &mut self,
        f: impl Fn(&mut S, &Action) + Send + Sync + 'static,
    ) -> Result<&mut Self, SliceError> {
        if self.default.is_some() {
            return Err(SliceError::DuplicateDefault);
        }
        self.default = Some(CaseReducer::typed(f));
        Ok(self)
    }
}

/// The reducer-extension mechanism as supplied by the user.
pub enum ExtraReducers<S> {
    /// The supported form: a callback operating on the builder.
    Callback(Box<dyn FnOnce(&mut ReducerBuilder<S>) -> Result<(), SliceError>>),
    /// The legacy table form. Kept representable so construction can reject
    /// it with a clear error instead of silently accepting a map.
    Table(HashMap<String, CaseReducer>),
}

/// What the builder callback produced, in merge-ready form.
pub(crate) struct BuilderParts {
    pub cases: HashMap<String, CaseReducer>,
    pub matchers: Vec<(MatcherFn, CaseReducer)>,
    pub default: Option<CaseReducer>,
}

impl BuilderParts {
    pub fn empty() -> Self {
        Self {
            cases: HashMap::new(),
            matchers: Vec::new(),
            default: None,
        }
    }
}

/// Run the callback against a fresh builder and collect its registrations.
pub(crate) fn execute<S: 'static>(
    callback: Box<dyn FnOnce(&mut ReducerBuilder<S>) -> Result<(), SliceError>>,
) -> Result<BuilderParts, SliceError> {
    let mut builder = ReducerBuilder::new();
    callback(&mut builder)?;
    Ok(BuilderParts {
        cases: builder.cases,
        matchers: builder.matchers,
        default: builder.default,
    })
}
