//! The reducer-handling context: the accumulator every kind's handling
//! function writes into during slice construction.

use std::collections::HashMap;

use stateflow_action::{Action, ActionCreator, MatcherFn, OpLifecycle};
use std::sync::Arc;
use tracing::debug;

use crate::error::SliceError;
use crate::state::{CaseReducer, InitialState, SliceState};

/// What a handler name exposes on the finished slice's action map: a plain
/// creator, or a whole async lifecycle (start creator plus phase creators).
#[derive(Clone)]
pub enum ActionSurface {
    Creator(ActionCreator),
    Lifecycle(Arc<OpLifecycle>),
}

impl ActionSurface {
    /// The action type dispatching this surface produces: the creator's
    /// type, or the lifecycle's start type.
    pub fn kind(&self) -> &str {
        match self {
            ActionSurface::Creator(c) => c.kind(),
            ActionSurface::Lifecycle(l) => l.kind(),
        }
    }

    pub fn as_creator(&self) -> Option<&ActionCreator> {
        match self {
            ActionSurface::Creator(c) => Some(c),
            ActionSurface::Lifecycle(_) => None,
        }
    }

    pub fn as_lifecycle(&self) -> Option<&Arc<OpLifecycle>> {
        match self {
            ActionSurface::Lifecycle(l) => Some(l),
            ActionSurface::Creator(_) => None,
        }
    }

    /// Create the surface's action: the creator's action, or the lifecycle
    /// start action.
    pub fn action(&self, arg: impl Into<serde_json::Value>) -> Action {
        match self {
            ActionSurface::Creator(c) => c.action(arg),
            ActionSurface::Lifecycle(l) => l.start(arg),
        }
    }
}

/// What a handler name exposes on the finished slice's case-reducer map.
#[derive(Clone)]
pub enum CaseReducerEntry {
    Single(CaseReducer),
    Lifecycle(LifecycleReducers),
}

impl CaseReducerEntry {
    pub fn as_single(&self) -> Option<&CaseReducer> {
        match self {
            CaseReducerEntry::Single(r) => Some(r),
            CaseReducerEntry::Lifecycle(_) => None,
        }
    }

    pub fn as_lifecycle(&self) -> Option<&LifecycleReducers> {
        match self {
            CaseReducerEntry::Lifecycle(l) => Some(l),
            CaseReducerEntry::Single(_) => None,
        }
    }
}

/// The exposed record for an async handler; absent phases are no-ops.
#[derive(Clone)]
pub struct LifecycleReducers {
    pub pending: CaseReducer,
    pub fulfilled: CaseReducer,
    pub rejected: CaseReducer,
    pub settled: CaseReducer,
}

/// Resolve an action type from a string or an action-creator-like value.
pub trait IntoActionKind {
    fn into_action_kind(self) -> String;
}

impl IntoActionKind for String {
    fn into_action_kind(self) -> String {
        self
    }
}

impl IntoActionKind for &str {
    fn into_action_kind(self) -> String {
        self.to_string()
    }
}

impl IntoActionKind for &ActionCreator {
    fn into_action_kind(self) -> String {
        self.kind().to_string()
    }
}

impl IntoActionKind for &ActionSurface {
    fn into_action_kind(self) -> String {
        self.kind().to_string()
    }
}

/// Per-construction accumulator. Created fresh for each slice build,
/// populated synchronously by the kind handlers, then dissolved into the
/// pipeline parts and the slice's exposed maps.
pub struct BuildContext {
    slice_name: String,
    initial: InitialState,
    cases: HashMap<String, CaseReducer>,
    matchers: Vec<(MatcherFn, CaseReducer)>,
    actions: HashMap<String, ActionSurface>,
    case_reducers: HashMap<String, CaseReducerEntry>,
}

impl BuildContext {
    pub fn new(slice_name: impl Into<String>, initial: InitialState) -> Self {
        Self {
            slice_name: slice_name.into(),
            initial,
            cases: HashMap::new(),
            matchers: Vec::new(),
            actions: HashMap::new(),
            case_reducers: HashMap::new(),
        }
    }

    pub fn slice_name(&self) -> &str {
        &self.slice_name
    }

    /// Register a case handler under an action type. The type must be
    /// non-empty and not already registered in this construction, no matter
    /// which kind registered it first.
    pub fn add_case(
        &mut self,
        kind: impl IntoActionKind,
        reducer: CaseReducer,
    ) -> Result<&mut Self, SliceError> {
        let kind = kind.into_action_kind();
        if kind.is_empty() {
            return Err(SliceError::EmptyActionKind);
        }
        if self.cases.contains_key(&kind) {
            return Err(SliceError::DuplicateCase(kind));
        }
        self.cases.insert(kind, reducer);
        Ok(self)
    }

    /// Append a matcher handler. Insertion order is evaluation order; every
    /// matching matcher runs on dispatch.
    pub fn add_matcher(&mut self, matcher: MatcherFn, reducer: CaseReducer) -> &mut Self {
        self.matchers.push((matcher, reducer));
        self
    }

    /// Expose an action surface under a handler name. Last write wins; a
    /// single kind normally owns each name.
    pub fn expose_action(&mut self, name: &str, surface: ActionSurface) -> &mut Self {
        if self.actions.contains_key(name) {
            debug!(slice = %self.slice_name, handler = name, "exposed action shadowed");
        }
        self.actions.insert(name.to_string(), surface);
        self
    }

    /// Expose a case-reducer entry under a handler name. Last write wins.
    pub fn expose_case_reducer(&mut self, name: &str, entry: CaseReducerEntry) -> &mut Self {
        if self.case_reducers.contains_key(name) {
            debug!(slice = %self.slice_name, handler = name, "exposed case reducer shadowed");
        }
        self.case_reducers.insert(name.to_string(), entry);
        self
    }

    /// A fresh copy of the slice's initial state. A lazy initializer behind
    /// this accessor has already been resolved and cached, so repeated calls
    /// return clones of the same value.
    pub fn initial_state(&self) -> SliceState {
        self.initial.fresh()
    }

    pub(crate) fn into_parts(self) -> ContextParts {
        ContextParts {
            cases: self.cases,
            matchers: self.matchers,
            actions: self.actions,
            case_reducers: self.case_reducers,
        }
    }
}

/// What the context dissolves into once every definition is handled.
pub(crate) struct ContextParts {
    pub cases: HashMap<String, CaseReducer>,
    pub matchers: Vec<(MatcherFn, CaseReducer)>,
    pub actions: HashMap<String, ActionSurface>,
    pub case_reducers: HashMap<String, CaseReducerEntry>,
}
