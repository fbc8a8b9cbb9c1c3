//! Reducer definitions: what a declared handler *is* before it gets wired.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use stateflow_action::{Action, OpOptions, PayloadCreator, SharedPrepare};

use crate::state::CaseReducer;

/// Tag of the plain case-reducer kind.
pub const KIND_REDUCER: &str = "reducer";
/// Tag of the case-reducer-with-prepare kind.
pub const KIND_PREPARED: &str = "preparedReducer";
/// Tag of the async-operation kind.
pub const KIND_ASYNC: &str = "asyncReducer";

/// Tags that user-supplied kinds may not claim.
pub const RESERVED_KINDS: &[&str] = &[KIND_REDUCER, KIND_PREPARED, KIND_ASYNC];

/// A declared handler, tagged by kind. Produced once, consumed exactly once
/// by the kind's handling function during slice construction.
pub enum ReducerDefinition {
    /// A plain transition function.
    Case { reducer: CaseReducer },
    /// A payload-preparation function bundled with a transition function.
    Prepared {
        prepare: SharedPrepare,
        reducer: CaseReducer,
    },
    /// An operation initiator with up to four optional phase handlers.
    AsyncOp {
        payload_creator: PayloadCreator,
        phases: PhaseSet,
        options: OpOptions,
    },
    /// A user-registered kind; the payload is whatever its `define` step
    /// produced and only its `handle` knows the concrete type.
    Custom {
        kind: String,
        payload: Box<dyn Any + Send>,
    },
}

impl ReducerDefinition {
    pub fn tag(&self) -> &str {
        match self {
            ReducerDefinition::Case { .. } => KIND_REDUCER,
            ReducerDefinition::Prepared { .. } => KIND_PREPARED,
            ReducerDefinition::AsyncOp { .. } => KIND_ASYNC,
            ReducerDefinition::Custom { kind, .. } => kind,
        }
    }
}

impl fmt::Debug for ReducerDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReducerDefinition")
            .field("tag", &self.tag())
            .finish()
    }
}

/// Per-definition details computed at handling time, never stored.
#[derive(Debug, Clone)]
pub struct ReducerDetails {
    pub handler_name: String,
    /// `scoped(slice_name, handler_name)`.
    pub action_kind: String,
}

/// Erased optional handlers for the four lifecycle phases.
#[derive(Clone, Default)]
pub struct PhaseSet {
    pub pending: Option<CaseReducer>,
    pub fulfilled: Option<CaseReducer>,
    pub rejected: Option<CaseReducer>,
    pub settled: Option<CaseReducer>,
}

/// Typed builder for a [`PhaseSet`].
pub struct PhaseHandlers<S> {
    set: PhaseSet,
    _marker: PhantomData<fn(&mut S)>,
}

impl<S: 'static> PhaseHandlers<S> {
    pub fn new() -> Self {
        Self {
            set: PhaseSet::default(),
            _marker: PhantomData,
        }
    }

    pub fn pending(mut self, f: impl Fn(&mut S, &Action) + Send + Sync + 'static) -> Self {
        self.set.pending = Some(CaseReducer::typed(f));
        self
    }

    pub fn fulfilled(mut self, f: impl Fn(&mut S, &Action) + Send + Sync + 'static) -> Self {
        self.set.fulfilled = Some(CaseReducer::typed(f));
        self
    }

    pub fn rejected(mut self, f: impl Fn(&mut S, &Action) + Send + Sync + 'static) -> Self {
        self.set.rejected = Some(CaseReducer::typed(f));
        self
    }

    /// Fires on either terminal phase; wired through the matcher path since
    /// it spans two action types.
    pub fn settled(mut self, f: impl Fn(&mut S, &Action) + Send + Sync + 'static) -> Self {
        self.set.settled = Some(CaseReducer::typed(f));
        self
    }

    pub(crate) fn into_set(self) -> PhaseSet {
        self.set
    }
}

impl<S: 'static> Default for PhaseHandlers<S> {
    fn default() -> Self {
        Self::new()
    }
}
