//! Erased slice state and the case-reducer callable.
//!
//! Slices are typed at their public surface but the registry, the building
//! context and the composed root tree must hold handlers and states of many
//! slices side by side, so everything below the [`crate::slice::Slice`]
//! facade works on `dyn Any`.

use std::any::{type_name, Any};
use std::sync::{Arc, OnceLock};

use stateflow_action::Action;

use crate::error::SliceError;

/// One slice's boxed state branch.
pub type SliceState = Box<dyn Any + Send>;

/// A state transition for one action, erased over the state type.
///
/// Built from a typed closure; running it against a state of the wrong type
/// is a host-misuse error, never a panic.
#[derive(Clone)]
pub struct CaseReducer {
    run: Arc<dyn Fn(&mut dyn Any, &Action) -> Result<(), SliceError> + Send + Sync>,
}

impl CaseReducer {
    pub fn typed<S: 'static>(f: impl Fn(&mut S, &Action) + Send + Sync + 'static) -> Self {
        Self {
            run: Arc::new(move |state, action| {
                let state = state
                    .downcast_mut::<S>()
                    .ok_or(SliceError::StateTypeMismatch(type_name::<S>()))?;
                f(state, action);
                Ok(())
            }),
        }
    }

    /// Handler that leaves the state untouched. Used for absent lifecycle
    /// phases in exposed case-reducer records.
    pub fn noop() -> Self {
        Self {
            run: Arc::new(|_, _| Ok(())),
        }
    }

    pub fn apply(&self, state: &mut dyn Any, action: &Action) -> Result<(), SliceError> {
        (self.run)(state, action)
    }
}

/// Factory for a slice's initial state.
///
/// Lazy initializers are evaluated exactly once and the result cached; every
/// later call clones the cached value. This holds both for the top-level
/// accessor and for the building-context protocol, which share the factory.
#[derive(Clone)]
pub struct InitialState {
    build: Arc<dyn Fn() -> SliceState + Send + Sync>,
}

impl InitialState {
    pub fn value<S: Clone + Send + Sync + 'static>(value: S) -> Self {
        Self {
            build: Arc::new(move || Box::new(value.clone())),
        }
    }

    pub fn lazy<S: Clone + Send + Sync + 'static>(
        init: impl Fn() -> S + Send + Sync + 'static,
    ) -> Self {
        let cell: Arc<OnceLock<S>> = Arc::new(OnceLock::new());
        Self {
            build: Arc::new(move || -> SliceState {
                Box::new(cell.get_or_init(|| init()).clone())
            }),
        }
    }

    /// A fresh boxed copy of the initial state.
    pub fn fresh(&self) -> SliceState {
        (self.build)()
    }

    /// A fresh typed copy of the initial state.
    pub fn fresh_as<S: 'static>(&self) -> Result<S, SliceError> {
        self.fresh()
            .downcast::<S>()
            .map(|boxed| *boxed)
            .map_err(|_| SliceError::StateTypeMismatch(type_name::<S>()))
    }
}
