//! The composed slice handle and the injection adapter.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;
use stateflow_action::Action;
use tracing::debug;

use crate::context::{ActionSurface, CaseReducerEntry};
use crate::error::SliceError;
use crate::pipeline::LazyReducer;
use crate::root::RootState;
use crate::selector::{
    state_accessor, BoundSelector, ErasedSelector, SelectorCache, SelectorSet, StateAccessor,
};
use crate::state::{InitialState, SliceState};

/// Erased per-slice reducer entry point, as registered with a composition
/// host. Absent incoming state resolves to the slice's initial state.
pub type DynReducer =
    Arc<dyn Fn(Option<SliceState>, &Action) -> Result<SliceState, SliceError> + Send + Sync>;

/// Options for [`Slice::inject_into`].
#[derive(Debug, Clone, Default)]
pub struct InjectConfig {
    /// Mount the slice under this path instead of its own.
    pub mount_path: Option<String>,
}

/// What a slice hands to a composition host.
pub struct ReducerEntry {
    pub mount_path: String,
    pub reducer: DynReducer,
}

/// A root-composition host: accepts `{mount_path, reducer}` registrations.
/// The slice side only ever calls `inject`; host internals stay opaque.
pub trait SliceHost {
    fn inject(&mut self, entry: ReducerEntry, config: &InjectConfig) -> Result<(), SliceError>;
}

pub(crate) struct SliceCore {
    name: String,
    mount_path: String,
    injected: bool,
    reducer: Arc<LazyReducer>,
    dyn_reducer: DynReducer,
    initial: InitialState,
    actions: HashMap<String, ActionSurface>,
    case_reducers: HashMap<String, CaseReducerEntry>,
    selector_sources: HashMap<String, ErasedSelector>,
    cache: SelectorCache,
    /// Canonical accessors so the no-argument selector forms hit one cache
    /// entry per handle instead of allocating a fresh accessor per call.
    identity_accessor: StateAccessor,
    mount_accessor: StateAccessor,
}

impl SliceCore {
    fn with_mount(&self, mount_path: String, injected: bool) -> Self {
        Self {
            name: self.name.clone(),
            mount_path: mount_path.clone(),
            injected,
            reducer: Arc::clone(&self.reducer),
            dyn_reducer: Arc::clone(&self.dyn_reducer),
            initial: self.initial.clone(),
            actions: self.actions.clone(),
            case_reducers: self.case_reducers.clone(),
            selector_sources: self.selector_sources.clone(),
            cache: SelectorCache::new(),
            identity_accessor: state_accessor(|root| Some(root)),
            mount_accessor: make_mount_accessor(mount_path),
        }
    }
}

fn make_mount_accessor(mount_path: String) -> StateAccessor {
    state_accessor(move |root| {
        root.downcast_ref::<RootState>()
            .and_then(|root| root.get(&mount_path))
    })
}

/// The externally visible composed slice: name, mount path, dispatchable
/// reducer, generated action creators, exposed case reducers, and selector
/// access. `S` is the slice's state type; everything underneath is erased
/// so heterogeneous slices compose into one tree.
///
/// Cloning shares the handle (same identity, same caches). Use
/// [`Slice::inject_into`] to derive a variant with a new identity.
pub struct Slice<S> {
    core: Arc<SliceCore>,
    _marker: PhantomData<fn() -> S>,
}

impl<S> Clone for Slice<S> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
            _marker: PhantomData,
        }
    }
}

impl<S> fmt::Debug for Slice<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slice")
            .field("name", &self.core.name)
            .field("mount_path", &self.core.mount_path)
            .field("injected", &self.core.injected)
            .finish()
    }
}

impl<S: Clone + Send + Sync + 'static> Slice<S> {
    pub(crate) fn from_parts(
        name: String,
        reducer: Arc<LazyReducer>,
        initial: InitialState,
        actions: HashMap<String, ActionSurface>,
        case_reducers: HashMap<String, CaseReducerEntry>,
        selector_sources: HashMap<String, ErasedSelector>,
    ) -> Self {
        let dyn_reducer: DynReducer = {
            let reducer = Arc::clone(&reducer);
            Arc::new(move |state, action| reducer.reduce(state, action))
        };
        let core = SliceCore {
            mount_path: name.clone(),
            mount_accessor: make_mount_accessor(name.clone()),
            identity_accessor: state_accessor(|root| Some(root)),
            name,
            injected: false,
            reducer,
            dyn_reducer,
            initial,
            actions,
            case_reducers,
            selector_sources,
            cache: SelectorCache::new(),
        };
        Self {
            core: Arc::new(core),
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// The key under which this slice's state lives in the composed root
    /// state. Defaults to the slice name; injected variants may remap it.
    pub fn mount_path(&self) -> &str {
        &self.core.mount_path
    }

    pub fn is_injected(&self) -> bool {
        self.core.injected
    }

    /// Apply one action to this slice's state. `None` stands for
    /// not-yet-initialized state and resolves to the initial state.
    pub fn reduce(&self, state: Option<S>, action: &Action) -> Result<S, SliceError> {
        let state = state.map(|s| Box::new(s) as SliceState);
        let next = self.core.reducer.reduce(state, action)?;
        next.downcast::<S>()
            .map(|boxed| *boxed)
            .map_err(|_| SliceError::StateTypeMismatch(type_name::<S>()))
    }

    /// The erased reducer entry point. Stable across calls and shared with
    /// injected variants, so hosts can deduplicate by identity.
    pub fn reducer(&self) -> DynReducer {
        Arc::clone(&self.core.dyn_reducer)
    }

    pub fn get_initial_state(&self) -> Result<S, SliceError> {
        self.core.initial.fresh_as::<S>()
    }

    pub fn actions(&self) -> &HashMap<String, ActionSurface> {
        &self.core.actions
    }

    pub fn action(&self, handler_name: &str) -> Option<&ActionSurface> {
        self.core.actions.get(handler_name)
    }

    pub fn case_reducers(&self) -> &HashMap<String, CaseReducerEntry> {
        &self.core.case_reducers
    }

    pub fn case_reducer(&self, handler_name: &str) -> Option<&CaseReducerEntry> {
        self.core.case_reducers.get(handler_name)
    }

    /// Selectors bound to the identity accessor: callers pass the slice's
    /// own state.
    pub fn get_selectors(&self) -> Arc<SelectorSet> {
        let accessor = Arc::clone(&self.core.identity_accessor);
        self.bind_selectors(&accessor)
    }

    /// Selectors bound to a caller-supplied accessor. Reference-equal
    /// accessors (the same `Arc`) return the same selector set, with the
    /// same per-name function identities.
    pub fn get_selectors_with(&self, accessor: &StateAccessor) -> Arc<SelectorSet> {
        self.bind_selectors(accessor)
    }

    /// Selectors bound to this handle's mount path: callers pass the
    /// composed [`RootState`].
    pub fn selectors(&self) -> Arc<SelectorSet> {
        let accessor = Arc::clone(&self.core.mount_accessor);
        self.bind_selectors(&accessor)
    }

    fn bind_selectors(&self, accessor: &StateAccessor) -> Arc<SelectorSet> {
        self.core.cache.get_or_insert(accessor, || {
            self.core
                .selector_sources
                .iter()
                .map(|(name, user)| {
                    (
                        name.clone(),
                        bind_one(
                            accessor,
                            user,
                            &self.core.initial,
                            self.core.injected,
                            &self.core.name,
                        ),
                    )
                })
                .collect()
        })
    }

    /// Read this slice's state out of the composed root. An absent branch
    /// resolves to the initial state for injected variants and is an error
    /// for statically mounted ones.
    pub fn select_slice(&self, root: &RootState) -> Result<S, SliceError> {
        match root.get(&self.core.mount_path) {
            Some(branch) => branch
                .downcast_ref::<S>()
                .cloned()
                .ok_or(SliceError::StateTypeMismatch(type_name::<S>())),
            None if self.core.injected => self.core.initial.fresh_as::<S>(),
            None => Err(SliceError::MissingSliceState(self.core.name.clone())),
        }
    }

    /// Register this slice's reducer with a composition host, then return a
    /// new handle bound to the (possibly remapped) mount path whose
    /// selectors tolerate an absent state branch. The original handle is
    /// untouched.
    pub fn inject_into<H: SliceHost>(
        &self,
        host: &mut H,
        config: InjectConfig,
    ) -> Result<Slice<S>, SliceError> {
        let mount_path = config
            .mount_path
            .clone()
            .unwrap_or_else(|| self.core.mount_path.clone());
        host.inject(
            ReducerEntry {
                mount_path: mount_path.clone(),
                reducer: Arc::clone(&self.core.dyn_reducer),
            },
            &config,
        )?;
        debug!(slice = %self.core.name, mount_path = %mount_path, "slice injected");
        Ok(Slice {
            core: Arc::new(self.core.with_mount(mount_path, true)),
            _marker: PhantomData,
        })
    }
}

fn bind_one(
    accessor: &StateAccessor,
    user: &ErasedSelector,
    initial: &InitialState,
    injected: bool,
    slice_name: &str,
) -> BoundSelector {
    let bound = {
        // Held weakly so the cached set never keeps its accessor alive; a
        // set that outlives its accessor resolves like an absent branch.
        let accessor = Arc::downgrade(accessor);
        let user = Arc::clone(user);
        let initial = initial.clone();
        let slice_name = slice_name.to_string();
        Arc::new(move |root: &dyn Any| -> Result<Value, SliceError> {
            match accessor.upgrade().and_then(|navigate| navigate(root)) {
                Some(state) => user(state),
                None if injected => {
                    let state = initial.fresh();
                    let state: &dyn Any = state.as_ref();
                    user(state)
                }
                None => Err(SliceError::MissingSliceState(slice_name.clone())),
            }
        })
    };
    BoundSelector::new(bound, Arc::clone(user))
}
