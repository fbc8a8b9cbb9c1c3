//! Pluggable reducer-composition engine.
//!
//! Given a name, an initial state, and declarative case-reducer
//! definitions, this crate produces one dispatchable state-transition
//! function plus derived helpers: generated action creators, exposed case
//! reducers, bound selectors, and an injection adapter for mounting the
//! slice into a larger composed state tree.
//!
//! The moving parts, leaf first: a registry of reducer-definition kinds
//! ([`registry::KindRegistry`]), the per-construction accumulator every
//! kind writes into ([`context::BuildContext`]), an ordered external
//! extension builder ([`builder::ReducerBuilder`]), a lazily compiled,
//! memoized pipeline ([`pipeline::LazyReducer`]), selector binding with an
//! accessor-identity cache ([`selector`]), and the typed handle tying it
//! together ([`slice::Slice`]).
//!
//! Everything is synchronous. The async-operation kind only wires handlers
//! for the phases of an externally executed operation; see
//! `stateflow_action::OpLifecycle` for the driver side.

pub mod builder;
pub mod context;
pub mod definition;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod root;
pub mod selector;
pub mod slice;
pub mod state;

pub use builder::{ExtraReducers, ReducerBuilder};
pub use context::{ActionSurface, BuildContext, CaseReducerEntry, IntoActionKind, LifecycleReducers};
pub use definition::{
    PhaseHandlers, PhaseSet, ReducerDefinition, ReducerDetails, KIND_ASYNC, KIND_PREPARED,
    KIND_REDUCER, RESERVED_KINDS,
};
pub use engine::{Engine, EngineOptions, SliceBuilder};
pub use error::SliceError;
pub use pipeline::LazyReducer;
pub use registry::{KindHandler, KindRegistry};
pub use root::RootState;
pub use selector::{state_accessor, BoundSelector, ErasedSelector, SelectorSet, StateAccessor};
pub use slice::{DynReducer, InjectConfig, ReducerEntry, Slice, SliceHost};
pub use state::{CaseReducer, InitialState, SliceState};
