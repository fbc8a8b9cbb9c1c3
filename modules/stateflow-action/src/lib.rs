//! Action primitives for the stateflow engine.
//!
//! An action is a type string plus a dynamic JSON payload. This crate holds
//! the leaf-level building blocks consumed by `stateflow-slice`: the action
//! value itself, the action-creator primitive (optionally with a payload
//! preparation step), predicate matchers, the slice-scoped type namer, and
//! the async-operation lifecycle primitive (start/pending/fulfilled/rejected
//! plus a settled matcher). Nothing here dispatches or awaits anything.

pub mod action;
pub mod creator;
pub mod kind;
pub mod lifecycle;
pub mod matcher;

pub use action::Action;
pub use creator::{ActionCreator, Prepared, SharedPrepare};
pub use kind::scoped;
pub use lifecycle::{OpLifecycle, OpOptions, OpRun, PayloadCreator, PayloadFuture};
pub use matcher::{any_of, from_fn, kind_is, MatcherFn};
