//! The engine factory and the slice builder.
//!
//! An engine is a kind registry plus options, built once and reused for
//! every slice it constructs. [`SliceBuilder::build`] is the default entry
//! point (built-in kinds only); [`SliceBuilder::build_with`] constructs
//! through a custom engine.

use std::any::type_name;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;
use stateflow_action::{scoped, Action, OpOptions, PayloadCreator, Prepared};
use tracing::{debug, warn};

use crate::builder::{execute, BuilderParts, ExtraReducers, ReducerBuilder};
use crate::context::BuildContext;
use crate::definition::{PhaseHandlers, ReducerDefinition, ReducerDetails};
use crate::error::SliceError;
use crate::pipeline::{LazyReducer, PipelineParts};
use crate::registry::{KindHandler, KindRegistry};
use crate::selector::ErasedSelector;
use crate::slice::Slice;
use crate::state::{CaseReducer, InitialState};

/// Explicit construction-time flags. Replaces any ambient environment
/// check: behavior never depends on environment variables.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Emit non-fatal `tracing` warnings for suspicious configurations
    /// (e.g. a slice declaring no handlers at all).
    pub diagnostics: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self { diagnostics: true }
    }
}

/// Slice factory: an immutable kind registry captured by every slice this
/// engine builds.
pub struct Engine {
    registry: KindRegistry,
    options: EngineOptions,
}

impl Engine {
    /// Engine with the built-in kinds only.
    pub fn new() -> Self {
        Self {
            registry: KindRegistry::builtin(),
            options: EngineOptions::default(),
        }
    }

    /// Engine with the built-in kinds plus validated user kinds.
    pub fn with_kinds(
        extra: impl IntoIterator<Item = (String, KindHandler)>,
    ) -> Result<Self, SliceError> {
        let mut registry = KindRegistry::builtin();
        for (tag, handler) in extra {
            registry = registry.with_kind(tag, handler)?;
        }
        Ok(Self {
            registry,
            options: EngineOptions::default(),
        })
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Construct a slice from a builder. Fails on the first configuration
    /// or registration error; no partial slice is produced.
    pub fn build<S: Clone + Send + Sync + 'static>(
        &self,
        builder: SliceBuilder<S>,
    ) -> Result<Slice<S>, SliceError> {
        let SliceBuilder {
            name,
            initial,
            definitions,
            selectors,
            extra,
            _marker,
        } = builder;

        if name.is_empty() {
            return Err(SliceError::EmptyName);
        }
        let initial = initial.ok_or_else(|| SliceError::MissingInitialState(name.clone()))?;
        if self.options.diagnostics && definitions.is_empty() && extra.is_none() {
            warn!(slice = %name, "slice declares no handlers; its reducer will never change state");
        }

        let mut cx = BuildContext::new(name.clone(), initial.clone());
        for (handler_name, definition) in definitions {
            let details = ReducerDetails {
                action_kind: scoped(&name, &handler_name),
                handler_name,
            };
            self.registry.handle(definition, &details, &mut cx)?;
        }

        // The external extension is evaluated eagerly, before any dispatch.
        let builder_parts = match extra {
            None => BuilderParts::empty(),
            Some(ExtraReducers::Callback(callback)) => execute(callback)?,
            Some(ExtraReducers::Table(_)) => return Err(SliceError::LegacyExtraReducers),
        };

        let parts = cx.into_parts();
        debug!(
            slice = %name,
            cases = parts.cases.len(),
            matchers = parts.matchers.len(),
            extra_cases = builder_parts.cases.len(),
            "slice constructed"
        );
        let reducer = Arc::new(LazyReducer::new(PipelineParts {
            slice_name: name.clone(),
            initial: initial.clone(),
            context_cases: parts.cases,
            builder_cases: builder_parts.cases,
            context_matchers: parts.matchers,
            builder_matchers: builder_parts.matchers,
            default: builder_parts.default,
        }));

        Ok(Slice::from_parts(
            name,
            reducer,
            initial,
            parts.actions,
            parts.case_reducers,
            selectors.into_iter().collect(),
        ))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Declarative slice configuration. Definition order is preserved; each
/// entry is routed through the engine's kind registry at build time.
pub struct SliceBuilder<S> {
    name: String,
    initial: Option<InitialState>,
    definitions: Vec<(String, ReducerDefinition)>,
    selectors: Vec<(String, ErasedSelector)>,
    extra: Option<ExtraReducers<S>>,
    _marker: PhantomData<fn(&mut S)>,
}

impl<S: Clone + Send + Sync + 'static> SliceBuilder<S> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            initial: None,
            definitions: Vec::new(),
            selectors: Vec::new(),
            extra: None,
            _marker: PhantomData,
        }
    }

    pub fn initial_state(mut self, value: S) -> Self {
        self.initial = Some(InitialState::value(value));
        self
    }

    /// Lazy initial state; the initializer runs at most once.
    pub fn initial_state_with(mut self, init: impl Fn() -> S + Send + Sync + 'static) -> Self {
        self.initial = Some(InitialState::lazy(init));
        self
    }

    /// Use `S::default()` as the initial state.
    pub fn default_initial(self) -> Self
    where
        S: Default,
    {
        self.initial_state_with(S::default)
    }

    /// A plain case reducer: handles `"<slice>/<name>"` and exposes a
    /// generated action creator under `name`.
    pub fn reducer(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&mut S, &Action) + Send + Sync + 'static,
    ) -> Self {
        self.definitions.push((
            name.into(),
            ReducerDefinition::Case {
                reducer: CaseReducer::typed(f),
            },
        ));
        self
    }

    /// A case reducer whose action creator runs `prepare` first to shape
    /// the payload and metadata.
    pub fn prepared(
        mut self,
        name: impl Into<String>,
        prepare: impl Fn(Value) -> Prepared + Send + Sync + 'static,
        f: impl Fn(&mut S, &Action) + Send + Sync + 'static,
    ) -> Self {
        self.definitions.push((
            name.into(),
            ReducerDefinition::Prepared {
                prepare: Arc::new(prepare),
                reducer: CaseReducer::typed(f),
            },
        ));
        self
    }

    /// An async-operation reducer: wires the provided phase handlers for an
    /// externally executed operation and exposes its lifecycle under `name`.
    pub fn async_op(
        self,
        name: impl Into<String>,
        payload_creator: PayloadCreator,
        phases: PhaseHandlers<S>,
    ) -> Self {
        self.async_op_with(name, payload_creator, phases, OpOptions::default())
    }

    pub fn async_op_with(
        mut self,
        name: impl Into<String>,
        payload_creator: PayloadCreator,
        phases: PhaseHandlers<S>,
        options: OpOptions,
    ) -> Self {
        self.definitions.push((
            name.into(),
            ReducerDefinition::AsyncOp {
                payload_creator,
                phases: phases.into_set(),
                options,
            },
        ));
        self
    }

    /// A raw definition, for user-registered kinds.
    pub fn define(mut self, name: impl Into<String>, definition: ReducerDefinition) -> Self {
        self.definitions.push((name.into(), definition));
        self
    }

    /// A named selector over the slice state, bound lazily after
    /// construction through `get_selectors`/`selectors`.
    pub fn selector(
        mut self,
        name: impl Into<String>,
        f: impl Fn(&S) -> Value + Send + Sync + 'static,
    ) -> Self {
        let erased: ErasedSelector = Arc::new(move |state| {
            let state = state
                .downcast_ref::<S>()
                .ok_or(SliceError::StateTypeMismatch(type_name::<S>()))?;
            Ok(f(state))
        });
        self.selectors.push((name.into(), erased));
        self
    }

    /// Extra case/matcher/default handlers via the builder callback,
    /// evaluated eagerly at build time.
    pub fn extra_reducers(
        mut self,
        callback: impl FnOnce(&mut ReducerBuilder<S>) -> Result<(), SliceError> + 'static,
    ) -> Self {
        self.extra = Some(ExtraReducers::Callback(Box::new(callback)));
        self
    }

    /// The legacy table form of the extension mechanism. Rejected at build
    /// time; present only so misuse fails loudly.
    pub fn extra_reducer_table(mut self, table: HashMap<String, CaseReducer>) -> Self {
        self.extra = Some(ExtraReducers::Table(table));
        self
    }

    /// Build through an engine with the built-in kinds (the default
    /// engine).
    pub fn build(self) -> Result<Slice<S>, SliceError> {
        Engine::new().build(self)
    }

    pub fn build_with(self, engine: &Engine) -> Result<Slice<S>, SliceError> {
        engine.build(self)
    }
}
