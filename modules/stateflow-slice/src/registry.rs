//! The reducer-definition kind registry.
//!
//! Each kind is a handling function that consumes one definition and wires
//! it into the building context. The built-in kinds form a closed tagged
//! set; user kinds extend the table at engine construction, under any tag
//! that is not reserved.

use std::collections::HashMap;
use std::sync::Arc;

use stateflow_action::{ActionCreator, OpLifecycle};

use crate::context::{ActionSurface, BuildContext, CaseReducerEntry, LifecycleReducers};
use crate::definition::{
    ReducerDefinition, ReducerDetails, KIND_ASYNC, KIND_PREPARED, KIND_REDUCER, RESERVED_KINDS,
};
use crate::error::SliceError;
use crate::state::CaseReducer;

/// Handling function for one kind: consume the definition, wire the context.
pub type KindHandler =
    Arc<dyn Fn(ReducerDefinition, &ReducerDetails, &mut BuildContext) -> Result<(), SliceError> + Send + Sync>;

/// Immutable tag → handler table, built once per engine and captured by
/// every slice construction that engine performs.
#[derive(Clone)]
pub struct KindRegistry {
    handlers: HashMap<String, KindHandler>,
}

impl KindRegistry {
    /// The three built-in kinds.
    pub fn builtin() -> Self {
        let mut handlers: HashMap<String, KindHandler> = HashMap::new();
        handlers.insert(KIND_REDUCER.to_string(), Arc::new(handle_case));
        handlers.insert(KIND_PREPARED.to_string(), Arc::new(handle_prepared));
        handlers.insert(KIND_ASYNC.to_string(), Arc::new(handle_async));
        Self { handlers }
    }

    /// Add a user kind. Reserved tags and already-registered tags fail fast.
    pub fn with_kind(
        mut self,
        tag: impl Into<String>,
        handler: KindHandler,
    ) -> Result<Self, SliceError> {
        let tag = tag.into();
        if RESERVED_KINDS.contains(&tag.as_str()) || self.handlers.contains_key(&tag) {
            return Err(SliceError::ReservedKind(tag));
        }
        self.handlers.insert(tag, handler);
        Ok(self)
    }

    /// Route a definition to its kind's handling function.
    pub fn handle(
        &self,
        definition: ReducerDefinition,
        details: &ReducerDetails,
        cx: &mut BuildContext,
    ) -> Result<(), SliceError> {
        let handler = self
            .handlers
            .get(definition.tag())
            .cloned()
            .ok_or_else(|| SliceError::UnknownKind(definition.tag().to_string()))?;
        handler(definition, details, cx)
    }
}

fn handle_case(
    definition: ReducerDefinition,
    details: &ReducerDetails,
    cx: &mut BuildContext,
) -> Result<(), SliceError> {
    let ReducerDefinition::Case { reducer } = definition else {
        return Err(SliceError::DefinitionPayload(KIND_REDUCER.to_string()));
    };
    cx.add_case(details.action_kind.as_str(), reducer.clone())?;
    cx.expose_case_reducer(&details.handler_name, CaseReducerEntry::Single(reducer));
    cx.expose_action(
        &details.handler_name,
        ActionSurface::Creator(ActionCreator::new(&details.action_kind)),
    );
    Ok(())
}

fn handle_prepared(
    definition: ReducerDefinition,
    details: &ReducerDetails,
    cx: &mut BuildContext,
) -> Result<(), SliceError> {
    let ReducerDefinition::Prepared { prepare, reducer } = definition else {
        return Err(SliceError::DefinitionPayload(KIND_PREPARED.to_string()));
    };
    cx.add_case(details.action_kind.as_str(), reducer.clone())?;
    cx.expose_case_reducer(&details.handler_name, CaseReducerEntry::Single(reducer));
    cx.expose_action(
        &details.handler_name,
        ActionSurface::Creator(ActionCreator::prepared_shared(&details.action_kind, prepare)),
    );
    Ok(())
}

fn handle_async(
    definition: ReducerDefinition,
    details: &ReducerDetails,
    cx: &mut BuildContext,
) -> Result<(), SliceError> {
    let ReducerDefinition::AsyncOp {
        payload_creator,
        phases,
        options,
    } = definition
    else {
        return Err(SliceError::DefinitionPayload(KIND_ASYNC.to_string()));
    };
    let lifecycle = Arc::new(OpLifecycle::new(
        &details.action_kind,
        payload_creator,
        options,
    ));
    if let Some(pending) = &phases.pending {
        cx.add_case(lifecycle.pending(), pending.clone())?;
    }
    if let Some(fulfilled) = &phases.fulfilled {
        cx.add_case(lifecycle.fulfilled(), fulfilled.clone())?;
    }
    if let Some(rejected) = &phases.rejected {
        cx.add_case(lifecycle.rejected(), rejected.clone())?;
    }
    if let Some(settled) = &phases.settled {
        // Settled spans both terminal types, so it goes through the matcher
        // path rather than the case map.
        cx.add_matcher(lifecycle.settled_matcher(), settled.clone());
    }
    cx.expose_case_reducer(
        &details.handler_name,
        CaseReducerEntry::Lifecycle(LifecycleReducers {
            pending: phases.pending.unwrap_or_else(CaseReducer::noop),
            fulfilled: phases.fulfilled.unwrap_or_else(CaseReducer::noop),
            rejected: phases.rejected.unwrap_or_else(CaseReducer::noop),
            settled: phases.settled.unwrap_or_else(CaseReducer::noop),
        }),
    );
    cx.expose_action(&details.handler_name, ActionSurface::Lifecycle(lifecycle));
    Ok(())
}
