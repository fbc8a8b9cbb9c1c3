//! The async-operation lifecycle primitive.
//!
//! An externally executed async operation is represented as an action
//! triple: `<prefix>/pending` when it starts, then exactly one of
//! `<prefix>/fulfilled` or `<prefix>/rejected`. This module only *names*
//! those phases and builds their actions; it never awaits anything itself.
//! Driving the payload future is the caller's job, via [`OpLifecycle::begin`]
//! and [`OpRun::settle`].

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use crate::action::Action;
use crate::creator::ActionCreator;
use crate::matcher::{any_of, MatcherFn};

/// Future produced by a payload creator: the operation's result value, or
/// an error value for the rejected phase.
pub type PayloadFuture = BoxFuture<'static, Result<Value, Value>>;

/// The operation initiator. Called once per run with the start argument.
pub type PayloadCreator = Arc<dyn Fn(Value) -> PayloadFuture + Send + Sync>;

/// Options accepted at lifecycle construction.
#[derive(Clone, Default)]
pub struct OpOptions {
    /// When present, vetoes a run before the pending phase is entered.
    pub condition: Option<Arc<dyn Fn(&Value) -> bool + Send + Sync>>,
}

impl fmt::Debug for OpOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpOptions")
            .field("condition", &self.condition.is_some())
            .finish()
    }
}

/// One async operation's action surface: a start creator under the bare
/// prefix plus pending/fulfilled/rejected creators and a settled matcher.
pub struct OpLifecycle {
    kind: String,
    payload_creator: PayloadCreator,
    options: OpOptions,
    pending: ActionCreator,
    fulfilled: ActionCreator,
    rejected: ActionCreator,
}

impl OpLifecycle {
    pub fn new(kind: impl Into<String>, payload_creator: PayloadCreator, options: OpOptions) -> Self {
        let kind = kind.into();
        let pending = ActionCreator::new(format!("{kind}/pending"));
        let fulfilled = ActionCreator::new(format!("{kind}/fulfilled"));
        let rejected = ActionCreator::new(format!("{kind}/rejected"));
        Self {
            kind,
            payload_creator,
            options,
            pending,
            fulfilled,
            rejected,
        }
    }

    /// The bare operation type, e.g. `"users/fetchUser"`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn pending(&self) -> &ActionCreator {
        &self.pending
    }

    pub fn fulfilled(&self) -> &ActionCreator {
        &self.fulfilled
    }

    pub fn rejected(&self) -> &ActionCreator {
        &self.rejected
    }

    /// The start action: carries the operation argument as payload under the
    /// bare prefix. External executors react to it by calling [`Self::begin`].
    pub fn start(&self, arg: impl Into<Value>) -> Action {
        let arg = arg.into();
        Action::new(&self.kind)
            .with_meta(json!({ "arg": arg.clone() }))
            .with_payload(arg)
    }

    /// Matcher recognizing either terminal phase.
    pub fn settled_matcher(&self) -> MatcherFn {
        any_of([self.fulfilled.kind(), self.rejected.kind()])
    }

    /// Begin one run: returns the pending action plus the in-flight payload
    /// future, or `None` when the condition option vetoes the run.
    pub fn begin(&self, arg: impl Into<Value>) -> Option<OpRun> {
        let arg = arg.into();
        if let Some(condition) = &self.options.condition {
            if !condition(&arg) {
                debug!(op = %self.kind, "lifecycle run vetoed by condition");
                return None;
            }
        }
        let request_id = Uuid::new_v4().to_string();
        debug!(op = %self.kind, request_id = %request_id, "lifecycle run started");
        let pending = self
            .pending
            .action_empty()
            .with_meta(phase_meta(&arg, &request_id, "pending"));
        let fut = (self.payload_creator)(arg.clone());
        Some(OpRun {
            request_id,
            arg,
            pending,
            fut,
            fulfilled: self.fulfilled.clone(),
            rejected: self.rejected.clone(),
        })
    }
}

impl fmt::Debug for OpLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpLifecycle").field("kind", &self.kind).finish()
    }
}

/// One in-flight run: the pending action to dispatch now, and the terminal
/// action produced by awaiting the payload future.
pub struct OpRun {
    request_id: String,
    arg: Value,
    /// Dispatch this before awaiting [`Self::settle`].
    pub pending: Action,
    fut: PayloadFuture,
    fulfilled: ActionCreator,
    rejected: ActionCreator,
}

impl OpRun {
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Await the operation and produce its terminal action.
    pub async fn settle(self) -> Action {
        match self.fut.await {
            Ok(value) => self
                .fulfilled
                .action(value)
                .with_meta(phase_meta(&self.arg, &self.request_id, "fulfilled")),
            Err(err) => self
                .rejected
                .action(err)
                .with_meta(phase_meta(&self.arg, &self.request_id, "rejected"))
                .with_error(true),
        }
    }
}

fn phase_meta(arg: &Value, request_id: &str, status: &str) -> Value {
    json!({
        "arg": arg,
        "requestId": request_id,
        "requestStatus": status,
    })
}
