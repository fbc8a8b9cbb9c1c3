//! The action-creator primitive.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::action::Action;

/// Result of a payload-preparation step: the shaped fields of the action
/// about to be created.
#[derive(Debug, Clone, PartialEq)]
pub struct Prepared {
    pub payload: Value,
    pub meta: Value,
    pub error: bool,
}

impl Prepared {
    pub fn payload(payload: impl Into<Value>) -> Self {
        Self {
            payload: payload.into(),
            meta: Value::Null,
            error: false,
        }
    }

    pub fn with_meta(mut self, meta: impl Into<Value>) -> Self {
        self.meta = meta.into();
        self
    }

    pub fn with_error(mut self, error: bool) -> Self {
        self.error = error;
        self
    }
}

/// Shared payload-preparation function.
pub type SharedPrepare = Arc<dyn Fn(Value) -> Prepared + Send + Sync>;

/// Produces actions of one fixed type, optionally shaping the payload
/// through a preparation step first.
///
/// The creator carries its action type so registration sites can resolve a
/// type from either a string or a creator.
#[derive(Clone)]
pub struct ActionCreator {
    kind: String,
    prepare: Option<SharedPrepare>,
}

impl ActionCreator {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            prepare: None,
        }
    }

    /// Creator whose argument is run through `prepare` before dispatch.
    pub fn prepared(
        kind: impl Into<String>,
        prepare: impl Fn(Value) -> Prepared + Send + Sync + 'static,
    ) -> Self {
        Self::prepared_shared(kind, Arc::new(prepare))
    }

    pub fn prepared_shared(kind: impl Into<String>, prepare: SharedPrepare) -> Self {
        Self {
            kind: kind.into(),
            prepare: Some(prepare),
        }
    }

    /// The action type every produced action carries.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Create an action from the given argument. For prepared creators the
    /// argument is what `prepare` receives; otherwise it becomes the payload
    /// unchanged.
    pub fn action(&self, arg: impl Into<Value>) -> Action {
        let arg = arg.into();
        match &self.prepare {
            Some(prepare) => {
                let shaped = prepare(arg);
                Action::new(&self.kind)
                    .with_payload(shaped.payload)
                    .with_meta(shaped.meta)
                    .with_error(shaped.error)
            }
            None => Action::new(&self.kind).with_payload(arg),
        }
    }

    /// Create an action with no argument (payload stays null unless a
    /// preparation step shapes it).
    pub fn action_empty(&self) -> Action {
        self.action(Value::Null)
    }

    /// True when the action carries this creator's type.
    pub fn matches(&self, action: &Action) -> bool {
        action.kind == self.kind
    }
}

impl fmt::Debug for ActionCreator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionCreator")
            .field("kind", &self.kind)
            .field("prepared", &self.prepare.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_creator_passes_payload_through() {
        let creator = ActionCreator::new("counter/addBy");
        let action = creator.action(5);
        assert_eq!(action.kind, "counter/addBy");
        assert_eq!(action.payload, json!(5));
    }

    #[test]
    fn empty_call_has_null_payload() {
        let creator = ActionCreator::new("counter/increment");
        assert_eq!(creator.action_empty().payload, Value::Null);
    }

    #[test]
    fn prepared_creator_shapes_payload_and_meta() {
        let creator = ActionCreator::prepared("todo/add", |arg| {
            Prepared::payload(json!({"text": arg})).with_meta(json!({"source": "test"}))
        });
        let action = creator.action("buy milk");
        assert_eq!(action.payload["text"], "buy milk");
        assert_eq!(action.meta["source"], "test");
        assert!(!action.error);
    }

    #[test]
    fn matches_by_kind() {
        let creator = ActionCreator::new("a/b");
        assert!(creator.matches(&Action::new("a/b")));
        assert!(!creator.matches(&Action::new("a/c")));
    }
}
