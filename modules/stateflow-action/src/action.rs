//! The dispatched action value.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A dispatchable action: a type discriminator plus a dynamic payload.
///
/// `kind` is the wire-level discriminator the compiled reducer keys on,
/// conventionally `"<slice>/<handler>"` (see [`crate::kind::scoped`]).
/// `meta` carries out-of-band data such as lifecycle request ids; `error`
/// marks rejected-phase actions whose payload is the error value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub meta: Value,
    #[serde(default)]
    pub error: bool,
}

impl Action {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: Value::Null,
            meta: Value::Null,
            error: false,
        }
    }

    pub fn with_payload(mut self, payload: impl Into<Value>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn with_meta(mut self, meta: impl Into<Value>) -> Self {
        self.meta = meta.into();
        self
    }

    pub fn with_error(mut self, error: bool) -> Self {
        self.error = error;
        self
    }

    /// True when this action carries the given type discriminator.
    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_are_empty() {
        let action = Action::new("counter/increment");
        assert_eq!(action.kind, "counter/increment");
        assert_eq!(action.payload, Value::Null);
        assert_eq!(action.meta, Value::Null);
        assert!(!action.error);
    }

    #[test]
    fn builder_style_fields() {
        let action = Action::new("users/fetchUser/rejected")
            .with_payload(json!({"message": "boom"}))
            .with_meta(json!({"requestId": "r1"}))
            .with_error(true);
        assert!(action.error);
        assert_eq!(action.payload["message"], "boom");
        assert_eq!(action.meta["requestId"], "r1");
    }

    #[test]
    fn round_trips_through_json() {
        let action = Action::new("a/b").with_payload(json!([1, 2, 3]));
        let text = serde_json::to_string(&action).expect("serialize");
        let back: Action = serde_json::from_str(&text).expect("deserialize");
        assert_eq!(back, action);
    }
}
