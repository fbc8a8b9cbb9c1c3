//! The compiled reducer pipeline.
//!
//! Construction captures the parts (context cases and matchers, builder
//! cases, matchers and default); the merge into one dispatchable pipeline
//! happens lazily on the first dispatch and is memoized for the slice's
//! lifetime. Compiling is pure, so building at most once and reusing the
//! result indefinitely is safe.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use stateflow_action::{Action, MatcherFn};
use tracing::{debug, trace};

use crate::error::SliceError;
use crate::state::{CaseReducer, InitialState, SliceState};

pub(crate) struct PipelineParts {
    pub slice_name: String,
    pub initial: InitialState,
    pub context_cases: HashMap<String, CaseReducer>,
    pub builder_cases: HashMap<String, CaseReducer>,
    pub context_matchers: Vec<(MatcherFn, CaseReducer)>,
    pub builder_matchers: Vec<(MatcherFn, CaseReducer)>,
    pub default: Option<CaseReducer>,
}

struct Compiled {
    cases: HashMap<String, CaseReducer>,
    matchers: Vec<(MatcherFn, CaseReducer)>,
    default: Option<CaseReducer>,
}

/// The slice's state-transition function, built on first use.
pub struct LazyReducer {
    parts: PipelineParts,
    compiled: OnceLock<Compiled>,
    builds: AtomicUsize,
}

impl LazyReducer {
    pub(crate) fn new(parts: PipelineParts) -> Self {
        Self {
            parts,
            compiled: OnceLock::new(),
            builds: AtomicUsize::new(0),
        }
    }

    fn compiled(&self) -> &Compiled {
        self.compiled.get_or_init(|| {
            self.builds.fetch_add(1, Ordering::Relaxed);
            debug!(
                slice = %self.parts.slice_name,
                cases = self.parts.context_cases.len() + self.parts.builder_cases.len(),
                matchers = self.parts.context_matchers.len() + self.parts.builder_matchers.len(),
                "compiling reducer pipeline"
            );
            compile(&self.parts)
        })
    }

    /// Apply one action. An absent incoming state is replaced by the slice's
    /// initial state before any handler runs. At most one case handler runs;
    /// every matching matcher runs afterwards, in registration order; the
    /// default runs only when neither matched.
    pub fn reduce(
        &self,
        state: Option<SliceState>,
        action: &Action,
    ) -> Result<SliceState, SliceError> {
        let compiled = self.compiled();
        let mut state = match state {
            Some(state) => state,
            None => self.parts.initial.fresh(),
        };
        let mut matched = false;
        if let Some(case) = compiled.cases.get(action.kind.as_str()) {
            case.apply(state.as_mut(), action)?;
            matched = true;
        }
        for (matcher, handler) in &compiled.matchers {
            if matcher(action) {
                handler.apply(state.as_mut(), action)?;
                matched = true;
            }
        }
        if !matched {
            if let Some(default) = &compiled.default {
                default.apply(state.as_mut(), action)?;
            }
        }
        trace!(slice = %self.parts.slice_name, kind = %action.kind, matched, "reduced");
        Ok(state)
    }

    /// A fresh copy of the slice's initial state.
    pub fn initial_state(&self) -> SliceState {
        self.parts.initial.fresh()
    }

    pub fn slice_name(&self) -> &str {
        &self.parts.slice_name
    }

    pub(crate) fn build_count(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }
}

/// Merge the parts: case maps are unioned with context registrations
/// overwriting builder registrations for the same type; context matchers
/// run before builder matchers, each group in insertion order.
fn compile(parts: &PipelineParts) -> Compiled {
    let mut cases = parts.builder_cases.clone();
    for (kind, reducer) in &parts.context_cases {
        cases.insert(kind.clone(), reducer.clone());
    }
    let mut matchers =
        Vec::with_capacity(parts.context_matchers.len() + parts.builder_matchers.len());
    matchers.extend(parts.context_matchers.iter().cloned());
    matchers.extend(parts.builder_matchers.iter().cloned());
    Compiled {
        cases,
        matchers,
        default: parts.default.clone(),
    }
}
