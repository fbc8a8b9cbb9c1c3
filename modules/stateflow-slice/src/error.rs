use thiserror::Error;

/// Everything that can go wrong constructing or using a slice.
///
/// Construction either fully succeeds or returns exactly one of these; no
/// partial slice is ever produced. The only dispatch-time variants are the
/// selector-path `MissingSliceState` and the host-misuse `StateTypeMismatch`.
#[derive(Error, Debug)]
pub enum SliceError {
    // Configuration
    #[error("slice name must not be empty")]
    EmptyName,

    #[error("slice `{0}` has no initial state")]
    MissingInitialState(String),

    #[error("reducer kind `{0}` is reserved")]
    ReservedKind(String),

    #[error("no reducer kind registered under tag `{0}`")]
    UnknownKind(String),

    #[error("extra reducers must be supplied as a builder callback, not a table")]
    LegacyExtraReducers,

    // Registration
    #[error("a case reducer is already registered for action type `{0}`")]
    DuplicateCase(String),

    #[error("action type must not be empty")]
    EmptyActionKind,

    #[error("cases must be added before matchers and the default case")]
    CaseAfterMatcher,

    #[error("matchers must be added before the default case")]
    MatcherAfterDefault,

    #[error("the default case is already set")]
    DuplicateDefault,

    #[error("definition payload for kind `{0}` has an unexpected type")]
    DefinitionPayload(String),

    // State resolution
    #[error("state for slice `{0}` is missing from the root state")]
    MissingSliceState(String),

    #[error("slice state is not of type `{0}`")]
    StateTypeMismatch(&'static str),
}
