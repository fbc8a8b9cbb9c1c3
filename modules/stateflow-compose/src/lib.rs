//! Root-state composition host.
//!
//! Holds the `{mount_path, reducer}` registrations of many slices and runs
//! every action through each slice's reducer against its branch of the
//! [`stateflow_slice::RootState`] tree. Slices arrive either statically
//! ([`Composer::register`]) or dynamically, through the
//! [`stateflow_slice::SliceHost`] injection contract. No store, no
//! middleware, no dispatch loop lives here; callers own the action flow.

pub mod composer;

pub use composer::Composer;
