//! The composition host: an ordered set of mounted slice reducers.

use std::sync::Arc;

use stateflow_action::Action;
use stateflow_slice::{
    DynReducer, InjectConfig, ReducerEntry, RootState, Slice, SliceError, SliceHost,
};
use tracing::warn;

/// Action kind dispatched by [`Composer::initial_root`]. No slice handles
/// it, so every reducer falls through to its initial-state substitution.
pub const INIT_KIND: &str = "@@stateflow/init";

struct Mounted {
    mount_path: String,
    reducer: DynReducer,
}

/// Routes each action through every mounted slice reducer against its own
/// branch of the [`RootState`] tree. Registration order is dispatch order.
///
/// Slices land here two ways: eagerly via [`Composer::register`], or
/// through the [`SliceHost`] injection contract (`slice.inject_into`).
/// Either way the set only grows; a mount path, once claimed, keeps its
/// first reducer.
#[derive(Default)]
pub struct Composer {
    mounted: Vec<Mounted>,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount a slice under its own mount path.
    pub fn register<S: Clone + Send + Sync + 'static>(&mut self, slice: &Slice<S>) {
        self.mount(slice.mount_path().to_string(), slice.reducer());
    }

    pub fn mount_paths(&self) -> impl Iterator<Item = &str> {
        self.mounted.iter().map(|m| m.mount_path.as_str())
    }

    pub fn len(&self) -> usize {
        self.mounted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounted.is_empty()
    }

    /// Run one action through every mounted reducer. Each reducer sees its
    /// own branch (or `None` when the branch does not exist yet) and its
    /// result is written back under the same mount path.
    pub fn reduce(&self, mut root: RootState, action: &Action) -> Result<RootState, SliceError> {
        for mounted in &self.mounted {
            let branch = root.take(&mounted.mount_path);
            let next = (mounted.reducer)(branch, action)?;
            root.insert(mounted.mount_path.clone(), next);
        }
        Ok(root)
    }

    /// Build the fully populated initial tree by reducing an empty root
    /// with an action nothing handles.
    pub fn initial_root(&self) -> Result<RootState, SliceError> {
        self.reduce(RootState::new(), &Action::new(INIT_KIND))
    }

    fn mount(&mut self, mount_path: String, reducer: DynReducer) {
        if let Some(existing) = self.mounted.iter().find(|m| m.mount_path == mount_path) {
            if !Arc::ptr_eq(&existing.reducer, &reducer) {
                warn!(mount_path = %mount_path, "mount path already claimed, keeping first reducer");
            }
            return;
        }
        self.mounted.push(Mounted { mount_path, reducer });
    }
}

impl SliceHost for Composer {
    fn inject(&mut self, entry: ReducerEntry, _config: &InjectConfig) -> Result<(), SliceError> {
        self.mount(entry.mount_path, entry.reducer);
        Ok(())
    }
}
