//! The composed root state tree: one boxed branch per mount path.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use crate::state::SliceState;

/// Root of a composed state tree. Each slice's state lives under its mount
/// path; branches are owned boxes so slices of different state types can
/// coexist.
#[derive(Default)]
pub struct RootState {
    branches: HashMap<String, SliceState>,
}

impl RootState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, mount_path: &str) -> Option<&dyn Any> {
        match self.branches.get(mount_path) {
            Some(branch) => {
                let branch: &dyn Any = branch.as_ref();
                Some(branch)
            }
            None => None,
        }
    }

    pub fn get_as<S: 'static>(&self, mount_path: &str) -> Option<&S> {
        self.get(mount_path).and_then(|branch| branch.downcast_ref::<S>())
    }

    pub fn insert(&mut self, mount_path: impl Into<String>, state: SliceState) {
        self.branches.insert(mount_path.into(), state);
    }

    pub fn take(&mut self, mount_path: &str) -> Option<SliceState> {
        self.branches.remove(mount_path)
    }

    pub fn contains(&self, mount_path: &str) -> bool {
        self.branches.contains_key(mount_path)
    }

    pub fn mount_paths(&self) -> impl Iterator<Item = &str> {
        self.branches.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }
}

impl fmt::Debug for RootState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut paths: Vec<&str> = self.mount_paths().collect();
        paths.sort_unstable();
        f.debug_struct("RootState").field("mount_paths", &paths).finish()
    }
}
