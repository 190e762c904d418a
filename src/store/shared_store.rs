use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures_channel::mpsc::UnboundedReceiver;

use crate::store::{ChangeMode, TreeStore};
use crate::tree::{EntryData, Node, Snapshot, TreeError, TreePath};

/// A cloneable handle to one [`TreeStore`] for use across threads.
///
/// Mutations take the write lock, so they are serialised and each one either
/// installs a whole snapshot or nothing. Readers only hold the read lock long
/// enough to clone the snapshot pointer or resolve a node.
#[derive(Debug, Clone, Default)]
pub struct SharedTreeStore {
    inner: Arc<RwLock<TreeStore>>,
}

impl From<TreeStore> for SharedTreeStore {
    fn from(store: TreeStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }
}

impl SharedTreeStore {
    // The store never panics halfway through a mutation, so a poisoned lock
    // still guards a valid snapshot.
    fn read(&self) -> RwLockReadGuard<'_, TreeStore> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TreeStore> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current_snapshot(&self) -> Snapshot {
        self.read().current_snapshot()
    }

    pub fn get_entry(&self, path: impl Into<TreePath>) -> Result<Arc<Node>, TreeError> {
        self.read().get_entry(path)
    }

    pub fn subscribe(&self) -> UnboundedReceiver<Snapshot> {
        self.write().subscribe()
    }

    pub fn add_group(
        &self,
        name: impl Into<String>,
        path: impl Into<TreePath>,
    ) -> Result<(), TreeError> {
        self.write().add_group(name, path)
    }

    pub fn add_entry(
        &self,
        name: impl Into<String>,
        path: impl Into<TreePath>,
        data: EntryData,
    ) -> Result<(), TreeError> {
        self.write().add_entry(name, path, data)
    }

    pub fn remove_entry(&self, path: impl Into<TreePath>) -> Result<(), TreeError> {
        self.write().remove_entry(path)
    }

    pub fn rename_entry(
        &self,
        path: impl Into<TreePath>,
        new_name: impl Into<String>,
    ) -> Result<(), TreeError> {
        self.write().rename_entry(path, new_name)
    }

    pub fn change_entry_data(
        &self,
        path: impl Into<TreePath>,
        data: EntryData,
        mode: ChangeMode,
    ) -> Result<(), TreeError> {
        self.write().change_entry_data(path, data, mode)
    }
}
