/// Behaviour fixed for the lifetime of a [`TreeStore`](super::TreeStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Reject a new or renamed node whose name is already taken by a sibling.
    pub unique: bool,
}

impl StoreOptions {
    pub fn allow_duplicates() -> Self {
        Self { unique: false }
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self { unique: true }
    }
}
