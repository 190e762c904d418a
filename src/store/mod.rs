mod change_mode;
mod options;
mod shared_store;
mod tree_store;

pub use change_mode::ChangeMode;
pub use options::StoreOptions;
pub use shared_store::SharedTreeStore;
pub use tree_store::TreeStore;
