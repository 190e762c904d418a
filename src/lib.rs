//! A path-addressed tree of groups and entries with copy-on-write snapshots.
//!
//! [`store::TreeStore`] is the entry point: it owns the current
//! [`tree::Snapshot`] and exposes the mutation and query operations. The
//! remaining modules make up the `nestree` command-line front end.

pub mod application;
pub mod cli;
pub mod config;
pub mod render;
pub mod script;
pub mod store;
pub mod tree;

pub use store::{ChangeMode, SharedTreeStore, StoreOptions, TreeStore};
pub use tree::{Children, EntryData, Node, Snapshot, TreeError, TreePath};
