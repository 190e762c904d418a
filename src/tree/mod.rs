//! In-memory tree model addressed by paths of names.
//!
//! Groups hold an ordered list of further nodes, entries hold key/value data.
//! The anonymous root is just a list of nodes.

mod error;
mod node;
mod path;
pub mod resolver;

pub use error::TreeError;
pub(crate) use error::{
    EntryNameRequiredSnafu, InvalidChangeTypeSnafu, InvalidPathSnafu, NameExistsSnafu,
};
pub use node::{Children, EntryData, Node, Snapshot};
pub use path::TreePath;
