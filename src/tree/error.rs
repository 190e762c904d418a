use snafu::Snafu;

use crate::tree::TreePath;

/// Every way a store operation can be rejected.
///
/// None of these leave partial state behind: a failed operation keeps the
/// current snapshot exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TreeError {
    #[snafu(display("Entry name is required"))]
    EntryNameRequired,
    #[snafu(display("A node named '{}' already exists in this group", name))]
    NameExists { name: String },
    #[snafu(display("Invalid path: '{}'", path))]
    InvalidPath { path: TreePath },
    #[snafu(display(
        "Invalid change type '{}', expected 'replace' or 'merge'",
        mode
    ))]
    InvalidChangeType { mode: String },
}
