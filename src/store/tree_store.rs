use std::sync::Arc;

use futures_channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use snafu::prelude::*;
use tracing::debug;

use crate::store::{ChangeMode, StoreOptions};
use crate::tree::{
    Children, EntryData, EntryNameRequiredSnafu, InvalidPathSnafu, NameExistsSnafu, Node,
    Snapshot, TreeError, TreePath, resolver,
};

/// Owns the current snapshot of a tree and applies path-addressed edits to it.
///
/// Every successful mutation builds a new snapshot and swaps it in; snapshots
/// handed out earlier are never touched. A failed mutation leaves the current
/// snapshot as it was.
#[derive(Debug)]
pub struct TreeStore {
    snapshot: Snapshot,
    options: StoreOptions,
    subscribers: Vec<UnboundedSender<Snapshot>>,
}

impl Default for TreeStore {
    fn default() -> Self {
        Self::new(Children::new(), StoreOptions::default())
    }
}

impl TreeStore {
    pub fn new(initial: impl Into<Snapshot>, options: StoreOptions) -> Self {
        Self {
            snapshot: initial.into(),
            options,
            subscribers: Vec::new(),
        }
    }

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    /// The snapshot installed by the last successful mutation.
    pub fn current_snapshot(&self) -> Snapshot {
        Arc::clone(&self.snapshot)
    }

    /// Receives every snapshot installed from now on.
    pub fn subscribe(&mut self) -> UnboundedReceiver<Snapshot> {
        let (sender, receiver) = mpsc::unbounded();
        self.subscribers.push(sender);
        receiver
    }

    /// Appends an empty group named `name` to the group at `path`.
    pub fn add_group(
        &mut self,
        name: impl Into<String>,
        path: impl Into<TreePath>,
    ) -> Result<(), TreeError> {
        let name = name.into();
        ensure!(!name.is_empty(), EntryNameRequiredSnafu);
        self.insert("add_group", Node::group(name), path.into())
    }

    /// Appends an entry named `name` holding `data` to the group at `path`.
    pub fn add_entry(
        &mut self,
        name: impl Into<String>,
        path: impl Into<TreePath>,
        data: EntryData,
    ) -> Result<(), TreeError> {
        let name = name.into();
        ensure!(!name.is_empty(), EntryNameRequiredSnafu);
        self.insert("add_entry", Node::entry(name, data), path.into())
    }

    /// Removes the node named by the last element of `path`.
    pub fn remove_entry(&mut self, path: impl Into<TreePath>) -> Result<(), TreeError> {
        let path = path.into();
        self.commit("remove_entry", |root| {
            let (container, index) = resolver::resolve_target_mut(root, &path)?;
            container.remove(index);
            Ok(())
        })
    }

    /// Renames the node at `path`, keeping its position and contents.
    ///
    /// With uniqueness enabled the new name must not belong to a sibling.
    /// Renaming a node to its current name is accepted.
    pub fn rename_entry(
        &mut self,
        path: impl Into<TreePath>,
        new_name: impl Into<String>,
    ) -> Result<(), TreeError> {
        let path = path.into();
        let new_name = new_name.into();
        ensure!(!new_name.is_empty(), EntryNameRequiredSnafu);

        let unique = self.options.unique;
        self.commit("rename_entry", |root| {
            let (container, index) = resolver::resolve_target_mut(root, &path)?;
            if container[index].name() == new_name {
                return Ok(());
            }
            ensure!(
                !unique || resolver::position(container, &new_name).is_none(),
                NameExistsSnafu { name: &new_name }
            );
            Arc::make_mut(&mut container[index]).set_name(new_name);
            Ok(())
        })
    }

    /// Replaces or merges the data of the entry at `path`.
    ///
    /// Fails with [`TreeError::InvalidPath`] when the path names a group.
    pub fn change_entry_data(
        &mut self,
        path: impl Into<TreePath>,
        data: EntryData,
        mode: ChangeMode,
    ) -> Result<(), TreeError> {
        let path = path.into();
        self.commit("change_entry_data", |root| {
            let (container, index) = resolver::resolve_target_mut(root, &path)?;
            let Node::Entry { data: existing, .. } = Arc::make_mut(&mut container[index]) else {
                return InvalidPathSnafu { path: &path }.fail();
            };
            mode.apply(existing, data);
            Ok(())
        })
    }

    /// Looks up the node at `path` in the current snapshot without copying.
    pub fn get_entry(&self, path: impl Into<TreePath>) -> Result<Arc<Node>, TreeError> {
        let path = path.into();
        resolver::resolve_node(&self.snapshot, &path).map(Arc::clone)
    }

    fn insert(&mut self, operation: &str, node: Node, path: TreePath) -> Result<(), TreeError> {
        let unique = self.options.unique;
        self.commit(operation, |root| {
            let container = resolver::resolve_mut(root, &path)?;
            ensure!(
                !unique || resolver::position(container, node.name()).is_none(),
                NameExistsSnafu { name: node.name() }
            );
            container.push(Arc::new(node));
            Ok(())
        })
    }

    /// Runs `edit` against a copy-on-write handle of the current root and
    /// installs the result only if the edit succeeds.
    fn commit<F>(&mut self, operation: &str, edit: F) -> Result<(), TreeError>
    where
        F: FnOnce(&mut Children) -> Result<(), TreeError>,
    {
        let mut next = Arc::clone(&self.snapshot);
        edit(Arc::make_mut(&mut next))?;
        self.install(next);
        debug!("Installed new snapshot after {}", operation);
        Ok(())
    }

    fn install(&mut self, next: Snapshot) {
        self.subscribers
            .retain(|subscriber| subscriber.unbounded_send(Arc::clone(&next)).is_ok());
        self.snapshot = next;
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use rstest::*;
    use serde_json::json;

    use super::*;

    fn data(value: serde_json::Value) -> EntryData {
        match value {
            serde_json::Value::Object(object) => object.into(),
            other => panic!("expected a JSON object, got {other}"),
        }
    }

    /// A -> B -> x{k: 1}, A -> y{a: 1, b: 2}, C
    #[fixture]
    fn store() -> TreeStore {
        let mut store = TreeStore::default();
        store.add_group("A", TreePath::root()).unwrap();
        store.add_group("B", ["A"]).unwrap();
        store.add_entry("x", ["A", "B"], data(json!({"k": 1}))).unwrap();
        store.add_entry("y", ["A"], data(json!({"a": 1, "b": 2}))).unwrap();
        store.add_group("C", TreePath::root()).unwrap();
        store
    }

    fn child_names(node: &Node) -> Vec<String> {
        node.children()
            .unwrap()
            .iter()
            .map(|child| child.name().to_string())
            .collect()
    }

    #[test]
    fn end_to_end_add_get_remove() {
        let mut store = TreeStore::default();
        store.add_group("A", TreePath::root()).unwrap();
        store.add_group("B", ["A"]).unwrap();
        store.add_entry("x", ["A", "B"], data(json!({"k": 1}))).unwrap();

        let entry = store.get_entry(["A", "B", "x"]).unwrap();
        assert_eq!(*entry, Node::entry("x", data(json!({"k": 1}))));

        store.remove_entry(["A", "B", "x"]).unwrap();
        assert!(matches!(
            store.get_entry(["A", "B", "x"]),
            Err(TreeError::InvalidPath { .. })
        ));
    }

    #[rstest]
    #[case(TreePath::root())]
    #[case(TreePath::from(["A"]))]
    #[case(TreePath::from(["A", "B"]))]
    fn added_group_is_empty(mut store: TreeStore, #[case] path: TreePath) {
        store.add_group("fresh", &path).unwrap();
        let group = store.get_entry(path.join("fresh")).unwrap();
        assert_eq!(*group, Node::group("fresh"));
    }

    #[rstest]
    fn added_entry_keeps_its_data(mut store: TreeStore) {
        let payload = data(json!({"list": [1, 2], "nested": {"deep": true}}));
        store.add_entry("z", ["C"], payload.clone()).unwrap();
        let entry = store.get_entry(["C", "z"]).unwrap();
        assert_eq!(entry.data(), Some(&payload));
    }

    #[rstest]
    fn new_children_are_appended(mut store: TreeStore) {
        store.add_entry("last", ["A"], EntryData::new()).unwrap();
        let group = store.get_entry(["A"]).unwrap();
        assert_eq!(child_names(&group), ["B", "y", "last"]);
    }

    #[rstest]
    #[case::group_at_root(TreePath::root(), "A")]
    #[case::entry_name_in_group(TreePath::from(["A"]), "y")]
    #[case::group_name_in_group(TreePath::from(["A"]), "B")]
    fn duplicate_names_are_rejected(
        mut store: TreeStore,
        #[case] path: TreePath,
        #[case] name: &str,
    ) {
        let before = store.current_snapshot();
        assert_eq!(
            store.add_group(name, &path),
            Err(TreeError::NameExists {
                name: name.to_string()
            })
        );
        assert_eq!(
            store.add_entry(name, &path, EntryData::new()),
            Err(TreeError::NameExists {
                name: name.to_string()
            })
        );
        assert!(Arc::ptr_eq(&before, &store.current_snapshot()));
    }

    #[test]
    fn duplicates_allowed_when_uniqueness_disabled() {
        let mut store = TreeStore::new(Children::new(), StoreOptions::allow_duplicates());
        store.add_group("dup", TreePath::root()).unwrap();
        store.add_group("dup", TreePath::root()).unwrap();
        store
            .add_entry("dup", TreePath::root(), EntryData::new())
            .unwrap();

        let snapshot = store.current_snapshot();
        assert_eq!(snapshot.len(), 3);
        assert!(snapshot.iter().all(|node| node.name() == "dup"));
    }

    #[rstest]
    fn empty_names_are_required(mut store: TreeStore) {
        assert_eq!(
            store.add_group("", TreePath::root()),
            Err(TreeError::EntryNameRequired)
        );
        assert_eq!(
            store.add_entry("", ["A"], EntryData::new()),
            Err(TreeError::EntryNameRequired)
        );
        assert_eq!(
            store.rename_entry(["A"], ""),
            Err(TreeError::EntryNameRequired)
        );
    }

    #[rstest]
    #[case::missing_group(TreePath::from(["missing"]))]
    #[case::through_entry(TreePath::from(["A", "y"]))]
    #[case::missing_nested(TreePath::from(["A", "B", "nope"]))]
    fn insertion_into_invalid_path_fails(mut store: TreeStore, #[case] path: TreePath) {
        assert!(matches!(
            store.add_group("g", &path),
            Err(TreeError::InvalidPath { .. })
        ));
        assert!(matches!(
            store.add_entry("e", &path, EntryData::new()),
            Err(TreeError::InvalidPath { .. })
        ));
    }

    #[rstest]
    fn remove_keeps_sibling_order(mut store: TreeStore) {
        store.add_entry("z", ["A"], EntryData::new()).unwrap();
        store.remove_entry(["A", "y"]).unwrap();

        let group = store.get_entry(["A"]).unwrap();
        assert_eq!(child_names(&group), ["B", "z"]);
        assert!(matches!(
            store.remove_entry(["A", "y"]),
            Err(TreeError::InvalidPath { .. })
        ));
    }

    #[rstest]
    fn remove_group_drops_its_subtree(mut store: TreeStore) {
        store.remove_entry(["A"]).unwrap();
        assert_eq!(store.current_snapshot().len(), 1);
        assert!(store.get_entry(["A", "B", "x"]).is_err());
    }

    #[rstest]
    #[case::empty(TreePath::root())]
    #[case::missing(TreePath::from(["A", "missing"]))]
    #[case::through_entry(TreePath::from(["A", "y", "k"]))]
    fn node_operations_reject_invalid_paths(mut store: TreeStore, #[case] path: TreePath) {
        let before = store.current_snapshot();
        let invalid = |result: Result<(), TreeError>| {
            matches!(result, Err(TreeError::InvalidPath { .. }))
        };

        assert!(invalid(store.remove_entry(&path)));
        assert!(invalid(store.rename_entry(&path, "other")));
        assert!(invalid(store.change_entry_data(
            &path,
            EntryData::new(),
            ChangeMode::Merge
        )));
        assert!(matches!(
            store.get_entry(&path),
            Err(TreeError::InvalidPath { .. })
        ));
        assert_eq!(before, store.current_snapshot());
    }

    #[rstest]
    fn rename_keeps_position_and_contents(mut store: TreeStore) {
        store.rename_entry(["A", "B"], "Renamed").unwrap();

        let group = store.get_entry(["A"]).unwrap();
        assert_eq!(child_names(&group), ["Renamed", "y"]);
        let entry = store.get_entry(["A", "Renamed", "x"]).unwrap();
        assert_eq!(entry.data(), Some(&data(json!({"k": 1}))));
    }

    #[rstest]
    fn rename_rejects_sibling_name_when_unique(mut store: TreeStore) {
        let before = store.current_snapshot();
        assert_eq!(
            store.rename_entry(["A", "y"], "B"),
            Err(TreeError::NameExists {
                name: "B".to_string()
            })
        );
        assert_eq!(before, store.current_snapshot());
    }

    #[rstest]
    fn rename_to_own_name_is_accepted(mut store: TreeStore) {
        let before = store.current_snapshot();
        store.rename_entry(["A", "y"], "y").unwrap();
        assert_eq!(before, store.current_snapshot());
    }

    #[test]
    fn rename_allows_sibling_name_without_uniqueness() {
        let mut store = TreeStore::new(Children::new(), StoreOptions::allow_duplicates());
        store.add_group("a", TreePath::root()).unwrap();
        store.add_group("b", TreePath::root()).unwrap();
        store.rename_entry(["b"], "a").unwrap();

        let snapshot = store.current_snapshot();
        assert!(snapshot.iter().all(|node| node.name() == "a"));
    }

    #[rstest]
    #[case(ChangeMode::Merge, json!({"a": 1, "b": 3, "c": 4}))]
    #[case(ChangeMode::Replace, json!({"b": 3, "c": 4}))]
    fn change_entry_data_modes(
        mut store: TreeStore,
        #[case] mode: ChangeMode,
        #[case] expected: serde_json::Value,
    ) {
        store
            .change_entry_data(["A", "y"], data(json!({"b": 3, "c": 4})), mode)
            .unwrap();
        let entry = store.get_entry(["A", "y"]).unwrap();
        assert_eq!(entry.data().map(EntryData::to_json), Some(expected));
    }

    #[rstest]
    fn merge_keeps_existing_key_order(mut store: TreeStore) {
        store
            .change_entry_data(["A", "y"], data(json!({"b": 3, "c": 4})), ChangeMode::Merge)
            .unwrap();
        let entry = store.get_entry(["A", "y"]).unwrap();
        let expected = EntryData::from_iter([("a", json!(1)), ("b", json!(3)), ("c", json!(4))]);
        assert_eq!(entry.data(), Some(&expected));
    }

    #[rstest]
    fn change_entry_data_rejects_groups(mut store: TreeStore) {
        let before = store.current_snapshot();
        assert_eq!(
            store.change_entry_data(["A", "B"], EntryData::new(), ChangeMode::Replace),
            Err(TreeError::InvalidPath {
                path: TreePath::from(["A", "B"])
            })
        );
        assert_eq!(before, store.current_snapshot());
    }

    #[rstest]
    fn failed_calls_leave_snapshot_untouched(mut store: TreeStore) {
        let before = store.current_snapshot();
        let copy: Children = before
            .iter()
            .map(|node| Arc::new(Node::clone(node)))
            .collect();

        let _ = store.add_group("B", ["A"]);
        let _ = store.add_entry("e", ["A", "y"], EntryData::new());
        let _ = store.rename_entry(["A", "y"], "B");
        let _ = store.remove_entry(["A", "B", "missing"]);
        let _ = store.change_entry_data(["A"], EntryData::new(), ChangeMode::Merge);

        assert!(Arc::ptr_eq(&before, &store.current_snapshot()));
        assert_eq!(*store.current_snapshot(), copy);
    }

    #[rstest]
    fn earlier_snapshots_and_nodes_are_isolated(mut store: TreeStore) {
        let before = store.current_snapshot();
        let held_group = store.get_entry(["A", "B"]).unwrap();
        let held_entry = store.get_entry(["A", "B", "x"]).unwrap();
        let held_copy = (*held_entry).clone();

        store.add_entry("w", ["A", "B"], EntryData::new()).unwrap();
        store
            .change_entry_data(["A", "B", "x"], data(json!({"k": 2})), ChangeMode::Replace)
            .unwrap();
        store.rename_entry(["A", "B", "x"], "renamed").unwrap();

        assert_eq!(child_names(&held_group), ["x"]);
        assert_eq!(*held_entry, held_copy);
        assert_eq!(
            resolver::resolve(&before, &["A".to_string(), "B".to_string()])
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            *store.get_entry(["A", "B", "renamed"]).unwrap(),
            Node::entry("renamed", data(json!({"k": 2})))
        );
    }

    #[rstest]
    fn held_group_outlives_removal_of_its_child(mut store: TreeStore) {
        let held_group = store.get_entry(["A", "B"]).unwrap();
        let held_entry = store.get_entry(["A", "B", "x"]).unwrap();

        store.remove_entry(["A", "B", "x"]).unwrap();

        assert_eq!(child_names(&held_group), ["x"]);
        assert_eq!(*held_entry, Node::entry("x", data(json!({"k": 1}))));
        assert!(child_names(&store.get_entry(["A", "B"]).unwrap()).is_empty());
        assert!(matches!(
            store.get_entry(["A", "B", "x"]),
            Err(TreeError::InvalidPath { .. })
        ));
    }

    #[rstest]
    fn untouched_subtrees_are_shared(mut store: TreeStore) {
        let before = store.current_snapshot();
        store.add_entry("z", ["A", "B"], EntryData::new()).unwrap();
        let after = store.current_snapshot();

        assert!(!Arc::ptr_eq(&before[0], &after[0]));
        assert!(Arc::ptr_eq(&before[1], &after[1]));
    }

    #[rstest]
    fn get_entry_reads_live_snapshot(store: TreeStore) {
        let snapshot = store.current_snapshot();
        let node = store.get_entry(["C"]).unwrap();
        assert!(Arc::ptr_eq(&node, &snapshot[1]));
    }

    #[test]
    fn deep_paths_resolve_without_recursion() {
        let mut store = TreeStore::default();
        let mut path = TreePath::root();
        for depth in 0..1_000 {
            let name = format!("g{depth}");
            store.add_group(name.as_str(), &path).unwrap();
            path = path.join(name);
        }
        store.add_entry("leaf", &path, EntryData::new()).unwrap();
        assert!(store.get_entry(path.join("leaf")).unwrap().is_entry());
    }

    #[test]
    fn deep_trees_are_dropped_without_recursion() {
        const DEPTH: usize = 100_000;

        let mut node = Node::group(format!("g{DEPTH}"));
        for depth in (0..DEPTH).rev() {
            node = Node::group_with(format!("g{depth}"), [node]);
        }
        let path = (0..=DEPTH).map(|depth| format!("g{depth}")).collect::<TreePath>();

        let mut store = TreeStore::new(vec![Arc::new(node)], StoreOptions::default());
        store.add_entry("leaf", &path, EntryData::new()).unwrap();
        let held = store.current_snapshot();
        store.remove_entry(path.join("leaf")).unwrap();
        assert!(store.get_entry(path.join("leaf")).is_err());

        drop(held);
        drop(store);
    }

    #[compio::test]
    async fn subscribers_receive_committed_snapshots_only() {
        let mut store = TreeStore::default();
        let mut changes = store.subscribe();

        store.add_group("A", TreePath::root()).unwrap();
        let _ = store.add_group("A", TreePath::root());
        store.add_entry("x", ["A"], EntryData::new()).unwrap();

        let first = changes.next().await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].children().map(Vec::len), Some(0));
        let second = changes.next().await.unwrap();
        assert!(Arc::ptr_eq(&second, &store.current_snapshot()));

        changes.close();
        assert!(changes.next().await.is_none());
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let mut store = TreeStore::default();
        drop(store.subscribe());
        let _kept = store.subscribe();

        store.add_group("A", TreePath::root()).unwrap();
        assert_eq!(store.subscribers.len(), 1);
    }
}
