use std::{
    borrow::Cow,
    path::{Path, PathBuf},
    sync::Arc,
};

use compio::fs;
use hashlink::LinkedHashMap;
use saphyr::{LoadableYamlNode, Scalar, Yaml};
use serde_json::Value;
use snafu::prelude::*;
use tracing::debug;

use crate::tree::{Children, EntryData, Node, TreePath};

/// Initial contents of a store, read from a YAML document.
///
/// The document is a sequence of nodes. Each node is a mapping with a `name`
/// and either `children` (a group) or `data` (an entry):
///
/// ```yaml
/// - name: A
///   children:
///     - name: x
///       data: { k: 1 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeSeed {
    children: Children,
}

impl TreeSeed {
    pub async fn read(path: &Path) -> Result<Self, SeedError> {
        debug!("Reading seed file: {}", path.display());
        let bytes = fs::read(path).await.context(ReadSnafu { path })?;
        let contents = String::from_utf8(bytes).context(EncodingSnafu { path })?;
        debug!("Successfully read seed file: {} bytes", contents.len());
        contents.as_str().try_into()
    }

    pub fn into_children(self) -> Children {
        self.children
    }

    fn parse_nodes(sequence: &[Yaml], parent: &TreePath) -> Result<Children, SeedError> {
        sequence
            .iter()
            .enumerate()
            .map(|(index, node)| Self::parse_node(node, parent, index).map(Arc::new))
            .collect()
    }

    fn parse_node(node: &Yaml, parent: &TreePath, index: usize) -> Result<Node, SeedError> {
        let location = || format!("{}[{}]", parent, index);
        let mapping = node
            .as_mapping()
            .with_context(|| NodeNotMappingSnafu { location: location() })?;
        let name = field(mapping, "name")
            .and_then(Yaml::as_str)
            .with_context(|| MissingNameSnafu { location: location() })?;
        ensure!(!name.is_empty(), EmptyNameSnafu { location: location() });
        let path = parent.join(name);

        match (field(mapping, "children"), field(mapping, "data")) {
            (Some(_), Some(_)) => AmbiguousNodeSnafu { path }.fail(),
            (Some(children), None) => {
                let children = children
                    .as_sequence()
                    .context(ChildrenNotSequenceSnafu { path: &path })?;
                Ok(Node::Group {
                    name: name.to_string(),
                    children: Self::parse_nodes(children, &path)?,
                })
            }
            (None, Some(data)) => {
                let data = data
                    .as_mapping()
                    .context(DataNotMappingSnafu { path: &path })?;
                Ok(Node::entry(name, parse_data(data, &path)?))
            }
            (None, None) => Ok(Node::entry(name, EntryData::new())),
        }
    }
}

impl TryFrom<&str> for TreeSeed {
    type Error = SeedError;

    fn try_from(contents: &str) -> Result<Self, Self::Error> {
        let documents = Yaml::load_from_str(contents).context(ParseSnafu)?;
        let document = documents.first().context(EmptyDocumentSnafu)?;
        let nodes = document.as_sequence().context(TopLevelNotSequenceSnafu)?;
        let children = Self::parse_nodes(nodes, &TreePath::root())?;
        debug!("Parsed {} top level seed nodes", children.len());
        Ok(TreeSeed { children })
    }
}

impl From<TreeSeed> for Children {
    fn from(seed: TreeSeed) -> Self {
        seed.into_children()
    }
}

fn field<'m, 'y>(
    mapping: &'m LinkedHashMap<Yaml<'y>, Yaml<'y>>,
    name: &'static str,
) -> Option<&'m Yaml<'y>> {
    mapping.get(&Yaml::Value(Scalar::String(Cow::Borrowed(name))))
}

fn parse_data(mapping: &LinkedHashMap<Yaml, Yaml>, path: &TreePath) -> Result<EntryData, SeedError> {
    mapping
        .iter()
        .map(|(key, value)| -> Result<_, SeedError> {
            let key = key.as_str().context(NonStringKeySnafu { path })?;
            Ok((key, to_json(value, path)?))
        })
        .collect()
}

fn to_json(value: &Yaml, path: &TreePath) -> Result<Value, SeedError> {
    match value {
        Yaml::Value(Scalar::Null) => Ok(Value::Null),
        Yaml::Value(Scalar::Boolean(flag)) => Ok(Value::Bool(*flag)),
        Yaml::Value(Scalar::Integer(number)) => Ok(Value::from(*number)),
        Yaml::Value(Scalar::FloatingPoint(number)) => Ok(Value::from(number.into_inner())),
        Yaml::Value(Scalar::String(text)) => Ok(Value::String(text.to_string())),
        Yaml::Sequence(items) => items
            .iter()
            .map(|item| to_json(item, path))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Yaml::Mapping(mapping) => Ok(parse_data(mapping, path)?.to_json()),
        _ => UnsupportedValueSnafu { path }.fail(),
    }
}

#[derive(Debug, Snafu)]
pub enum SeedError {
    #[snafu(display("Failed to read the seed file: {}", path.display()))]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Seed file {} is not valid UTF-8", path.display()))]
    EncodingError {
        path: PathBuf,
        source: std::string::FromUtf8Error,
    },
    #[snafu(display("Failed to parse the seed file"))]
    ParseError { source: saphyr::ScanError },
    #[snafu(display("Seed file contains no document"))]
    EmptyDocument,
    #[snafu(display("Top level of the seed should be a sequence of nodes"))]
    TopLevelNotSequence,
    #[snafu(display("Seed node at {} should be a map", location))]
    NodeNotMapping { location: String },
    #[snafu(display("Seed node at {} has no string 'name'", location))]
    MissingName { location: String },
    #[snafu(display("Seed node at {} has an empty 'name'", location))]
    EmptyName { location: String },
    #[snafu(display("Seed node '{}' has both 'children' and 'data'", path))]
    AmbiguousNode { path: TreePath },
    #[snafu(display("'children' of seed node '{}' should be a sequence", path))]
    ChildrenNotSequence { path: TreePath },
    #[snafu(display("'data' of seed node '{}' should be a map", path))]
    DataNotMapping { path: TreePath },
    #[snafu(display("Data of seed node '{}' has a non-string key", path))]
    NonStringKey { path: TreePath },
    #[snafu(display("Data of seed node '{}' holds an unsupported YAML value", path))]
    UnsupportedValue { path: TreePath },
}
