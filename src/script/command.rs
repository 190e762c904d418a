use std::{str::FromStr, sync::Arc};

use serde_json::Value;
use snafu::prelude::*;
use tracing::debug;

use crate::store::{ChangeMode, TreeStore};
use crate::tree::{EntryData, Node, Snapshot, TreeError, TreePath};

/// Route text naming the root container.
pub const ROOT_ROUTE: &str = ".";

/// One line of a script, already parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddGroup {
        path: TreePath,
        name: String,
    },
    AddEntry {
        path: TreePath,
        name: String,
        data: EntryData,
    },
    Remove {
        path: TreePath,
    },
    Rename {
        path: TreePath,
        new_name: String,
    },
    Change {
        path: TreePath,
        mode: String,
        data: EntryData,
    },
    Get {
        path: TreePath,
    },
    Print,
}

/// What a successfully applied command produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Applied,
    Node(Arc<Node>),
    Tree(Snapshot),
}

impl Command {
    pub fn apply(&self, store: &mut TreeStore) -> Result<Outcome, TreeError> {
        debug!("Applying command: {:?}", self);
        let applied = match self {
            Command::AddGroup { path, name } => store.add_group(name.as_str(), path),
            Command::AddEntry { path, name, data } => {
                store.add_entry(name.as_str(), path, data.clone())
            }
            Command::Remove { path } => store.remove_entry(path),
            Command::Rename { path, new_name } => store.rename_entry(path, new_name.as_str()),
            Command::Change { path, mode, data } => {
                let mode = ChangeMode::from_str(mode)?;
                store.change_entry_data(path, data.clone(), mode)
            }
            Command::Get { path } => return store.get_entry(path).map(Outcome::Node),
            Command::Print => return Ok(Outcome::Tree(store.current_snapshot())),
        };
        applied.map(|()| Outcome::Applied)
    }
}

impl FromStr for Command {
    type Err = CommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut rest = line.trim();
        let keyword = next_token(&mut rest).context(MissingArgumentSnafu {
            argument: "command",
        })?;

        let command = match keyword {
            "group" => Command::AddGroup {
                path: parse_route(&mut rest)?,
                name: required(&mut rest, "name")?.to_string(),
            },
            "entry" => Command::AddEntry {
                path: parse_route(&mut rest)?,
                name: required(&mut rest, "name")?.to_string(),
                data: optional_data(&mut rest)?,
            },
            "remove" => Command::Remove {
                path: parse_route(&mut rest)?,
            },
            "rename" => Command::Rename {
                path: parse_route(&mut rest)?,
                new_name: required(&mut rest, "new name")?.to_string(),
            },
            "change" => Command::Change {
                path: parse_route(&mut rest)?,
                mode: required(&mut rest, "mode")?.to_string(),
                data: required_data(&mut rest)?,
            },
            "get" => Command::Get {
                path: parse_route(&mut rest)?,
            },
            "print" => Command::Print,
            _ => {
                return UnknownCommandSnafu { keyword }.fail();
            }
        };

        ensure!(rest.is_empty(), TrailingInputSnafu { input: rest });
        Ok(command)
    }
}

/// Splits a comma-joined route into a path, dropping empty segments.
///
/// `.` alone stands for the root.
pub fn route_to_path(route: &str) -> TreePath {
    if route == ROOT_ROUTE {
        return TreePath::root();
    }
    route
        .split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Parses JSON text into entry data; the text must hold an object.
pub fn parse_data(text: &str) -> Result<EntryData, CommandParseError> {
    match serde_json::from_str::<Value>(text).context(InvalidJsonSnafu)? {
        Value::Object(object) => Ok(object.into()),
        _ => NotAnObjectSnafu.fail(),
    }
}

fn next_token<'a>(rest: &mut &'a str) -> Option<&'a str> {
    let trimmed = rest.trim_start();
    if trimmed.is_empty() {
        *rest = trimmed;
        return None;
    }
    let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
    let (token, remainder) = trimmed.split_at(end);
    *rest = remainder.trim_start();
    Some(token)
}

fn required<'a>(rest: &mut &'a str, argument: &'static str) -> Result<&'a str, CommandParseError> {
    next_token(rest).context(MissingArgumentSnafu { argument })
}

fn parse_route(rest: &mut &str) -> Result<TreePath, CommandParseError> {
    required(rest, "route").map(route_to_path)
}

fn optional_data(rest: &mut &str) -> Result<EntryData, CommandParseError> {
    if rest.is_empty() {
        return Ok(EntryData::new());
    }
    required_data(rest)
}

fn required_data(rest: &mut &str) -> Result<EntryData, CommandParseError> {
    ensure!(!rest.is_empty(), MissingArgumentSnafu { argument: "data" });
    let data = parse_data(*rest)?;
    *rest = "";
    Ok(data)
}

#[derive(Debug, Snafu)]
pub enum CommandParseError {
    #[snafu(display("Unknown command '{}'", keyword))]
    UnknownCommand { keyword: String },
    #[snafu(display("Missing argument: {}", argument))]
    MissingArgument { argument: &'static str },
    #[snafu(display("Entry data is not valid JSON"))]
    InvalidJson { source: serde_json::Error },
    #[snafu(display("Entry data must be a JSON object"))]
    NotAnObject,
    #[snafu(display("Unexpected trailing input '{}'", input))]
    TrailingInput { input: String },
}
