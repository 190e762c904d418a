//! Text rendering of trees for the terminal.

use std::fmt::Write as _;

use colored::Colorize;
use supports_color::Stream;

use crate::tree::{Children, Node};

const INDENT: &str = "  ";

/// Renders groups as their name over indented children, and entries as their
/// name over `- key: value` lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeRenderer {
    color: bool,
}

impl TreeRenderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Colours output only if stdout supports it.
    pub fn for_stdout() -> Self {
        Self::new(supports_color::on(Stream::Stdout).is_some())
    }

    pub fn render_tree(&self, children: &Children) -> String {
        self.render(children.iter().map(|node| node.as_ref()).collect())
    }

    pub fn render_node(&self, node: &Node) -> String {
        self.render(vec![node])
    }

    fn render(&self, roots: Vec<&Node>) -> String {
        let mut output = String::new();
        let mut pending = roots
            .into_iter()
            .rev()
            .map(|node| (node, 0))
            .collect::<Vec<_>>();

        while let Some((node, depth)) = pending.pop() {
            let indent = INDENT.repeat(depth);
            match node {
                Node::Group { name, children } => {
                    let _ = writeln!(output, "{indent}{}", self.group_name(name));
                    pending.extend(children.iter().rev().map(|child| (child.as_ref(), depth + 1)));
                }
                Node::Entry { name, data } => {
                    let _ = writeln!(output, "{indent}{}", self.entry_name(name));
                    for (key, value) in data.iter() {
                        let _ = writeln!(output, "{indent}{INDENT}- {key}: {value}");
                    }
                }
            }
        }
        output
    }

    fn group_name(&self, name: &str) -> String {
        if self.color {
            name.bold().blue().to_string()
        } else {
            name.to_string()
        }
    }

    fn entry_name(&self, name: &str) -> String {
        if self.color {
            name.bold().to_string()
        } else {
            name.to_string()
        }
    }
}
