//! Line-based command language driving a [`TreeStore`](crate::store::TreeStore).
//!
//! Routes are comma-joined names (`A,B,x`, or `.` for the root) and entry data
//! is a JSON object taking the rest of the line.

mod command;
mod script;

pub use command::{Command, CommandParseError, Outcome, ROOT_ROUTE, parse_data, route_to_path};
pub use script::{Script, ScriptError, ScriptLine};
