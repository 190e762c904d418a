use std::path::{Path, PathBuf};

use compio::fs;
use snafu::prelude::*;
use tracing::debug;

use crate::script::{Command, CommandParseError};

const COMMENT_PREFIX: char = '#';

/// A command together with the script line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    pub number: usize,
    pub command: Command,
}

/// A parsed script: one command per non-blank, non-comment line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    lines: Vec<ScriptLine>,
}

impl Script {
    pub async fn read(path: &Path) -> Result<Self, ScriptError> {
        debug!("Reading script file: {}", path.display());
        let bytes = fs::read(path).await.context(ReadSnafu { path })?;
        let contents = String::from_utf8(bytes).context(EncodingSnafu { path })?;
        contents.as_str().try_into()
    }

    pub fn lines(&self) -> &[ScriptLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl TryFrom<&str> for Script {
    type Error = ScriptError;

    fn try_from(contents: &str) -> Result<Self, Self::Error> {
        let lines = contents
            .lines()
            .enumerate()
            .map(|(index, line)| (index + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with(COMMENT_PREFIX))
            .map(|(number, line)| {
                line.parse::<Command>()
                    .map(|command| ScriptLine { number, command })
                    .context(InvalidLineSnafu { line: number })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Parsed {} script commands", lines.len());
        Ok(Script { lines })
    }
}

#[derive(Debug, Snafu)]
pub enum ScriptError {
    #[snafu(display("Failed to read the script file: {}", path.display()))]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Script file {} is not valid UTF-8", path.display()))]
    EncodingError {
        path: PathBuf,
        source: std::string::FromUtf8Error,
    },
    #[snafu(display("Invalid command on line {}", line))]
    InvalidLine {
        line: usize,
        source: CommandParseError,
    },
}
