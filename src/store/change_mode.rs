use std::str::FromStr;

use derive_more::Display;

use crate::tree::{EntryData, InvalidChangeTypeSnafu, TreeError};

/// How new data is combined with an entry's existing data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
pub enum ChangeMode {
    /// The entry's data becomes the new data wholesale.
    #[display("replace")]
    Replace,
    /// Keys of the new data are written over the existing data.
    #[default]
    #[display("merge")]
    Merge,
}

impl ChangeMode {
    pub fn apply(self, existing: &mut EntryData, incoming: EntryData) {
        match self {
            ChangeMode::Replace => *existing = incoming,
            ChangeMode::Merge => existing.merge(incoming),
        }
    }
}

impl FromStr for ChangeMode {
    type Err = TreeError;

    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        match mode {
            "replace" => Ok(ChangeMode::Replace),
            "merge" => Ok(ChangeMode::Merge),
            _ => InvalidChangeTypeSnafu { mode }.fail(),
        }
    }
}

impl TryFrom<&str> for ChangeMode {
    type Error = TreeError;

    fn try_from(mode: &str) -> Result<Self, Self::Error> {
        mode.parse()
    }
}
