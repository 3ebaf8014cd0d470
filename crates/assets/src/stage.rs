use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Pipeline stage an asset currently occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    New,
    Verified,
    Labelled,
}

#[derive(Debug, Error)]
#[error("unknown stage '{0}' (expected new, verified or labelled)")]
pub struct ParseStageError(String);

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::New, Stage::Verified, Stage::Labelled];

    /// Directory name under the data root.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Verified => "verified",
            Self::Labelled => "labelled",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Verified => "Verified",
            Self::Labelled => "Labelled",
        }
    }

    /// Directed edges of the stage graph. `Labelled` has no outgoing edge.
    pub fn can_move_to(self, target: Stage) -> bool {
        matches!(
            (self, target),
            (Self::New, Self::Verified) | (Self::Verified, Self::Labelled) | (Self::Verified, Self::New)
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for Stage {
    type Err = ParseStageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(Self::New),
            "verified" => Ok(Self::Verified),
            "labelled" | "labeled" => Ok(Self::Labelled),
            other => Err(ParseStageError(other.to_string())),
        }
    }
}
