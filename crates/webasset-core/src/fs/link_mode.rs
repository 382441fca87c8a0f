use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How an installer materializes a repository resource inside a target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    #[default]
    Copy,
    Symlink,
}

impl LinkMode {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkMode::Copy => "copy",
            LinkMode::Symlink => "symlink",
        }
    }
}

impl fmt::Display for LinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "copy" => Ok(LinkMode::Copy),
            "symlink" => Ok(LinkMode::Symlink),
            other => anyhow::bail!("Unknown link mode: '{}'. Use 'copy' or 'symlink'", other),
        }
    }
}
