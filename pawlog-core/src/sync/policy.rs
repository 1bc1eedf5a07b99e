use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What to do when an id exists on both sides with different content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Pull keeps the local copy; push overwrites the remote one.
    #[default]
    PreferLocal,
    /// Pull replaces the local copy; sync does not push conflicting ids.
    PreferRemote,
    /// Neither side is overwritten; conflicts are only reported.
    Reject,
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictPolicy::PreferLocal => write!(f, "prefer-local"),
            ConflictPolicy::PreferRemote => write!(f, "prefer-remote"),
            ConflictPolicy::Reject => write!(f, "reject"),
        }
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "prefer-local" | "local" => Ok(ConflictPolicy::PreferLocal),
            "prefer-remote" | "remote" => Ok(ConflictPolicy::PreferRemote),
            "reject" => Ok(ConflictPolicy::Reject),
            _ => Err(format!(
                "Invalid conflict policy '{}'. Valid options: prefer-local, prefer-remote, reject",
                s
            )),
        }
    }
}
