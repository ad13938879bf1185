//! Combination policy.
//!
//! The two combinator flavours share one construction protocol and differ
//! only in how they arbitrate deadlines and whether the node arms its own
//! deadline timer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokio::time::Instant;

/// How a combined context derives its deadline from its parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Earliest deadline wins; the node arms its own deadline timer.
    #[default]
    Pair,
    /// Primary's deadline if it has one, else secondary's. Expiry is
    /// observed only through the parents' own signals.
    Union,
}

impl Mode {
    /// Effective deadline of a node whose parents report `primary` and `secondary`.
    pub fn arbitrate(self, primary: Option<Instant>, secondary: Option<Instant>) -> Option<Instant> {
        match self {
            Mode::Pair => match (primary, secondary) {
                (Some(p), Some(s)) => Some(p.min(s)),
                (p, s) => p.or(s),
            },
            Mode::Union => primary.or(secondary),
        }
    }

    /// Whether nodes built in this mode arm a deadline timer by default.
    pub fn arms_deadline_timer(self) -> bool {
        matches!(self, Mode::Pair)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Pair => "pair",
            Mode::Union => "union",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pair" => Ok(Mode::Pair),
            "union" => Ok(Mode::Union),
            other => Err(format!("unknown combination mode '{other}' (expected pair or union)")),
        }
    }
}
