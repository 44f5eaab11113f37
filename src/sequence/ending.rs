//! How a trajectory ended, and the coarser status derived from it.

use crate::math::Natural;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Terminal classification of an aliquot trajectory.
///
/// Serialized as `"terminated"`, `"cycle_<N>"` or `"step_limit"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ending {
    /// A value <= 1 was reached.
    Terminated,
    /// A previously visited value recurred; the payload is the cycle length.
    Cycle(u64),
    /// The step budget ran out first.
    StepLimitReached,
}

impl Ending {
    pub fn is_cycle(&self) -> bool {
        matches!(self, Self::Cycle(_))
    }
}

impl fmt::Display for Ending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminated => write!(f, "terminated"),
            Self::Cycle(length) => write!(f, "cycle_{}", length),
            Self::StepLimitReached => write!(f, "step_limit"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unrecognized ending tag '{0}'")]
pub struct ParseEndingError(String);

impl FromStr for Ending {
    type Err = ParseEndingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "terminated" => Ok(Self::Terminated),
            "step_limit" => Ok(Self::StepLimitReached),
            other => other
                .strip_prefix("cycle_")
                .and_then(|n| n.parse::<u64>().ok())
                .filter(|&n| n > 0)
                .map(Self::Cycle)
                .ok_or_else(|| ParseEndingError(other.to_string())),
        }
    }
}

impl Serialize for Ending {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Ending {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

/// Named outcome used by summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SequenceStatus {
    Terminated,
    /// The seed is its own proper divisor sum.
    Perfect,
    /// The seed sits on a 2-cycle.
    Amicable,
    /// The seed sits on a cycle of the given length (3 or more).
    Sociable(u64),
    /// A cycle was entered after a pre-period, so the seed is not on it.
    Cycle,
    /// Step budget exhausted.
    OpenLimit,
}

impl SequenceStatus {
    /// Classify an ending. `final_value` is the value that closed the cycle.
    pub fn classify(ending: Ending, seed: &Natural, final_value: &Natural) -> Self {
        match ending {
            Ending::Terminated => Self::Terminated,
            Ending::StepLimitReached => Self::OpenLimit,
            Ending::Cycle(_) if final_value != seed => Self::Cycle,
            Ending::Cycle(1) => Self::Perfect,
            Ending::Cycle(2) => Self::Amicable,
            Ending::Cycle(length) => Self::Sociable(length),
        }
    }
}

impl fmt::Display for SequenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminated => write!(f, "terminated"),
            Self::Perfect => write!(f, "perfect"),
            Self::Amicable => write!(f, "amicable"),
            Self::Sociable(length) => write!(f, "sociable-{}", length),
            Self::Cycle => write!(f, "cycle"),
            Self::OpenLimit => write!(f, "open-limit"),
        }
    }
}

impl Serialize for SequenceStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
