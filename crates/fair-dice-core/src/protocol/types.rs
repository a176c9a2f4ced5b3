//! Round types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique round identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundId(Uuid);

impl RoundId {
    /// Create a new random round ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RoundId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for RoundId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl fmt::Debug for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RoundId({})", self.0)
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Round outcome
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    SystemWins,
    PeerWins,
    Tie,
}

impl Verdict {
    /// Compare two rolled faces; strictly greater wins
    pub fn from_rolls(system_roll: i64, peer_roll: i64) -> Self {
        match system_roll.cmp(&peer_roll) {
            std::cmp::Ordering::Greater => Verdict::SystemWins,
            std::cmp::Ordering::Less => Verdict::PeerWins,
            std::cmp::Ordering::Equal => Verdict::Tie,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::SystemWins => "System wins",
            Verdict::PeerWins => "Peer wins",
            Verdict::Tie => "Tie",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Party identifier. The system is side A, the peer is side B.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    System,
    Peer,
}

impl Side {
    /// Get the opponent
    pub fn opponent(&self) -> Side {
        match self {
            Side::System => Side::Peer,
            Side::Peer => Side::System,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::System => write!(f, "system"),
            Side::Peer => write!(f, "peer"),
        }
    }
}

/// What a fair draw is used for within a round
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawPurpose {
    /// Peer guesses the committed bit to decide who moves first
    FirstMove,
    /// Automatic die choice for the given side
    DieSelection(Side),
    /// Face index of the given side's die
    Roll(Side),
}

impl fmt::Display for DrawPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawPurpose::FirstMove => write!(f, "first move"),
            DrawPurpose::DieSelection(side) => write!(f, "{} die selection", side),
            DrawPurpose::Roll(side) => write!(f, "{} roll", side),
        }
    }
}
