//! Pairwise win probabilities between dice.

use super::{DiceSet, Die};
use crate::protocol::ProtocolError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Exact probability `wins / total`
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(try_from = "RawProbability")]
pub struct Probability {
    wins: u64,
    total: u64,
}

#[derive(Deserialize)]
struct RawProbability {
    wins: u64,
    total: u64,
}

impl TryFrom<RawProbability> for Probability {
    type Error = ProtocolError;

    fn try_from(raw: RawProbability) -> Result<Self, Self::Error> {
        Probability::try_new(raw.wins, raw.total)
    }
}

impl Probability {
    /// # Panics
    ///
    /// If `total` is zero or `wins > total`.
    pub fn new(wins: u64, total: u64) -> Self {
        assert!(total > 0 && wins <= total, "invalid probability {wins}/{total}");
        Self { wins, total }
    }

    pub fn try_new(wins: u64, total: u64) -> Result<Self, ProtocolError> {
        if total == 0 || wins > total {
            return Err(ProtocolError::InvalidConfiguration(format!(
                "invalid probability {wins}/{total}"
            )));
        }
        Ok(Self { wins, total })
    }

    /// Numerator in lowest terms
    pub fn numerator(&self) -> u64 {
        self.wins / gcd(self.wins, self.total)
    }

    /// Denominator in lowest terms
    pub fn denominator(&self) -> u64 {
        self.total / gcd(self.wins, self.total)
    }

    pub fn as_f64(&self) -> f64 {
        self.wins as f64 / self.total as f64
    }
}

impl PartialEq for Probability {
    fn eq(&self, other: &Self) -> bool {
        self.wins as u128 * other.total as u128 == other.wins as u128 * self.total as u128
    }
}

impl Eq for Probability {}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.as_f64())
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Probability that a roll of `a` is strictly greater than a roll of `b`.
/// Equal faces count toward neither side.
pub fn win_probability(a: &Die, b: &Die) -> Probability {
    let wins = a
        .faces()
        .iter()
        .map(|x| b.faces().iter().filter(|y| x > y).count() as u64)
        .sum();
    Probability::new(wins, (a.face_count() * b.face_count()) as u64)
}

/// `table[row][col]` is the probability that die `row` beats die `col`.
/// The diagonal is `None`.
pub fn probability_table(dice: &DiceSet) -> Vec<Vec<Option<Probability>>> {
    dice.iter()
        .enumerate()
        .map(|(i, row)| {
            dice.iter()
                .enumerate()
                .map(|(j, col)| (i != j).then(|| win_probability(row, col)))
                .collect()
        })
        .collect()
}
