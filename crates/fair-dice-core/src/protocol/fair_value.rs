//! Commit, combine, and reveal: the fair value protocol.
//!
//! The committing side draws a value uniformly from a range and publishes
//! only `HMAC-SHA3-256(key, value)`. The peer then supplies a contribution
//! without knowing the value, the two are combined, and finally the key and
//! value are revealed so the peer can recompute the MAC.
//!
//! Callers must not reveal a commitment before the peer's contribution has
//! been irrevocably submitted. Nothing here enforces that ordering.

use super::ProtocolError;
use crate::crypto::{self, Mac, RevealedKey, SecretKey};
use rand::{rngs::OsRng, CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive integer range `[min, max]` with at least two values
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRange")]
pub struct ValueRange {
    min: i64,
    max: i64,
}

#[derive(Deserialize)]
struct RawRange {
    min: i64,
    max: i64,
}

impl TryFrom<RawRange> for ValueRange {
    type Error = ProtocolError;

    fn try_from(raw: RawRange) -> Result<Self, Self::Error> {
        ValueRange::new(raw.min, raw.max)
    }
}

impl ValueRange {
    pub fn new(min: i64, max: i64) -> Result<Self, ProtocolError> {
        // The span must also fit a u64 so it can act as a modulus.
        let span = max as i128 - min as i128 + 1;
        if max <= min || span > u64::MAX as i128 {
            return Err(ProtocolError::InvalidRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// Index range `[0, count - 1]`, e.g. the faces of a die
    pub fn indices(count: usize) -> Result<Self, ProtocolError> {
        let max = i64::try_from(count)
            .map_err(|_| ProtocolError::InvalidRange { min: 0, max: i64::MAX })?
            - 1;
        Self::new(0, max)
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    /// Number of values in the range (`max - min + 1`)
    pub fn span(&self) -> u64 {
        (self.max as i128 - self.min as i128 + 1) as u64
    }

    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.min, self.max)
    }
}

/// How the peer's input is combined with the committed value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombinationPolicy {
    /// `(committed + contribution) mod span`, contribution in `[0, span - 1]`
    Additive,
    /// Peer guesses the committed value, guess in `[min, max]`
    Guess,
}

impl CombinationPolicy {
    /// Inclusive bounds the peer's input must fall in
    pub fn input_bounds(&self, range: ValueRange) -> (i64, i64) {
        match self {
            CombinationPolicy::Additive => {
                (0, i64::try_from(range.span() - 1).unwrap_or(i64::MAX))
            }
            CombinationPolicy::Guess => (range.min(), range.max()),
        }
    }

    /// Combine a committed value with the peer's input. Pure.
    pub fn apply(
        &self,
        range: ValueRange,
        committed_value: i64,
        input: i64,
    ) -> Result<Resolution, ProtocolError> {
        if !range.contains(committed_value) {
            return Err(ProtocolError::TranscriptMismatch(format!(
                "committed value {committed_value} outside {range}"
            )));
        }

        let (min, max) = self.input_bounds(range);
        if !(min..=max).contains(&input) {
            return Err(ProtocolError::InvalidContribution {
                value: input,
                min,
                max,
            });
        }

        Ok(match self {
            CombinationPolicy::Additive => {
                let span = range.span() as u128;
                let offset = (committed_value as i128 - range.min() as i128) as u128;
                let index = (offset + input as u128) % span;
                Resolution::Sum {
                    final_value: (range.min() as i128 + index as i128) as i64,
                }
            }
            CombinationPolicy::Guess => Resolution::Guess {
                correct: input == committed_value,
            },
        })
    }
}

/// Outcome of combining a commitment with the peer's input
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Sum { final_value: i64 },
    Guess { correct: bool },
}

/// A committed value together with its key and published MAC.
///
/// Only the MAC may be shown to the peer before [`reveal`]. Not `Clone`:
/// a commitment is consumed by exactly one reveal.
pub struct Commitment {
    range: ValueRange,
    value: i64,
    key: SecretKey,
    mac: Mac,
}

impl Commitment {
    /// The MAC to publish to the peer
    pub fn mac(&self) -> &Mac {
        &self.mac
    }

    pub fn range(&self) -> ValueRange {
        self.range
    }
}

impl fmt::Debug for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Commitment")
            .field("range", &self.range)
            .field("mac", &self.mac)
            .finish_non_exhaustive()
    }
}

/// Result of a combine step
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedResult {
    pub range: ValueRange,
    pub policy: CombinationPolicy,
    pub committed_value: i64,
    pub contribution: i64,
    pub resolution: Resolution,
}

impl CombinedResult {
    /// The combined value, for the additive policy
    pub fn final_value(&self) -> Option<i64> {
        match self.resolution {
            Resolution::Sum { final_value } => Some(final_value),
            Resolution::Guess { .. } => None,
        }
    }

    /// Whether the peer guessed the committed value, for the guess policy
    pub fn guessed_correctly(&self) -> Option<bool> {
        match self.resolution {
            Resolution::Guess { correct } => Some(correct),
            Resolution::Sum { .. } => None,
        }
    }
}

/// Disclosed key and value, enough to recompute the MAC
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reveal {
    pub key: RevealedKey,
    pub committed_value: i64,
    pub mac: Mac,
}

impl Reveal {
    /// Recompute the MAC and compare it with the one published at commit time
    pub fn verify(&self) -> Result<(), ProtocolError> {
        crypto::verify(&self.key, self.committed_value, &self.mac)
    }
}

/// Commit to a value drawn uniformly from `[min, max]` using the OS CSPRNG.
pub fn commit(min: i64, max: i64) -> Result<Commitment, ProtocolError> {
    let range = ValueRange::new(min, max)?;
    commit_with_rng(range, &mut OsRng)
}

/// Commit using a caller-supplied cryptographic RNG.
pub fn commit_with_rng<R: RngCore + CryptoRng>(
    range: ValueRange,
    rng: &mut R,
) -> Result<Commitment, ProtocolError> {
    let key = SecretKey::from_rng(rng);
    let index = sample_uniform(rng, range.span());
    let value = (range.min() as i128 + index as i128) as i64;
    let mac = key.mac(value)?;

    Ok(Commitment {
        range,
        value,
        key,
        mac,
    })
}

/// Additive combination: `(committed + contribution) mod span`, mapped back
/// into the commitment's range. Fails without side effects if the
/// contribution is outside `[0, span - 1]`.
pub fn combine(commitment: &Commitment, contribution: i64) -> Result<CombinedResult, ProtocolError> {
    combine_with(CombinationPolicy::Additive, commitment, contribution)
}

/// Combine under an explicit policy.
pub fn combine_with(
    policy: CombinationPolicy,
    commitment: &Commitment,
    contribution: i64,
) -> Result<CombinedResult, ProtocolError> {
    let resolution = policy.apply(commitment.range, commitment.value, contribution)?;
    Ok(CombinedResult {
        range: commitment.range,
        policy,
        committed_value: commitment.value,
        contribution,
        resolution,
    })
}

/// Consume the commitment and disclose its key and value.
pub fn reveal(commitment: Commitment) -> Reveal {
    Reveal {
        committed_value: commitment.value,
        mac: commitment.mac,
        key: commitment.key.publish(),
    }
}

/// Uniform draw from `[0, span)` by rejection sampling over the full `u64`
/// output space. Draws at or above `floor(u64::MAX / span) * span` are
/// discarded so the final modulus carries no bias.
pub(crate) fn sample_uniform<R: RngCore + ?Sized>(rng: &mut R, span: u64) -> u64 {
    let zone = (u64::MAX / span) * span;
    loop {
        let draw = rng.next_u64();
        if draw < zone {
            return draw % span;
        }
    }
}
