//! Round transcript: every commitment, contribution, and reveal of a round,
//! in the order they happened, so an auditor can recompute all of it.

use super::{CombinationPolicy, CombinedResult, DrawPurpose, ProtocolError, Resolution, Reveal};
use super::{RoundId, ValueRange};
use crate::crypto::{self, Mac, RevealedKey};
use serde::{Deserialize, Serialize};

/// One fair draw
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub purpose: DrawPurpose,
    pub range: ValueRange,
    pub policy: CombinationPolicy,
    pub mac: Mac,
    pub key: RevealedKey,
    pub committed_value: i64,
    pub contribution: i64,
    pub resolution: Resolution,
}

impl TranscriptEntry {
    pub fn new(purpose: DrawPurpose, combined: &CombinedResult, reveal: &Reveal) -> Self {
        Self {
            purpose,
            range: combined.range,
            policy: combined.policy,
            mac: reveal.mac,
            key: reveal.key,
            committed_value: reveal.committed_value,
            contribution: combined.contribution,
            resolution: combined.resolution,
        }
    }

    /// Recompute the MAC and the combination from the recorded inputs
    pub fn verify(&self) -> Result<(), ProtocolError> {
        crypto::verify(&self.key, self.committed_value, &self.mac)?;

        if !self.range.contains(self.committed_value) {
            return Err(ProtocolError::TranscriptMismatch(format!(
                "{}: committed value {} outside {}",
                self.purpose, self.committed_value, self.range
            )));
        }

        let recomputed = self
            .policy
            .apply(self.range, self.committed_value, self.contribution)
            .map_err(|e| ProtocolError::TranscriptMismatch(format!("{}: {e}", self.purpose)))?;
        if recomputed != self.resolution {
            return Err(ProtocolError::TranscriptMismatch(format!(
                "{}: recorded resolution {:?} but inputs give {:?}",
                self.purpose, self.resolution, recomputed
            )));
        }
        Ok(())
    }
}

/// Ordered record of all draws in one round
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundTranscript {
    pub round_id: RoundId,
    pub entries: Vec<TranscriptEntry>,
}

impl RoundTranscript {
    pub fn new(round_id: RoundId) -> Self {
        Self {
            round_id,
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: TranscriptEntry) {
        self.entries.push(entry);
    }

    pub fn entries_for(&self, purpose: DrawPurpose) -> impl Iterator<Item = &TranscriptEntry> {
        self.entries.iter().filter(move |e| e.purpose == purpose)
    }

    /// Verify every entry, stopping at the first failure
    pub fn verify(&self) -> Result<(), ProtocolError> {
        self.entries.iter().try_for_each(TranscriptEntry::verify)
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(json)?)
    }
}
