//! Auditable round record.
//!
//! The transcript alone proves each MAC and combination. The record adds
//! the dice in play and the round outcome so an auditor can also replay
//! how the draws turn into die choices, faces, and the verdict.

use super::{DiceSet, RoundReport, SelectionMode};
use crate::protocol::{
    DrawPurpose, ProtocolError, Resolution, RoundTranscript, Side, TranscriptEntry, Verdict,
};
use serde::{Deserialize, Serialize};

/// Who picked which die, what was rolled, and who won
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub first_mover: Side,
    pub system_die: usize,
    pub peer_die: usize,
    pub system_roll: i64,
    pub peer_roll: i64,
    pub verdict: Verdict,
}

/// Everything written by `play --transcript`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub dice: DiceSet,
    pub mode: SelectionMode,
    /// Absent when the round was aborted
    pub outcome: Option<RoundOutcome>,
    pub transcript: RoundTranscript,
}

impl RoundRecord {
    pub fn completed(dice: &DiceSet, mode: SelectionMode, report: &RoundReport) -> Self {
        Self {
            dice: dice.clone(),
            mode,
            outcome: Some(RoundOutcome {
                first_mover: report.first_mover,
                system_die: report.system_die,
                peer_die: report.peer_die,
                system_roll: report.system_roll,
                peer_roll: report.peer_roll,
                verdict: report.verdict,
            }),
            transcript: report.transcript.clone(),
        }
    }

    pub fn aborted(dice: &DiceSet, mode: SelectionMode, transcript: &RoundTranscript) -> Self {
        Self {
            dice: dice.clone(),
            mode,
            outcome: None,
            transcript: transcript.clone(),
        }
    }

    /// Verify every draw, then replay the round from the draws and check
    /// the recorded outcome against it.
    pub fn verify(&self) -> Result<(), ProtocolError> {
        self.transcript.verify()?;
        let Some(outcome) = self.outcome else {
            return Ok(());
        };
        self.mode
            .validate(&self.dice)
            .map_err(|e| mismatch(e.to_string()))?;

        let first_move = self.single(DrawPurpose::FirstMove)?;
        let first_mover = match first_move.resolution {
            Resolution::Guess { correct: true } => Side::Peer,
            Resolution::Guess { correct: false } => Side::System,
            Resolution::Sum { .. } => return Err(mismatch("first move is not a guess")),
        };
        if first_mover != outcome.first_mover {
            return Err(mismatch(format!(
                "first mover recorded as {} but the guess gives {}",
                outcome.first_mover, first_mover
            )));
        }

        for (side, index) in [
            (Side::System, outcome.system_die),
            (Side::Peer, outcome.peer_die),
        ] {
            if index >= self.dice.len() {
                return Err(mismatch(format!("{side} die {index} does not exist")));
            }
        }
        if outcome.system_die == outcome.peer_die {
            return Err(mismatch("both sides hold the same die"));
        }

        match self.mode {
            SelectionMode::Automatic => self.check_die_draw(&outcome)?,
            SelectionMode::Manual => {
                let draws = self
                    .transcript
                    .entries_for(DrawPurpose::DieSelection(Side::System))
                    .count();
                if draws != 0 {
                    return Err(mismatch("manual round contains a die draw"));
                }
            }
        }

        self.check_roll(Side::System, outcome.system_die, outcome.system_roll)?;
        self.check_roll(Side::Peer, outcome.peer_die, outcome.peer_roll)?;

        let verdict = Verdict::from_rolls(outcome.system_roll, outcome.peer_roll);
        if verdict != outcome.verdict {
            return Err(mismatch(format!(
                "verdict recorded as {} but the rolls give {}",
                outcome.verdict, verdict
            )));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The system's die is drawn over the dice the peer has not taken
    fn check_die_draw(&self, outcome: &RoundOutcome) -> Result<(), ProtocolError> {
        let draw = self.single(DrawPurpose::DieSelection(Side::System))?;
        let excluded = match outcome.first_mover {
            Side::System => None,
            Side::Peer => Some(outcome.peer_die),
        };
        let available: Vec<usize> = (0..self.dice.len())
            .filter(|i| Some(*i) != excluded)
            .collect();

        if draw.range.span() != available.len() as u64 {
            return Err(mismatch(format!(
                "die draw over {} values but {} dice were available",
                draw.range.span(),
                available.len()
            )));
        }
        let drawn = sum_index(draw)?;
        if available.get(drawn) != Some(&outcome.system_die) {
            return Err(mismatch(format!(
                "die draw gives position {drawn} but system die recorded as {}",
                outcome.system_die
            )));
        }
        Ok(())
    }

    /// The roll indexes the faces of the die that side holds
    fn check_roll(&self, side: Side, die_index: usize, recorded: i64) -> Result<(), ProtocolError> {
        let die = &self.dice[die_index];
        let draw = self.single(DrawPurpose::Roll(side))?;
        if draw.range.span() != die.face_count() as u64 {
            return Err(mismatch(format!(
                "{side} roll drawn over {} values but the die has {} faces",
                draw.range.span(),
                die.face_count()
            )));
        }
        let face = die
            .face(sum_index(draw)?)
            .ok_or_else(|| mismatch(format!("{side} roll outside die {die}")))?;
        if face != recorded {
            return Err(mismatch(format!(
                "{side} roll recorded as {recorded} but die {die} shows {face}"
            )));
        }
        Ok(())
    }

    fn single(&self, purpose: DrawPurpose) -> Result<&TranscriptEntry, ProtocolError> {
        let mut entries = self.transcript.entries_for(purpose);
        match (entries.next(), entries.next()) {
            (Some(entry), None) => Ok(entry),
            (None, _) => Err(mismatch(format!("no {purpose} draw"))),
            (Some(_), Some(_)) => Err(mismatch(format!("more than one {purpose} draw"))),
        }
    }
}

fn sum_index(entry: &TranscriptEntry) -> Result<usize, ProtocolError> {
    match entry.resolution {
        Resolution::Sum { final_value } => usize::try_from(final_value)
            .map_err(|_| mismatch(format!("{} index {final_value} is negative", entry.purpose))),
        Resolution::Guess { .. } => Err(mismatch(format!("{} is not a sum", entry.purpose))),
    }
}

fn mismatch(message: impl Into<String>) -> ProtocolError {
    ProtocolError::TranscriptMismatch(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::DiceRoundCoordinator;
    use crate::io::ScriptedPresenter;

    fn dice() -> DiceSet {
        DiceSet::parse(&["2,2,4,4,9,9", "1,1,6,6,8,8", "3,3,5,5,7,7"]).unwrap()
    }

    fn played(mode: SelectionMode) -> RoundRecord {
        let dice = dice();
        let mut presenter = ScriptedPresenter::with_inputs([1, 1, 3, 4]);
        match mode {
            SelectionMode::Manual => {
                presenter
                    .push_selection(Side::Peer, 0)
                    .push_selection(Side::System, 1);
            }
            SelectionMode::Automatic => {
                presenter
                    .push_selection(Side::Peer, 2)
                    .push_selection(Side::Peer, 0);
            }
        }
        let mut round = DiceRoundCoordinator::new(&dice, mode, presenter).unwrap();
        let report = round.play().unwrap();
        RoundRecord::completed(&dice, mode, &report)
    }

    #[test]
    fn test_completed_rounds_verify() {
        for mode in [SelectionMode::Manual, SelectionMode::Automatic] {
            let record = played(mode);
            assert!(record.verify().is_ok(), "{mode:?}");

            let parsed = RoundRecord::from_json(&record.to_json().unwrap()).unwrap();
            assert_eq!(parsed, record);
            assert!(parsed.verify().is_ok());
        }
    }

    #[test]
    fn test_swapped_die_detected() {
        let mut record = played(SelectionMode::Manual);
        if let Some(outcome) = record.outcome.as_mut() {
            outcome.system_die = 2;
        }
        assert!(matches!(
            record.verify(),
            Err(ProtocolError::TranscriptMismatch(_))
        ));
    }

    #[test]
    fn test_altered_roll_detected() {
        let mut record = played(SelectionMode::Automatic);
        if let Some(outcome) = record.outcome.as_mut() {
            outcome.peer_roll = 100;
        }
        assert!(matches!(
            record.verify(),
            Err(ProtocolError::TranscriptMismatch(_))
        ));
    }

    #[test]
    fn test_altered_verdict_detected() {
        let mut record = played(SelectionMode::Manual);
        if let Some(outcome) = record.outcome.as_mut() {
            outcome.verdict = match outcome.verdict {
                Verdict::SystemWins => Verdict::PeerWins,
                _ => Verdict::SystemWins,
            };
        }
        assert!(matches!(
            record.verify(),
            Err(ProtocolError::TranscriptMismatch(_))
        ));
    }

    #[test]
    fn test_substituted_dice_detected() {
        let mut record = played(SelectionMode::Manual);
        record.dice = DiceSet::parse(&["100,101,102,103,104,105"; 3]).unwrap();
        assert!(record.verify().is_err());
    }

    #[test]
    fn test_aborted_round_checks_draws_only() {
        let dice = dice();
        let mut presenter = ScriptedPresenter::with_inputs([0]);
        presenter.push_selection_exit(Side::Peer);
        let mut round = DiceRoundCoordinator::new(&dice, SelectionMode::Manual, presenter).unwrap();
        assert!(round.play().is_err());

        let record = RoundRecord::aborted(&dice, SelectionMode::Manual, round.transcript());
        assert!(record.outcome.is_none());
        assert_eq!(record.transcript.entries.len(), 1);
        assert!(record.verify().is_ok());
    }
}
