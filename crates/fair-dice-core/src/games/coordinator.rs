//! Dice round coordinator.
//!
//! One round runs strictly in sequence:
//!
//! ```text
//! Start -> FirstMove{Commit,AwaitPeer,Resolved} -> DiceSelection
//!       -> RollA{Commit,AwaitPeer,Resolved} -> RollB{Commit,AwaitPeer,Resolved} -> Done
//! ```
//!
//! Side A is the system, side B the peer. Every fair draw runs
//! commit, await peer, reveal to completion before the next one starts, so
//! at most one commitment is open at any time.

use super::{DiceSet, SelectionMode};
use crate::io::{PeerInput, PeerPrompt, Presenter};
use crate::protocol::{
    combine_with, commit, reveal, CombinationPolicy, CombinedResult, DrawPurpose, ProtocolError,
    Resolution, RoundId, RoundTranscript, Side, TranscriptEntry, ValueRange, Verdict,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// Round state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    Start,
    FirstMoveCommit,
    FirstMoveAwaitPeer,
    FirstMoveResolved,
    DiceSelection,
    RollACommit,
    RollAAwaitPeer,
    RollAResolved,
    RollBCommit,
    RollBAwaitPeer,
    RollBResolved,
    Done,
    Aborted,
}

impl RoundPhase {
    /// Commit, await-peer and resolved phases for a draw, if it has its own
    fn for_draw(purpose: DrawPurpose) -> Option<[RoundPhase; 3]> {
        match purpose {
            DrawPurpose::FirstMove => Some([
                RoundPhase::FirstMoveCommit,
                RoundPhase::FirstMoveAwaitPeer,
                RoundPhase::FirstMoveResolved,
            ]),
            DrawPurpose::Roll(Side::System) => Some([
                RoundPhase::RollACommit,
                RoundPhase::RollAAwaitPeer,
                RoundPhase::RollAResolved,
            ]),
            DrawPurpose::Roll(Side::Peer) => Some([
                RoundPhase::RollBCommit,
                RoundPhase::RollBAwaitPeer,
                RoundPhase::RollBResolved,
            ]),
            DrawPurpose::DieSelection(_) => None,
        }
    }
}

/// Result of a completed round
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundReport {
    pub round_id: RoundId,
    pub first_mover: Side,
    pub system_die: usize,
    pub peer_die: usize,
    pub system_roll: i64,
    pub peer_roll: i64,
    pub verdict: Verdict,
    pub transcript: RoundTranscript,
}

/// Drives one two-party dice round through the fair value protocol
pub struct DiceRoundCoordinator<'a, P: Presenter> {
    dice: &'a DiceSet,
    mode: SelectionMode,
    presenter: P,
    phase: RoundPhase,
    transcript: RoundTranscript,
}

impl<'a, P: Presenter> DiceRoundCoordinator<'a, P> {
    /// Validate the configuration. Fails before any key is generated.
    pub fn new(dice: &'a DiceSet, mode: SelectionMode, presenter: P) -> Result<Self, ProtocolError> {
        mode.validate(dice)?;
        Ok(Self {
            dice,
            mode,
            presenter,
            phase: RoundPhase::Start,
            transcript: RoundTranscript::new(RoundId::new()),
        })
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn round_id(&self) -> RoundId {
        self.transcript.round_id
    }

    /// Draws completed so far, including those of an aborted round
    pub fn transcript(&self) -> &RoundTranscript {
        &self.transcript
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn into_presenter(self) -> P {
        self.presenter
    }

    /// Play the round to completion.
    ///
    /// Returns [`ProtocolError::AbortedByPeer`] if the peer exits; the
    /// pending commitment, if any, is dropped unrevealed.
    pub fn play(&mut self) -> Result<RoundReport, ProtocolError> {
        if self.phase != RoundPhase::Start {
            return Err(ProtocolError::InvalidConfiguration(format!(
                "round {} already played",
                self.round_id()
            )));
        }

        info!(
            round_id = %self.round_id(),
            dice = self.dice.len(),
            mode = ?self.mode,
            "Starting round"
        );
        let result = self.run();
        if let Err(e) = &result {
            self.enter(RoundPhase::Aborted);
            warn!(round_id = %self.round_id(), error = %e, "Round ended early");
        }
        result
    }

    fn run(&mut self) -> Result<RoundReport, ProtocolError> {
        let first_move = self.fair_draw(
            DrawPurpose::FirstMove,
            ValueRange::new(0, 1)?,
            CombinationPolicy::Guess,
        )?;
        let first_mover = match first_move.resolution {
            Resolution::Guess { correct: true } => Side::Peer,
            _ => Side::System,
        };
        self.presenter.display_first_move(first_mover);

        self.enter(RoundPhase::DiceSelection);
        let first_pick = self.pick_die(first_mover, None)?;
        let second_pick = self.pick_die(first_mover.opponent(), Some(first_pick))?;
        let (system_die, peer_die) = match first_mover {
            Side::System => (first_pick, second_pick),
            Side::Peer => (second_pick, first_pick),
        };

        let system_roll = self.roll(Side::System, system_die)?;
        let peer_roll = self.roll(Side::Peer, peer_die)?;

        let verdict = Verdict::from_rolls(system_roll, peer_roll);
        self.presenter
            .display_round_outcome(system_roll, peer_roll, verdict);
        self.enter(RoundPhase::Done);
        info!(
            round_id = %self.round_id(),
            system_roll,
            peer_roll,
            %verdict,
            "Round complete"
        );

        Ok(RoundReport {
            round_id: self.round_id(),
            first_mover,
            system_die,
            peer_die,
            system_roll,
            peer_roll,
            verdict,
            transcript: self.transcript.clone(),
        })
    }

    fn pick_die(&mut self, side: Side, excluded: Option<usize>) -> Result<usize, ProtocolError> {
        let index = match (side, self.mode) {
            (Side::System, SelectionMode::Automatic) => self.draw_die(side, excluded)?,
            _ => self.ask_for_die(side, excluded)?,
        };
        let dice = self.dice;
        self.presenter.display_die_choice(side, index, &dice[index]);
        debug!(round_id = %self.round_id(), %side, index, "Die chosen");
        Ok(index)
    }

    /// Pick uniformly among the dice still available, with the peer
    /// contributing to the draw.
    fn draw_die(&mut self, side: Side, excluded: Option<usize>) -> Result<usize, ProtocolError> {
        let available: Vec<usize> = (0..self.dice.len())
            .filter(|i| Some(*i) != excluded)
            .collect();
        let position = self.draw_index(DrawPurpose::DieSelection(side), available.len())?;
        Ok(available[position])
    }

    fn ask_for_die(&mut self, side: Side, excluded: Option<usize>) -> Result<usize, ProtocolError> {
        let dice = self.dice;
        loop {
            match self.presenter.select_die(side, dice, excluded)? {
                PeerInput::Exit => return Err(ProtocolError::AbortedByPeer),
                PeerInput::Value(index) if index < dice.len() && Some(index) != excluded => {
                    return Ok(index)
                }
                PeerInput::Value(index) => {
                    let err = ProtocolError::InvalidContribution {
                        value: i64::try_from(index).unwrap_or(i64::MAX),
                        min: 0,
                        max: dice.len() as i64 - 1,
                    };
                    warn!(%side, index, ?excluded, "Rejected die selection");
                    self.presenter.display_rejected_input(&err);
                }
            }
        }
    }

    /// Roll `side`'s die. The modulus is that die's own face count.
    fn roll(&mut self, side: Side, die_index: usize) -> Result<i64, ProtocolError> {
        let dice = self.dice;
        let die = &dice[die_index];
        let face_index = self.draw_index(DrawPurpose::Roll(side), die.face_count())?;
        let value = die.faces()[face_index];
        self.presenter.display_roll(side, value);
        Ok(value)
    }

    fn draw_index(&mut self, purpose: DrawPurpose, count: usize) -> Result<usize, ProtocolError> {
        let range = ValueRange::indices(count)?;
        let combined = self.fair_draw(purpose, range, CombinationPolicy::Additive)?;
        combined
            .final_value()
            .map(|value| value as usize)
            .ok_or_else(|| {
                ProtocolError::InvalidConfiguration(format!("{purpose} draw did not produce a sum"))
            })
    }

    /// One commit / await peer / reveal triad
    fn fair_draw(
        &mut self,
        purpose: DrawPurpose,
        range: ValueRange,
        policy: CombinationPolicy,
    ) -> Result<CombinedResult, ProtocolError> {
        let phases = RoundPhase::for_draw(purpose);
        if let Some([commit_phase, _, _]) = phases {
            self.enter(commit_phase);
        }

        let commitment = commit(range.min(), range.max())?;
        debug!(
            round_id = %self.round_id(),
            %purpose,
            %range,
            mac = %commitment.mac(),
            "Committed"
        );
        self.presenter
            .display_commitment(purpose, range, commitment.mac());

        if let Some([_, await_phase, _]) = phases {
            self.enter(await_phase);
        }
        let (min, max) = policy.input_bounds(range);
        let prompt = PeerPrompt {
            purpose,
            policy,
            range,
            min,
            max,
        };
        let combined = loop {
            match self.presenter.request_peer_integer(&prompt)? {
                // The commitment drops here and its key is wiped unrevealed.
                PeerInput::Exit => return Err(ProtocolError::AbortedByPeer),
                PeerInput::Value(input) => match combine_with(policy, &commitment, input) {
                    Ok(combined) => break combined,
                    Err(e) if e.is_retryable() => {
                        warn!(%purpose, input, "Rejected peer input");
                        self.presenter.display_rejected_input(&e);
                    }
                    Err(e) => return Err(e),
                },
            }
        };

        let revealed = reveal(commitment);
        if let Err(e) = revealed.verify() {
            error!(round_id = %self.round_id(), %purpose, error = %e, "Self-verification failed");
            return Err(e);
        }
        self.presenter.display_reveal(purpose, &revealed, &combined);
        self.transcript
            .push(TranscriptEntry::new(purpose, &combined, &revealed));
        debug!(
            round_id = %self.round_id(),
            %purpose,
            key = %revealed.key,
            committed = revealed.committed_value,
            contribution = combined.contribution,
            resolution = ?combined.resolution,
            "Revealed"
        );

        if let Some([_, _, resolved_phase]) = phases {
            self.enter(resolved_phase);
        }
        Ok(combined)
    }

    fn enter(&mut self, next: RoundPhase) {
        debug!(round_id = %self.round_id(), from = ?self.phase, to = ?next, "Round phase");
        self.phase = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{PresenterEvent, ScriptedPresenter};

    fn dice() -> DiceSet {
        DiceSet::parse(&["2,2,4,4,9,9", "1,1,6,6,8,8", "3,3,5,5,7,7"]).unwrap()
    }

    #[test]
    fn test_manual_round_reaches_done() {
        let dice = dice();
        let mut presenter = ScriptedPresenter::with_inputs([0, 3, 5]);
        presenter
            .push_selection(Side::Peer, 0)
            .push_selection(Side::System, 2);

        let mut round =
            DiceRoundCoordinator::new(&dice, SelectionMode::Manual, presenter).unwrap();
        let report = round.play().unwrap();

        assert_eq!(round.phase(), RoundPhase::Done);
        assert_eq!(report.peer_die, 0);
        assert_eq!(report.system_die, 2);
        assert_eq!(report.transcript.entries.len(), 3);
        assert!(dice[2].faces().contains(&report.system_roll));
        assert!(dice[0].faces().contains(&report.peer_roll));
        assert_eq!(
            report.verdict,
            Verdict::from_rolls(report.system_roll, report.peer_roll)
        );
        assert!(report.transcript.verify().is_ok());
    }

    #[test]
    fn test_first_mover_follows_guess() {
        let dice = dice();
        let mut presenter = ScriptedPresenter::with_inputs([1, 0, 0]);
        presenter
            .push_selection(Side::Peer, 1)
            .push_selection(Side::System, 0);

        let mut round =
            DiceRoundCoordinator::new(&dice, SelectionMode::Manual, presenter).unwrap();
        let report = round.play().unwrap();

        let first = &report.transcript.entries[0];
        let expected = if first.committed_value == 1 {
            Side::Peer
        } else {
            Side::System
        };
        assert_eq!(report.first_mover, expected);
    }

    #[test]
    fn test_exit_at_first_prompt_aborts_without_reveal() {
        let dice = dice();
        let mut presenter = ScriptedPresenter::new();
        presenter.push_exit();

        let mut round =
            DiceRoundCoordinator::new(&dice, SelectionMode::Automatic, presenter).unwrap();

        assert!(matches!(round.play(), Err(ProtocolError::AbortedByPeer)));
        assert_eq!(round.phase(), RoundPhase::Aborted);
        assert!(round.transcript().entries.is_empty());

        let presenter = round.into_presenter();
        assert_eq!(presenter.macs().len(), 1);
        assert!(presenter.reveals().is_empty());
    }

    #[test]
    fn test_invalid_configuration_rejected_before_commit() {
        let two = DiceSet::parse(&["1,2", "3,4"]).unwrap();
        assert!(matches!(
            DiceRoundCoordinator::new(&two, SelectionMode::Automatic, ScriptedPresenter::new()),
            Err(ProtocolError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_round_cannot_be_replayed() {
        let dice = dice();
        let mut presenter = ScriptedPresenter::with_inputs([0, 0, 0]);
        presenter
            .push_selection(Side::Peer, 0)
            .push_selection(Side::System, 1);

        let mut round =
            DiceRoundCoordinator::new(&dice, SelectionMode::Manual, presenter).unwrap();
        round.play().unwrap();

        assert!(matches!(
            round.play(),
            Err(ProtocolError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_events_are_ordered_commit_before_reveal() {
        let dice = dice();
        let mut presenter = ScriptedPresenter::with_inputs([0, 1, 2]);
        presenter
            .push_selection(Side::Peer, 2)
            .push_selection(Side::System, 1);

        let mut round =
            DiceRoundCoordinator::new(&dice, SelectionMode::Manual, presenter).unwrap();
        round.play().unwrap();

        // Each commitment is followed by its own reveal before the next commitment.
        let mut open = false;
        for event in round.presenter().events() {
            match event {
                PresenterEvent::Commitment { .. } => {
                    assert!(!open, "two commitments open at once");
                    open = true;
                }
                PresenterEvent::Reveal { .. } => {
                    assert!(open, "reveal without commitment");
                    open = false;
                }
                _ => {}
            }
        }
        assert!(!open);
    }
}
