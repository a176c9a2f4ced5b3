//! Scripted presenter for testing.

use super::traits::{PeerInput, PeerPrompt, Presenter};
use crate::games::{DiceSet, Die};
use crate::protocol::{
    CombinedResult, DrawPurpose, ProtocolError, Reveal, Side, ValueRange, Verdict,
};
use crate::Mac;
use std::collections::{HashMap, VecDeque};

/// Everything the coordinator showed to the peer, in order
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PresenterEvent {
    Commitment {
        purpose: DrawPurpose,
        range: ValueRange,
        mac: Mac,
    },
    Rejected(String),
    Reveal {
        purpose: DrawPurpose,
        reveal: Reveal,
        combined: CombinedResult,
    },
    FirstMove(Side),
    DieChoice {
        side: Side,
        index: usize,
    },
    Roll {
        side: Side,
        value: i64,
    },
    Outcome {
        system_value: i64,
        peer_value: i64,
        verdict: Verdict,
    },
}

/// In-memory presenter that replays queued peer answers.
///
/// An exhausted queue answers [`PeerInput::Exit`].
#[derive(Debug, Default)]
pub struct ScriptedPresenter {
    inputs: VecDeque<PeerInput<i64>>,
    selections: HashMap<Side, VecDeque<PeerInput<usize>>>,
    prompts: Vec<PeerPrompt>,
    events: Vec<PresenterEvent>,
}

impl ScriptedPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with a queue of integer answers
    pub fn with_inputs(inputs: impl IntoIterator<Item = i64>) -> Self {
        let mut presenter = Self::new();
        for value in inputs {
            presenter.push_input(value);
        }
        presenter
    }

    pub fn push_input(&mut self, value: i64) -> &mut Self {
        self.inputs.push_back(PeerInput::Value(value));
        self
    }

    pub fn push_exit(&mut self) -> &mut Self {
        self.inputs.push_back(PeerInput::Exit);
        self
    }

    /// Queue a die index answer for `side`
    pub fn push_selection(&mut self, side: Side, index: usize) -> &mut Self {
        self.selections
            .entry(side)
            .or_default()
            .push_back(PeerInput::Value(index));
        self
    }

    pub fn push_selection_exit(&mut self, side: Side) -> &mut Self {
        self.selections
            .entry(side)
            .or_default()
            .push_back(PeerInput::Exit);
        self
    }

    /// Prompts received so far
    pub fn prompts(&self) -> &[PeerPrompt] {
        &self.prompts
    }

    /// Events displayed so far
    pub fn events(&self) -> &[PresenterEvent] {
        &self.events
    }

    /// Number of integer answers not yet consumed
    pub fn remaining_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// MACs displayed so far
    pub fn macs(&self) -> Vec<Mac> {
        self.events
            .iter()
            .filter_map(|e| match e {
                PresenterEvent::Commitment { mac, .. } => Some(*mac),
                _ => None,
            })
            .collect()
    }

    /// Reveals displayed so far
    pub fn reveals(&self) -> Vec<Reveal> {
        self.events
            .iter()
            .filter_map(|e| match e {
                PresenterEvent::Reveal { reveal, .. } => Some(*reveal),
                _ => None,
            })
            .collect()
    }

    pub fn rejections(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, PresenterEvent::Rejected(_)))
            .count()
    }
}

impl Presenter for ScriptedPresenter {
    fn display_commitment(&mut self, purpose: DrawPurpose, range: ValueRange, mac: &Mac) {
        self.events.push(PresenterEvent::Commitment {
            purpose,
            range,
            mac: *mac,
        });
    }

    fn request_peer_integer(
        &mut self,
        prompt: &PeerPrompt,
    ) -> Result<PeerInput<i64>, ProtocolError> {
        self.prompts.push(*prompt);
        Ok(self.inputs.pop_front().unwrap_or(PeerInput::Exit))
    }

    fn display_rejected_input(&mut self, error: &ProtocolError) {
        self.events.push(PresenterEvent::Rejected(error.to_string()));
    }

    fn display_reveal(&mut self, purpose: DrawPurpose, reveal: &Reveal, combined: &CombinedResult) {
        self.events.push(PresenterEvent::Reveal {
            purpose,
            reveal: *reveal,
            combined: *combined,
        });
    }

    fn select_die(
        &mut self,
        side: Side,
        _dice: &DiceSet,
        _excluded: Option<usize>,
    ) -> Result<PeerInput<usize>, ProtocolError> {
        Ok(self
            .selections
            .get_mut(&side)
            .and_then(VecDeque::pop_front)
            .unwrap_or(PeerInput::Exit))
    }

    fn display_round_outcome(&mut self, system_value: i64, peer_value: i64, verdict: Verdict) {
        self.events.push(PresenterEvent::Outcome {
            system_value,
            peer_value,
            verdict,
        });
    }

    fn display_first_move(&mut self, first: Side) {
        self.events.push(PresenterEvent::FirstMove(first));
    }

    fn display_die_choice(&mut self, side: Side, index: usize, _die: &Die) {
        self.events.push(PresenterEvent::DieChoice { side, index });
    }

    fn display_roll(&mut self, side: Side, value: i64) {
        self.events.push(PresenterEvent::Roll { side, value });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::CombinationPolicy;

    fn prompt() -> PeerPrompt {
        PeerPrompt {
            purpose: DrawPurpose::FirstMove,
            policy: CombinationPolicy::Guess,
            range: ValueRange::new(0, 1).unwrap(),
            min: 0,
            max: 1,
        }
    }

    #[test]
    fn test_inputs_replay_in_order_then_exit() {
        let mut presenter = ScriptedPresenter::with_inputs([1, 0]);

        assert_eq!(
            presenter.request_peer_integer(&prompt()).unwrap(),
            PeerInput::Value(1)
        );
        assert_eq!(
            presenter.request_peer_integer(&prompt()).unwrap(),
            PeerInput::Value(0)
        );
        assert_eq!(
            presenter.request_peer_integer(&prompt()).unwrap(),
            PeerInput::Exit
        );
        assert_eq!(presenter.prompts().len(), 3);
    }

    #[test]
    fn test_selections_are_per_side() {
        let dice = DiceSet::parse(&["1,2", "3,4"]).unwrap();
        let mut presenter = ScriptedPresenter::new();
        presenter
            .push_selection(Side::Peer, 1)
            .push_selection(Side::System, 0);

        assert_eq!(
            presenter.select_die(Side::System, &dice, None).unwrap(),
            PeerInput::Value(0)
        );
        assert_eq!(
            presenter.select_die(Side::Peer, &dice, Some(0)).unwrap(),
            PeerInput::Value(1)
        );
        assert_eq!(
            presenter.select_die(Side::Peer, &dice, None).unwrap(),
            PeerInput::Exit
        );
    }
}
