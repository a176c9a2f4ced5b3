//! Presenter trait definition.

use crate::games::{DiceSet, Die};
use crate::protocol::{
    CombinationPolicy, CombinedResult, DrawPurpose, ProtocolError, Reveal, Side, ValueRange,
    Verdict,
};
use crate::Mac;
use serde::{Deserialize, Serialize};

/// A value read from the peer, or the peer asking to leave
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerInput<T> {
    Value(T),
    Exit,
}

/// What the peer is being asked for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerPrompt {
    pub purpose: DrawPurpose,
    pub policy: CombinationPolicy,
    pub range: ValueRange,
    /// Smallest accepted input
    pub min: i64,
    /// Largest accepted input
    pub max: i64,
}

/// Trait for the presentation layer
///
/// Implementations can be:
/// - ScriptedPresenter for testing
/// - A console presenter reading stdin in the CLI
///
/// `request_peer_integer` and `select_die` block until the peer answers.
/// Returning [`PeerInput::Exit`] aborts the round; any pending commitment
/// is dropped without being revealed.
pub trait Presenter {
    /// Show the MAC of a fresh commitment
    fn display_commitment(&mut self, purpose: DrawPurpose, range: ValueRange, mac: &Mac);

    /// Read an integer from the peer. Range checking is the caller's job.
    fn request_peer_integer(&mut self, prompt: &PeerPrompt)
        -> Result<PeerInput<i64>, ProtocolError>;

    /// Tell the peer their last input was rejected and will be asked again
    fn display_rejected_input(&mut self, error: &ProtocolError);

    /// Show the revealed key and value alongside the combined result
    fn display_reveal(&mut self, purpose: DrawPurpose, reveal: &Reveal, combined: &CombinedResult);

    /// Ask which die `side` plays with. `excluded` is already taken.
    fn select_die(
        &mut self,
        side: Side,
        dice: &DiceSet,
        excluded: Option<usize>,
    ) -> Result<PeerInput<usize>, ProtocolError>;

    /// Show the final rolls and the verdict
    fn display_round_outcome(&mut self, system_value: i64, peer_value: i64, verdict: Verdict);

    fn display_first_move(&mut self, _first: Side) {}

    fn display_die_choice(&mut self, _side: Side, _index: usize, _die: &Die) {}

    fn display_roll(&mut self, _side: Side, _value: i64) {}
}
