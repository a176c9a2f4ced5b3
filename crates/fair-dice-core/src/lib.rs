//! Fair Dice Core Library
//!
//! This crate provides the commit-reveal protocol for producing a random
//! value that neither party can bias, the dice round coordinator built on
//! top of it, and win-probability analysis for dice sets.

pub mod crypto;
pub mod games;
pub mod io;
pub mod protocol;

pub use crypto::{Mac, RevealedKey, SecretKey};
pub use games::{
    probability_table, win_probability, DiceRoundCoordinator, DiceSet, Die, Probability,
    RoundOutcome, RoundPhase, RoundRecord, RoundReport, SelectionMode,
};
pub use io::{PeerInput, PeerPrompt, Presenter, ScriptedPresenter};
pub use protocol::{
    combine, commit, reveal, CombinationPolicy, CombinedResult, Commitment, DrawPurpose,
    ProtocolError, Resolution, Reveal, RoundId, RoundTranscript, Side, TranscriptEntry, ValueRange,
    Verdict,
};
