//! Dice games built on the fair value protocol.

mod coordinator;
mod dice;
mod probability;
mod record;

pub use coordinator::{DiceRoundCoordinator, RoundPhase, RoundReport};
pub use dice::{DiceSet, Die, SelectionMode};
pub use probability::{probability_table, win_probability, Probability};
pub use record::{RoundOutcome, RoundRecord};
