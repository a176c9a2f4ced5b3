//! Fair value protocol, round types, and transcripts.

mod error;
mod fair_value;
mod transcript;
mod types;

pub use error::ProtocolError;
pub use fair_value::{
    combine, combine_with, commit, commit_with_rng, reveal, CombinationPolicy, CombinedResult, Commitment,
    Resolution, Reveal, ValueRange,
};
pub use transcript::{RoundTranscript, TranscriptEntry};
pub use types::{DrawPurpose, RoundId, Side, Verdict};
