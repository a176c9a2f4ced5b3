//! Presentation layer abstraction.
//!
//! The coordinator never touches a console directly. Everything shown to the
//! peer and every value read back goes through a [`Presenter`].

mod scripted;
mod traits;

pub use scripted::{PresenterEvent, ScriptedPresenter};
pub use traits::{PeerInput, PeerPrompt, Presenter};
