//! Voice path: transcript normalisation and audio channel arbitration
//!
//! Raw transcripts become canonical commands via the priority-ordered
//! normaliser; the audio arbiter owns the mutual exclusion between the
//! speech input stream and speech synthesis on the shared audio channel.

pub mod arbiter;
pub mod normalise;

pub use arbiter::{ArbiterAction, ArbiterEvent, ArbiterState, AudioArbiter};
pub use normalise::normalise;
