//! souschef - Gesture and voice command interpretation for hands-free cooking
//!
//! Turns a stream of hand-landmark frames from an external pose-detection
//! service and a stream of raw speech transcripts from an external
//! speech-to-text service into a small closed vocabulary of application
//! commands, while arbitrating the shared audio channel against speech
//! synthesis.
//!
//! The host wires the services to an [`engine::EngineHandle`] and receives
//! commands through the [`engine::ports`] traits; everything in between —
//! classification, stabilisation, normalisation, arbitration and duplicate
//! suppression — runs on one serialised engine thread.

pub mod command;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod gesture;
pub mod voice;

pub use command::{Command, CommandSource, ViewContext};
pub use config::EngineConfig;
pub use engine::{Engine, EngineHandle, EnginePorts, ModalityStatus};
pub use gesture::{classify, GestureLabel, HandFrame, Landmark};
pub use voice::normalise::normalise;
