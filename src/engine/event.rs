//! Inbound event alphabet for the serialised engine loop
//!
//! Every external signal — pose ticks, transcripts, synthesis callbacks,
//! settings changes, and completions from the I/O bridge threads — is
//! funnelled through one channel of these events, so the state machines
//! never run concurrently with themselves or each other.

use crate::command::ViewContext;
use crate::error::{CaptureFault, ListenFault};
use crate::gesture::landmarks::HandFrame;

/// An event delivered to the engine loop.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// One pose-detection tick; `None` when no hand is present.
    /// With multi-hand detection the host passes the first hand only.
    HandFrame(Option<HandFrame>),
    /// One recognised utterance from the speech-to-text service
    Transcript(String),
    /// Speech synthesis started playing
    SynthesisStarted,
    /// Speech synthesis finished playing
    SynthesisEnded,
    /// The host switched views
    ContextChanged(ViewContext),
    /// Voice control was toggled by the settings layer
    VoiceEnabled(bool),
    /// Gesture control was toggled by the settings layer
    GestureEnabled(bool),
    /// The speech input stream started (reported by the I/O bridge)
    ListenStarted,
    /// The speech input stream ended on its own
    ListenEnded,
    /// The speech input stream reported a fault
    ListenFaulted(ListenFault),
    /// The camera capture pipeline started (reported by the I/O bridge)
    CaptureStarted,
    /// The camera capture pipeline failed
    CaptureFaulted(CaptureFault),
    /// Stop the engine loop
    Shutdown,
}
