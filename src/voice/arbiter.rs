//! Audio channel arbitration
//!
//! The microphone and the speaker share one audio channel: speech input
//! must never run while speech synthesis is playing, or the input stream
//! captures the output audio. This module owns that mutual exclusion.
//!
//! The arbiter is a pure event-to-actions machine: it never touches the
//! services or clocks itself. The engine executes the returned actions
//! (start/stop the input stream, schedule or cancel the resume and
//! backoff timers, surface an unavailable status) on its serialised loop.

use serde::{Deserialize, Serialize};

use crate::error::ListenFault;

/// Default settle window after synthesis ends, before input resumes (ms)
pub const DEFAULT_RESUME_SETTLE_MS: u64 = 1_500;

/// Default backoff before re-attempting a failed input start (ms)
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 2_000;

/// Default bound on consecutive input start attempts
pub const DEFAULT_MAX_START_ATTEMPTS: u32 = 3;

/// State of the audio channel coordinator.
///
/// Invariant: `Listening` and `Speaking` are mutually exclusive; there is
/// no event interleaving that holds both, because both are values of this
/// single field and every transition out of `Listening` stops the input
/// stream in the same step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ArbiterState {
    /// Voice input inactive; requires an explicit enable to start
    #[default]
    Idle,
    /// The input stream is running (or a start is in flight)
    Listening,
    /// Input paused after synthesis; waiting out the settle window
    Paused,
    /// Speech synthesis is playing; input is cut
    Speaking,
    /// A transient input fault occurred; waiting out the backoff
    Retrying,
}

impl ArbiterState {
    /// Returns a human-readable description of the state
    pub fn description(&self) -> &'static str {
        match self {
            ArbiterState::Idle => "Voice input inactive",
            ArbiterState::Listening => "Listening for speech",
            ArbiterState::Paused => "Paused for synthesis settle",
            ArbiterState::Speaking => "Speech synthesis playing",
            ArbiterState::Retrying => "Retrying input after fault",
        }
    }
}

/// Events consumed by the arbiter.
#[derive(Debug, Clone)]
pub enum ArbiterEvent {
    /// Voice control was toggled
    VoiceEnabled(bool),
    /// Speech synthesis started playing
    SynthesisStarted,
    /// Speech synthesis finished playing
    SynthesisEnded,
    /// The input stream started successfully
    ListenStarted,
    /// The input stream ended on its own (not via an explicit stop)
    ListenEnded,
    /// The input stream reported a fault
    ListenFault(ListenFault),
    /// The post-synthesis settle timer elapsed
    ResumeElapsed,
    /// The retry backoff timer elapsed
    BackoffElapsed,
}

/// Actions the engine must carry out after an arbiter step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArbiterAction {
    /// Start the speech input stream (off the serialised path)
    StartListening,
    /// Stop the speech input stream immediately
    StopListening,
    /// Schedule the post-synthesis settle timer
    ScheduleResume,
    /// Schedule the retry backoff timer
    ScheduleBackoff,
    /// Cancel a pending settle timer (no-op if none)
    CancelResume,
    /// Cancel a pending backoff timer (no-op if none)
    CancelBackoff,
    /// Surface that voice input is unavailable until re-enabled
    SurfaceUnavailable(ListenFault),
}

/// The audio channel arbitration coordinator.
pub struct AudioArbiter {
    state: ArbiterState,
    /// Whether voice control is enabled by the settings layer
    enabled: bool,
    /// Whether synthesis is currently playing (tracked even in `Idle`)
    synthesis_active: bool,
    /// Input start attempts spent since the last successful start
    attempts: u32,
    /// Bound on consecutive start attempts
    max_attempts: u32,
    /// Whether the unavailable status has already been surfaced
    unavailable_surfaced: bool,
}

impl AudioArbiter {
    /// Creates an arbiter with the given start-attempt budget.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            state: ArbiterState::Idle,
            enabled: false,
            synthesis_active: false,
            attempts: 0,
            max_attempts: max_attempts.max(1),
            unavailable_surfaced: false,
        }
    }

    /// Returns the current state
    pub fn state(&self) -> ArbiterState {
        self.state
    }

    /// Returns whether voice control is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns whether speech synthesis is currently playing
    pub fn synthesis_active(&self) -> bool {
        self.synthesis_active
    }

    /// Returns the attempts spent since the last successful start
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Process one event and return the actions to execute.
    pub fn process_event(&mut self, event: ArbiterEvent) -> Vec<ArbiterAction> {
        let previous = self.state;
        let actions = self.transition(event);
        if self.state != previous {
            tracing::info!(
                "Audio arbiter: {:?} -> {:?}",
                previous,
                self.state
            );
        }
        actions
    }

    fn transition(&mut self, event: ArbiterEvent) -> Vec<ArbiterAction> {
        match event {
            ArbiterEvent::VoiceEnabled(true) => {
                if self.enabled {
                    return Vec::new();
                }
                self.enabled = true;
                self.attempts = 0;
                self.unavailable_surfaced = false;
                if self.synthesis_active {
                    // Input may not start under active output; wait for
                    // the synthesis-end settle path.
                    self.state = ArbiterState::Speaking;
                    Vec::new()
                } else {
                    vec![ArbiterAction::StartListening]
                }
            }
            ArbiterEvent::VoiceEnabled(false) => {
                let was_listening = self.state == ArbiterState::Listening;
                self.enabled = false;
                self.state = ArbiterState::Idle;
                self.attempts = 0;
                let mut actions = vec![ArbiterAction::CancelResume, ArbiterAction::CancelBackoff];
                if was_listening {
                    actions.push(ArbiterAction::StopListening);
                }
                actions
            }
            ArbiterEvent::SynthesisStarted => {
                self.synthesis_active = true;
                match self.state {
                    // Cut input before output begins, in the same step.
                    ArbiterState::Listening => {
                        self.state = ArbiterState::Speaking;
                        vec![ArbiterAction::StopListening]
                    }
                    ArbiterState::Paused => {
                        self.state = ArbiterState::Speaking;
                        vec![ArbiterAction::CancelResume]
                    }
                    ArbiterState::Retrying => {
                        self.state = ArbiterState::Speaking;
                        vec![ArbiterAction::CancelBackoff]
                    }
                    // Idle stays idle: a parked coordinator is not revived
                    // by synthesis traffic.
                    ArbiterState::Idle | ArbiterState::Speaking => Vec::new(),
                }
            }
            ArbiterEvent::SynthesisEnded => {
                self.synthesis_active = false;
                if self.state == ArbiterState::Speaking {
                    self.state = ArbiterState::Paused;
                    vec![ArbiterAction::ScheduleResume]
                } else {
                    Vec::new()
                }
            }
            ArbiterEvent::ListenStarted => {
                if !self.enabled || self.synthesis_active {
                    // The start raced a disable or a synthesis onset; the
                    // input stream must not stay up.
                    return vec![ArbiterAction::StopListening];
                }
                self.attempts = 0;
                self.unavailable_surfaced = false;
                self.state = ArbiterState::Listening;
                Vec::new()
            }
            ArbiterEvent::ListenEnded => {
                if !self.enabled || self.state != ArbiterState::Listening {
                    // Ended because we stopped it (or we are not the
                    // active consumer); nothing to restart.
                    return Vec::new();
                }
                // Restart-on-end, at the cost of one budget unit.
                self.spend_attempt(ListenFault::AudioCapture("input stream ended".to_string()))
            }
            ArbiterEvent::ListenFault(fault) => {
                if !self.enabled || self.state == ArbiterState::Speaking {
                    return Vec::new();
                }
                if fault.is_timeout() {
                    // An ordinary no-speech timeout: restart silently
                    // without touching the budget.
                    return if self.state == ArbiterState::Listening {
                        vec![ArbiterAction::StartListening]
                    } else {
                        Vec::new()
                    };
                }
                if fault.is_retryable() {
                    self.attempts += 1;
                    if self.attempts >= self.max_attempts {
                        self.give_up(fault)
                    } else {
                        self.state = ArbiterState::Retrying;
                        vec![ArbiterAction::ScheduleBackoff]
                    }
                } else {
                    // Permission denied, explicit abort, service disabled:
                    // park until the user re-enables voice control.
                    self.attempts = 0;
                    self.give_up(fault)
                }
            }
            ArbiterEvent::ResumeElapsed => {
                if self.enabled
                    && self.state == ArbiterState::Paused
                    && !self.synthesis_active
                {
                    vec![ArbiterAction::StartListening]
                } else {
                    // Stale firing after a cancel; cancellation is
                    // idempotent so this is a no-op.
                    Vec::new()
                }
            }
            ArbiterEvent::BackoffElapsed => {
                if self.enabled
                    && self.state == ArbiterState::Retrying
                    && !self.synthesis_active
                {
                    vec![ArbiterAction::StartListening]
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// Spend one start attempt; restart immediately or give up.
    fn spend_attempt(&mut self, fault: ListenFault) -> Vec<ArbiterAction> {
        self.attempts += 1;
        if self.attempts >= self.max_attempts {
            self.give_up(fault)
        } else {
            vec![ArbiterAction::StartListening]
        }
    }

    /// Park in `Idle` and surface the unavailable status at most once.
    fn give_up(&mut self, fault: ListenFault) -> Vec<ArbiterAction> {
        self.state = ArbiterState::Idle;
        let mut actions = vec![ArbiterAction::CancelResume, ArbiterAction::CancelBackoff];
        if !self.unavailable_surfaced {
            self.unavailable_surfaced = true;
            tracing::warn!("Voice input unavailable: {}", fault);
            actions.push(ArbiterAction::SurfaceUnavailable(fault));
        }
        actions
    }
}

impl Default for AudioArbiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_START_ATTEMPTS)
    }
}
