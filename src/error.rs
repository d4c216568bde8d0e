//! Fault taxonomy for the interpretation engine
//!
//! Input-channel faults are split into retryable and non-retryable classes
//! (plus the "no speech" timeout, which is neither); capture faults are
//! fatal to the gesture path only. No fault in one modality may disable
//! the other.

/// Faults reported by the speech-input service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListenFault {
    /// Microphone permission was denied by the user or platform
    #[error("microphone permission denied")]
    PermissionDenied,

    /// Recognition was explicitly aborted
    #[error("speech recognition aborted")]
    Aborted,

    /// The speech service is disabled or unsupported
    #[error("speech service disabled")]
    ServiceDisabled,

    /// Transient network fault while streaming audio
    #[error("network fault: {0}")]
    Network(String),

    /// Transient audio capture fault
    #[error("audio capture fault: {0}")]
    AudioCapture(String),

    /// No speech was detected before the service timed out.
    /// A normal timeout, not an error; never consumes retry budget.
    #[error("no speech detected")]
    NoSpeech,
}

impl ListenFault {
    /// Whether the coordinator may silently retry after this fault.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ListenFault::Network(_) | ListenFault::AudioCapture(_))
    }

    /// Whether this fault is the ordinary no-speech timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ListenFault::NoSpeech)
    }
}

/// Faults reported by the camera / pose-detection service.
///
/// Fatal to the gesture path only; the voice path is unaffected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureFault {
    /// No camera device is available
    #[error("no camera available")]
    NoCamera,

    /// Camera permission was denied
    #[error("camera permission denied")]
    PermissionDenied,

    /// The capture pipeline failed to start or died
    #[error("capture failed: {0}")]
    Failed(String),
}

/// Errors raised by the engine runtime itself.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine thread has stopped and the event queue is closed
    #[error("engine is not running")]
    NotRunning,

    /// The engine thread panicked during shutdown
    #[error("engine thread panicked")]
    ThreadPanicked,
}
