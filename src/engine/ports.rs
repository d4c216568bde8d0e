//! Outbound ports to the host application and the external services
//!
//! The engine calls out through these traits only. Commands and status
//! changes go to the host; capture and listening lifecycle calls go to
//! the pose-detection and speech-to-text services. Lifecycle calls may
//! block, so the engine invokes them from short-lived bridge threads and
//! receives their outcomes back as events.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::command::{Command, CommandSource};
use crate::error::{CaptureFault, ListenFault};

/// A modality availability change surfaced to the host.
///
/// Surfaced at most once per outage to avoid log and UI spam; cleared by
/// an explicit re-enable of the affected modality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModalityStatus {
    /// Voice input gave up and requires explicit re-enable
    VoiceUnavailable { reason: String },
    /// The gesture path lost its camera and requires explicit re-enable
    GestureUnavailable { reason: String },
}

impl ModalityStatus {
    pub(crate) fn voice(fault: &ListenFault) -> Self {
        ModalityStatus::VoiceUnavailable {
            reason: fault.to_string(),
        }
    }

    pub(crate) fn gesture(fault: &CaptureFault) -> Self {
        ModalityStatus::GestureUnavailable {
            reason: fault.to_string(),
        }
    }
}

/// Receives each admitted command exactly once per suppression window.
pub trait CommandSink: Send + Sync {
    fn dispatch_command(&self, command: Command, source: CommandSource);
}

/// Receives modality availability changes.
pub trait StatusSink: Send + Sync {
    fn on_status(&self, status: ModalityStatus);
}

/// Camera lifecycle for the pose-detection service.
pub trait CapturePort: Send + Sync {
    /// Start camera capture. May block; runs on a bridge thread.
    fn start_capture(&self) -> Result<(), CaptureFault>;
    /// Stop camera capture.
    fn stop_capture(&self);
}

/// Microphone lifecycle for the speech-to-text service.
pub trait ListenPort: Send + Sync {
    /// Start the speech input stream. May block; runs on a bridge thread.
    fn start_listening(&self) -> Result<(), ListenFault>;
    /// Stop the speech input stream.
    fn stop_listening(&self);
}

/// The full set of host-provided ports.
#[derive(Clone)]
pub struct EnginePorts {
    pub commands: Arc<dyn CommandSink>,
    pub status: Arc<dyn StatusSink>,
    pub capture: Arc<dyn CapturePort>,
    pub listen: Arc<dyn ListenPort>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_faults() {
        let status = ModalityStatus::voice(&ListenFault::PermissionDenied);
        assert_eq!(
            status,
            ModalityStatus::VoiceUnavailable {
                reason: "microphone permission denied".to_string()
            }
        );

        let status = ModalityStatus::gesture(&CaptureFault::NoCamera);
        assert_eq!(
            status,
            ModalityStatus::GestureUnavailable {
                reason: "no camera available".to_string()
            }
        );
    }

    #[test]
    fn test_status_serialisation() {
        let status = ModalityStatus::VoiceUnavailable {
            reason: "gone".to_string(),
        };
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("voice_unavailable"));
    }
}
