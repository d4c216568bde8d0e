//! The serialised event-processing core
//!
//! Two independent producers feed the engine: the pose-detection tick
//! (~30 Hz) and the speech-recognition result callback. Both are funnelled
//! through one bounded channel into a single thread, so classification,
//! stabilisation, normalisation, arbitration and dispatch never run
//! concurrently with themselves or each other. Blocking service calls
//! (camera and microphone lifecycle) run on short-lived bridge threads and
//! report their outcomes back as events on the same channel.

pub mod event;
pub mod ports;
pub mod timers;

pub use event::EngineEvent;
pub use ports::{CapturePort, CommandSink, EnginePorts, ListenPort, ModalityStatus, StatusSink};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use std::thread::JoinHandle;
use std::time::Instant;

use crate::command::{Command, CommandSource, ViewContext};
use crate::config::EngineConfig;
use crate::dispatch::{map_gesture, CommandDispatcher};
use crate::error::{EngineError, ListenFault};
use crate::gesture::classifier::classify_with_rule;
use crate::gesture::landmarks::HandFrame;
use crate::gesture::stabilizer::{GestureStabiliser, StabiliserAction};
use crate::voice::arbiter::{ArbiterAction, ArbiterEvent, AudioArbiter};
use crate::voice::normalise::normalise;
use self::timers::{TimerKind, TimerQueue};

/// Capacity of the engine's event queue
const EVENT_QUEUE_CAPACITY: usize = 64;

/// Cloneable sender half of the engine: the inbound interface.
///
/// All methods enqueue an event and return immediately. With multi-hand
/// detection results the host passes only the first hand.
#[derive(Clone)]
pub struct EngineHandle {
    sender: Sender<EngineEvent>,
}

impl EngineHandle {
    fn send(&self, event: EngineEvent) -> Result<(), EngineError> {
        self.sender
            .send(event)
            .map_err(|_| EngineError::NotRunning)
    }

    /// Deliver one pose-detection tick; `None` when no hand is present.
    ///
    /// Frames are droppable: if the queue is full the frame is discarded
    /// rather than blocking the detection callback, since the next tick
    /// arrives within a frame interval anyway.
    pub fn on_hand_frame(&self, frame: Option<HandFrame>) -> Result<(), EngineError> {
        match self.sender.try_send(EngineEvent::HandFrame(frame)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                tracing::trace!("Dropping hand frame: event queue full");
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(EngineError::NotRunning),
        }
    }

    /// Deliver one recognised utterance.
    pub fn on_transcript(&self, text: impl Into<String>) -> Result<(), EngineError> {
        self.send(EngineEvent::Transcript(text.into()))
    }

    /// Speech synthesis started playing.
    pub fn on_synthesis_start(&self) -> Result<(), EngineError> {
        self.send(EngineEvent::SynthesisStarted)
    }

    /// Speech synthesis finished playing.
    pub fn on_synthesis_end(&self) -> Result<(), EngineError> {
        self.send(EngineEvent::SynthesisEnded)
    }

    /// The host switched views.
    pub fn set_context(&self, context: ViewContext) -> Result<(), EngineError> {
        self.send(EngineEvent::ContextChanged(context))
    }

    /// Toggle voice control.
    pub fn set_voice_enabled(&self, enabled: bool) -> Result<(), EngineError> {
        self.send(EngineEvent::VoiceEnabled(enabled))
    }

    /// Toggle gesture control.
    pub fn set_gesture_enabled(&self, enabled: bool) -> Result<(), EngineError> {
        self.send(EngineEvent::GestureEnabled(enabled))
    }

    /// The speech input stream ended on its own (not via an explicit
    /// stop). Called by the host's speech service adapter.
    pub fn on_listening_ended(&self) -> Result<(), EngineError> {
        self.send(EngineEvent::ListenEnded)
    }

    /// The speech input stream reported a fault asynchronously.
    pub fn on_listening_fault(&self, fault: ListenFault) -> Result<(), EngineError> {
        self.send(EngineEvent::ListenFaulted(fault))
    }
}

/// The running engine: owns the processing thread.
pub struct Engine {
    handle: EngineHandle,
    thread: Option<JoinHandle<()>>,
}

impl Engine {
    /// Spawn the engine thread with the given configuration and ports.
    pub fn spawn(config: EngineConfig, ports: EnginePorts) -> Self {
        let (sender, receiver) = bounded(EVENT_QUEUE_CAPACITY);
        let handle = EngineHandle { sender };

        let core = EngineCore::new(config, ports, handle.clone());
        let thread = std::thread::Builder::new()
            .name("souschef-engine".to_string())
            .spawn(move || core.run(receiver))
            .expect("failed to spawn engine thread");

        Self {
            handle,
            thread: Some(thread),
        }
    }

    /// A cloneable handle for delivering events.
    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Stop the engine and wait for the thread to finish.
    pub fn shutdown(mut self) -> Result<(), EngineError> {
        let _ = self.handle.send(EngineEvent::Shutdown);
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| EngineError::ThreadPanicked),
            None => Ok(()),
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.handle.send(EngineEvent::Shutdown);
            let _ = thread.join();
        }
    }
}

/// State owned by the engine thread.
struct EngineCore {
    config: EngineConfig,
    ports: EnginePorts,
    handle: EngineHandle,
    stabiliser: GestureStabiliser,
    arbiter: AudioArbiter,
    dispatcher: CommandDispatcher,
    timers: TimerQueue,
    context: ViewContext,
    gesture_enabled: bool,
    /// Whether the capture pipeline is up; frames are ignored until it is
    gesture_available: bool,
    /// Whether the current gesture outage has already been surfaced
    gesture_fault_surfaced: bool,
}

impl EngineCore {
    fn new(config: EngineConfig, ports: EnginePorts, handle: EngineHandle) -> Self {
        Self {
            stabiliser: GestureStabiliser::new(config.gesture.min_hold_frames),
            arbiter: AudioArbiter::new(config.voice.max_start_attempts),
            dispatcher: CommandDispatcher::new(config.dispatch.suppression_window()),
            timers: TimerQueue::new(),
            context: ViewContext::default(),
            gesture_enabled: false,
            gesture_available: false,
            gesture_fault_surfaced: false,
            config,
            ports,
            handle,
        }
    }

    fn run(mut self, receiver: Receiver<EngineEvent>) {
        tracing::info!("Interpretation engine started");
        self.bootstrap();

        loop {
            let event = if let Some(deadline) = self.timers.next_deadline() {
                let now = Instant::now();
                if deadline <= now {
                    self.fire_timers(now);
                    continue;
                }
                match receiver.recv_timeout(deadline - now) {
                    Ok(event) => event,
                    Err(RecvTimeoutError::Timeout) => {
                        self.fire_timers(Instant::now());
                        continue;
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            } else {
                match receiver.recv() {
                    Ok(event) => event,
                    Err(_) => break,
                }
            };

            if matches!(event, EngineEvent::Shutdown) {
                break;
            }
            self.handle_event(event);
        }

        self.stop_services();
        tracing::info!("Interpretation engine stopped");
    }

    /// Apply the configured initial enablement.
    fn bootstrap(&mut self) {
        if self.config.gesture.enabled {
            self.handle_event(EngineEvent::GestureEnabled(true));
        }
        if self.config.voice.enabled {
            self.handle_event(EngineEvent::VoiceEnabled(true));
        }
    }

    fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::HandFrame(frame) => self.on_hand_frame(frame),
            EngineEvent::Transcript(text) => self.on_transcript(text),
            EngineEvent::SynthesisStarted => {
                let actions = self.arbiter.process_event(ArbiterEvent::SynthesisStarted);
                self.apply_arbiter_actions(actions);
            }
            EngineEvent::SynthesisEnded => {
                let actions = self.arbiter.process_event(ArbiterEvent::SynthesisEnded);
                self.apply_arbiter_actions(actions);
            }
            EngineEvent::ContextChanged(context) => {
                tracing::debug!("View context changed to {:?}", context);
                self.context = context;
            }
            EngineEvent::VoiceEnabled(enabled) => {
                let actions = self
                    .arbiter
                    .process_event(ArbiterEvent::VoiceEnabled(enabled));
                self.apply_arbiter_actions(actions);
            }
            EngineEvent::GestureEnabled(enabled) => self.on_gesture_enabled(enabled),
            EngineEvent::ListenStarted => {
                let actions = self.arbiter.process_event(ArbiterEvent::ListenStarted);
                self.apply_arbiter_actions(actions);
            }
            EngineEvent::ListenEnded => {
                let actions = self.arbiter.process_event(ArbiterEvent::ListenEnded);
                self.apply_arbiter_actions(actions);
            }
            EngineEvent::ListenFaulted(fault) => {
                let actions = self.arbiter.process_event(ArbiterEvent::ListenFault(fault));
                self.apply_arbiter_actions(actions);
            }
            EngineEvent::CaptureStarted => {
                if self.gesture_enabled {
                    tracing::info!("Gesture capture started");
                    self.gesture_available = true;
                }
            }
            EngineEvent::CaptureFaulted(fault) => self.on_capture_fault(fault),
            EngineEvent::Shutdown => {}
        }
    }

    fn on_hand_frame(&mut self, frame: Option<HandFrame>) {
        if !self.gesture_enabled || !self.gesture_available {
            return;
        }

        let actions = match frame {
            Some(frame) => {
                let result = classify_with_rule(&frame, &self.config.gesture.classifier);
                tracing::trace!(
                    "Classified frame as {} via rule {}",
                    result.label.as_str(),
                    result.rule
                );
                self.stabiliser.on_label(result.label)
            }
            None => self.stabiliser.on_hand_absent(),
        };
        self.apply_stabiliser_actions(actions);
    }

    fn on_transcript(&mut self, text: String) {
        if !self.arbiter.is_enabled() {
            return;
        }
        // Input is cut before output starts, so anything recognised while
        // synthesis is playing is echo.
        if self.arbiter.synthesis_active() {
            tracing::debug!("Discarding transcript during synthesis: {:?}", text);
            return;
        }

        let command = normalise(&text);
        self.dispatch(command, CommandSource::Voice);
    }

    fn on_gesture_enabled(&mut self, enabled: bool) {
        if self.gesture_enabled == enabled {
            return;
        }
        self.gesture_enabled = enabled;

        if enabled {
            tracing::info!("Gesture control enabled");
            self.gesture_fault_surfaced = false;
            self.start_capture();
        } else {
            tracing::info!("Gesture control disabled");
            self.gesture_available = false;
            self.stabiliser.reset();
            self.timers.cancel(TimerKind::GestureCooldown);
            self.timers.cancel(TimerKind::GestureAbsence);
            let capture = self.ports.capture.clone();
            self.spawn_bridge("capture-stop", move || capture.stop_capture());
        }
    }

    fn on_capture_fault(&mut self, fault: crate::error::CaptureFault) {
        if !self.gesture_enabled {
            return;
        }
        // Fatal to the gesture path only; voice is untouched.
        self.gesture_available = false;
        self.stabiliser.reset();
        self.timers.cancel(TimerKind::GestureCooldown);
        self.timers.cancel(TimerKind::GestureAbsence);

        if !self.gesture_fault_surfaced {
            self.gesture_fault_surfaced = true;
            tracing::warn!("Gesture input unavailable: {}", fault);
            self.ports.status.on_status(ModalityStatus::gesture(&fault));
        }
    }

    fn fire_timers(&mut self, now: Instant) {
        for kind in self.timers.fire_due(now) {
            match kind {
                TimerKind::GestureCooldown => self.stabiliser.on_cooldown_expired(),
                TimerKind::GestureAbsence => self.stabiliser.on_absence_expired(),
                TimerKind::VoiceResume => {
                    let actions = self.arbiter.process_event(ArbiterEvent::ResumeElapsed);
                    self.apply_arbiter_actions(actions);
                }
                TimerKind::VoiceBackoff => {
                    let actions = self.arbiter.process_event(ArbiterEvent::BackoffElapsed);
                    self.apply_arbiter_actions(actions);
                }
            }
        }
    }

    fn apply_stabiliser_actions(&mut self, actions: Vec<StabiliserAction>) {
        for action in actions {
            match action {
                StabiliserAction::Dispatch(label) => match map_gesture(label, self.context) {
                    Some(command) => self.dispatch(command, CommandSource::Gesture),
                    None => tracing::debug!(
                        "Gesture {} has no meaning on the {:?} view",
                        label.as_str(),
                        self.context
                    ),
                },
                StabiliserAction::StartCooldown => {
                    self.timers.schedule(
                        TimerKind::GestureCooldown,
                        Instant::now() + self.config.gesture.cooldown(),
                    );
                }
                StabiliserAction::StartAbsenceTimer => {
                    self.timers.schedule(
                        TimerKind::GestureAbsence,
                        Instant::now() + self.config.gesture.absence_reset(),
                    );
                }
                StabiliserAction::CancelAbsenceTimer => {
                    self.timers.cancel(TimerKind::GestureAbsence);
                }
            }
        }
    }

    fn apply_arbiter_actions(&mut self, actions: Vec<ArbiterAction>) {
        for action in actions {
            match action {
                ArbiterAction::StartListening => self.start_listening(),
                ArbiterAction::StopListening => {
                    let listen = self.ports.listen.clone();
                    self.spawn_bridge("listen-stop", move || listen.stop_listening());
                }
                ArbiterAction::ScheduleResume => {
                    self.timers.schedule(
                        TimerKind::VoiceResume,
                        Instant::now() + self.config.voice.resume_settle(),
                    );
                }
                ArbiterAction::ScheduleBackoff => {
                    self.timers.schedule(
                        TimerKind::VoiceBackoff,
                        Instant::now() + self.config.voice.retry_backoff(),
                    );
                }
                ArbiterAction::CancelResume => self.timers.cancel(TimerKind::VoiceResume),
                ArbiterAction::CancelBackoff => self.timers.cancel(TimerKind::VoiceBackoff),
                ArbiterAction::SurfaceUnavailable(fault) => {
                    self.ports.status.on_status(ModalityStatus::voice(&fault));
                }
            }
        }
    }

    fn dispatch(&mut self, command: Command, source: CommandSource) {
        if let Some(command) = self.dispatcher.accept(command, source, Instant::now()) {
            tracing::info!("Dispatching {} command: {}", source.as_str(), command);
            self.ports.commands.dispatch_command(command, source);
        }
    }

    /// Start the microphone off the serialised path; the outcome comes
    /// back as a `ListenStarted` or `ListenFaulted` event.
    fn start_listening(&self) {
        let listen = self.ports.listen.clone();
        let handle = self.handle.clone();
        self.spawn_bridge("listen-start", move || {
            let event = match listen.start_listening() {
                Ok(()) => EngineEvent::ListenStarted,
                Err(fault) => EngineEvent::ListenFaulted(fault),
            };
            if handle.send(event).is_err() {
                tracing::debug!("Engine stopped before listen start completed");
            }
        });
    }

    /// Start the camera off the serialised path; the outcome comes back
    /// as a `CaptureStarted` or `CaptureFaulted` event.
    fn start_capture(&self) {
        let capture = self.ports.capture.clone();
        let handle = self.handle.clone();
        self.spawn_bridge("capture-start", move || {
            let event = match capture.start_capture() {
                Ok(()) => EngineEvent::CaptureStarted,
                Err(fault) => EngineEvent::CaptureFaulted(fault),
            };
            if handle.send(event).is_err() {
                tracing::debug!("Engine stopped before capture start completed");
            }
        });
    }

    fn spawn_bridge<F>(&self, name: &str, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Err(e) = std::thread::Builder::new()
            .name(format!("souschef-{}", name))
            .spawn(f)
        {
            tracing::warn!("Failed to spawn {} bridge thread: {}", name, e);
        }
    }

    /// Final blocking stop of both services at shutdown.
    fn stop_services(&self) {
        self.ports.listen.stop_listening();
        self.ports.capture.stop_capture();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CaptureFault;
    use std::sync::Arc;

    struct NullPorts;

    impl CommandSink for NullPorts {
        fn dispatch_command(&self, _command: Command, _source: CommandSource) {}
    }
    impl StatusSink for NullPorts {
        fn on_status(&self, _status: ModalityStatus) {}
    }
    impl CapturePort for NullPorts {
        fn start_capture(&self) -> Result<(), CaptureFault> {
            Ok(())
        }
        fn stop_capture(&self) {}
    }
    impl ListenPort for NullPorts {
        fn start_listening(&self) -> Result<(), ListenFault> {
            Ok(())
        }
        fn stop_listening(&self) {}
    }

    fn null_ports() -> EnginePorts {
        let ports = Arc::new(NullPorts);
        EnginePorts {
            commands: ports.clone(),
            status: ports.clone(),
            capture: ports.clone(),
            listen: ports,
        }
    }

    #[test]
    fn test_spawn_and_shutdown() {
        let engine = Engine::spawn(EngineConfig::default(), null_ports());
        let handle = engine.handle();
        handle.on_transcript("next step").unwrap();
        engine.shutdown().unwrap();
    }

    #[test]
    fn test_handle_reports_not_running_after_shutdown() {
        let engine = Engine::spawn(EngineConfig::default(), null_ports());
        let handle = engine.handle();
        engine.shutdown().unwrap();

        assert!(matches!(
            handle.on_transcript("next"),
            Err(EngineError::NotRunning)
        ));
    }

    #[test]
    fn test_dropped_frames_are_not_errors() {
        let engine = Engine::spawn(EngineConfig::default(), null_ports());
        let handle = engine.handle();
        // Flood beyond the queue capacity; excess frames drop silently.
        for _ in 0..(EVENT_QUEUE_CAPACITY * 4) {
            handle.on_hand_frame(None).unwrap();
        }
        engine.shutdown().unwrap();
    }
}
