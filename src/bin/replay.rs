//! Replay harness for the interpretation engine
//!
//! Reads JSON-lines events from stdin, drives a live engine, and prints
//! every dispatched command and status change as JSON on stdout. Useful
//! for replaying recorded detection sessions against the classifier and
//! the state machines without a camera or microphone attached.
//!
//! Event lines:
//!
//! ```text
//! {"hand_frame": {"keypoints": [{"x": 0.0, "y": 0.0}, ...]}}
//! {"hand_frame": null}
//! {"transcript": "set a timer for 12 minutes"}
//! {"synthesis": "start"}   {"synthesis": "end"}
//! {"context": "timer"}
//! {"voice_enabled": true}  {"gesture_enabled": false}
//! {"wait_ms": 1600}
//! ```

use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use souschef::command::{Command, CommandSource, ViewContext};
use souschef::config;
use souschef::engine::{
    CapturePort, CommandSink, Engine, EnginePorts, ListenPort, ModalityStatus, StatusSink,
};
use souschef::error::{CaptureFault, ListenFault};
use souschef::gesture::HandFrame;

/// One line of replay input.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ReplayEvent {
    /// A pose-detection tick (`null` for no hand)
    HandFrame(Option<HandFrame>),
    /// A recognised utterance
    Transcript(String),
    /// `"start"` or `"end"` of speech synthesis
    Synthesis(String),
    /// View context switch
    Context(ViewContext),
    /// Toggle voice control
    VoiceEnabled(bool),
    /// Toggle gesture control
    GestureEnabled(bool),
    /// Sleep before the next event, letting timers fire
    WaitMs(u64),
}

/// Prints dispatched commands and status changes as JSON lines.
struct PrintSink;

impl CommandSink for PrintSink {
    fn dispatch_command(&self, command: Command, source: CommandSource) {
        println!(
            "{{\"command\": {}, \"source\": \"{}\"}}",
            serde_json::to_string(&command.to_string()).unwrap_or_default(),
            source.as_str()
        );
    }
}

impl StatusSink for PrintSink {
    fn on_status(&self, status: ModalityStatus) {
        match serde_json::to_string(&status) {
            Ok(json) => println!("{{\"status\": {}}}", json),
            Err(e) => tracing::warn!("Failed to serialise status: {}", e),
        }
    }
}

/// Stand-in services: lifecycle calls always succeed immediately.
struct StubServices;

impl CapturePort for StubServices {
    fn start_capture(&self) -> Result<(), CaptureFault> {
        tracing::debug!("stub: start_capture");
        Ok(())
    }
    fn stop_capture(&self) {
        tracing::debug!("stub: stop_capture");
    }
}

impl ListenPort for StubServices {
    fn start_listening(&self) -> Result<(), ListenFault> {
        tracing::debug!("stub: start_listening");
        Ok(())
    }
    fn stop_listening(&self) {
        tracing::debug!("stub: stop_listening");
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let sink = Arc::new(PrintSink);
    let services = Arc::new(StubServices);
    let ports = EnginePorts {
        commands: sink.clone(),
        status: sink,
        capture: services.clone(),
        listen: services,
    };

    let engine = Engine::spawn(config::get_config(), ports);
    let handle = engine.handle();

    let stdin = std::io::stdin();
    for (line_no, line) in stdin.lock().lines().enumerate() {
        let line = line.context("failed to read stdin")?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let event: ReplayEvent = serde_json::from_str(trimmed)
            .with_context(|| format!("bad replay event on line {}", line_no + 1))?;

        match event {
            ReplayEvent::HandFrame(frame) => handle.on_hand_frame(frame)?,
            ReplayEvent::Transcript(text) => handle.on_transcript(text)?,
            ReplayEvent::Synthesis(edge) => match edge.as_str() {
                "start" => handle.on_synthesis_start()?,
                "end" => handle.on_synthesis_end()?,
                other => bail!("bad synthesis edge {:?} on line {}", other, line_no + 1),
            },
            ReplayEvent::Context(context) => handle.set_context(context)?,
            ReplayEvent::VoiceEnabled(enabled) => handle.set_voice_enabled(enabled)?,
            ReplayEvent::GestureEnabled(enabled) => handle.set_gesture_enabled(enabled)?,
            ReplayEvent::WaitMs(ms) => std::thread::sleep(Duration::from_millis(ms)),
        }
    }

    // Let in-flight events and imminent timers drain before stopping.
    std::thread::sleep(Duration::from_millis(100));
    engine.shutdown()?;
    Ok(())
}
