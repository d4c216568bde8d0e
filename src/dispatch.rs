//! Command dispatch with duplicate suppression
//!
//! The dispatcher sits between the two producer paths (stabilised gestures
//! and normalised transcripts) and the host's action layer. Each path has
//! its own suppression window keyed by the literal command string: a
//! gesture and a voice command with the same name may both fire, but two
//! identical commands from the same path within the window may not.
//!
//! Gesture-to-command mapping is context-sensitive and otherwise
//! stateless; the active [`ViewContext`] is owned by the host and passed
//! in on every call.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::command::{Command, CommandSource, ViewContext};
use crate::gesture::classifier::GestureLabel;

/// Default duplicate-suppression window (ms)
pub const DEFAULT_SUPPRESSION_WINDOW_MS: u64 = 2_000;

/// Timer presets selected by finger count on the timer view (minutes)
const FINGER_TIMER_PRESETS: [u32; 4] = [5, 10, 15, 30];

/// Map a stabilised gesture to a command under the active view context.
///
/// Returns `None` for gestures that mean nothing in the given context
/// (e.g. finger counts outside the timer view).
pub fn map_gesture(label: GestureLabel, context: ViewContext) -> Option<Command> {
    match (label, context) {
        // Navigation gestures work everywhere.
        (GestureLabel::PointingUp, _) => Some(Command::Timer),
        (GestureLabel::Rock, _) => Some(Command::Ingredients),
        (GestureLabel::OpenPalm, _) => Some(Command::ShowSteps),

        // On the timer view the hand controls the timer itself.
        (GestureLabel::ThumbsUp, ViewContext::Timer) => Some(Command::Start),
        (GestureLabel::ThumbsDown, ViewContext::Timer) => Some(Command::Pause),
        (GestureLabel::Fist, ViewContext::Timer) => Some(Command::Pause),
        (GestureLabel::OneFinger, ViewContext::Timer) => {
            Some(Command::TimerFor(FINGER_TIMER_PRESETS[0]))
        }
        (GestureLabel::TwoFingers, ViewContext::Timer) => {
            Some(Command::TimerFor(FINGER_TIMER_PRESETS[1]))
        }
        (GestureLabel::ThreeFingers, ViewContext::Timer) => {
            Some(Command::TimerFor(FINGER_TIMER_PRESETS[2]))
        }
        (GestureLabel::FourFingers, ViewContext::Timer) => {
            Some(Command::TimerFor(FINGER_TIMER_PRESETS[3]))
        }

        // Outside the timer view thumbs navigate between steps.
        (GestureLabel::ThumbsUp, _) => Some(Command::Next),
        (GestureLabel::ThumbsDown, _) => Some(Command::Back),
        (GestureLabel::Fist, ViewContext::Ingredients) => Some(Command::UncheckAll),
        (GestureLabel::Fist, ViewContext::Steps) => Some(Command::Back),
        (GestureLabel::Ok, ViewContext::Ingredients) => Some(Command::CheckAll),

        // Finger counts and the ok sign mean nothing elsewhere.
        (GestureLabel::Ok, _) => None,
        (
            GestureLabel::OneFinger
            | GestureLabel::TwoFingers
            | GestureLabel::ThreeFingers
            | GestureLabel::FourFingers,
            _,
        ) => None,
        (GestureLabel::None, _) => None,
    }
}

/// Per-path duplicate suppression over the literal command string.
pub struct CommandDispatcher {
    window: Duration,
    recent_gesture: HashMap<String, Instant>,
    recent_voice: HashMap<String, Instant>,
}

impl CommandDispatcher {
    /// Creates a dispatcher with the given suppression window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            recent_gesture: HashMap::new(),
            recent_voice: HashMap::new(),
        }
    }

    /// Admit a command from one path, or suppress it as a duplicate.
    ///
    /// The clock is passed in so callers (and tests) control time.
    pub fn accept(
        &mut self,
        command: Command,
        source: CommandSource,
        now: Instant,
    ) -> Option<Command> {
        let key = command.to_string();
        let window = self.window;
        let recent = match source {
            CommandSource::Gesture => &mut self.recent_gesture,
            CommandSource::Voice => &mut self.recent_voice,
        };

        if let Some(&last) = recent.get(&key) {
            if now.duration_since(last) < window {
                tracing::debug!(
                    "Suppressed duplicate {} command: {}",
                    source.as_str(),
                    key
                );
                return None;
            }
        }

        recent.insert(key, now);
        recent.retain(|_, &mut last| now.duration_since(last) < window);
        Some(command)
    }

    /// Drop all suppression history.
    pub fn clear(&mut self) {
        self.recent_gesture.clear();
        self.recent_voice.clear();
    }
}

impl Default for CommandDispatcher {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_SUPPRESSION_WINDOW_MS))
    }
}
