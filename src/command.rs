//! Command vocabulary shared with the host application
//!
//! Commands are the single boundary between this engine and the action
//! layer: the host never sees raw gestures or transcripts, only values of
//! [`Command`] tagged with their [`CommandSource`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// A discrete application command.
///
/// Every variant has a canonical string form (see [`fmt::Display`]) which
/// the dispatcher uses as the duplicate-suppression key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Advance to the next cooking step
    Next,
    /// Return to the previous cooking step
    Back,
    /// Show the ingredients view
    Ingredients,
    /// Open the timer view without a duration
    Timer,
    /// Create a timer for the given number of minutes
    TimerFor(u32),
    /// A bare duration in minutes ("5 min"), interpreted by the host
    Minutes(u32),
    /// Show the steps view
    ShowSteps,
    /// Pause the running timer
    Pause,
    /// Start the timer
    Start,
    /// Restart the timer from its full duration
    Restart,
    /// Check every ingredient
    CheckAll,
    /// Uncheck every ingredient
    UncheckAll,
    /// Unrecognised transcript passed through verbatim (e.g. an
    /// ingredient name the host may search for)
    FreeText(String),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Next => write!(f, "next"),
            Command::Back => write!(f, "back"),
            Command::Ingredients => write!(f, "ingredients"),
            Command::Timer => write!(f, "timer"),
            Command::TimerFor(n) => write!(f, "timer:{}", n),
            Command::Minutes(n) => write!(f, "{} min", n),
            Command::ShowSteps => write!(f, "show steps"),
            Command::Pause => write!(f, "pause"),
            Command::Start => write!(f, "start"),
            Command::Restart => write!(f, "restart"),
            Command::CheckAll => write!(f, "check all"),
            Command::UncheckAll => write!(f, "uncheck all"),
            Command::FreeText(text) => write!(f, "{}", text),
        }
    }
}

impl Command {
    /// Returns whether this command is a free-text passthrough rather
    /// than a member of the fixed alphabet.
    pub fn is_free_text(&self) -> bool {
        matches!(self, Command::FreeText(_))
    }
}

/// Which input modality produced a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandSource {
    /// Hand-landmark gesture path
    Gesture,
    /// Speech transcript path
    Voice,
}

impl CommandSource {
    /// String representation for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandSource::Gesture => "gesture",
            CommandSource::Voice => "voice",
        }
    }
}

/// The view the host application is currently showing.
///
/// Owned by the host and passed to the engine via `set_context`; it
/// changes what several gestures mean (see the dispatcher).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ViewContext {
    /// The step-by-step cooking view
    #[default]
    Steps,
    /// The ingredients checklist view
    Ingredients,
    /// The timer view
    Timer,
}
