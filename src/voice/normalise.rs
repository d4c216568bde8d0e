//! Transcript command normalisation
//!
//! Turns a raw lowercase transcript into a canonical [`Command`]. Natural
//! phrases overlap ("set timer for 5 minutes" contains both a timer
//! keyword and a number), so the rules run in a fixed priority order and
//! the first match wins. Unrecognised transcripts pass through unchanged
//! as free text for the host to interpret (e.g. an ingredient name).
//!
//! Keyword hits are word-bounded so that, for example, "restart" cannot
//! satisfy the earlier start rule.

use regex::Regex;
use std::sync::LazyLock;

use crate::command::Command;

/// Timer durations below this are never accepted (minutes)
const TIMER_MINUTES_MIN: u32 = 1;

/// Timer durations above this are never accepted (minutes)
const TIMER_MINUTES_MAX: u32 = 120;

/// Maximum word count for the bare-number rule
const BARE_NUMBER_MAX_WORDS: usize = 2;

/// Next-step phrases
static NEXT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(next|continue|forward)\b").unwrap());

/// Back / previous-step phrases
static BACK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(back|previous)\b").unwrap());

/// Pause keyword
static PAUSE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bpause\b").unwrap());

/// Start keyword (word-bounded: does not match inside "restart")
static START_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(start|resume)\b").unwrap());

/// Restart phrases
static RESTART_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(restart|reset)\b").unwrap());

/// Check-all phrases
static CHECK_ALL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bcheck (all|everything)\b").unwrap());

/// Uncheck-all phrases
static UNCHECK_ALL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\buncheck (all|everything)\b").unwrap());

/// Ingredients phrases
static INGREDIENTS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bingredients?\b").unwrap());

/// Timer keyword
static TIMER_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\btimers?\b").unwrap());

/// Number followed by a minutes unit ("5 minutes", "5 min")
static MINUTES_UNIT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,3})\s*(minutes?|mins?)\b").unwrap());

/// Any standalone number
static NUMBER_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{1,3})\b").unwrap());

/// Steps phrases
static STEPS_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bsteps?\b").unwrap());

/// Extract the first number in the accepted timer range.
///
/// Digits only; number words never match, and out-of-range numbers are
/// treated as if no number were present.
fn extract_minutes(text: &str) -> Option<u32> {
    NUMBER_PATTERN
        .captures_iter(text)
        .filter_map(|caps| caps[1].parse::<u32>().ok())
        .find(|n| (TIMER_MINUTES_MIN..=TIMER_MINUTES_MAX).contains(n))
}

/// Normalise a raw transcript into a command.
///
/// Pure and deterministic; case and surrounding whitespace are ignored.
pub fn normalise(transcript: &str) -> Command {
    let text = transcript.trim().to_lowercase();

    if NEXT_PATTERN.is_match(&text) {
        return Command::Next;
    }
    if BACK_PATTERN.is_match(&text) {
        return Command::Back;
    }
    if PAUSE_PATTERN.is_match(&text) {
        return Command::Pause;
    }
    // "start the timer" is a timer request, not a start command.
    if START_PATTERN.is_match(&text) && !TIMER_PATTERN.is_match(&text) {
        return Command::Start;
    }
    if RESTART_PATTERN.is_match(&text) {
        return Command::Restart;
    }
    if CHECK_ALL_PATTERN.is_match(&text) {
        return Command::CheckAll;
    }
    if UNCHECK_ALL_PATTERN.is_match(&text) {
        return Command::UncheckAll;
    }
    if INGREDIENTS_PATTERN.is_match(&text) {
        return Command::Ingredients;
    }
    // The timer rule must run before the bare-number rules so that
    // "set timer for 5 minutes" becomes timer:5 rather than "5 min".
    if TIMER_PATTERN.is_match(&text) {
        return match extract_minutes(&text) {
            Some(minutes) => Command::TimerFor(minutes),
            None => Command::Timer,
        };
    }
    if let Some(caps) = MINUTES_UNIT_PATTERN.captures(&text) {
        if let Some(minutes) = caps[1]
            .parse::<u32>()
            .ok()
            .filter(|n| (TIMER_MINUTES_MIN..=TIMER_MINUTES_MAX).contains(n))
        {
            return Command::Minutes(minutes);
        }
    }
    if text.split_whitespace().count() <= BARE_NUMBER_MAX_WORDS {
        if let Some(minutes) = extract_minutes(&text) {
            return Command::Minutes(minutes);
        }
    }
    if STEPS_PATTERN.is_match(&text) {
        return Command::ShowSteps;
    }

    Command::FreeText(text)
}
