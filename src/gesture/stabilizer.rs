//! Gesture stabilisation state machine
//!
//! Consumes one classifier label per detection tick and decides when a
//! gesture becomes a dispatchable command. Dispatch is immediate (the
//! default hold threshold is one frame — the duplicate suppression below
//! and the cooldown here already prevent repeats), at most once per
//! cooldown window, with a full reset after the hand has been absent for
//! the grace period.
//!
//! The machine owns no clocks: it emits declarative actions and the engine
//! schedules and cancels the actual timers.

use serde::{Deserialize, Serialize};

use super::classifier::GestureLabel;

/// Phase of the stabilisation machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StabiliserPhase {
    /// No gesture is being tracked
    #[default]
    Idle,
    /// A gesture is tracked but has not been dispatched
    Holding,
    /// A gesture was dispatched; the cooldown timer is running
    Cooldown,
}

impl StabiliserPhase {
    /// Returns a human-readable description of the phase
    pub fn description(&self) -> &'static str {
        match self {
            StabiliserPhase::Idle => "No gesture tracked",
            StabiliserPhase::Holding => "Tracking a gesture",
            StabiliserPhase::Cooldown => "Cooling down after dispatch",
        }
    }
}

/// Actions the engine must carry out after a stabiliser step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StabiliserAction {
    /// Forward this gesture to the dispatcher
    Dispatch(GestureLabel),
    /// Start the cooldown timer
    StartCooldown,
    /// Start the hand-absence grace timer
    StartAbsenceTimer,
    /// Cancel a pending hand-absence grace timer
    CancelAbsenceTimer,
}

/// Per-session stabilisation state.
///
/// Created when gesture detection starts and reset whenever detection
/// stops or the hand disappears for longer than the grace period.
pub struct GestureStabiliser {
    phase: StabiliserPhase,
    /// Most recently observed label
    last_label: Option<GestureLabel>,
    /// Consecutive ticks the current label has been observed
    hold_count: u32,
    /// Label most recently dispatched; cleared when the cooldown expires
    last_dispatched: Option<GestureLabel>,
    /// Frames a label must be held before it may dispatch
    min_hold_frames: u32,
    /// Whether the absence grace timer is running
    absence_pending: bool,
}

impl GestureStabiliser {
    /// Creates a stabiliser with the given hold threshold in frames.
    pub fn new(min_hold_frames: u32) -> Self {
        Self {
            phase: StabiliserPhase::Idle,
            last_label: None,
            hold_count: 0,
            last_dispatched: None,
            min_hold_frames: min_hold_frames.max(1),
            absence_pending: false,
        }
    }

    /// Returns the current phase
    pub fn phase(&self) -> StabiliserPhase {
        self.phase
    }

    /// Returns how many consecutive ticks the current label has been held
    pub fn hold_count(&self) -> u32 {
        self.hold_count
    }

    /// Returns the label currently being tracked
    pub fn last_label(&self) -> Option<GestureLabel> {
        self.last_label
    }

    /// Process one classifier tick for a frame that contained a hand.
    pub fn on_label(&mut self, label: GestureLabel) -> Vec<StabiliserAction> {
        let mut actions = Vec::new();

        // A visible hand cancels any pending absence reset.
        if self.absence_pending {
            self.absence_pending = false;
            actions.push(StabiliserAction::CancelAbsenceTimer);
        }

        // An unclassified frame leaves the tracked gesture untouched.
        if !label.is_gesture() {
            return actions;
        }

        if self.last_label == Some(label) {
            self.hold_count += 1;
        } else {
            self.last_label = Some(label);
            self.hold_count = 1;
        }

        // Labels keep being tracked during cooldown, but nothing dispatches.
        if self.phase == StabiliserPhase::Cooldown {
            return actions;
        }

        if self.hold_count >= self.min_hold_frames && self.last_dispatched != Some(label) {
            self.last_dispatched = Some(label);
            self.phase = StabiliserPhase::Cooldown;
            tracing::info!(
                "Gesture stabilised after {} frame(s): {}",
                self.hold_count,
                label.as_str()
            );
            actions.push(StabiliserAction::Dispatch(label));
            actions.push(StabiliserAction::StartCooldown);
        } else {
            self.phase = StabiliserPhase::Holding;
        }

        actions
    }

    /// Process one detection tick in which no hand was present.
    pub fn on_hand_absent(&mut self) -> Vec<StabiliserAction> {
        let mut actions = Vec::new();

        if self.last_label.is_some() || self.last_dispatched.is_some() {
            self.hold_count = 0;
            if !self.absence_pending {
                self.absence_pending = true;
                actions.push(StabiliserAction::StartAbsenceTimer);
            }
        }

        actions
    }

    /// The cooldown timer elapsed: the dispatched gesture may be reissued.
    pub fn on_cooldown_expired(&mut self) {
        self.last_dispatched = None;
        self.phase = if self.last_label.is_some() {
            StabiliserPhase::Holding
        } else {
            StabiliserPhase::Idle
        };
        tracing::debug!("Gesture cooldown expired");
    }

    /// The absence grace timer elapsed: a reappearing gesture is new.
    pub fn on_absence_expired(&mut self) {
        self.absence_pending = false;
        self.last_label = None;
        self.last_dispatched = None;
        self.hold_count = 0;
        if self.phase != StabiliserPhase::Cooldown {
            self.phase = StabiliserPhase::Idle;
        }
        tracing::debug!("Gesture session reset after hand absence");
    }

    /// Reset the machine to its initial state.
    ///
    /// The engine cancels any scheduled timers alongside this call.
    pub fn reset(&mut self) {
        self.phase = StabiliserPhase::Idle;
        self.last_label = None;
        self.last_dispatched = None;
        self.hold_count = 0;
        self.absence_pending = false;
    }
}

impl Default for GestureStabiliser {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatched(actions: &[StabiliserAction]) -> Option<GestureLabel> {
        actions.iter().find_map(|a| match a {
            StabiliserAction::Dispatch(label) => Some(*label),
            _ => None,
        })
    }

    #[test]
    fn test_first_frame_dispatches() {
        let mut stab = GestureStabiliser::default();
        let actions = stab.on_label(GestureLabel::OpenPalm);

        assert_eq!(dispatched(&actions), Some(GestureLabel::OpenPalm));
        assert!(actions.contains(&StabiliserAction::StartCooldown));
        assert_eq!(stab.phase(), StabiliserPhase::Cooldown);
    }

    #[test]
    fn test_repeat_frames_dispatch_once() {
        let mut stab = GestureStabiliser::default();
        stab.on_label(GestureLabel::Fist);

        // The classifier reports the same gesture on every tick; only the
        // first tick may dispatch.
        for _ in 0..50 {
            let actions = stab.on_label(GestureLabel::Fist);
            assert_eq!(dispatched(&actions), None);
        }
    }

    #[test]
    fn test_same_gesture_reissues_after_cooldown() {
        let mut stab = GestureStabiliser::default();
        stab.on_label(GestureLabel::Fist);
        stab.on_label(GestureLabel::Fist);

        stab.on_cooldown_expired();
        let actions = stab.on_label(GestureLabel::Fist);
        assert_eq!(dispatched(&actions), Some(GestureLabel::Fist));
    }

    #[test]
    fn test_new_gesture_tracked_but_not_dispatched_during_cooldown() {
        let mut stab = GestureStabiliser::default();
        stab.on_label(GestureLabel::Fist);

        let actions = stab.on_label(GestureLabel::OpenPalm);
        assert_eq!(dispatched(&actions), None);
        assert_eq!(stab.last_label(), Some(GestureLabel::OpenPalm));

        // Once the cooldown ends, the tracked gesture dispatches on the
        // next tick.
        stab.on_cooldown_expired();
        let actions = stab.on_label(GestureLabel::OpenPalm);
        assert_eq!(dispatched(&actions), Some(GestureLabel::OpenPalm));
    }

    #[test]
    fn test_hold_threshold_applies() {
        let mut stab = GestureStabiliser::new(3);

        assert_eq!(dispatched(&stab.on_label(GestureLabel::Rock)), None);
        assert_eq!(dispatched(&stab.on_label(GestureLabel::Rock)), None);
        assert_eq!(
            dispatched(&stab.on_label(GestureLabel::Rock)),
            Some(GestureLabel::Rock)
        );
    }

    #[test]
    fn test_label_change_resets_hold_count() {
        let mut stab = GestureStabiliser::new(3);

        stab.on_label(GestureLabel::Rock);
        stab.on_label(GestureLabel::Rock);
        // A different label restarts the count.
        stab.on_label(GestureLabel::Ok);
        assert_eq!(stab.hold_count(), 1);
        assert_eq!(dispatched(&stab.on_label(GestureLabel::Ok)), None);
        assert_eq!(
            dispatched(&stab.on_label(GestureLabel::Ok)),
            Some(GestureLabel::Ok)
        );
    }

    #[test]
    fn test_unclassified_frame_changes_nothing() {
        let mut stab = GestureStabiliser::default();
        stab.on_label(GestureLabel::Fist);

        let actions = stab.on_label(GestureLabel::None);
        assert!(actions.is_empty());
        assert_eq!(stab.last_label(), Some(GestureLabel::Fist));
    }

    #[test]
    fn test_absence_starts_grace_timer_once() {
        let mut stab = GestureStabiliser::default();
        stab.on_label(GestureLabel::Fist);

        let actions = stab.on_hand_absent();
        assert!(actions.contains(&StabiliserAction::StartAbsenceTimer));
        assert_eq!(stab.hold_count(), 0);

        // Subsequent absent ticks do not reschedule.
        assert!(stab.on_hand_absent().is_empty());
    }

    #[test]
    fn test_reappearing_hand_cancels_grace_timer() {
        let mut stab = GestureStabiliser::default();
        stab.on_label(GestureLabel::Fist);
        stab.on_hand_absent();

        let actions = stab.on_label(GestureLabel::Fist);
        assert!(actions.contains(&StabiliserAction::CancelAbsenceTimer));
    }

    #[test]
    fn test_absence_expiry_treats_gesture_as_new() {
        let mut stab = GestureStabiliser::default();
        stab.on_label(GestureLabel::Fist);
        stab.on_cooldown_expired();
        stab.on_label(GestureLabel::Fist);
        stab.on_hand_absent();
        stab.on_absence_expired();
        stab.on_cooldown_expired();

        // The held gesture disappeared and came back: dispatch again.
        let actions = stab.on_label(GestureLabel::Fist);
        assert_eq!(dispatched(&actions), Some(GestureLabel::Fist));
    }

    #[test]
    fn test_absence_with_no_tracked_gesture_is_noop() {
        let mut stab = GestureStabiliser::default();
        assert!(stab.on_hand_absent().is_empty());
    }

    #[test]
    fn test_reset() {
        let mut stab = GestureStabiliser::default();
        stab.on_label(GestureLabel::OpenPalm);
        stab.reset();

        assert_eq!(stab.phase(), StabiliserPhase::Idle);
        assert_eq!(stab.last_label(), None);
        assert_eq!(stab.hold_count(), 0);
    }

    #[test]
    fn test_phase_descriptions() {
        assert_eq!(StabiliserPhase::Idle.description(), "No gesture tracked");
        assert_eq!(StabiliserPhase::Holding.description(), "Tracking a gesture");
        assert_eq!(
            StabiliserPhase::Cooldown.description(),
            "Cooling down after dispatch"
        );
    }
}
