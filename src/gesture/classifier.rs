//! Landmark gesture classification.
//!
//! Pure, stateless classification of one [`HandFrame`] into a
//! [`GestureLabel`]. The geometric heuristics overlap (a raised index
//! finger is both "one finger" and a pointing candidate), so the decision
//! is an explicit ordered rule table evaluated top to bottom; the order is
//! part of the contract and is covered by tests.

use serde::{Deserialize, Serialize};

use super::landmarks::{HandFrame, Keypoint};

/// A classified hand gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GestureLabel {
    OpenPalm,
    Fist,
    ThumbsUp,
    ThumbsDown,
    PointingUp,
    Rock,
    Ok,
    OneFinger,
    TwoFingers,
    ThreeFingers,
    FourFingers,
    /// No recognisable gesture in the frame
    #[default]
    None,
}

impl GestureLabel {
    /// String representation for logging and suppression keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenPalm => "open_palm",
            Self::Fist => "fist",
            Self::ThumbsUp => "thumbs_up",
            Self::ThumbsDown => "thumbs_down",
            Self::PointingUp => "pointing_up",
            Self::Rock => "rock",
            Self::Ok => "ok",
            Self::OneFinger => "one_finger",
            Self::TwoFingers => "two_fingers",
            Self::ThreeFingers => "three_fingers",
            Self::FourFingers => "four_fingers",
            Self::None => "none",
        }
    }

    /// Whether this label represents an actual gesture.
    pub fn is_gesture(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Classifier threshold configuration.
///
/// The defaults are the contract constants from the reference detector,
/// expressed in detection-space units (pixels at the original capture
/// resolution).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Minimum wrist-to-index-tip displacement for a pointing gesture
    pub point_min_distance: f32,
    /// Minimum upward rise (negative y) of the index tip over the wrist
    /// for a pointing gesture
    pub point_min_rise: f32,
    /// The vertical component must exceed this fraction of the horizontal
    /// component for a pointing gesture
    pub point_vertical_ratio: f32,
    /// Minimum drop of the thumb tip below the thumb MCP for thumbs-down
    pub thumb_down_margin: f32,
    /// Maximum thumb-tip-to-index-tip distance for the ok sign
    pub ok_pinch_distance: f32,
    /// Rescale the distance thresholds by the observed hand span
    /// (wrist to middle MCP) against `reference_hand_span`
    pub scale_by_hand_span: bool,
    /// Hand span at which the absolute thresholds are calibrated
    pub reference_hand_span: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            point_min_distance: 40.0,
            point_min_rise: 25.0,
            point_vertical_ratio: 0.6,
            thumb_down_margin: 15.0,
            ok_pinch_distance: 60.0,
            scale_by_hand_span: false,
            reference_hand_span: 80.0,
        }
    }
}

/// Distance thresholds resolved for one frame.
#[derive(Debug, Clone, Copy)]
struct Thresholds {
    point_min_distance: f32,
    point_min_rise: f32,
    point_vertical_ratio: f32,
    thumb_down_margin: f32,
    ok_pinch_distance: f32,
}

impl Thresholds {
    fn resolve(config: &ClassifierConfig, hand_span: f32) -> Self {
        let factor = if config.scale_by_hand_span
            && hand_span > 0.0
            && config.reference_hand_span > 0.0
        {
            hand_span / config.reference_hand_span
        } else {
            1.0
        };
        Self {
            point_min_distance: config.point_min_distance * factor,
            point_min_rise: config.point_min_rise * factor,
            point_vertical_ratio: config.point_vertical_ratio,
            thumb_down_margin: config.thumb_down_margin * factor,
            ok_pinch_distance: config.ok_pinch_distance * factor,
        }
    }
}

/// Per-frame finger geometry, computed once before rule evaluation.
#[derive(Debug, Clone, Copy)]
struct FrameMetrics {
    index_extended: bool,
    middle_extended: bool,
    ring_extended: bool,
    pinky_extended: bool,
    /// Thumb tip above IP above MCP
    thumb_up_extended: bool,
    /// Thumb tip below both IP and MCP
    thumb_below_joints: bool,
    /// Thumb tip drop below the thumb MCP (positive = below)
    thumb_drop: f32,
    index_truly_closed: bool,
    middle_truly_closed: bool,
    ring_truly_closed: bool,
    pinky_truly_closed: bool,
    index_wrist_dx: f32,
    index_wrist_dy: f32,
    index_wrist_distance: f32,
    thumb_index_distance: f32,
    hand_span: f32,
}

impl FrameMetrics {
    fn compute(frame: &HandFrame) -> Self {
        let wrist = frame.get(Keypoint::Wrist);
        let thumb_mcp = frame.get(Keypoint::ThumbMcp);
        let thumb_ip = frame.get(Keypoint::ThumbIp);
        let thumb_tip = frame.get(Keypoint::ThumbTip);
        let index_tip = frame.get(Keypoint::IndexTip);

        let extended = |tip: Keypoint, pip: Keypoint, mcp: Keypoint| {
            let (tip, pip, mcp) = (frame.get(tip), frame.get(pip), frame.get(mcp));
            tip.y < pip.y && pip.y < mcp.y
        };
        let truly_closed = |tip: Keypoint, pip: Keypoint, mcp: Keypoint| {
            let (tip, pip, mcp) = (frame.get(tip), frame.get(pip), frame.get(mcp));
            tip.y > pip.y && tip.y > mcp.y
        };

        Self {
            index_extended: extended(Keypoint::IndexTip, Keypoint::IndexPip, Keypoint::IndexMcp),
            middle_extended: extended(
                Keypoint::MiddleTip,
                Keypoint::MiddlePip,
                Keypoint::MiddleMcp,
            ),
            ring_extended: extended(Keypoint::RingTip, Keypoint::RingPip, Keypoint::RingMcp),
            pinky_extended: extended(Keypoint::PinkyTip, Keypoint::PinkyPip, Keypoint::PinkyMcp),
            thumb_up_extended: thumb_tip.y < thumb_ip.y && thumb_ip.y < thumb_mcp.y,
            thumb_below_joints: thumb_tip.y > thumb_ip.y && thumb_tip.y > thumb_mcp.y,
            thumb_drop: thumb_tip.y - thumb_mcp.y,
            index_truly_closed: truly_closed(
                Keypoint::IndexTip,
                Keypoint::IndexPip,
                Keypoint::IndexMcp,
            ),
            middle_truly_closed: truly_closed(
                Keypoint::MiddleTip,
                Keypoint::MiddlePip,
                Keypoint::MiddleMcp,
            ),
            ring_truly_closed: truly_closed(Keypoint::RingTip, Keypoint::RingPip, Keypoint::RingMcp),
            pinky_truly_closed: truly_closed(
                Keypoint::PinkyTip,
                Keypoint::PinkyPip,
                Keypoint::PinkyMcp,
            ),
            index_wrist_dx: index_tip.x - wrist.x,
            index_wrist_dy: index_tip.y - wrist.y,
            index_wrist_distance: wrist.distance_to(index_tip),
            thumb_index_distance: thumb_tip.distance_to(index_tip),
            hand_span: wrist.distance_to(frame.get(Keypoint::MiddleMcp)),
        }
    }

    /// Exactly the index finger is extended.
    fn only_index_extended(&self) -> bool {
        self.index_extended && !self.middle_extended && !self.ring_extended && !self.pinky_extended
    }

    /// None of the four fingers is extended.
    fn no_finger_extended(&self) -> bool {
        !self.index_extended && !self.middle_extended && !self.ring_extended && !self.pinky_extended
    }

    /// Thumb counts as closed for the fist check.
    fn thumb_closed(&self) -> bool {
        !self.thumb_up_extended || self.thumb_below_joints
    }
}

/// One entry of the classification decision table.
struct Rule {
    label: GestureLabel,
    name: &'static str,
    matches: fn(&FrameMetrics, &Thresholds) -> bool,
}

/// The decision table, in contract precedence order. First match wins.
const RULES: &[Rule] = &[
    Rule {
        label: GestureLabel::PointingUp,
        name: "pointing_up",
        matches: |m, t| {
            m.only_index_extended()
                && m.index_wrist_distance > t.point_min_distance
                && m.index_wrist_dy < -t.point_min_rise
                && m.index_wrist_dy.abs() > m.index_wrist_dx.abs() * t.point_vertical_ratio
        },
    },
    Rule {
        label: GestureLabel::OpenPalm,
        name: "open_palm",
        matches: |m, _| {
            m.index_extended
                && m.middle_extended
                && m.ring_extended
                && m.pinky_extended
                && m.thumb_up_extended
        },
    },
    Rule {
        label: GestureLabel::OneFinger,
        name: "one_finger",
        matches: |m, _| m.only_index_extended(),
    },
    Rule {
        label: GestureLabel::TwoFingers,
        name: "two_fingers",
        matches: |m, _| {
            m.index_extended && m.middle_extended && !m.ring_extended && !m.pinky_extended
        },
    },
    Rule {
        label: GestureLabel::ThreeFingers,
        name: "three_fingers",
        matches: |m, _| {
            m.index_extended && m.middle_extended && m.ring_extended && !m.pinky_extended
        },
    },
    Rule {
        label: GestureLabel::FourFingers,
        name: "four_fingers",
        matches: |m, _| {
            m.index_extended
                && m.middle_extended
                && m.ring_extended
                && m.pinky_extended
                && !m.thumb_up_extended
        },
    },
    Rule {
        label: GestureLabel::Fist,
        name: "fist",
        matches: |m, _| {
            m.no_finger_extended()
                && m.thumb_closed()
                && m.index_truly_closed
                && m.middle_truly_closed
                && m.ring_truly_closed
                && m.pinky_truly_closed
        },
    },
    Rule {
        label: GestureLabel::ThumbsUp,
        name: "thumbs_up",
        matches: |m, _| m.thumb_up_extended && m.no_finger_extended(),
    },
    Rule {
        label: GestureLabel::ThumbsDown,
        name: "thumbs_down",
        matches: |m, t| {
            m.thumb_below_joints && m.thumb_drop > t.thumb_down_margin && m.no_finger_extended()
        },
    },
    Rule {
        label: GestureLabel::Rock,
        name: "rock",
        matches: |m, _| {
            m.index_extended && !m.middle_extended && !m.ring_extended && m.pinky_extended
        },
    },
    Rule {
        label: GestureLabel::Ok,
        name: "ok",
        matches: |m, t| {
            m.thumb_index_distance < t.ok_pinch_distance
                && !m.middle_extended
                && !m.ring_extended
                && !m.pinky_extended
        },
    },
];

/// The outcome of one classification, including which rule matched.
///
/// The rule name feeds debug overlays; the label is what the rest of the
/// engine consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub label: GestureLabel,
    /// Name of the decision-table rule that matched
    pub rule: &'static str,
}

/// Classify a frame and report the winning rule.
pub fn classify_with_rule(frame: &HandFrame, config: &ClassifierConfig) -> Classification {
    if !frame.is_complete() {
        return Classification {
            label: GestureLabel::None,
            rule: "incomplete_frame",
        };
    }

    let metrics = FrameMetrics::compute(frame);
    let thresholds = Thresholds::resolve(config, metrics.hand_span);

    for rule in RULES {
        if (rule.matches)(&metrics, &thresholds) {
            return Classification {
                label: rule.label,
                rule: rule.name,
            };
        }
    }

    Classification {
        label: GestureLabel::None,
        rule: "no_match",
    }
}

/// Classify a frame into a gesture label.
///
/// Total and deterministic: every frame maps to exactly one label, and
/// frames with fewer than 21 keypoints map to `none`.
pub fn classify(frame: &HandFrame, config: &ClassifierConfig) -> GestureLabel {
    classify_with_rule(frame, config).label
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::landmarks::{Landmark, LANDMARK_COUNT};

    /// Pose of a single digit in the test hand.
    #[derive(Clone, Copy, PartialEq)]
    enum Digit {
        Extended,
        Closed,
        /// Curled but with the tip above the MCP, so the finger is neither
        /// extended nor "truly closed"
        Curled,
    }

    /// Pose of the thumb in the test hand.
    #[derive(Clone, Copy, PartialEq)]
    enum Thumb {
        Up,
        Closed,
        Down,
    }

    /// Build a synthetic hand at a fixed capture-space position.
    ///
    /// The wrist sits at (100, 200); smaller y is up. Extended fingers run
    /// tip < pip < mcp in y, closed fingers the reverse, matching the
    /// detector's coordinate conventions.
    fn make_hand(thumb: Thumb, fingers: [Digit; 4]) -> HandFrame {
        let mut points = vec![Landmark::new(0.0, 0.0); LANDMARK_COUNT];
        points[Keypoint::Wrist.index()] = Landmark::new(100.0, 200.0);

        // Thumb chain: CMC, MCP, IP, tip
        points[Keypoint::ThumbCmc.index()] = Landmark::new(75.0, 190.0);
        points[Keypoint::ThumbMcp.index()] = Landmark::new(70.0, 175.0);
        let (ip_y, tip_y) = match thumb {
            Thumb::Up => (150.0, 130.0),
            Thumb::Closed => (180.0, 188.0),
            Thumb::Down => (185.0, 195.0),
        };
        points[Keypoint::ThumbIp.index()] = Landmark::new(68.0, ip_y);
        points[Keypoint::ThumbTip.index()] = Landmark::new(66.0, tip_y);

        // Finger chains: MCP, PIP, DIP, tip
        let bases = [
            (Keypoint::IndexMcp, 85.0),
            (Keypoint::MiddleMcp, 100.0),
            (Keypoint::RingMcp, 115.0),
            (Keypoint::PinkyMcp, 130.0),
        ];
        for (i, (mcp, x)) in bases.iter().enumerate() {
            let base = mcp.index();
            let (pip_y, dip_y, tip_y) = match fingers[i] {
                Digit::Extended => (130.0, 110.0, 90.0),
                Digit::Closed => (170.0, 178.0, 185.0),
                Digit::Curled => (150.0, 148.0, 155.0),
            };
            points[base] = Landmark::new(*x, 160.0);
            points[base + 1] = Landmark::new(*x, pip_y);
            points[base + 2] = Landmark::new(*x, dip_y);
            points[base + 3] = Landmark::new(*x, tip_y);
        }

        HandFrame::new(points)
    }

    fn set(frame: &HandFrame, keypoint: Keypoint, x: f32, y: f32) -> HandFrame {
        let mut points = frame.keypoints().to_vec();
        points[keypoint.index()] = Landmark::new(x, y);
        HandFrame::new(points)
    }

    #[test]
    fn test_open_palm_all_five_extended() {
        let frame = make_hand(Thumb::Up, [Digit::Extended; 4]);
        assert_eq!(classify(&frame, &ClassifierConfig::default()), GestureLabel::OpenPalm);
    }

    #[test]
    fn test_four_fingers_thumb_closed() {
        let frame = make_hand(Thumb::Closed, [Digit::Extended; 4]);
        assert_eq!(
            classify(&frame, &ClassifierConfig::default()),
            GestureLabel::FourFingers
        );
    }

    #[test]
    fn test_two_and_three_fingers() {
        let two = make_hand(
            Thumb::Closed,
            [Digit::Extended, Digit::Extended, Digit::Closed, Digit::Closed],
        );
        assert_eq!(classify(&two, &ClassifierConfig::default()), GestureLabel::TwoFingers);

        let three = make_hand(
            Thumb::Closed,
            [Digit::Extended, Digit::Extended, Digit::Extended, Digit::Closed],
        );
        assert_eq!(
            classify(&three, &ClassifierConfig::default()),
            GestureLabel::ThreeFingers
        );
    }

    #[test]
    fn test_pointing_up_far_vertical_index() {
        // The default extended index tip is 110 units above the wrist and
        // nearly vertical, so it reads as pointing rather than a count.
        let frame = make_hand(
            Thumb::Closed,
            [Digit::Extended, Digit::Closed, Digit::Closed, Digit::Closed],
        );
        let result = classify_with_rule(&frame, &ClassifierConfig::default());
        assert_eq!(result.label, GestureLabel::PointingUp);
        assert_eq!(result.rule, "pointing_up");
    }

    #[test]
    fn test_one_finger_index_near_wrist() {
        // An index held near the body: extended, but the tip stays within
        // the pointing displacement threshold.
        let frame = make_hand(
            Thumb::Closed,
            [Digit::Extended, Digit::Closed, Digit::Closed, Digit::Closed],
        );
        let frame = set(&frame, Keypoint::IndexMcp, 95.0, 190.0);
        let frame = set(&frame, Keypoint::IndexPip, 95.0, 180.0);
        let frame = set(&frame, Keypoint::IndexTip, 95.0, 175.0);
        assert_eq!(classify(&frame, &ClassifierConfig::default()), GestureLabel::OneFinger);
    }

    #[test]
    fn test_one_finger_horizontal_index() {
        // Far from the wrist but mostly sideways: fails the vertical-ratio
        // test, so it is a count, not a point.
        let frame = make_hand(
            Thumb::Closed,
            [Digit::Extended, Digit::Closed, Digit::Closed, Digit::Closed],
        );
        let frame = set(&frame, Keypoint::IndexMcp, 85.0, 160.0);
        let frame = set(&frame, Keypoint::IndexPip, 50.0, 155.0);
        let frame = set(&frame, Keypoint::IndexTip, 20.0, 154.0);
        assert_eq!(classify(&frame, &ClassifierConfig::default()), GestureLabel::OneFinger);
    }

    #[test]
    fn test_fist_all_closed() {
        let frame = make_hand(Thumb::Closed, [Digit::Closed; 4]);
        assert_eq!(classify(&frame, &ClassifierConfig::default()), GestureLabel::Fist);
    }

    #[test]
    fn test_thumbs_up() {
        let frame = make_hand(Thumb::Up, [Digit::Closed; 4]);
        assert_eq!(classify(&frame, &ClassifierConfig::default()), GestureLabel::ThumbsUp);
    }

    #[test]
    fn test_thumbs_down_needs_margin() {
        // Fingers curled but not fully closed, so the fist rule passes on
        // the frame and the thumb-drop margin decides.
        let frame = make_hand(Thumb::Down, [Digit::Curled; 4]);
        // Tip at 195 is 20 units below the MCP at 175 — over the margin.
        assert_eq!(
            classify(&frame, &ClassifierConfig::default()),
            GestureLabel::ThumbsDown
        );
    }

    #[test]
    fn test_thumbs_down_with_tight_fist_reads_as_fist() {
        // Precedence contract: a dropped thumb over a fully closed hand is
        // still a fist, because the fist rule comes first.
        let frame = make_hand(Thumb::Down, [Digit::Closed; 4]);
        assert_eq!(classify(&frame, &ClassifierConfig::default()), GestureLabel::Fist);
    }

    #[test]
    fn test_rock_index_and_pinky() {
        let frame = make_hand(
            Thumb::Closed,
            [Digit::Extended, Digit::Closed, Digit::Closed, Digit::Extended],
        );
        assert_eq!(classify(&frame, &ClassifierConfig::default()), GestureLabel::Rock);
    }

    #[test]
    fn test_ok_pinch() {
        // Index curled into the thumb: neither extended nor truly closed,
        // thumb neither up-extended nor dropped, tips touching.
        let frame = make_hand(Thumb::Closed, [Digit::Closed; 4]);
        let frame = set(&frame, Keypoint::ThumbIp, 68.0, 178.0);
        let frame = set(&frame, Keypoint::ThumbTip, 88.0, 152.0);
        let frame = set(&frame, Keypoint::IndexPip, 85.0, 140.0);
        let frame = set(&frame, Keypoint::IndexTip, 85.0, 150.0);
        assert_eq!(classify(&frame, &ClassifierConfig::default()), GestureLabel::Ok);
    }

    #[test]
    fn test_incomplete_frame_is_none() {
        let frame = HandFrame::new(vec![Landmark::new(0.0, 0.0); 12]);
        let result = classify_with_rule(&frame, &ClassifierConfig::default());
        assert_eq!(result.label, GestureLabel::None);
        assert_eq!(result.rule, "incomplete_frame");
    }

    #[test]
    fn test_classification_is_pure() {
        let frame = make_hand(Thumb::Up, [Digit::Extended; 4]);
        let config = ClassifierConfig::default();
        assert_eq!(classify(&frame, &config), classify(&frame, &config));
    }

    #[test]
    fn test_every_frame_gets_exactly_one_label() {
        // Degenerate geometry must still classify without panicking.
        let degenerate = HandFrame::new(vec![Landmark::new(0.0, 0.0); LANDMARK_COUNT]);
        let label = classify(&degenerate, &ClassifierConfig::default());
        assert!(GestureLabel::as_str(&label).len() > 1);
    }

    #[test]
    fn test_hand_span_scaling_relaxes_pointing_distance() {
        // A small hand (half the reference span) with an index displacement
        // of ~28 units: under the absolute 40-unit threshold this is a
        // count, but with span scaling the threshold halves and it points.
        let frame = make_hand(
            Thumb::Closed,
            [Digit::Extended, Digit::Closed, Digit::Closed, Digit::Closed],
        );
        // Shrink the span: wrist to middle MCP becomes 40 units.
        let frame = set(&frame, Keypoint::MiddleMcp, 100.0, 160.0);
        let frame = set(&frame, Keypoint::IndexMcp, 95.0, 190.0);
        let frame = set(&frame, Keypoint::IndexPip, 95.0, 180.0);
        let frame = set(&frame, Keypoint::IndexTip, 97.0, 172.0);

        let absolute = ClassifierConfig::default();
        assert_eq!(classify(&frame, &absolute), GestureLabel::OneFinger);

        let scaled = ClassifierConfig {
            scale_by_hand_span: true,
            ..ClassifierConfig::default()
        };
        assert_eq!(classify(&frame, &scaled), GestureLabel::PointingUp);
    }

    #[test]
    fn test_label_strings() {
        assert_eq!(GestureLabel::OpenPalm.as_str(), "open_palm");
        assert_eq!(GestureLabel::PointingUp.as_str(), "pointing_up");
        assert_eq!(GestureLabel::FourFingers.as_str(), "four_fingers");
        assert_eq!(GestureLabel::None.as_str(), "none");
        assert!(!GestureLabel::None.is_gesture());
        assert!(GestureLabel::Fist.is_gesture());
    }
}
