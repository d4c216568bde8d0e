//! Gesture path: landmarks, classification, and stabilisation
//!
//! One [`HandFrame`] arrives per pose-detection tick, is classified into a
//! [`GestureLabel`] by the ordered rule table, and passes through the
//! stabilisation machine which decides when a held gesture becomes a
//! single dispatchable command.

pub mod classifier;
pub mod landmarks;
pub mod stabilizer;

pub use classifier::{classify, classify_with_rule, Classification, ClassifierConfig, GestureLabel};
pub use landmarks::{HandFrame, Keypoint, Landmark, LANDMARK_COUNT};
pub use stabilizer::{GestureStabiliser, StabiliserAction, StabiliserPhase};
