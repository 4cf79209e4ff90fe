//! Semantic motion status derivation
//!
//! Collapses a track's pose tags and current velocity into the single status
//! label shown to consumers. Pose-derived states always override the speed
//! classes: a sleeping person with sensor jitter must never be reported as
//! walking.

use crate::TrackerConfig;
use human_motion_common::{MotionTag, Velocity};
use serde::{Deserialize, Serialize};

/// Semantic motion classification of one track for the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MotionStatus {
    #[default]
    Stationary,
    Walking,
    Running,
    Sitting,
    Sleeping,
    HandRaise,
    /// Person in the left band of the frame (screen-position rule only)
    Left,
    /// Person in the right band of the frame (screen-position rule only)
    Right,
}

impl std::fmt::Display for MotionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MotionStatus::Stationary => write!(f, "Stationary"),
            MotionStatus::Walking => write!(f, "Walking"),
            MotionStatus::Running => write!(f, "Running"),
            MotionStatus::Sitting => write!(f, "Sitting"),
            MotionStatus::Sleeping => write!(f, "Sleeping"),
            MotionStatus::HandRaise => write!(f, "Hand Raise"),
            MotionStatus::Left => write!(f, "Left"),
            MotionStatus::Right => write!(f, "Right"),
        }
    }
}

/// Derive the status label from one frame's tags and velocity
///
/// Total and deterministic; first matching rule wins. Tag-derived states
/// take priority over displacement, in this order: sleeping, hand raise
/// (either side), left, right, sitting. Only when no tag applies is the
/// speed consulted. A `Standing` tag carries no status of its own and falls
/// through to the speed classes.
#[must_use]
pub fn classify_motion(
    tags: &[MotionTag],
    velocity: Velocity,
    config: &TrackerConfig,
) -> MotionStatus {
    if tags.contains(&MotionTag::Sleeping) {
        return MotionStatus::Sleeping;
    }
    if tags.iter().any(MotionTag::is_hand_raise) {
        return MotionStatus::HandRaise;
    }
    if tags.contains(&MotionTag::WalkingLeft) {
        return MotionStatus::Left;
    }
    if tags.contains(&MotionTag::WalkingRight) {
        return MotionStatus::Right;
    }
    if tags.contains(&MotionTag::Sitting) {
        return MotionStatus::Sitting;
    }

    let speed = velocity.speed();
    if speed < config.stationary_max_speed {
        MotionStatus::Stationary
    } else if speed < config.walking_max_speed {
        MotionStatus::Walking
    } else {
        MotionStatus::Running
    }
}
