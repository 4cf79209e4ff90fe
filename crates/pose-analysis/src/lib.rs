//! Pose signal extraction from COCO keypoints
//!
//! This module derives discrete motion tags (hand raise, sleeping, sitting,
//! standing) from a single detection's 17 keypoints using geometric threshold
//! rules. No ML model is required; the detector already supplies keypoint
//! positions and per-keypoint visibility confidences.
//!
//! # Rules
//! - **Hand raise** (per side): wrist clearly above the shoulder
//! - **Sleeping**: shoulder and hip at nearly the same height (body horizontal)
//! - **Sitting vs standing**: vertical torso extent below/above a threshold
//! - **Left/right screen position**: shoulder midpoint in the outer bands of
//!   the frame (off by default, kept as an extension point)
//!
//! All rules are gated on keypoint confidence: a joint at or below the
//! configured floor never influences the output, so occluded or off-frame
//! joints cannot produce false positives. Image coordinates are used
//! throughout (y grows downward, smaller y is higher).
//!
//! # Example
//! ```
//! use human_motion_common::Keypoint;
//! use human_motion_pose_analysis::{PoseAnalyzer, PoseAnalysisConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let analyzer = PoseAnalyzer::new(PoseAnalysisConfig::default());
//!
//! // Keypoints below the confidence floor never produce tags
//! let keypoints = vec![Keypoint::new(0.0, 0.0, 0.0); 17];
//! let tags = analyzer.analyze(&keypoints, 1920.0)?;
//! assert!(tags.is_empty());
//! # Ok(())
//! # }
//! ```

use human_motion_common::{Keypoint, KeypointName, MotionTag, KEYPOINT_COUNT};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Pose analysis errors
#[derive(Debug, Error)]
pub enum PoseAnalysisError {
    #[error("Expected {expected} keypoints, got {actual}")]
    InvalidKeypointCount { expected: usize, actual: usize },
}

/// Configuration for pose signal extraction
///
/// Every threshold of the extraction rules is a field here; there are no
/// hidden constants. Distances are in pixels of the source frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseAnalysisConfig {
    /// Minimum keypoint confidence for a joint to participate in any rule
    /// (exclusive, default: 0.4)
    pub confidence_floor: f32,
    /// How far above the shoulder the wrist must be to count as a raised
    /// hand, in pixels (default: 20.0)
    pub hand_raise_margin: f32,
    /// Maximum vertical shoulder-to-hip offset for the body to count as
    /// horizontal, in pixels (default: 10.0)
    pub lying_slope_tolerance: f32,
    /// Vertical torso extent below which a visible person counts as
    /// sitting rather than standing, in pixels (default: 60.0)
    pub sitting_height_threshold: f32,
    /// Emit left/right screen-position tags from the shoulder midpoint
    /// (default: false)
    pub screen_position_tags: bool,
    /// Fraction of the frame width left of which the person is "left"
    /// (default: 0.45)
    pub screen_left_fraction: f32,
    /// Fraction of the frame width right of which the person is "right"
    /// (default: 0.55)
    pub screen_right_fraction: f32,
}

impl Default for PoseAnalysisConfig {
    fn default() -> Self {
        Self {
            confidence_floor: 0.4,
            hand_raise_margin: 20.0,
            lying_slope_tolerance: 10.0,
            sitting_height_threshold: 60.0,
            screen_position_tags: false,
            screen_left_fraction: 0.45,
            screen_right_fraction: 0.55,
        }
    }
}

impl PoseAnalysisConfig {
    /// Default configuration with the left/right screen-position rule enabled
    #[must_use]
    pub fn with_screen_position_tags() -> Self {
        Self {
            screen_position_tags: true,
            ..Self::default()
        }
    }
}

/// Derives motion tags from one detection's keypoints
///
/// Pure and deterministic: identical input always yields identical tags, in
/// rule order, each tag at most once.
pub struct PoseAnalyzer {
    config: PoseAnalysisConfig,
}

impl PoseAnalyzer {
    /// Create a new pose analyzer
    #[must_use]
    pub fn new(config: PoseAnalysisConfig) -> Self {
        Self { config }
    }

    /// Extract motion tags from a detection's 17 COCO keypoints
    ///
    /// `frame_width` is only consulted by the screen-position rule. Fails
    /// only on a malformed keypoint sequence.
    pub fn analyze(
        &self,
        keypoints: &[Keypoint],
        frame_width: f32,
    ) -> Result<Vec<MotionTag>, PoseAnalysisError> {
        if keypoints.len() != KEYPOINT_COUNT {
            return Err(PoseAnalysisError::InvalidKeypointCount {
                expected: KEYPOINT_COUNT,
                actual: keypoints.len(),
            });
        }

        let mut tags = Vec::new();
        self.detect_hand_raises(keypoints, &mut tags);
        self.detect_lying_down(keypoints, &mut tags);
        self.detect_screen_position(keypoints, frame_width, &mut tags);
        self.detect_posture(keypoints, &mut tags);

        debug!("Pose analysis produced {} tags", tags.len());

        Ok(tags)
    }

    /// Joint participates in rules only above the confidence floor
    fn visible(&self, keypoint: &Keypoint) -> bool {
        keypoint.confidence > self.config.confidence_floor
    }

    /// Wrist above the shoulder by more than the margin, per side
    fn detect_hand_raises(&self, keypoints: &[Keypoint], tags: &mut Vec<MotionTag>) {
        let sides = [
            (KeypointName::LeftWrist, KeypointName::LeftShoulder, MotionTag::HandRaiseLeft),
            (KeypointName::RightWrist, KeypointName::RightShoulder, MotionTag::HandRaiseRight),
        ];

        for (wrist_name, shoulder_name, tag) in sides {
            let wrist = &keypoints[wrist_name as usize];
            let shoulder = &keypoints[shoulder_name as usize];
            if self.visible(wrist)
                && self.visible(shoulder)
                && wrist.y < shoulder.y - self.config.hand_raise_margin
            {
                tags.push(tag);
            }
        }
    }

    /// Shoulder and hip at nearly the same height means the body is
    /// horizontal (uses the left side)
    fn detect_lying_down(&self, keypoints: &[Keypoint], tags: &mut Vec<MotionTag>) {
        let shoulder = &keypoints[KeypointName::LeftShoulder as usize];
        let hip = &keypoints[KeypointName::LeftHip as usize];

        if self.visible(shoulder) && self.visible(hip) {
            let slope = (shoulder.y - hip.y).abs();
            if slope < self.config.lying_slope_tolerance {
                tags.push(MotionTag::Sleeping);
            }
        }
    }

    /// Shoulder midpoint in the outer frame bands, gated behind
    /// `screen_position_tags`
    fn detect_screen_position(
        &self,
        keypoints: &[Keypoint],
        frame_width: f32,
        tags: &mut Vec<MotionTag>,
    ) {
        if !self.config.screen_position_tags {
            return;
        }

        let left = &keypoints[KeypointName::LeftShoulder as usize];
        let right = &keypoints[KeypointName::RightShoulder as usize];
        if self.visible(left) && self.visible(right) {
            let mid_x = (left.x + right.x) / 2.0;
            if mid_x < frame_width * self.config.screen_left_fraction {
                tags.push(MotionTag::WalkingLeft);
            } else if mid_x > frame_width * self.config.screen_right_fraction {
                tags.push(MotionTag::WalkingRight);
            }
        }
    }

    /// Exactly one of sitting/standing whenever hip and shoulder are both
    /// visible (uses the left side)
    fn detect_posture(&self, keypoints: &[Keypoint], tags: &mut Vec<MotionTag>) {
        let shoulder = &keypoints[KeypointName::LeftShoulder as usize];
        let hip = &keypoints[KeypointName::LeftHip as usize];

        if self.visible(shoulder) && self.visible(hip) {
            let torso_height = (shoulder.y - hip.y).abs();
            if torso_height < self.config.sitting_height_threshold {
                tags.push(MotionTag::Sitting);
            } else {
                tags.push(MotionTag::Standing);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// All joints hidden (zero confidence) at the origin
    fn hidden_keypoints() -> Vec<Keypoint> {
        vec![Keypoint::new(0.0, 0.0, 0.0); KEYPOINT_COUNT]
    }

    fn set(keypoints: &mut [Keypoint], name: KeypointName, x: f32, y: f32, confidence: f32) {
        keypoints[name as usize] = Keypoint::new(x, y, confidence);
    }

    /// A confidently-visible upright torso: shoulders at y=100, hips at y=200
    fn standing_keypoints() -> Vec<Keypoint> {
        let mut kps = hidden_keypoints();
        set(&mut kps, KeypointName::LeftShoulder, 100.0, 100.0, 0.9);
        set(&mut kps, KeypointName::RightShoulder, 140.0, 100.0, 0.9);
        set(&mut kps, KeypointName::LeftHip, 105.0, 200.0, 0.9);
        set(&mut kps, KeypointName::RightHip, 135.0, 200.0, 0.9);
        kps
    }

    #[test]
    fn test_default_config() {
        let config = PoseAnalysisConfig::default();
        assert_eq!(config.confidence_floor, 0.4);
        assert_eq!(config.hand_raise_margin, 20.0);
        assert_eq!(config.lying_slope_tolerance, 10.0);
        assert_eq!(config.sitting_height_threshold, 60.0);
        assert!(!config.screen_position_tags);
    }

    #[test]
    fn test_wrong_keypoint_count() {
        let analyzer = PoseAnalyzer::new(PoseAnalysisConfig::default());
        let result = analyzer.analyze(&[Keypoint::new(0.0, 0.0, 0.9); 5], 640.0);
        match result {
            Err(PoseAnalysisError::InvalidKeypointCount { expected, actual }) => {
                assert_eq!(expected, KEYPOINT_COUNT);
                assert_eq!(actual, 5);
            }
            other => panic!("expected keypoint count error, got {other:?}"),
        }
    }

    #[test]
    fn test_hidden_keypoints_produce_no_tags() {
        let analyzer = PoseAnalyzer::new(PoseAnalysisConfig::default());
        let tags = analyzer.analyze(&hidden_keypoints(), 640.0).unwrap();
        assert!(tags.is_empty());
    }

    #[test]
    fn test_hand_raise_left() {
        let analyzer = PoseAnalyzer::new(PoseAnalysisConfig::default());
        let mut kps = standing_keypoints();
        // Wrist 30px above the shoulder, margin is 20
        set(&mut kps, KeypointName::LeftWrist, 90.0, 70.0, 0.9);

        let tags = analyzer.analyze(&kps, 640.0).unwrap();
        assert!(tags.contains(&MotionTag::HandRaiseLeft));
        assert!(!tags.contains(&MotionTag::HandRaiseRight));
    }

    #[test]
    fn test_hand_raise_both_sides() {
        let analyzer = PoseAnalyzer::new(PoseAnalysisConfig::default());
        let mut kps = standing_keypoints();
        set(&mut kps, KeypointName::LeftWrist, 90.0, 60.0, 0.9);
        set(&mut kps, KeypointName::RightWrist, 150.0, 60.0, 0.9);

        let tags = analyzer.analyze(&kps, 640.0).unwrap();
        assert!(tags.contains(&MotionTag::HandRaiseLeft));
        assert!(tags.contains(&MotionTag::HandRaiseRight));
    }

    #[test]
    fn test_hand_raise_requires_margin() {
        let analyzer = PoseAnalyzer::new(PoseAnalysisConfig::default());
        let mut kps = standing_keypoints();
        // Exactly at shoulder_y - margin: strict inequality, must not fire
        set(&mut kps, KeypointName::LeftWrist, 90.0, 80.0, 0.9);

        let tags = analyzer.analyze(&kps, 640.0).unwrap();
        assert!(!tags.contains(&MotionTag::HandRaiseLeft));
    }

    #[test]
    fn test_hand_raise_blocked_by_low_confidence() {
        let analyzer = PoseAnalyzer::new(PoseAnalysisConfig::default());
        let mut kps = standing_keypoints();
        // Well above the shoulder but occluded
        set(&mut kps, KeypointName::LeftWrist, 90.0, 10.0, 0.2);

        let tags = analyzer.analyze(&kps, 640.0).unwrap();
        assert!(!tags.contains(&MotionTag::HandRaiseLeft));
    }

    #[test]
    fn test_confidence_exactly_at_floor_does_not_fire() {
        let analyzer = PoseAnalyzer::new(PoseAnalysisConfig::default());
        let mut kps = standing_keypoints();
        set(&mut kps, KeypointName::LeftWrist, 90.0, 10.0, 0.4);

        let tags = analyzer.analyze(&kps, 640.0).unwrap();
        assert!(!tags.contains(&MotionTag::HandRaiseLeft));
    }

    #[test]
    fn test_lying_down() {
        let analyzer = PoseAnalyzer::new(PoseAnalysisConfig::default());
        let mut kps = hidden_keypoints();
        // Shoulder and hip at nearly the same height
        set(&mut kps, KeypointName::LeftShoulder, 100.0, 150.0, 0.9);
        set(&mut kps, KeypointName::LeftHip, 200.0, 155.0, 0.9);

        let tags = analyzer.analyze(&kps, 640.0).unwrap();
        assert!(tags.contains(&MotionTag::Sleeping));
        // A horizontal torso is also shorter than the sitting threshold
        assert!(tags.contains(&MotionTag::Sitting));
    }

    #[test]
    fn test_upright_torso_is_not_lying_down() {
        let analyzer = PoseAnalyzer::new(PoseAnalysisConfig::default());
        let tags = analyzer.analyze(&standing_keypoints(), 640.0).unwrap();
        assert!(!tags.contains(&MotionTag::Sleeping));
    }

    #[test]
    fn test_standing() {
        let analyzer = PoseAnalyzer::new(PoseAnalysisConfig::default());
        let tags = analyzer.analyze(&standing_keypoints(), 640.0).unwrap();
        assert!(tags.contains(&MotionTag::Standing));
        assert!(!tags.contains(&MotionTag::Sitting));
    }

    #[test]
    fn test_sitting() {
        let analyzer = PoseAnalyzer::new(PoseAnalysisConfig::default());
        let mut kps = standing_keypoints();
        // Compressed torso: 40px < 60px threshold
        set(&mut kps, KeypointName::LeftHip, 105.0, 140.0, 0.9);

        let tags = analyzer.analyze(&kps, 640.0).unwrap();
        assert!(tags.contains(&MotionTag::Sitting));
        assert!(!tags.contains(&MotionTag::Standing));
    }

    #[test]
    fn test_posture_requires_visible_hip() {
        let analyzer = PoseAnalyzer::new(PoseAnalysisConfig::default());
        let mut kps = standing_keypoints();
        set(&mut kps, KeypointName::LeftHip, 105.0, 200.0, 0.1);

        let tags = analyzer.analyze(&kps, 640.0).unwrap();
        assert!(!tags.contains(&MotionTag::Sitting));
        assert!(!tags.contains(&MotionTag::Standing));
    }

    #[test]
    fn test_screen_position_disabled_by_default() {
        let analyzer = PoseAnalyzer::new(PoseAnalysisConfig::default());
        // Shoulder midpoint at x=120 in a 640-wide frame, well left of center
        let tags = analyzer.analyze(&standing_keypoints(), 640.0).unwrap();
        assert!(!tags.contains(&MotionTag::WalkingLeft));
        assert!(!tags.contains(&MotionTag::WalkingRight));
    }

    #[test]
    fn test_screen_position_left() {
        let analyzer = PoseAnalyzer::new(PoseAnalysisConfig::with_screen_position_tags());
        // Midpoint x=120 < 640 * 0.45 = 288
        let tags = analyzer.analyze(&standing_keypoints(), 640.0).unwrap();
        assert!(tags.contains(&MotionTag::WalkingLeft));
        assert!(!tags.contains(&MotionTag::WalkingRight));
    }

    #[test]
    fn test_screen_position_right() {
        let analyzer = PoseAnalyzer::new(PoseAnalysisConfig::with_screen_position_tags());
        let mut kps = standing_keypoints();
        set(&mut kps, KeypointName::LeftShoulder, 500.0, 100.0, 0.9);
        set(&mut kps, KeypointName::RightShoulder, 540.0, 100.0, 0.9);
        // Midpoint x=520 > 640 * 0.55 = 352
        let tags = analyzer.analyze(&kps, 640.0).unwrap();
        assert!(tags.contains(&MotionTag::WalkingRight));
        assert!(!tags.contains(&MotionTag::WalkingLeft));
    }

    #[test]
    fn test_screen_position_center_is_neither() {
        let analyzer = PoseAnalyzer::new(PoseAnalysisConfig::with_screen_position_tags());
        let mut kps = standing_keypoints();
        set(&mut kps, KeypointName::LeftShoulder, 300.0, 100.0, 0.9);
        set(&mut kps, KeypointName::RightShoulder, 340.0, 100.0, 0.9);

        let tags = analyzer.analyze(&kps, 640.0).unwrap();
        assert!(!tags.contains(&MotionTag::WalkingLeft));
        assert!(!tags.contains(&MotionTag::WalkingRight));
    }

    #[test]
    fn test_multiple_tags_coexist() {
        let analyzer = PoseAnalyzer::new(PoseAnalysisConfig::default());
        let mut kps = standing_keypoints();
        set(&mut kps, KeypointName::LeftWrist, 90.0, 60.0, 0.9);

        let tags = analyzer.analyze(&kps, 640.0).unwrap();
        assert_eq!(tags, vec![MotionTag::HandRaiseLeft, MotionTag::Standing]);
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let analyzer = PoseAnalyzer::new(PoseAnalysisConfig::default());
        let kps = standing_keypoints();
        let first = analyzer.analyze(&kps, 640.0).unwrap();
        let second = analyzer.analyze(&kps, 640.0).unwrap();
        assert_eq!(first, second);
    }
}
