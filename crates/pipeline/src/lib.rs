//! Per-frame orchestration of pose analysis and tracking
//!
//! This module wires the pose analyzer and the track registry into one
//! frame-cycle entry point: validate the incoming detections, derive motion
//! tags per detection, feed the tagged batch to the registry, and hand the
//! resulting track snapshots back to the caller. The pipeline is an explicit
//! object constructed once with configuration; there are no process-wide
//! singletons, so tests can drive it deterministically without a camera.
//!
//! Malformed detections (wrong keypoint count, degenerate bounding box) are
//! dropped from the batch and counted; the rest of the batch still
//! processes. The pipeline is single-threaded: one `process_frame` call
//! fully processes one frame before returning.
//!
//! # Example
//! ```
//! use human_motion_common::{BoundingBox, Detection, Keypoint};
//! use human_motion_pipeline::{PipelineConfig, TrackingPipeline};
//!
//! let mut pipeline = TrackingPipeline::new(PipelineConfig::default());
//!
//! let detection = Detection::new(
//!     BoundingBox::new(90.0, 80.0, 110.0, 120.0),
//!     0.9,
//!     vec![Keypoint::new(0.0, 0.0, 0.0); 17],
//! );
//! let report = pipeline.process_frame(vec![detection], 1920.0);
//!
//! assert_eq!(report.frame_index, 0);
//! assert_eq!(report.tracks.len(), 1);
//! assert_eq!(report.dropped_detections, 0);
//! ```

use human_motion_common::Detection;
use human_motion_pose_analysis::{PoseAnalysisConfig, PoseAnalyzer};
use human_motion_tracker::{TrackRegistry, TrackSnapshot, TrackerConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML config: {0}")]
    ConfigParse(String),
}

/// Combined configuration for the whole tracking pipeline
///
/// Nests the pose-analysis and tracker tunables; fields omitted from a
/// loaded file fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub pose: PoseAnalysisConfig,
    pub tracker: TrackerConfig,
}

impl PipelineConfig {
    /// Load pipeline configuration from a YAML file
    pub fn from_yaml(yaml_path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let contents = std::fs::read_to_string(yaml_path.as_ref())?;
        let config: PipelineConfig = serde_yaml::from_str(&contents)
            .map_err(|e| PipelineError::ConfigParse(e.to_string()))?;
        Ok(config)
    }
}

/// Result of processing one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    /// 0-based index of the processed frame
    pub frame_index: u64,
    /// Snapshot of every live track after this frame
    pub tracks: BTreeMap<u64, TrackSnapshot>,
    /// Detections removed from this batch for violating the input contract
    pub dropped_detections: usize,
}

/// One-frame-at-a-time tracking pipeline
pub struct TrackingPipeline {
    analyzer: PoseAnalyzer,
    registry: TrackRegistry,
    frames_processed: u64,
}

impl TrackingPipeline {
    /// Create a new tracking pipeline
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        info!("Creating tracking pipeline");
        Self {
            analyzer: PoseAnalyzer::new(config.pose),
            registry: TrackRegistry::new(config.tracker),
            frames_processed: 0,
        }
    }

    /// Process one frame of raw detections
    ///
    /// Each detection is validated and pose-analyzed; malformed ones are
    /// dropped and counted in the report while the rest of the batch
    /// proceeds. `frame_width` is the source frame width in pixels,
    /// consulted by the screen-position pose rule.
    pub fn process_frame(&mut self, detections: Vec<Detection>, frame_width: f32) -> FrameReport {
        let frame_index = self.frames_processed;
        self.frames_processed += 1;

        let total = detections.len();
        let mut tagged = Vec::with_capacity(total);
        let mut dropped = 0usize;

        for mut detection in detections {
            if detection.validate().is_err() {
                dropped += 1;
                continue;
            }
            match self.analyzer.analyze(&detection.keypoints, frame_width) {
                Ok(tags) => {
                    detection.motion_tags = tags;
                    tagged.push(detection);
                }
                Err(_) => dropped += 1,
            }
        }

        if dropped > 0 {
            warn!(
                "Frame {}: dropped {} of {} malformed detections",
                frame_index, dropped, total
            );
        }

        let tracks = self.registry.update(tagged);

        debug!(
            "Frame {}: {} live tracks, {} detections dropped",
            frame_index,
            tracks.len(),
            dropped
        );

        FrameReport {
            frame_index,
            tracks,
            dropped_detections: dropped,
        }
    }

    /// Total frames processed so far
    #[must_use]
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Distinct identities ever tracked, including expired ones
    #[must_use]
    pub fn identities_seen(&self) -> u64 {
        self.registry.identities_seen()
    }

    /// Read access to the underlying registry
    #[must_use]
    pub fn registry(&self) -> &TrackRegistry {
        &self.registry
    }
}

impl Default for TrackingPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}
