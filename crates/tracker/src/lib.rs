//! Multi-object tracking registry with motion classification
//!
//! This module assigns persistent identities to per-frame person detections
//! and derives a semantic motion status for each. Detections are matched to
//! live tracks by centroid distance; unmatched tracks age out after a
//! configurable number of missed frames, and unmatched detections become new
//! tracks. Track ids are monotonically increasing and never reused.
//!
//! # Features
//! - Persistent track identities across frames
//! - Greedy nearest-neighbor assignment with a hard distance gate
//! - Occlusion tolerance via a per-track disappearance counter
//! - Bounded centroid trail and per-frame velocity for every track
//! - Pose-tag driven status labels (Sleeping, Hand Raise, Sitting, ...)
//!
//! # Example
//! ```
//! use human_motion_common::{BoundingBox, Detection, Keypoint};
//! use human_motion_tracker::{TrackRegistry, TrackerConfig};
//!
//! let mut registry = TrackRegistry::new(TrackerConfig::default());
//!
//! let detection = Detection::new(
//!     BoundingBox::new(90.0, 80.0, 110.0, 120.0),
//!     0.9,
//!     vec![Keypoint::new(0.0, 0.0, 0.0); 17],
//! );
//! let tracks = registry.update(vec![detection]);
//!
//! assert_eq!(tracks.len(), 1);
//! assert_eq!(registry.identities_seen(), 1);
//! ```

pub mod assignment;
pub mod classifier;

pub use assignment::{resolve_assignments, Assignment};
pub use classifier::{classify_motion, MotionStatus};

use human_motion_common::{BoundingBox, Detection, Point, Velocity};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use thiserror::Error;
use tracing::{debug, info};

/// Tracking errors
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Deregistration of an id the registry does not hold. This indicates a
    /// caller bug or a registry invariant breach, not a recoverable
    /// condition.
    #[error("Unknown track id: {0}")]
    UnknownTrack(u64),
}

/// Tracking configuration
///
/// All tunables of the track lifecycle and the status speed classes.
/// Distances and speeds are in pixels and pixels per frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Frames a track survives without a match before removal (default: 30)
    pub max_disappeared: u32,
    /// Maximum centroid distance for a detection to match a track; anything
    /// farther always becomes a new track (default: 50.0)
    pub max_distance: f32,
    /// Number of past centroids kept per track (default: 30)
    pub trail_length: usize,
    /// Speeds below this classify as Stationary (default: 2.0)
    pub stationary_max_speed: f32,
    /// Speeds below this classify as Walking, above as Running
    /// (default: 10.0)
    pub walking_max_speed: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_disappeared: 30,
            max_distance: 50.0,
            trail_length: 30,
            stationary_max_speed: 2.0,
            walking_max_speed: 10.0,
        }
    }
}

/// One live track, owned exclusively by the registry
#[derive(Debug, Clone)]
struct Track {
    centroid: Point,
    bbox: BoundingBox,
    disappeared_frames: u32,
    trail: VecDeque<Point>,
    velocity: Velocity,
    status: MotionStatus,
    last_detection: Option<Detection>,
}

impl Track {
    fn new(centroid: Point, bbox: BoundingBox, trail_length: usize) -> Self {
        let mut track = Self {
            centroid,
            bbox,
            disappeared_frames: 0,
            trail: VecDeque::with_capacity(trail_length),
            velocity: Velocity::default(),
            status: MotionStatus::default(),
            last_detection: None,
        };
        track.record_position(centroid, trail_length);
        track
    }

    /// Append to the trail, evicting the oldest entries beyond the capacity
    fn record_position(&mut self, centroid: Point, trail_length: usize) {
        self.trail.push_back(centroid);
        while self.trail.len() > trail_length {
            self.trail.pop_front();
        }
    }

    fn to_snapshot(&self, id: u64) -> TrackSnapshot {
        TrackSnapshot {
            id,
            centroid: self.centroid,
            bbox: self.bbox,
            velocity: self.velocity,
            status: self.status,
            disappeared_frames: self.disappeared_frames,
            trail: self.trail.iter().copied().collect(),
            last_detection: self.last_detection.clone(),
        }
    }
}

/// Owned copy of one track's state, safe to hand to consumers
///
/// Snapshots share no storage with the registry: a later `update` never
/// mutates a snapshot a caller already holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSnapshot {
    pub id: u64,
    pub centroid: Point,
    pub bbox: BoundingBox,
    pub velocity: Velocity,
    pub status: MotionStatus,
    /// Consecutive frames this track has gone unmatched
    pub disappeared_frames: u32,
    /// Most recent centroids, oldest first
    pub trail: Vec<Point>,
    /// Most recent matched detection, absent until first attached
    pub last_detection: Option<Detection>,
}

/// Registry of live tracks, the single owner of all per-track state
///
/// One `update` call fully processes one frame. The registry is
/// single-threaded and holds no locks; callers must serialize frames.
pub struct TrackRegistry {
    config: TrackerConfig,
    tracks: BTreeMap<u64, Track>,
    next_id: u64,
}

impl TrackRegistry {
    /// Create a new track registry
    #[must_use]
    pub fn new(config: TrackerConfig) -> Self {
        info!("Creating track registry with config: {:?}", config);
        Self {
            config,
            tracks: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Register a new track at the given position, returning its id
    ///
    /// The new track starts with zero velocity, a trail holding only the
    /// birth centroid, and Stationary status. Ids are never reused.
    pub fn register(&mut self, centroid: Point, bbox: BoundingBox) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.tracks
            .insert(id, Track::new(centroid, bbox, self.config.trail_length));
        debug!("Registered track {} at ({}, {})", id, centroid.x, centroid.y);
        id
    }

    /// Remove a track and all its state
    pub fn deregister(&mut self, id: u64) -> Result<(), TrackerError> {
        match self.tracks.remove(&id) {
            Some(_) => {
                debug!("Deregistered track {}", id);
                Ok(())
            }
            None => Err(TrackerError::UnknownTrack(id)),
        }
    }

    /// Process one frame of tagged detections
    ///
    /// Matched tracks are moved to their detection's centroid with velocity,
    /// trail, and status updated; unmatched tracks age by one frame and are
    /// removed once they exceed the disappearance limit; unmatched
    /// detections are registered as new tracks. All transitions are computed
    /// from the assignment before any track is mutated, so a frame is
    /// applied wholly or not at all.
    pub fn update(&mut self, detections: Vec<Detection>) -> BTreeMap<u64, TrackSnapshot> {
        debug!(
            "Updating registry: {} live tracks, {} detections",
            self.tracks.len(),
            detections.len()
        );

        if detections.is_empty() {
            let ids: Vec<u64> = self.tracks.keys().copied().collect();
            self.age_tracks(&ids);
            return self.snapshot();
        }

        if self.tracks.is_empty() {
            for detection in detections {
                self.register_detection(detection);
            }
            return self.snapshot();
        }

        let existing: Vec<(u64, Point)> = self
            .tracks
            .iter()
            .map(|(id, track)| (*id, track.centroid))
            .collect();
        let centroids: Vec<Point> = detections.iter().map(Detection::centroid).collect();
        let assignment = resolve_assignments(&existing, &centroids, self.config.max_distance);

        debug!(
            "Assignment: {} matched, {} unmatched tracks, {} new detections",
            assignment.matches.len(),
            assignment.unmatched_tracks.len(),
            assignment.unmatched_detections.len()
        );

        // Detections move out of their slots as matches and registrations
        // consume them
        let mut slots: Vec<Option<Detection>> = detections.into_iter().map(Some).collect();

        for (id, index) in &assignment.matches {
            if let Some(detection) = slots[*index].take() {
                self.apply_match(*id, detection);
            }
        }

        self.age_tracks(&assignment.unmatched_tracks);

        for index in assignment.unmatched_detections {
            if let Some(detection) = slots[index].take() {
                self.register_detection(detection);
            }
        }

        self.snapshot()
    }

    /// Owned snapshot of one track, if live
    #[must_use]
    pub fn get(&self, id: u64) -> Option<TrackSnapshot> {
        self.tracks.get(&id).map(|track| track.to_snapshot(id))
    }

    /// Owned snapshot of every live track, keyed by id
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<u64, TrackSnapshot> {
        self.tracks
            .iter()
            .map(|(id, track)| (*id, track.to_snapshot(*id)))
            .collect()
    }

    /// Number of live tracks
    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// True when no tracks are live
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Distinct identities ever registered, including removed tracks
    ///
    /// Monotonic; equals the next id to be assigned.
    #[must_use]
    pub fn identities_seen(&self) -> u64 {
        self.next_id
    }

    /// Register a new track carrying its originating detection
    fn register_detection(&mut self, detection: Detection) -> u64 {
        let id = self.register(detection.centroid(), detection.bbox);
        if let Some(track) = self.tracks.get_mut(&id) {
            track.last_detection = Some(detection);
        }
        id
    }

    /// Move a matched track onto its new detection
    fn apply_match(&mut self, id: u64, detection: Detection) {
        if let Some(track) = self.tracks.get_mut(&id) {
            let new_centroid = detection.centroid();
            track.velocity = Velocity::between(track.centroid, new_centroid);
            track.centroid = new_centroid;
            track.bbox = detection.bbox;
            track.disappeared_frames = 0;
            track.record_position(new_centroid, self.config.trail_length);
            track.status = classify_motion(&detection.motion_tags, track.velocity, &self.config);
            track.last_detection = Some(detection);
        }
    }

    /// Age the given tracks by one frame, removing any past the limit
    fn age_tracks(&mut self, ids: &[u64]) {
        for id in ids {
            let expired = match self.tracks.get_mut(id) {
                Some(track) => {
                    track.disappeared_frames += 1;
                    track.disappeared_frames > self.config.max_disappeared
                }
                None => false,
            };
            if expired {
                debug!("Track {} expired, removing", id);
                self.tracks.remove(id);
            }
        }
    }
}
