//! Greedy nearest-neighbor assignment between live tracks and detections
//!
//! Matches each existing track position against the new detection centroids
//! of one frame. The algorithm is deliberately greedy rather than globally
//! optimal (no Hungarian matching): rows are processed in order of their
//! best-case distance, so the most confidently-matchable tracks claim their
//! detections first. For the small per-frame populations this tracker
//! targets (tens of people) the O(N*M) distance matrix dominates and the
//! greedy result is close enough to optimal.

use human_motion_common::Point;
use std::cmp::Ordering;

/// Outcome of matching one frame's detections against the live tracks
///
/// `matches` pairs a track id with a detection index, in acceptance order.
/// The unmatched lists preserve registry order and input order respectively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    pub matches: Vec<(u64, usize)>,
    pub unmatched_tracks: Vec<u64>,
    pub unmatched_detections: Vec<usize>,
}

/// Greedily match existing track positions to new detection positions
///
/// `max_distance` is a hard gate: a pair farther apart than this is never
/// accepted, even when both sides would otherwise remain unmatched. Each
/// track row gets exactly one attempt at its nearest detection; a row whose
/// nearest detection is already consumed stays unmatched this frame rather
/// than falling back to its second-nearest.
pub fn resolve_assignments(
    existing: &[(u64, Point)],
    detections: &[Point],
    max_distance: f32,
) -> Assignment {
    if existing.is_empty() {
        return Assignment {
            unmatched_detections: (0..detections.len()).collect(),
            ..Assignment::default()
        };
    }
    if detections.is_empty() {
        return Assignment {
            unmatched_tracks: existing.iter().map(|(id, _)| *id).collect(),
            ..Assignment::default()
        };
    }

    // Full pairwise distance matrix, tracks as rows, detections as columns
    let distances: Vec<Vec<f32>> = existing
        .iter()
        .map(|(_, position)| {
            detections
                .iter()
                .map(|detection| position.distance(detection))
                .collect()
        })
        .collect();

    // Process rows by ascending row-minimum; the stable sort keeps ties in
    // registry order so the earlier track wins an equidistant detection
    let mut row_order: Vec<usize> = (0..existing.len()).collect();
    row_order.sort_by(|&a, &b| {
        let min_a = row_minimum(&distances[a]);
        let min_b = row_minimum(&distances[b]);
        min_a.partial_cmp(&min_b).unwrap_or(Ordering::Equal)
    });

    let mut matches = Vec::with_capacity(existing.len().min(detections.len()));
    let mut row_matched = vec![false; existing.len()];
    let mut column_used = vec![false; detections.len()];

    for row in row_order {
        let (column, distance) = nearest_column(&distances[row]);
        if column_used[column] || distance > max_distance {
            continue;
        }
        matches.push((existing[row].0, column));
        row_matched[row] = true;
        column_used[column] = true;
    }

    let unmatched_tracks = existing
        .iter()
        .enumerate()
        .filter(|(row, _)| !row_matched[*row])
        .map(|(_, (id, _))| *id)
        .collect();
    let unmatched_detections = (0..detections.len())
        .filter(|column| !column_used[*column])
        .collect();

    Assignment {
        matches,
        unmatched_tracks,
        unmatched_detections,
    }
}

fn row_minimum(row: &[f32]) -> f32 {
    row.iter().copied().fold(f32::INFINITY, f32::min)
}

/// First-occurrence arg-min of a non-empty distance row
fn nearest_column(row: &[f32]) -> (usize, f32) {
    let mut best_column = 0;
    let mut best_distance = row[0];
    for (column, &distance) in row.iter().enumerate().skip(1) {
        if distance < best_distance {
            best_column = column;
            best_distance = distance;
        }
    }
    (best_column, best_distance)
}
