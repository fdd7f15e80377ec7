#![forbid(unsafe_code)]

//! Persisted gallery state.
//!
//! A [`GallerySnapshot`] captures everything needed to rebuild a
//! [`LaneTracker`](crate::lanes::LaneTracker) after a configuration change:
//! the orientation, the lane thickness, and one rectangle per lane giving
//! its occupied bounds at save time.
//!
//! Two encodings are supported:
//!
//! - serde derives, for hosts that persist structured state;
//! - a fixed-order integer word codec ([`to_words`](GallerySnapshot::to_words)
//!   / [`from_words`](GallerySnapshot::from_words)) matching the wire order
//!   `orientation ordinal, lane size, lane count, then left/top/right/bottom
//!   per lane`, for hosts that persist an opaque flat blob.
//!
//! Restoring a snapshot with no lanes or a non-positive lane size is a
//! no-op by contract; [`is_restorable`](GallerySnapshot::is_restorable)
//! encodes that check.

use crate::{Orientation, Rect};
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Current snapshot schema version.
pub const GALLERY_SCHEMA_VERSION: u16 = 1;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Decode/validation errors for persisted gallery state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// The word stream ended before the declared content.
    Truncated { expected: usize, actual: usize },
    /// The orientation ordinal was not recognized.
    BadOrientation { ordinal: i32 },
    /// The declared lane count was negative.
    NegativeLaneCount { count: i32 },
    /// The schema version is newer than this build understands.
    UnsupportedSchemaVersion { version: u16 },
    /// A lane rectangle has an inverted scroll-axis extent.
    InvertedLane { lane: usize },
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::Truncated { expected, actual } => {
                write!(f, "snapshot truncated: expected {expected} words, got {actual}")
            }
            SnapshotError::BadOrientation { ordinal } => {
                write!(f, "unknown orientation ordinal {ordinal}")
            }
            SnapshotError::NegativeLaneCount { count } => {
                write!(f, "negative lane count {count}")
            }
            SnapshotError::UnsupportedSchemaVersion { version } => {
                write!(f, "unsupported snapshot schema version {version}")
            }
            SnapshotError::InvertedLane { lane } => {
                write!(f, "lane {lane} has an inverted occupied extent")
            }
        }
    }
}

impl std::error::Error for SnapshotError {}

// ---------------------------------------------------------------------------
// GallerySnapshot
// ---------------------------------------------------------------------------

/// Serializable snapshot of lane state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GallerySnapshot {
    /// Schema version for migration detection.
    #[serde(default = "default_schema_version")]
    pub schema_version: u16,
    /// Scroll orientation at save time.
    pub orientation: Orientation,
    /// Lane thickness in pixels at save time.
    pub lane_size: i32,
    /// One rectangle per lane: fixed lane-axis bounds plus the occupied
    /// scroll-axis extent.
    pub lanes: Vec<Rect>,
}

fn default_schema_version() -> u16 {
    GALLERY_SCHEMA_VERSION
}

impl GallerySnapshot {
    /// Create a v1 snapshot.
    #[must_use]
    pub fn new(orientation: Orientation, lane_size: i32, lanes: Vec<Rect>) -> Self {
        Self {
            schema_version: GALLERY_SCHEMA_VERSION,
            orientation,
            lane_size,
            lanes,
        }
    }

    /// Whether installing this snapshot would have any effect.
    ///
    /// Lane count 0 or non-positive lane size restores nothing; a fresh
    /// tracker is built on the next layout pass instead.
    #[must_use]
    pub fn is_restorable(&self) -> bool {
        self.lane_size > 0 && !self.lanes.is_empty()
    }

    /// Structural validation beyond what decoding enforces.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.schema_version > GALLERY_SCHEMA_VERSION {
            return Err(SnapshotError::UnsupportedSchemaVersion {
                version: self.schema_version,
            });
        }
        for (lane, rect) in self.lanes.iter().enumerate() {
            let inverted = if self.orientation.is_vertical() {
                rect.top > rect.bottom
            } else {
                rect.left > rect.right
            };
            if inverted {
                return Err(SnapshotError::InvertedLane { lane });
            }
        }
        Ok(())
    }

    /// Fast content hash for change detection.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.schema_version.hash(&mut hasher);
        self.orientation.ordinal().hash(&mut hasher);
        self.lane_size.hash(&mut hasher);
        for lane in &self.lanes {
            lane.hash(&mut hasher);
        }
        hasher.finish()
    }

    // ── Word codec ──────────────────────────────────────────────────

    /// Encode as a flat word stream in the fixed wire order.
    #[must_use]
    pub fn to_words(&self) -> Vec<i32> {
        let mut words = Vec::with_capacity(3 + self.lanes.len() * 4);
        words.push(self.orientation.ordinal());
        words.push(self.lane_size);
        words.push(self.lanes.len() as i32);
        for lane in &self.lanes {
            words.extend_from_slice(&[lane.left, lane.top, lane.right, lane.bottom]);
        }
        words
    }

    /// Decode a flat word stream produced by [`to_words`](Self::to_words).
    pub fn from_words(words: &[i32]) -> Result<Self, SnapshotError> {
        if words.len() < 3 {
            return Err(SnapshotError::Truncated {
                expected: 3,
                actual: words.len(),
            });
        }

        let orientation = Orientation::from_ordinal(words[0])
            .ok_or(SnapshotError::BadOrientation { ordinal: words[0] })?;
        let lane_size = words[1];
        let count = words[2];
        if count < 0 {
            return Err(SnapshotError::NegativeLaneCount { count });
        }

        let count = count as usize;
        let expected = 3 + count * 4;
        if words.len() < expected {
            return Err(SnapshotError::Truncated {
                expected,
                actual: words.len(),
            });
        }

        let lanes = words[3..expected]
            .chunks_exact(4)
            .map(|edges| Rect::new(edges[0], edges[1], edges[2], edges[3]))
            .collect();

        Ok(Self {
            schema_version: GALLERY_SCHEMA_VERSION,
            orientation,
            lane_size,
            lanes,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GallerySnapshot {
        GallerySnapshot::new(
            Orientation::Vertical,
            100,
            vec![Rect::new(0, -20, 100, 180), Rect::new(100, -20, 200, 140)],
        )
    }

    #[test]
    fn word_order_is_fixed() {
        let words = sample().to_words();
        assert_eq!(
            words,
            vec![0, 100, 2, 0, -20, 100, 180, 100, -20, 200, 140]
        );
    }

    #[test]
    fn word_round_trip() {
        let snapshot = sample();
        let decoded = GallerySnapshot::from_words(&snapshot.to_words()).expect("decode");
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn empty_snapshot_round_trips_but_is_not_restorable() {
        let snapshot = GallerySnapshot::new(Orientation::Horizontal, 0, vec![]);
        assert!(!snapshot.is_restorable());
        let decoded = GallerySnapshot::from_words(&snapshot.to_words()).expect("decode");
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn decode_rejects_truncated_header() {
        assert_eq!(
            GallerySnapshot::from_words(&[0, 100]),
            Err(SnapshotError::Truncated {
                expected: 3,
                actual: 2,
            })
        );
    }

    #[test]
    fn decode_rejects_truncated_lane_list() {
        assert_eq!(
            GallerySnapshot::from_words(&[0, 100, 2, 0, 0, 100, 50]),
            Err(SnapshotError::Truncated {
                expected: 11,
                actual: 7,
            })
        );
    }

    #[test]
    fn decode_rejects_bad_orientation() {
        assert_eq!(
            GallerySnapshot::from_words(&[7, 100, 0]),
            Err(SnapshotError::BadOrientation { ordinal: 7 })
        );
    }

    #[test]
    fn decode_rejects_negative_lane_count() {
        assert_eq!(
            GallerySnapshot::from_words(&[0, 100, -1]),
            Err(SnapshotError::NegativeLaneCount { count: -1 })
        );
    }

    #[test]
    fn validate_flags_inverted_lane() {
        let snapshot =
            GallerySnapshot::new(Orientation::Vertical, 100, vec![Rect::new(0, 60, 100, 10)]);
        assert_eq!(
            snapshot.validate(),
            Err(SnapshotError::InvertedLane { lane: 0 })
        );
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn validate_flags_future_schema() {
        let mut snapshot = sample();
        snapshot.schema_version = GALLERY_SCHEMA_VERSION + 1;
        assert!(matches!(
            snapshot.validate(),
            Err(SnapshotError::UnsupportedSchemaVersion { .. })
        ));
    }

    #[test]
    fn state_hash_tracks_content() {
        let snapshot = sample();
        let mut mutated = snapshot.clone();
        assert_eq!(snapshot.state_hash(), mutated.state_hash());

        mutated.lanes[0].bottom += 1;
        assert_ne!(snapshot.state_hash(), mutated.state_hash());
    }

    #[test]
    fn error_display() {
        assert!(
            SnapshotError::BadOrientation { ordinal: 9 }
                .to_string()
                .contains("ordinal 9")
        );
        assert!(
            SnapshotError::Truncated {
                expected: 11,
                actual: 7,
            }
            .to_string()
            .contains("11")
        );
    }
}
