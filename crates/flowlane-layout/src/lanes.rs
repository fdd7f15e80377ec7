#![forbid(unsafe_code)]

//! Per-lane occupancy tracking.
//!
//! [`LaneTracker`] owns one rectangle per lane. The lane-axis edges of each
//! rectangle are the lane's fixed bounds; the scroll-axis edges are the
//! lane's occupied extent: `inner_start` (leading occupied edge) and
//! `inner_end` (trailing occupied edge).
//!
//! # Invariants
//!
//! 1. `inner_start <= inner_end` for every lane at all times within a
//!    layout pass; an empty lane has them coincident.
//! 2. Lane-axis bounds partition the padded lane axis into `lane_count`
//!    equal segments of `lane_size` pixels and are never changed by
//!    push/pop, only shifted wholesale by scroll offsets.
//! 3. `offset` is additive: `offset(a)` then `offset(b)` is `offset(a + b)`.
//! 4. The save/restore pair supports exactly one nesting level; it brackets
//!    the speculative scrap-measurement sub-pass.
//!
//! # Failure Modes
//!
//! Construction from untrusted lane rectangles ([`LaneTracker::from_lanes`])
//! validates its input and returns [`LaneError`]. Push/pop with an
//! out-of-range lane index is a caller contract violation and panics on
//! the slice index; a pop that would invert a lane's occupied extent is a
//! controller/tracker desynchronization and is debug-asserted rather than
//! silently clamped.

use crate::{Direction, LaneSpan, Orientation, Rect, Size, Viewport, lane_size_for};
use std::fmt;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Validation errors for tracker construction from saved lane state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaneError {
    /// The lane list was empty.
    EmptyLanes,
    /// The lane thickness was zero or negative.
    InvalidLaneSize { lane_size: i32 },
    /// A lane's occupied extent was inverted (`inner_start > inner_end`).
    InvertedLane {
        lane: usize,
        inner_start: i32,
        inner_end: i32,
    },
}

impl fmt::Display for LaneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaneError::EmptyLanes => write!(f, "lane list is empty"),
            LaneError::InvalidLaneSize { lane_size } => {
                write!(f, "lane size {lane_size} is not positive")
            }
            LaneError::InvertedLane {
                lane,
                inner_start,
                inner_end,
            } => write!(
                f,
                "lane {lane} has inverted occupied extent ({inner_start} > {inner_end})"
            ),
        }
    }
}

impl std::error::Error for LaneError {}

// ---------------------------------------------------------------------------
// LaneTracker
// ---------------------------------------------------------------------------

/// Tracks the occupied extent of every lane at both scroll edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneTracker {
    orientation: Orientation,
    lane_size: i32,
    lanes: Vec<Rect>,
    /// One-level undo slot for the speculative scrap sub-pass.
    saved: Option<Vec<Rect>>,
}

impl LaneTracker {
    /// Create a tracker with all lanes empty at the padded container origin.
    ///
    /// `lane_count` must be at least 1; the thickness is derived from the
    /// viewport via [`lane_size_for`].
    #[must_use]
    pub fn new(orientation: Orientation, viewport: &Viewport, lane_count: usize) -> Self {
        debug_assert!(lane_count >= 1, "lane_count must be >= 1");

        let lane_size = lane_size_for(viewport, orientation, lane_count);
        let lane_origin = viewport.lane_axis_origin(orientation);
        let scroll_origin = viewport.scroll_axis_origin(orientation);

        let lanes = (0..lane_count)
            .map(|i| {
                let lane_start = lane_origin + i as i32 * lane_size;
                if orientation.is_vertical() {
                    Rect::new(lane_start, scroll_origin, lane_start + lane_size, scroll_origin)
                } else {
                    Rect::new(scroll_origin, lane_start, scroll_origin, lane_start + lane_size)
                }
            })
            .collect();

        Self {
            orientation,
            lane_size,
            lanes,
            saved: None,
        }
    }

    /// Rebuild a tracker from previously saved lane rectangles.
    ///
    /// Each lane's `inner_start`/`inner_end` are taken from the supplied
    /// rectangle's scroll-axis bounds. The input is validated because it
    /// crosses the persistence boundary.
    pub fn from_lanes(
        orientation: Orientation,
        lanes: Vec<Rect>,
        lane_size: i32,
    ) -> Result<Self, LaneError> {
        if lanes.is_empty() {
            return Err(LaneError::EmptyLanes);
        }
        if lane_size <= 0 {
            return Err(LaneError::InvalidLaneSize { lane_size });
        }
        for (lane, rect) in lanes.iter().enumerate() {
            let (inner_start, inner_end) = scroll_edges(orientation, rect);
            if inner_start > inner_end {
                return Err(LaneError::InvertedLane {
                    lane,
                    inner_start,
                    inner_end,
                });
            }
        }

        Ok(Self {
            orientation,
            lane_size,
            lanes,
            saved: None,
        })
    }

    // ── Accessors ───────────────────────────────────────────────────

    /// The tracker's scroll orientation.
    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Fixed lane thickness in pixels.
    #[must_use]
    pub const fn lane_size(&self) -> i32 {
        self.lane_size
    }

    /// Number of lanes.
    #[must_use]
    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// The full rectangle of one lane: fixed lane-axis bounds plus the
    /// current occupied scroll-axis extent.
    #[must_use]
    pub fn lane(&self, lane: usize) -> Rect {
        self.lanes[lane]
    }

    /// All lane rectangles, in lane order.
    #[must_use]
    pub fn lanes(&self) -> &[Rect] {
        &self.lanes
    }

    /// Innermost leading occupied edge across all lanes: the furthest any
    /// lane's leading edge has advanced. While this exceeds a fill limit,
    /// at least one lane still has an uncovered gap on the leading side.
    #[must_use]
    pub fn inner_start(&self) -> i32 {
        self.lanes
            .iter()
            .map(|lane| scroll_edges(self.orientation, lane).0)
            .max()
            .unwrap_or(0)
    }

    /// Innermost trailing occupied edge across all lanes: the least any
    /// lane's trailing edge has advanced. While this is short of a fill
    /// limit, at least one lane still has an uncovered gap on the
    /// trailing side.
    #[must_use]
    pub fn inner_end(&self) -> i32 {
        self.lanes
            .iter()
            .map(|lane| scroll_edges(self.orientation, lane).1)
            .min()
            .unwrap_or(0)
    }

    // ── Frame computation ───────────────────────────────────────────

    /// Compute the rectangle where an item of the given measured size is
    /// placed on the spanned lanes.
    ///
    /// Lane-axis bounds are the union of the spanned lanes' fixed bounds.
    /// Growing toward `End` places the item flush against the furthest
    /// trailing occupied edge of its lanes; growing toward `Start` places
    /// it flush before the nearest leading occupied edge, extending
    /// backward by the measured scroll-axis length. This guarantees no
    /// overlap with frames already pushed onto the same lanes.
    #[must_use]
    pub fn child_frame(&self, measured: Size, span: LaneSpan, direction: Direction) -> Rect {
        let first = &self.lanes[span.start_lane];
        let last = &self.lanes[span.end_lane()];

        let scroll_extent = if self.orientation.is_vertical() {
            measured.height
        } else {
            measured.width
        };

        let (leading, trailing) = self.span_edges(span);
        let (scroll_start, scroll_end) = match direction {
            Direction::End => (trailing, trailing + scroll_extent),
            Direction::Start => (leading - scroll_extent, leading),
        };

        if self.orientation.is_vertical() {
            Rect::new(first.left, scroll_start, last.right, scroll_end)
        } else {
            Rect::new(scroll_start, first.top, scroll_end, last.bottom)
        }
    }

    /// Most restrictive (leading, trailing) occupied edges over a span.
    fn span_edges(&self, span: LaneSpan) -> (i32, i32) {
        let mut leading = i32::MAX;
        let mut trailing = i32::MIN;
        for lane in span.lanes() {
            let (inner_start, inner_end) = scroll_edges(self.orientation, &self.lanes[lane]);
            leading = leading.min(inner_start);
            trailing = trailing.max(inner_end);
        }
        (leading, trailing)
    }

    // ── Push / pop ──────────────────────────────────────────────────

    /// Grow one lane's occupied extent to include a placed frame.
    ///
    /// `margin` is the inter-item spacing hook along the scroll axis; the
    /// current controller policy always passes 0.
    pub fn push_child_frame(&mut self, frame: &Rect, lane: usize, margin: i32, direction: Direction) {
        let vertical = self.orientation.is_vertical();
        let lane_rect = &mut self.lanes[lane];
        match direction {
            Direction::End => {
                let trailing = if vertical { frame.bottom } else { frame.right };
                set_inner_end(vertical, lane_rect, trailing + margin);
            }
            Direction::Start => {
                let leading = if vertical { frame.top } else { frame.left };
                set_inner_start(vertical, lane_rect, leading - margin);
            }
        }
        debug_assert!(
            {
                let (s, e) = scroll_edges(self.orientation, &self.lanes[lane]);
                s <= e
            },
            "push inverted lane {lane} occupied extent"
        );
    }

    /// Shrink one lane's occupied extent after its frame is detached.
    ///
    /// The exact inverse of [`push_child_frame`](Self::push_child_frame):
    /// removal in direction `End` (item leaving at the front while content
    /// scrolls toward the end) advances `inner_start` to the frame's
    /// trailing edge; removal in direction `Start` retracts `inner_end` to
    /// the frame's leading edge.
    pub fn pop_child_frame(&mut self, frame: &Rect, lane: usize, margin: i32, direction: Direction) {
        let vertical = self.orientation.is_vertical();
        let lane_rect = &mut self.lanes[lane];
        match direction {
            Direction::End => {
                let trailing = if vertical { frame.bottom } else { frame.right };
                set_inner_start(vertical, lane_rect, trailing + margin);
            }
            Direction::Start => {
                let leading = if vertical { frame.top } else { frame.left };
                set_inner_end(vertical, lane_rect, leading - margin);
            }
        }
        debug_assert!(
            {
                let (s, e) = scroll_edges(self.orientation, &self.lanes[lane]);
                s <= e
            },
            "pop inverted lane {lane} occupied extent; tracker is desynchronized"
        );
    }

    // ── Pass lifecycle ──────────────────────────────────────────────

    /// Collapse every lane's occupied extent onto its edge at `direction`,
    /// so stale extents from a prior pass don't leak into a fresh one.
    pub fn reset(&mut self, direction: Direction) {
        let vertical = self.orientation.is_vertical();
        for lane_rect in &mut self.lanes {
            let (inner_start, inner_end) = if vertical {
                (lane_rect.top, lane_rect.bottom)
            } else {
                (lane_rect.left, lane_rect.right)
            };
            match direction {
                Direction::Start => set_inner_end(vertical, lane_rect, inner_start),
                Direction::End => set_inner_start(vertical, lane_rect, inner_end),
            }
        }
    }

    /// Collapse every lane's occupied extent onto the given scroll-axis
    /// position. Used when re-anchoring layout to an arbitrary item.
    pub fn reset_at(&mut self, offset: i32) {
        let vertical = self.orientation.is_vertical();
        for lane_rect in &mut self.lanes {
            set_inner_start(vertical, lane_rect, offset);
            set_inner_end(vertical, lane_rect, offset);
        }
    }

    /// Shift every lane's occupied extent by `delta` along the scroll axis.
    ///
    /// Applied exactly once per scroll delta, before any subsequent frame
    /// computation.
    pub fn offset(&mut self, delta: i32) {
        for lane_rect in &mut self.lanes {
            if self.orientation.is_vertical() {
                lane_rect.top += delta;
                lane_rect.bottom += delta;
            } else {
                lane_rect.left += delta;
                lane_rect.right += delta;
            }
        }
    }

    // ── Speculative sub-pass ────────────────────────────────────────

    /// Snapshot all lane states. One level only; a second `save` before
    /// [`restore`](Self::restore) is a caller contract violation.
    pub fn save(&mut self) {
        debug_assert!(self.saved.is_none(), "nested LaneTracker::save");
        self.saved = Some(self.lanes.clone());
    }

    /// Roll lane states back to the matching [`save`](Self::save).
    pub fn restore(&mut self) {
        debug_assert!(self.saved.is_some(), "LaneTracker::restore without save");
        if let Some(saved) = self.saved.take() {
            self.lanes = saved;
        }
    }
}

// ---------------------------------------------------------------------------
// Edge helpers
// ---------------------------------------------------------------------------

/// A lane rectangle's (inner_start, inner_end) along the scroll axis.
fn scroll_edges(orientation: Orientation, lane: &Rect) -> (i32, i32) {
    if orientation.is_vertical() {
        (lane.top, lane.bottom)
    } else {
        (lane.left, lane.right)
    }
}

fn set_inner_start(vertical: bool, lane: &mut Rect, value: i32) {
    if vertical {
        lane.top = value;
    } else {
        lane.left = value;
    }
}

fn set_inner_end(vertical: bool, lane: &mut Rect, value: i32) {
    if vertical {
        lane.bottom = value;
    } else {
        lane.right = value;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Sides;

    fn vertical_tracker(lanes: usize, width: i32) -> LaneTracker {
        LaneTracker::new(Orientation::Vertical, &Viewport::new(width, 600), lanes)
    }

    #[test]
    fn lanes_partition_the_lane_axis() {
        let tracker = vertical_tracker(4, 400);
        assert_eq!(tracker.lane_size(), 100);
        for i in 0..4 {
            let lane = tracker.lane(i);
            assert_eq!(lane.left, i as i32 * 100);
            assert_eq!(lane.right, (i as i32 + 1) * 100);
            assert_eq!(lane.width(), tracker.lane_size());
            assert_eq!(lane.top, lane.bottom);
        }
    }

    #[test]
    fn padding_shifts_lane_origin() {
        let viewport = Viewport::new(420, 600).with_padding(Sides::new(8, 10, 8, 10));
        let tracker = LaneTracker::new(Orientation::Vertical, &viewport, 4);
        assert_eq!(tracker.lane_size(), 100);
        assert_eq!(tracker.lane(0).left, 10);
        assert_eq!(tracker.lane(3).right, 410);
        assert_eq!(tracker.lane(0).top, 8);
    }

    #[test]
    fn horizontal_lanes_are_rows() {
        let tracker = LaneTracker::new(Orientation::Horizontal, &Viewport::new(600, 300), 3);
        assert_eq!(tracker.lane_size(), 100);
        let lane = tracker.lane(1);
        assert_eq!(lane.top, 100);
        assert_eq!(lane.bottom, 200);
        assert_eq!(lane.left, lane.right);
    }

    #[test]
    fn concrete_gallery_scenario() {
        // 4 lanes, lane_size 100, vertical, container 400 wide, no padding.
        let mut tracker = vertical_tracker(4, 400);

        let frame = tracker.child_frame(Size::new(100, 50), LaneSpan::single(0), Direction::End);
        assert_eq!(frame, Rect::new(0, 0, 100, 50));

        tracker.push_child_frame(&frame, 0, 0, Direction::End);
        assert_eq!(tracker.lane(0).bottom, 50);
        // The innermost trailing edge stays at 0: the other lanes are empty.
        assert_eq!(tracker.inner_end(), 0);

        // Detaching in direction Start retracts inner_end to the frame's
        // leading edge.
        tracker.pop_child_frame(&frame, 0, 0, Direction::Start);
        assert_eq!(tracker.lane(0).bottom, 0);
        assert_eq!(tracker.inner_end(), 0);
    }

    #[test]
    fn push_pop_inverse_toward_end() {
        let mut tracker = vertical_tracker(2, 200);
        let before = tracker.lane(0);

        let frames: Vec<Rect> = [40, 70, 25]
            .iter()
            .map(|&h| {
                let frame =
                    tracker.child_frame(Size::new(100, h), LaneSpan::single(0), Direction::End);
                tracker.push_child_frame(&frame, 0, 0, Direction::End);
                frame
            })
            .collect();
        assert_eq!(tracker.lane(0).bottom, 135);

        for frame in frames.iter().rev() {
            tracker.pop_child_frame(frame, 0, 0, Direction::Start);
        }
        assert_eq!(tracker.lane(0), before);
    }

    #[test]
    fn push_pop_inverse_toward_start() {
        let mut tracker = vertical_tracker(2, 200);
        let before = tracker.lane(1);

        let frames: Vec<Rect> = [30, 60]
            .iter()
            .map(|&h| {
                let frame =
                    tracker.child_frame(Size::new(100, h), LaneSpan::single(1), Direction::Start);
                tracker.push_child_frame(&frame, 1, 0, Direction::Start);
                frame
            })
            .collect();
        assert_eq!(tracker.lane(1).top, -90);

        for frame in frames.iter().rev() {
            tracker.pop_child_frame(frame, 1, 0, Direction::End);
        }
        assert_eq!(tracker.lane(1), before);
    }

    #[test]
    fn frames_on_one_lane_never_overlap() {
        let mut tracker = vertical_tracker(3, 300);
        let mut frames = Vec::new();
        for h in [35, 20, 90, 15, 50] {
            let frame =
                tracker.child_frame(Size::new(100, h), LaneSpan::single(1), Direction::End);
            tracker.push_child_frame(&frame, 1, 0, Direction::End);
            frames.push(frame);
        }

        for pair in frames.windows(2) {
            assert!(pair[0].bottom <= pair[1].top, "frames out of order");
            assert!(!pair[0].intersects(&pair[1]));
        }
    }

    #[test]
    fn spanned_frame_unions_lane_bounds() {
        let mut tracker = vertical_tracker(4, 400);

        // Occupy lane 1 so the spanned placement must clear it.
        let blocker = tracker.child_frame(Size::new(100, 80), LaneSpan::single(1), Direction::End);
        tracker.push_child_frame(&blocker, 1, 0, Direction::End);

        let span = LaneSpan::new(0, 2);
        let frame = tracker.child_frame(Size::new(200, 40), span, Direction::End);
        assert_eq!(frame.left, 0);
        assert_eq!(frame.right, 200);
        // Flush against lane 1's trailing edge, the most restrictive.
        assert_eq!(frame.top, 80);
        assert_eq!(frame.bottom, 120);

        for lane in span.lanes() {
            tracker.push_child_frame(&frame, lane, 0, Direction::End);
        }
        assert_eq!(tracker.lane(0).bottom, 120);
        assert_eq!(tracker.lane(1).bottom, 120);
        assert_eq!(tracker.lane(2).bottom, 0);
    }

    #[test]
    fn inner_edges_are_innermost() {
        let mut tracker = vertical_tracker(2, 200);
        let short = tracker.child_frame(Size::new(100, 30), LaneSpan::single(0), Direction::End);
        tracker.push_child_frame(&short, 0, 0, Direction::End);
        let tall = tracker.child_frame(Size::new(100, 90), LaneSpan::single(1), Direction::End);
        tracker.push_child_frame(&tall, 1, 0, Direction::End);

        // Lane 0 ends at 30, lane 1 at 90: the lagging lane bounds the fill.
        assert_eq!(tracker.inner_start(), 0);
        assert_eq!(tracker.inner_end(), 30);

        let lead = tracker.child_frame(Size::new(100, 40), LaneSpan::single(1), Direction::Start);
        tracker.push_child_frame(&lead, 1, 0, Direction::Start);
        // Lane 1 now starts at -40 but lane 0 still starts at 0.
        assert_eq!(tracker.inner_start(), 0);
    }

    #[test]
    fn reset_collapses_onto_requested_edge() {
        let mut tracker = vertical_tracker(2, 200);
        let frame = tracker.child_frame(Size::new(100, 60), LaneSpan::single(0), Direction::End);
        tracker.push_child_frame(&frame, 0, 0, Direction::End);

        tracker.reset(Direction::Start);
        assert_eq!(tracker.lane(0).top, 0);
        assert_eq!(tracker.lane(0).bottom, 0);

        tracker.push_child_frame(&frame, 0, 0, Direction::End);
        tracker.reset(Direction::End);
        assert_eq!(tracker.lane(0).top, 60);
        assert_eq!(tracker.lane(0).bottom, 60);
    }

    #[test]
    fn reset_at_moves_all_lanes() {
        let mut tracker = vertical_tracker(3, 300);
        tracker.reset_at(-240);
        for i in 0..3 {
            assert_eq!(tracker.lane(i).top, -240);
            assert_eq!(tracker.lane(i).bottom, -240);
        }
        assert_eq!(tracker.inner_start(), -240);
        assert_eq!(tracker.inner_end(), -240);
    }

    #[test]
    fn offset_shifts_scroll_axis_only() {
        let mut tracker = vertical_tracker(2, 200);
        let frame = tracker.child_frame(Size::new(100, 50), LaneSpan::single(0), Direction::End);
        tracker.push_child_frame(&frame, 0, 0, Direction::End);

        tracker.offset(-30);
        assert_eq!(tracker.lane(0).top, -30);
        assert_eq!(tracker.lane(0).bottom, 20);
        assert_eq!(tracker.lane(0).left, 0);
        assert_eq!(tracker.lane(0).right, 100);
    }

    #[test]
    fn offset_is_additive() {
        let mut split = vertical_tracker(3, 300);
        let mut single = split.clone();

        split.offset(17);
        split.offset(-40);
        single.offset(-23);

        assert_eq!(split, single);
    }

    #[test]
    fn save_restore_round_trip() {
        let mut tracker = vertical_tracker(2, 200);
        let frame = tracker.child_frame(Size::new(100, 45), LaneSpan::single(0), Direction::End);
        tracker.push_child_frame(&frame, 0, 0, Direction::End);
        let reference = tracker.clone();

        tracker.save();
        let speculative =
            tracker.child_frame(Size::new(100, 200), LaneSpan::single(1), Direction::End);
        tracker.push_child_frame(&speculative, 1, 0, Direction::End);
        tracker.offset(-75);
        tracker.restore();

        assert_eq!(tracker, reference);
    }

    #[test]
    fn from_lanes_validates_input() {
        assert_eq!(
            LaneTracker::from_lanes(Orientation::Vertical, vec![], 100),
            Err(LaneError::EmptyLanes)
        );
        assert_eq!(
            LaneTracker::from_lanes(Orientation::Vertical, vec![Rect::new(0, 0, 100, 50)], 0),
            Err(LaneError::InvalidLaneSize { lane_size: 0 })
        );
        assert_eq!(
            LaneTracker::from_lanes(Orientation::Vertical, vec![Rect::new(0, 90, 100, 40)], 100),
            Err(LaneError::InvertedLane {
                lane: 0,
                inner_start: 90,
                inner_end: 40,
            })
        );
    }

    #[test]
    fn from_lanes_preserves_occupied_extents() {
        let lanes = vec![Rect::new(0, -20, 100, 180), Rect::new(100, -20, 200, 140)];
        let tracker = LaneTracker::from_lanes(Orientation::Vertical, lanes.clone(), 100)
            .expect("valid lanes");
        assert_eq!(tracker.lanes(), lanes.as_slice());
        assert_eq!(tracker.inner_start(), -20);
        assert_eq!(tracker.inner_end(), 140);
    }

    #[test]
    fn horizontal_push_pop() {
        let mut tracker = LaneTracker::new(Orientation::Horizontal, &Viewport::new(600, 200), 2);
        let frame = tracker.child_frame(Size::new(120, 100), LaneSpan::single(0), Direction::End);
        assert_eq!(frame, Rect::new(0, 0, 120, 100));

        tracker.push_child_frame(&frame, 0, 0, Direction::End);
        assert_eq!(tracker.lane(0).right, 120);
        // Lane 1 is still empty, so the innermost trailing edge stays put.
        assert_eq!(tracker.inner_end(), 0);

        tracker.pop_child_frame(&frame, 0, 0, Direction::End);
        assert_eq!(tracker.lane(0).left, 120);
    }

    #[test]
    fn error_display() {
        let err = LaneError::InvertedLane {
            lane: 2,
            inner_start: 10,
            inner_end: 5,
        };
        assert!(err.to_string().contains("lane 2"));
        assert!(LaneError::EmptyLanes.to_string().contains("empty"));
    }
}
