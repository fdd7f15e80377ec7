#![forbid(unsafe_code)]

//! Incremental multi-lane flow layout.
//!
//! Positions a stream of variably-sized items into a fixed number of
//! parallel lanes (columns when scrolling vertically, rows when scrolling
//! horizontally). [`lanes::LaneTracker`] owns per-lane occupied extents;
//! [`gallery::FlowGallery`] drives lane assignment, attach/detach during
//! scroll, and saved-state round trips; [`fill::FillDriver`] is the generic
//! fill/recycle loop over the [`gallery::LayoutPolicy`] capability surface.

pub use flowlane_core::geometry::{Rect, Sides, Size};

pub mod fill;
pub mod gallery;
pub mod lanes;
pub mod snapshot;

pub use fill::{AttachedItem, FillDriver, ItemSource, Window};
pub use gallery::{
    Anchor, FlowGallery, LanePolicy, LayoutPass, LayoutPolicy, RoundRobin, UpdateOp, UpdateOutcome,
};
pub use lanes::{LaneError, LaneTracker};
pub use snapshot::{GALLERY_SCHEMA_VERSION, GallerySnapshot, SnapshotError};

/// The axis along which content scrolls.
///
/// Lanes run parallel to the scroll axis and partition the perpendicular
/// ("lane") axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Content scrolls top to bottom; lanes are columns.
    #[default]
    Vertical,
    /// Content scrolls left to right; lanes are rows.
    Horizontal,
}

impl Orientation {
    /// Whether the scroll axis is vertical.
    #[inline]
    pub const fn is_vertical(self) -> bool {
        matches!(self, Orientation::Vertical)
    }

    /// Stable wire ordinal for the saved-state codec.
    #[inline]
    pub const fn ordinal(self) -> i32 {
        match self {
            Orientation::Vertical => 0,
            Orientation::Horizontal => 1,
        }
    }

    /// Inverse of [`ordinal`](Self::ordinal).
    #[inline]
    pub const fn from_ordinal(ordinal: i32) -> Option<Self> {
        match ordinal {
            0 => Some(Orientation::Vertical),
            1 => Some(Orientation::Horizontal),
            _ => None,
        }
    }
}

/// The scroll-leading vs scroll-trailing edge.
///
/// Used both for tracker-edge queries and for push/pop semantics: filling
/// toward `End` grows trailing extents, recycling in direction `End`
/// drains leading extents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// The scroll-leading edge (top or left).
    Start,
    /// The scroll-trailing edge (bottom or right).
    End,
}

impl Direction {
    /// The opposite edge.
    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Direction::Start => Direction::End,
            Direction::End => Direction::Start,
        }
    }
}

/// The lanes one item occupies: a first lane and a span of consecutive
/// lanes. The default policy always assigns a span of 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneSpan {
    /// Index of the first occupied lane.
    pub start_lane: usize,
    /// Number of consecutive occupied lanes (>= 1).
    pub span: usize,
}

impl LaneSpan {
    /// A single-lane span.
    #[inline]
    pub const fn single(start_lane: usize) -> Self {
        Self {
            start_lane,
            span: 1,
        }
    }

    /// Create a span over `span` consecutive lanes.
    #[inline]
    pub const fn new(start_lane: usize, span: usize) -> Self {
        Self { start_lane, span }
    }

    /// Index of the last occupied lane.
    #[inline]
    pub const fn end_lane(&self) -> usize {
        self.start_lane + self.span - 1
    }

    /// Iterate over the occupied lane indices.
    pub fn lanes(&self) -> impl Iterator<Item = usize> {
        self.start_lane..self.start_lane + self.span
    }
}

/// Host-supplied container geometry: outer dimensions plus padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    /// Outer width in pixels.
    pub width: i32,
    /// Outer height in pixels.
    pub height: i32,
    /// Inner padding reserved on each side.
    pub padding: Sides,
}

impl Viewport {
    /// Create an unpadded viewport.
    #[inline]
    pub const fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            padding: Sides::all(0),
        }
    }

    /// Set the padding.
    #[must_use]
    pub const fn with_padding(mut self, padding: Sides) -> Self {
        self.padding = padding;
        self
    }

    /// Whether the viewport has no usable area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Usable extent along the lane axis (perpendicular to scroll).
    #[inline]
    pub const fn lane_axis_extent(&self, orientation: Orientation) -> i32 {
        if orientation.is_vertical() {
            self.width - self.padding.horizontal_sum()
        } else {
            self.height - self.padding.vertical_sum()
        }
    }

    /// Usable extent along the scroll axis.
    #[inline]
    pub const fn scroll_axis_extent(&self, orientation: Orientation) -> i32 {
        if orientation.is_vertical() {
            self.height - self.padding.vertical_sum()
        } else {
            self.width - self.padding.horizontal_sum()
        }
    }

    /// Padded origin along the lane axis.
    #[inline]
    pub const fn lane_axis_origin(&self, orientation: Orientation) -> i32 {
        if orientation.is_vertical() {
            self.padding.left
        } else {
            self.padding.top
        }
    }

    /// Padded origin along the scroll axis.
    #[inline]
    pub const fn scroll_axis_origin(&self, orientation: Orientation) -> i32 {
        if orientation.is_vertical() {
            self.padding.top
        } else {
            self.padding.left
        }
    }
}

/// Lane thickness for a given container and lane count.
///
/// Lanes partition the padded lane axis into `lane_count` equal segments;
/// any remainder pixels from integer division are left unused at the
/// trailing side of the lane axis.
#[must_use]
pub fn lane_size_for(viewport: &Viewport, orientation: Orientation, lane_count: usize) -> i32 {
    if lane_count == 0 {
        return 0;
    }
    viewport.lane_axis_extent(orientation) / lane_count as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_ordinal_round_trip() {
        for orientation in [Orientation::Vertical, Orientation::Horizontal] {
            assert_eq!(
                Orientation::from_ordinal(orientation.ordinal()),
                Some(orientation)
            );
        }
        assert_eq!(Orientation::from_ordinal(2), None);
        assert_eq!(Orientation::from_ordinal(-1), None);
    }

    #[test]
    fn direction_opposite() {
        assert_eq!(Direction::Start.opposite(), Direction::End);
        assert_eq!(Direction::End.opposite(), Direction::Start);
    }

    #[test]
    fn lane_span_bounds() {
        let span = LaneSpan::new(2, 3);
        assert_eq!(span.end_lane(), 4);
        assert_eq!(span.lanes().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert_eq!(LaneSpan::single(5).end_lane(), 5);
    }

    #[test]
    fn viewport_axis_extents() {
        let viewport = Viewport::new(400, 600).with_padding(Sides::new(10, 20, 30, 40));
        assert_eq!(viewport.lane_axis_extent(Orientation::Vertical), 340);
        assert_eq!(viewport.scroll_axis_extent(Orientation::Vertical), 560);
        assert_eq!(viewport.lane_axis_extent(Orientation::Horizontal), 560);
        assert_eq!(viewport.scroll_axis_extent(Orientation::Horizontal), 340);
        assert_eq!(viewport.lane_axis_origin(Orientation::Vertical), 40);
        assert_eq!(viewport.lane_axis_origin(Orientation::Horizontal), 10);
    }

    #[test]
    fn viewport_empty() {
        assert!(Viewport::new(0, 600).is_empty());
        assert!(Viewport::new(400, 0).is_empty());
        assert!(!Viewport::new(1, 1).is_empty());
    }

    #[test]
    fn lane_size_partition() {
        let viewport = Viewport::new(400, 600);
        assert_eq!(lane_size_for(&viewport, Orientation::Vertical, 4), 100);
        assert_eq!(lane_size_for(&viewport, Orientation::Horizontal, 3), 200);
        assert_eq!(lane_size_for(&viewport, Orientation::Vertical, 0), 0);
    }
}
