#![forbid(unsafe_code)]

//! Generic fill and recycle driver.
//!
//! [`Window`] models the host's attached-children list: a contiguous run
//! of adapter positions with their on-screen frames. [`FillDriver`] walks
//! that window outward until the controller's stopping condition says the
//! viewport edge is covered, and walks it back inward when scrolled-away
//! items should be recycled.
//!
//! The driver is deliberately ignorant of lanes: it talks to the
//! controller only through [`crate::gallery::LayoutPolicy`], so the same
//! loop serves any lane-assignment strategy.
//!
//! # Invariants
//!
//! - Attached positions are contiguous and ascending; `attach_end` and
//!   `attach_start` enforce this in debug builds.
//! - A fill step that produces a frame with no scroll-axis extent stops
//!   the loop; the stopping condition cannot make progress past it.

use std::collections::VecDeque;

use crate::gallery::LayoutPolicy;
use crate::{Direction, Orientation, Rect, Size};

// ---------------------------------------------------------------------------
// Item source
// ---------------------------------------------------------------------------

/// The host adapter: how many items exist and how big each one wants to be.
pub trait ItemSource {
    /// Total number of items.
    fn item_count(&self) -> usize;

    /// Desired size of the item at `position`, given the lane-axis pixels
    /// reserved for it. The returned size's lane-axis extent should match
    /// the reservation; the scroll-axis extent is the item's own.
    fn measure(&self, position: usize, lane_axis_extent: i32) -> Size;
}

// ---------------------------------------------------------------------------
// Window
// ---------------------------------------------------------------------------

/// One attached item: its adapter position and current on-screen frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachedItem {
    pub position: usize,
    pub frame: Rect,
}

/// The contiguous run of currently-attached items, in position order.
#[derive(Debug, Clone, Default)]
pub struct Window {
    items: VecDeque<AttachedItem>,
}

impl Window {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adapter position of the first attached item.
    #[must_use]
    pub fn first_visible(&self) -> Option<usize> {
        self.items.front().map(|item| item.position)
    }

    /// Adapter position of the last attached item.
    #[must_use]
    pub fn last_visible(&self) -> Option<usize> {
        self.items.back().map(|item| item.position)
    }

    /// Scroll-axis leading edge of the first attached item's frame.
    #[must_use]
    pub fn first_frame_start(&self, orientation: Orientation) -> Option<i32> {
        self.items
            .front()
            .map(|item| scroll_leading(orientation, &item.frame))
    }

    #[must_use]
    pub fn frame_at(&self, position: usize) -> Option<Rect> {
        let first = self.first_visible()?;
        self.items
            .get(position.checked_sub(first)?)
            .map(|item| item.frame)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AttachedItem> {
        self.items.iter()
    }

    /// Append an item after the current last position.
    pub fn attach_end(&mut self, position: usize, frame: Rect) {
        debug_assert!(
            self.last_visible().is_none_or(|last| position == last + 1),
            "attach_end out of order: {position}"
        );
        self.items.push_back(AttachedItem { position, frame });
    }

    /// Prepend an item before the current first position.
    pub fn attach_start(&mut self, position: usize, frame: Rect) {
        debug_assert!(
            self.first_visible()
                .is_none_or(|first| position + 1 == first),
            "attach_start out of order: {position}"
        );
        self.items.push_front(AttachedItem { position, frame });
    }

    pub fn detach_first(&mut self) -> Option<AttachedItem> {
        self.items.pop_front()
    }

    pub fn detach_last(&mut self) -> Option<AttachedItem> {
        self.items.pop_back()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Shift every attached frame by `delta` along the scroll axis.
    pub fn offset(&mut self, orientation: Orientation, delta: i32) {
        for item in &mut self.items {
            if orientation.is_vertical() {
                item.frame.offset(0, delta);
            } else {
                item.frame.offset(delta, 0);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Fill driver
// ---------------------------------------------------------------------------

/// Stateless fill/recycle loops over a [`Window`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FillDriver;

impl FillDriver {
    /// Attach items after the window until `policy` says the trailing
    /// `limit` is covered or items run out. When the window is empty the
    /// fill starts at `anchor`. Returns the number of items attached.
    pub fn fill_toward_end<P: LayoutPolicy>(
        policy: &mut P,
        window: &mut Window,
        source: &dyn ItemSource,
        anchor: usize,
        limit: i32,
    ) -> usize {
        let mut next = window.last_visible().map_or(anchor, |last| last + 1);
        let mut attached = 0;

        while next < source.item_count() && policy.can_add_more_views(Direction::End, limit) {
            if !Self::fill_one(policy, window, source, next, Direction::End) {
                break;
            }
            next += 1;
            attached += 1;
        }
        attached
    }

    /// Attach items before the window until `policy` says the leading
    /// `limit` is covered or position zero is reached. Returns the number
    /// of items attached. A no-op on an empty window: backward fill needs
    /// an attached item to extend from.
    pub fn fill_toward_start<P: LayoutPolicy>(
        policy: &mut P,
        window: &mut Window,
        source: &dyn ItemSource,
        limit: i32,
    ) -> usize {
        let Some(first) = window.first_visible() else {
            return 0;
        };
        let mut next = first;
        let mut attached = 0;

        while next > 0 && policy.can_add_more_views(Direction::Start, limit) {
            next -= 1;
            if !Self::fill_one(policy, window, source, next, Direction::Start) {
                break;
            }
            attached += 1;
        }
        attached
    }

    /// Detach items that have fully crossed `boundary` away from the
    /// viewport. `direction` is the scroll direction: scrolling toward
    /// `End` recycles from the window's start, and vice versa. Returns the
    /// number of items detached.
    pub fn recycle<P: LayoutPolicy>(
        policy: &mut P,
        window: &mut Window,
        orientation: Orientation,
        direction: Direction,
        boundary: i32,
    ) -> usize {
        let mut detached = 0;
        match direction {
            Direction::End => {
                while let Some(front) = window.items.front().copied() {
                    if scroll_trailing(orientation, &front.frame) > boundary {
                        break;
                    }
                    window.detach_first();
                    policy.detach_child(front.position, &front.frame, Direction::End);
                    detached += 1;
                }
            }
            Direction::Start => {
                while let Some(back) = window.items.back().copied() {
                    if scroll_leading(orientation, &back.frame) < boundary {
                        break;
                    }
                    window.detach_last();
                    policy.detach_child(back.position, &back.frame, Direction::Start);
                    detached += 1;
                }
            }
        }
        detached
    }

    /// Measure, place, and attach a single item. Returns `false` when the
    /// pass is degraded or the item cannot advance the fill.
    fn fill_one<P: LayoutPolicy>(
        policy: &mut P,
        window: &mut Window,
        source: &dyn ItemSource,
        position: usize,
        direction: Direction,
    ) -> bool {
        let measured = policy.measure_child(position, source);
        debug_assert!(
            policy.check_layout_params(position, measured),
            "item {position} measured off the lane grid"
        );

        let Some(frame) = policy.layout_child(position, measured, direction, false) else {
            return false;
        };

        match direction {
            Direction::End => window.attach_end(position, frame),
            Direction::Start => window.attach_start(position, frame),
        }

        // A frame with no scroll extent can never cover more of the limit;
        // bail rather than spin on it.
        !frame.is_empty()
    }
}

/// Scroll-axis leading edge of a frame.
pub(crate) fn scroll_leading(orientation: Orientation, frame: &Rect) -> i32 {
    if orientation.is_vertical() {
        frame.top
    } else {
        frame.left
    }
}

/// Scroll-axis trailing edge of a frame.
pub(crate) fn scroll_trailing(orientation: Orientation, frame: &Rect) -> i32 {
    if orientation.is_vertical() {
        frame.bottom
    } else {
        frame.right
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
