#![forbid(unsafe_code)]

//! Flow layout controller.
//!
//! [`FlowGallery`] drives a layout pass over a [`LaneTracker`]: it decides
//! lane assignment per item position (via an injected [`LanePolicy`]),
//! computes and commits frames on attach, pops them on detach, decides
//! when the fill loop may stop, and owns the saved-state round trip.
//!
//! The generic fill loop itself lives in [`crate::fill`] and talks to the
//! controller exclusively through the [`LayoutPolicy`] capability trait.
//!
//! # Layout pass order
//!
//! [`FlowGallery::on_layout_children`] performs, in order: install a
//! pending restored tracker, rebuild the tracker if geometry changed,
//! degrade to a no-op when no tracker can be built, re-anchor when
//! requested, reset the tracker's leading edge, then hand the fill
//! position to the driver.
//!
//! # Failure Modes
//!
//! Invalid geometry (zero lanes, zero-size viewport) never errors: the
//! pass is skipped and prior on-screen content stays untouched until
//! geometry becomes valid.

use crate::fill::{ItemSource, Window};
use crate::lanes::LaneTracker;
use crate::snapshot::{GallerySnapshot, SnapshotError};
use crate::{Direction, LaneSpan, Orientation, Rect, Size, Viewport, lane_size_for};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Injected lane-assignment strategy: how an item position maps to lanes.
pub trait LanePolicy {
    /// The lanes the item at `position` occupies when laid out toward
    /// `direction`.
    fn lane_for_position(
        &self,
        lane_count: usize,
        position: usize,
        direction: Direction,
    ) -> LaneSpan;

    /// Number of consecutive lanes the item at `position` spans.
    fn span_for_position(&self, _lane_count: usize, _position: usize) -> usize {
        1
    }
}

/// The simplest lane policy: position modulo lane count, span always 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoundRobin;

impl LanePolicy for RoundRobin {
    fn lane_for_position(
        &self,
        lane_count: usize,
        position: usize,
        _direction: Direction,
    ) -> LaneSpan {
        LaneSpan::single(position % lane_count.max(1))
    }
}

/// Capability surface the generic fill driver invokes on the controller.
pub trait LayoutPolicy {
    /// Measure the item at `position`, constraining it to the lane-axis
    /// space reserved for its lanes.
    fn measure_child(&self, position: usize, source: &dyn ItemSource) -> Size;

    /// Whether a measured size honors the lane constraint (the lane-axis
    /// extent must exactly fill the spanned lanes).
    fn check_layout_params(&self, position: usize, measured: Size) -> bool;

    /// Place the item and commit its frame to the spanned lanes.
    ///
    /// Returns `None` when no tracker is available (degraded pass).
    /// Frames of items pending removal are computed but not committed.
    fn layout_child(
        &mut self,
        position: usize,
        measured: Size,
        direction: Direction,
        is_removed: bool,
    ) -> Option<Rect>;

    /// Pop an item's placed frame off its spanned lanes.
    ///
    /// `frame` is the item's current on-screen bounds, not a recomputed
    /// frame: the item already has an authoritative position.
    fn detach_child(&mut self, position: usize, frame: &Rect, direction: Direction);

    /// Whether the fill loop may place another item toward `direction`
    /// before reaching the pixel `limit`.
    fn can_add_more_views(&self, direction: Direction, limit: i32) -> bool;
}

// ---------------------------------------------------------------------------
// Controller state
// ---------------------------------------------------------------------------

/// A re-anchor request: re-establish layout at an item position with the
/// given scroll-axis pixel offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    /// Item position whose frame should start at `offset`.
    pub position: usize,
    /// Scroll-axis pixel offset for the anchored item's leading edge.
    pub offset: i32,
}

/// Outcome of [`FlowGallery::on_layout_children`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutPass {
    /// Geometry was invalid; nothing was laid out.
    Skipped,
    /// The tracker is ready; the fill driver should start at this position.
    Ready { from_position: usize },
}

/// Adapter-change kinds forwarded by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Add,
    Remove,
    Update,
    Move,
}

/// What an adapter change requires of the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The change touches or precedes the visible window; re-layout.
    Relayout,
    /// The change is strictly after the visible window; nothing to do.
    Ignored,
}

/// Lifecycle of a restored lane snapshot.
///
/// `Pending` holds a tracker rebuilt from saved state until the next
/// layout pass consumes it exactly once.
#[derive(Debug, Clone)]
enum RestoreSlot {
    /// No restore has happened.
    Fresh,
    /// A restored tracker awaits the next layout pass.
    Pending(LaneTracker),
    /// A restored tracker was installed as the live tracker.
    Live,
}

impl RestoreSlot {
    fn take_pending(&mut self) -> Option<LaneTracker> {
        match std::mem::replace(self, RestoreSlot::Live) {
            RestoreSlot::Pending(tracker) => Some(tracker),
            previous => {
                *self = previous;
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// FlowGallery
// ---------------------------------------------------------------------------

/// The flow layout controller.
///
/// Exclusively owns the live [`LaneTracker`] and the pending-restore slot;
/// all operations run synchronously on the host's layout callback.
#[derive(Debug)]
pub struct FlowGallery<P: LanePolicy = RoundRobin> {
    orientation: Orientation,
    lane_count: usize,
    policy: P,
    lanes: Option<LaneTracker>,
    restore: RestoreSlot,
    pending_anchor: Option<Anchor>,
}

impl FlowGallery<RoundRobin> {
    /// Create a controller with the round-robin lane policy.
    #[must_use]
    pub fn new(orientation: Orientation, lane_count: usize) -> Self {
        Self::with_policy(orientation, lane_count, RoundRobin)
    }
}

impl<P: LanePolicy> FlowGallery<P> {
    /// Create a controller with a custom lane-assignment policy.
    #[must_use]
    pub fn with_policy(orientation: Orientation, lane_count: usize, policy: P) -> Self {
        Self {
            orientation,
            lane_count,
            policy,
            lanes: None,
            restore: RestoreSlot::Fresh,
            pending_anchor: None,
        }
    }

    // ── Configuration ───────────────────────────────────────────────

    /// Current scroll orientation.
    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Configured lane count.
    #[must_use]
    pub const fn lane_count(&self) -> usize {
        self.lane_count
    }

    /// Change the scroll orientation; takes effect on the next pass.
    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    /// Change the lane count; takes effect on the next pass.
    pub fn set_lane_count(&mut self, lane_count: usize) {
        self.lane_count = lane_count;
    }

    /// The live tracker, if one has been built.
    #[must_use]
    pub fn lanes(&self) -> Option<&LaneTracker> {
        self.lanes.as_ref()
    }

    /// The not-yet-consumed re-anchor request, if any.
    #[must_use]
    pub fn pending_anchor(&self) -> Option<Anchor> {
        self.pending_anchor
    }

    /// Host request: on the next pass, anchor layout at `position` with
    /// the given pixel offset.
    pub fn scroll_to(&mut self, position: usize, offset: i32) {
        self.pending_anchor = Some(Anchor { position, offset });
    }

    /// Lane-axis pixels reserved for an item spanning `span` lanes.
    #[must_use]
    pub fn lane_axis_reserve(&self, span: usize) -> i32 {
        self.lanes
            .as_ref()
            .map_or(0, |lanes| lanes.lane_size() * span as i32)
    }

    // ── Layout state ────────────────────────────────────────────────

    /// Whether the live tracker still matches the configuration and the
    /// container geometry.
    fn can_use_lanes(&self, viewport: &Viewport) -> bool {
        let Some(lanes) = &self.lanes else {
            return false;
        };
        lanes.orientation() == self.orientation
            && lanes.lane_count() == self.lane_count
            && lanes.lane_size() == lane_size_for(viewport, self.orientation, self.lane_count)
    }

    /// Rebuild the tracker iff orientation, lane count, or derived lane
    /// size no longer match the container. Returns whether a rebuild
    /// happened. A rebuild discards all prior lane state and requests
    /// re-anchoring to the first visible item so scroll position survives
    /// the geometry change.
    pub fn ensure_layout_state(&mut self, viewport: &Viewport, window: &Window) -> bool {
        if self.lane_count == 0 || viewport.is_empty() || self.can_use_lanes(viewport) {
            return false;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            lane_count = self.lane_count,
            orientation = ?self.orientation,
            "rebuilding lane tracker"
        );

        self.lanes = Some(LaneTracker::new(self.orientation, viewport, self.lane_count));
        self.request_move_layout(window);
        true
    }

    /// Ask for re-anchoring at the currently-first-visible item, unless a
    /// scroll target is already pending.
    fn request_move_layout(&mut self, window: &Window) {
        if self.pending_anchor.is_some() {
            return;
        }
        let Some(position) = window.first_visible() else {
            return;
        };
        let offset = window.first_frame_start(self.orientation).unwrap_or(0);
        self.pending_anchor = Some(Anchor { position, offset });
    }

    /// Top-level layout entry. See the module docs for the pass order.
    pub fn on_layout_children(&mut self, viewport: &Viewport, window: &Window) -> LayoutPass {
        let restoring = if let Some(tracker) = self.restore.take_pending() {
            #[cfg(feature = "tracing")]
            tracing::debug!(lanes = tracker.lane_count(), "installing restored lane state");
            self.lanes = Some(tracker);
            true
        } else {
            false
        };

        let refreshed = self.ensure_layout_state(viewport, window);

        let Some(lanes) = self.lanes.as_mut() else {
            #[cfg(feature = "tracing")]
            tracing::debug!("no usable lanes; skipping layout pass");
            return LayoutPass::Skipped;
        };

        let (position, offset) = match self.pending_anchor.take() {
            Some(anchor) => (anchor.position, anchor.offset),
            None => (window.first_visible().unwrap_or(0), 0),
        };

        // Only move layout when we're not consuming a restored state:
        // restored lanes already carry the right scroll offsets.
        if position > 0 && (refreshed || !restoring) {
            lanes.reset_at(offset);
        }

        lanes.reset(Direction::Start);

        LayoutPass::Ready {
            from_position: position,
        }
    }

    /// Bracket a speculative scrap-measurement sub-pass: lane state is
    /// snapshotted before the closure and rolled back after, so the
    /// sub-pass never corrupts the authoritative extents. One nesting
    /// level only.
    pub fn layout_scrap<F>(&mut self, scrap_pass: F)
    where
        F: FnOnce(&mut Self),
    {
        if self.lanes.is_none() {
            return;
        }
        if let Some(lanes) = self.lanes.as_mut() {
            lanes.save();
        }
        scrap_pass(self);
        if let Some(lanes) = self.lanes.as_mut() {
            lanes.restore();
        }
    }

    /// Forward a scroll delta to the tracker. Must be applied exactly once
    /// per delta, before any subsequent frame computation.
    pub fn offset_children(&mut self, delta: i32) {
        if let Some(lanes) = self.lanes.as_mut() {
            lanes.offset(delta);
        }
    }

    // ── Adapter updates ─────────────────────────────────────────────

    /// Decide whether an adapter change invalidates the visible window.
    ///
    /// A change whose range intersects or precedes the window requires a
    /// re-layout (positions of visible items may shift); a change strictly
    /// after the last visible position has no visual effect until scrolled
    /// into view.
    pub fn handle_update(
        &self,
        position_start: usize,
        item_count_or_to: usize,
        op: UpdateOp,
        window: &Window,
    ) -> UpdateOutcome {
        let Some(last_visible) = window.last_visible() else {
            return UpdateOutcome::Relayout;
        };

        let range_start = match op {
            UpdateOp::Move => position_start.min(item_count_or_to),
            UpdateOp::Add | UpdateOp::Remove | UpdateOp::Update => position_start,
        };

        if range_start > last_visible {
            UpdateOutcome::Ignored
        } else {
            UpdateOutcome::Relayout
        }
    }

    // ── Save / restore ──────────────────────────────────────────────

    /// Snapshot the live lane state for host persistence.
    #[must_use]
    pub fn save_state(&self) -> GallerySnapshot {
        match &self.lanes {
            Some(lanes) => {
                GallerySnapshot::new(self.orientation, lanes.lane_size(), lanes.lanes().to_vec())
            }
            None => GallerySnapshot::new(self.orientation, 0, Vec::new()),
        }
    }

    /// Stage a snapshot for the next layout pass.
    ///
    /// The snapshot is not installed immediately because the container may
    /// not yet have valid dimensions; it lands in the pending-restore slot
    /// and is consumed exactly once. Snapshots with no lanes or a
    /// non-positive lane size restore nothing.
    pub fn restore_state(&mut self, snapshot: &GallerySnapshot) -> Result<(), SnapshotError> {
        snapshot.validate()?;
        if !snapshot.is_restorable() {
            return Ok(());
        }

        self.orientation = snapshot.orientation;

        // validate() rejected inverted lanes and is_restorable() covered
        // the empty/size cases, so construction succeeds here.
        if let Ok(tracker) = LaneTracker::from_lanes(
            snapshot.orientation,
            snapshot.lanes.clone(),
            snapshot.lane_size,
        ) {
            self.lane_count = tracker.lane_count();
            self.restore = RestoreSlot::Pending(tracker);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// LayoutPolicy implementation
// ---------------------------------------------------------------------------

impl<P: LanePolicy> LayoutPolicy for FlowGallery<P> {
    fn measure_child(&self, position: usize, source: &dyn ItemSource) -> Size {
        let span = self.policy.span_for_position(self.lane_count, position);
        source.measure(position, self.lane_axis_reserve(span))
    }

    fn check_layout_params(&self, position: usize, measured: Size) -> bool {
        let span = self.policy.span_for_position(self.lane_count, position);
        let lane_axis = if self.orientation.is_vertical() {
            measured.width
        } else {
            measured.height
        };
        lane_axis == self.lane_axis_reserve(span)
    }

    fn layout_child(
        &mut self,
        position: usize,
        measured: Size,
        direction: Direction,
        is_removed: bool,
    ) -> Option<Rect> {
        let span = self
            .policy
            .lane_for_position(self.lane_count, position, direction);
        let lanes = self.lanes.as_mut()?;
        debug_assert!(span.end_lane() < lanes.lane_count(), "lane out of range");

        let frame = lanes.child_frame(measured, span, direction);
        if !is_removed {
            for lane in span.lanes() {
                lanes.push_child_frame(&frame, lane, 0, direction);
            }
        }
        Some(frame)
    }

    fn detach_child(&mut self, position: usize, frame: &Rect, direction: Direction) {
        let span = self
            .policy
            .lane_for_position(self.lane_count, position, direction);
        let Some(lanes) = self.lanes.as_mut() else {
            debug_assert!(false, "detach_child without a tracker");
            return;
        };
        for lane in span.lanes() {
            lanes.pop_child_frame(frame, lane, 0, direction);
        }
    }

    fn can_add_more_views(&self, direction: Direction, limit: i32) -> bool {
        let Some(lanes) = &self.lanes else {
            return false;
        };
        match direction {
            Direction::Start => lanes.inner_start() > limit,
            Direction::End => lanes.inner_end() < limit,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
