#![forbid(unsafe_code)]

//! Geometry primitives shared by the flowlane layout crates.

pub mod geometry;

pub use geometry::{Rect, Sides, Size};
