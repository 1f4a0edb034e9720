//! Position tracking: the single live position of a run.

pub mod tracker;

pub use tracker::PositionTracker;
