#![forbid(unsafe_code)]

//! Core primitives shared by the arbor crates.

pub mod geometry;
#[cfg(feature = "tracing-subscriber")]
pub mod logging;

pub use geometry::Rect;
