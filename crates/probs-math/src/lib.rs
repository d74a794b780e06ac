//! Numerical primitives for the probability engine.

pub mod math;

pub use math::information::*;
pub use math::normalize::*;
pub use math::ratio::*;
pub use math::stable::*;
