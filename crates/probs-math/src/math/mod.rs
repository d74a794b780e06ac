//! Core math modules.

pub mod information;
pub mod normalize;
pub mod ratio;
pub mod stable;
