//! Fair value gap detection
//!
//! A fair value gap is the untested interval left by a three-candle displacement:
//! the third candle's extreme does not overlap the first candle's opposite extreme,
//! and the middle candle closes beyond that extreme with a body move larger than
//! the calibration threshold.
//!
//! - [`helpers`]: bar delta percent and adaptive threshold estimation
//! - [`fvg`]: the [`FairValueGapDetector`] itself

pub mod fvg;
pub mod helpers;

pub use fvg::*;
pub use helpers::*;
