//! # Control Algorithms
//!
//! Closed-loop drive of a disc motor from tachometer feedback.
//!
//! ## Modules
//!
//! - [`quantizer`] - Rotation count to disc position in eighths of a revolution.
//! - [`speed`] - Proportional RPM regulation.
//! - [`seek`] - Fixed-power position seeking.

pub mod quantizer;
pub mod seek;
pub mod speed;

pub use quantizer::{disc_position, quantize, Position};
pub use seek::PositionSeeker;
pub use speed::SpeedController;

/// Failure of a blocking control operation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// Driving the direction pin failed
    Pin(E),
    /// The configured iteration budget ran out before the target was reached
    DidNotConverge { iterations: u32 },
}
