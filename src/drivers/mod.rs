pub mod motor;
pub mod tachometer;

pub use motor::{clamp_percent, to_duty, Direction, Motor};
pub use tachometer::{rpm_from_interval, RotationCounter, TachState, Tachometer};
