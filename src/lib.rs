//! Disc drive firmware for the kinetic sculpture
//!
//! Two DC motors turn the sculpture's front and back discs. Each motor has a tachometer whose
//! falling edges are timed in interrupt context; the main loop regulates disc speed and seeks
//! disc positions from that feedback.
//!
//! | Module | Purpose |
//! | ------ | ------- |
//! | [`hal`] | Clock trait and ATmega2560 peripherals |
//! | [`drivers`] | Motor output and tachometer sampling |
//! | [`control`] | Speed regulation, position quantization and seeking |
//! | [`disc`] | Disc wrapper owning one motor |
//! | [`logger`] | Serial trace of control events |
//! | [`config`] | Calibration constants and loop tuning |
#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod control;
pub mod disc;
pub mod drivers;
pub mod hal;
pub mod logger;

#[cfg(test)]
pub(crate) mod sim;

pub use config::{MotorConfig, SeekStop};
pub use control::{Error, Position};
pub use disc::{Disc, DiscSide};
pub use drivers::{Direction, Motor, Tachometer};
