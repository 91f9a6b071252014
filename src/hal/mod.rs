//! Board support for the sculpture controller.
//!
//! [`PulseClock`] is the only piece the control code needs; the register-level drivers below it
//! only exist on the AVR target.

pub mod clock;

#[cfg(target_arch = "avr")]
pub mod exint;
#[cfg(target_arch = "avr")]
pub mod gpio;
#[cfg(target_arch = "avr")]
pub mod pwm;
#[cfg(target_arch = "avr")]
pub mod timer;
#[cfg(target_arch = "avr")]
pub mod uart;

pub use clock::PulseClock;

#[cfg(target_arch = "avr")]
pub use exint::{TachInterrupt, TachInterrupts};
#[cfg(target_arch = "avr")]
pub use gpio::DirectionPin;
#[cfg(target_arch = "avr")]
pub use pwm::{Pwm, PwmChannel, PwmOutput};
#[cfg(target_arch = "avr")]
pub use timer::{Timer0Clock, Timer0Delay};
#[cfg(target_arch = "avr")]
pub use uart::Uart;
