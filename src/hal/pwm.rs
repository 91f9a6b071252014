//! Motor PWM on Timer1.
//!
//! Timer1 runs 8-bit phase correct PWM without prescaling (~31kHz, above hearing range). The motor
//! drivers are active low, so the duty written here is already inverted by the motor layer.

use avr_device::atmega2560::{PORTB, TC1};
use embedded_hal::PwmPin;

/// Timer1 compare outputs wired to the motor drivers
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum PwmChannel {
    /// OC1A, PB5, board pin 11
    Timer1A,
    /// OC1B, PB6, board pin 12
    Timer1B,
}

impl PwmChannel {
    fn port_bit(self) -> u8 {
        match self {
            PwmChannel::Timer1A => 5,
            PwmChannel::Timer1B => 6,
        }
    }

    fn compare_output_mask(self) -> u8 {
        match self {
            PwmChannel::Timer1A => 0x80, // COM1A1
            PwmChannel::Timer1B => 0x20, // COM1B1
        }
    }
}

/// Timer1 configured for motor drive
pub struct Pwm {
    _tc1: TC1,
}

impl Pwm {
    pub fn new(tc1: TC1) -> Self {
        unsafe {
            tc1.tccr1a.write(|w| w.bits(0x01)); // WGM10: phase correct, 8-bit
            tc1.tccr1b.write(|w| w.bits(0x01)); // CS10: clk/1
            tc1.ocr1a.write(|w| w.bits(255));
            tc1.ocr1b.write(|w| w.bits(255));
        }
        Self { _tc1: tc1 }
    }

    /// Split off both channels, configuring their pins as outputs
    pub fn split(self, portb: PORTB) -> (PwmOutput, PwmOutput) {
        let mask = (1 << PwmChannel::Timer1A.port_bit()) | (1 << PwmChannel::Timer1B.port_bit());
        unsafe {
            portb.ddrb.modify(|r, w| w.bits(r.bits() | mask));
        }
        (
            PwmOutput {
                channel: PwmChannel::Timer1A,
            },
            PwmOutput {
                channel: PwmChannel::Timer1B,
            },
        )
    }
}

/// One Timer1 compare channel
pub struct PwmOutput {
    channel: PwmChannel,
}

impl PwmPin for PwmOutput {
    type Duty = u16;

    fn disable(&mut self) {
        let mask = self.channel.compare_output_mask();
        unsafe {
            (*TC1::ptr()).tccr1a.modify(|r, w| w.bits(r.bits() & !mask));
        }
    }

    fn enable(&mut self) {
        let mask = self.channel.compare_output_mask();
        unsafe {
            (*TC1::ptr()).tccr1a.modify(|r, w| w.bits(r.bits() | mask));
        }
    }

    fn get_duty(&self) -> u16 {
        unsafe {
            match self.channel {
                PwmChannel::Timer1A => (*TC1::ptr()).ocr1a.read().bits(),
                PwmChannel::Timer1B => (*TC1::ptr()).ocr1b.read().bits(),
            }
        }
    }

    fn get_max_duty(&self) -> u16 {
        255
    }

    fn set_duty(&mut self, duty: u16) {
        let duty = duty.min(255);
        unsafe {
            match self.channel {
                PwmChannel::Timer1A => (*TC1::ptr()).ocr1a.write(|w| w.bits(duty)),
                PwmChannel::Timer1B => (*TC1::ptr()).ocr1b.write(|w| w.bits(duty)),
            }
        }
    }
}
