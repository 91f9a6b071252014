//! Host-side stand-ins for the board: a PWM channel that records its duty, a direction pin, a
//! simulated microsecond clock and a motor plant that turns delays into tachometer edges.

use core::cell::Cell;
use core::convert::Infallible;
use std::vec::Vec;

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::OutputPin;
use embedded_hal::PwmPin;

use crate::config::TACH_RPM_NUMERATOR;
use crate::drivers::Tachometer;
use crate::hal::PulseClock;
use crate::logger::{Event, EventSink};

pub struct RecordingPwm<'a> {
    duty: &'a Cell<u16>,
    enabled: bool,
}

impl<'a> RecordingPwm<'a> {
    pub fn new(duty: &'a Cell<u16>) -> Self {
        Self {
            duty,
            enabled: false,
        }
    }
}

impl PwmPin for RecordingPwm<'_> {
    type Duty = u16;

    fn disable(&mut self) {
        self.enabled = false;
    }

    fn enable(&mut self) {
        self.enabled = true;
    }

    fn get_duty(&self) -> u16 {
        self.duty.get()
    }

    fn get_max_duty(&self) -> u16 {
        255
    }

    fn set_duty(&mut self, duty: u16) {
        self.duty.set(duty);
    }
}

#[derive(Default)]
pub struct LevelPin {
    pub high: bool,
}

impl OutputPin for LevelPin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Infallible> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.high = true;
        Ok(())
    }
}

#[derive(Default)]
pub struct SimClock {
    now_us: Cell<u32>,
}

impl SimClock {
    pub fn set(&self, us: u32) {
        self.now_us.set(us);
    }
}

impl PulseClock for SimClock {
    fn micros(&self) -> u32 {
        self.now_us.get()
    }
}

/// First-order motor: tachometer RPM proportional to the drive, `rpm_per_step` per duty step
/// below full-off. Each delay advances the clock and fires the edges the shaft would produce.
pub struct Plant<'a> {
    pub tach: &'a Tachometer,
    pub clock: &'a SimClock,
    pub duty: &'a Cell<u16>,
    pub rpm_per_step: u32,
    last_edge_us: Cell<Option<u32>>,
    delays: Cell<u32>,
}

impl<'a> Plant<'a> {
    pub fn new(
        tach: &'a Tachometer,
        clock: &'a SimClock,
        duty: &'a Cell<u16>,
        rpm_per_step: u32,
    ) -> Self {
        Self {
            tach,
            clock,
            duty,
            rpm_per_step,
            last_edge_us: Cell::new(None),
            delays: Cell::new(0),
        }
    }

    pub fn rpm(&self) -> u32 {
        255u32.saturating_sub(self.duty.get() as u32) * self.rpm_per_step
    }

    pub fn delays(&self) -> u32 {
        self.delays.get()
    }
}

impl DelayMs<u16> for Plant<'_> {
    fn delay_ms(&mut self, ms: u16) {
        self.delays.set(self.delays.get() + 1);
        let start = self.clock.micros();
        let end = start + ms as u32 * 1_000;

        let rpm = self.rpm();
        if rpm == 0 {
            self.last_edge_us.set(None);
            self.clock.set(end);
            return;
        }

        let interval = TACH_RPM_NUMERATOR / rpm;
        let mut next = match self.last_edge_us.get() {
            Some(last) => (last + interval).max(start),
            None => start + interval,
        };
        while next <= end {
            self.clock.set(next);
            self.tach.on_edge(self.clock);
            self.last_edge_us.set(Some(next));
            next += interval;
        }
        self.clock.set(end);
    }
}

impl EventSink for Vec<Event> {
    fn record(&mut self, event: Event) {
        self.push(event);
    }
}

/// `ufmt` sink collecting text
#[derive(Default)]
pub struct TextBuffer(pub std::string::String);

impl ufmt::uWrite for TextBuffer {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
        self.0.push_str(s);
        Ok(())
    }
}
