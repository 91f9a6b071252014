//! Timer0 as the system microsecond clock.
//!
//! Timer0 runs in normal mode with a /64 prescaler: one tick is 4µs at 16MHz and the 8-bit counter
//! overflows every 1024µs. The overflow interrupt extends the count in software.

use core::cell::Cell;

use avr_device::atmega2560::TC0;
use critical_section::Mutex;
use embedded_hal::blocking::delay::DelayMs;

use crate::config::CPU_FREQ_HZ;
use crate::hal::PulseClock;

const PRESCALER: u32 = 64;
const US_PER_TICK: u32 = PRESCALER * 1_000_000 / CPU_FREQ_HZ;

static OVERFLOWS: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));

#[derive(Clone, Copy)]
pub struct Timer0Clock;

impl Timer0Clock {
    /// Start Timer0 and its overflow interrupt. Interrupts must be enabled separately.
    pub fn start(tc0: TC0) -> Self {
        unsafe {
            tc0.tccr0a.write(|w| w.bits(0x00)); // normal mode
            tc0.tcnt0.write(|w| w.bits(0));
            tc0.tccr0b.write(|w| w.bits(0x03)); // clk/64
            tc0.timsk0.write(|w| w.bits(0x01)); // TOIE0
        }
        Self
    }

    /// Count one Timer0 overflow. Call from the `TIMER0_OVF` interrupt.
    pub fn on_overflow() {
        critical_section::with(|cs| {
            let counter = OVERFLOWS.borrow(cs);
            counter.set(counter.get().wrapping_add(1));
        });
    }
}

impl PulseClock for Timer0Clock {
    fn micros(&self) -> u32 {
        critical_section::with(|cs| {
            let tc0 = unsafe { &*TC0::ptr() };
            let mut overflows = OVERFLOWS.borrow(cs).get();
            let ticks = tc0.tcnt0.read().bits();

            // Overflow pending but not yet serviced
            if tc0.tifr0.read().bits() & 0x01 != 0 && ticks < 255 {
                overflows = overflows.wrapping_add(1);
            }

            ((overflows << 8) | ticks as u32).wrapping_mul(US_PER_TICK)
        })
    }
}

/// Busy-wait delay on top of the Timer0 clock
#[derive(Clone, Copy)]
pub struct Timer0Delay {
    clock: Timer0Clock,
}

impl Timer0Delay {
    pub fn new(clock: Timer0Clock) -> Self {
        Self { clock }
    }
}

impl DelayMs<u16> for Timer0Delay {
    fn delay_ms(&mut self, ms: u16) {
        let start = self.clock.micros();
        let wait = ms as u32 * 1_000;
        while self.clock.micros().wrapping_sub(start) < wait {}
    }
}
