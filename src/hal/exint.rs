//! Tachometer inputs on external interrupts INT4 (pin 2) and INT5 (pin 3)

use avr_device::atmega2560::{EXINT, PORTE};

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum TachInterrupt {
    /// PE4, board pin 2
    Int4,
    /// PE5, board pin 3
    Int5,
}

impl TachInterrupt {
    fn bit(self) -> u8 {
        match self {
            TachInterrupt::Int4 => 4,
            TachInterrupt::Int5 => 5,
        }
    }
}

/// Owner of the external interrupt unit
pub struct TachInterrupts {
    exint: EXINT,
}

impl TachInterrupts {
    /// Make both tachometer pins pulled-up inputs
    pub fn new(exint: EXINT, porte: PORTE) -> Self {
        let mask = (1 << 4) | (1 << 5);
        unsafe {
            porte.ddre.modify(|r, w| w.bits(r.bits() & !mask));
            porte.porte.modify(|r, w| w.bits(r.bits() | mask));
        }
        Self { exint }
    }

    /// Fire on falling edges of `line`. Registering the same line twice is harmless.
    pub fn listen_falling(&mut self, line: TachInterrupt) {
        let bit = line.bit();
        // ISCn1:ISCn0 = 0b10 selects the falling edge
        let sense_shift = (bit - 4) * 2;
        unsafe {
            self.exint.eicrb.modify(|r, w| {
                w.bits((r.bits() & !(0b11 << sense_shift)) | (0b10 << sense_shift))
            });
            self.exint.eifr.write(|w| w.bits(1 << bit));
            self.exint.eimsk.modify(|r, w| w.bits(r.bits() | (1 << bit)));
        }
    }
}
