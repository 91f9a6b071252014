//! Motor direction outputs on port J

use core::convert::Infallible;
use core::marker::PhantomData;

use avr_device::atmega2560::PORTJ;
use embedded_hal::digital::v2::OutputPin;

/// Direction output on PORTJ bit `BIT`
pub struct DirectionPin<const BIT: u8> {
    _port: PhantomData<PORTJ>,
}

/// Board pin 14: back disc direction
pub type BackDirection = DirectionPin<1>;
/// Board pin 15: front disc direction
pub type FrontDirection = DirectionPin<0>;

/// Configure both direction pins as outputs, driven low
pub fn direction_pins(portj: PORTJ) -> (BackDirection, FrontDirection) {
    let mask = (1 << 1) | (1 << 0);
    unsafe {
        portj.portj.modify(|r, w| w.bits(r.bits() & !mask));
        portj.ddrj.modify(|r, w| w.bits(r.bits() | mask));
    }
    (
        DirectionPin { _port: PhantomData },
        DirectionPin { _port: PhantomData },
    )
}

impl<const BIT: u8> OutputPin for DirectionPin<BIT> {
    type Error = Infallible;

    #[inline]
    fn set_low(&mut self) -> Result<(), Infallible> {
        critical_section::with(|_| unsafe {
            (*PORTJ::ptr()).portj.modify(|r, w| w.bits(r.bits() & !(1 << BIT)));
        });
        Ok(())
    }

    #[inline]
    fn set_high(&mut self) -> Result<(), Infallible> {
        critical_section::with(|_| unsafe {
            (*PORTJ::ptr()).portj.modify(|r, w| w.bits(r.bits() | (1 << BIT)));
        });
        Ok(())
    }
}
