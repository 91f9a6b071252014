//! USART0 trace console (board USB serial)

use core::convert::Infallible;

use avr_device::atmega2560::USART0;
use embedded_hal::serial;

use crate::config::{CPU_FREQ_HZ, UART_BAUD};

// Double-speed mode: UBRR = f_cpu / (8 * baud) - 1
const UBRR: u16 = (CPU_FREQ_HZ / (8 * UART_BAUD) - 1) as u16;

pub struct Uart {
    usart: USART0,
}

impl Uart {
    pub fn new(usart: USART0) -> Self {
        unsafe {
            usart.ubrr0.write(|w| w.bits(UBRR));
            usart.ucsr0a.write(|w| w.bits(0x02)); // U2X0
            usart.ucsr0c.write(|w| w.bits(0x06)); // 8N1
            usart.ucsr0b.write(|w| w.bits(0x18)); // RXEN0 | TXEN0
        }
        Self { usart }
    }

    pub fn write_byte(&mut self, byte: u8) {
        let _ = nb::block!(serial::Write::write(self, byte));
    }
}

impl serial::Write<u8> for Uart {
    type Error = Infallible;

    fn write(&mut self, byte: u8) -> nb::Result<(), Infallible> {
        // UDRE0: transmit buffer empty
        if self.usart.ucsr0a.read().bits() & 0x20 == 0 {
            return Err(nb::Error::WouldBlock);
        }
        unsafe {
            self.usart.udr0.write(|w| w.bits(byte));
        }
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Infallible> {
        // TXC0: transmit complete
        if self.usart.ucsr0a.read().bits() & 0x40 == 0 {
            Err(nb::Error::WouldBlock)
        } else {
            Ok(())
        }
    }
}

impl ufmt::uWrite for Uart {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
        for byte in s.bytes() {
            self.write_byte(byte);
        }
        Ok(())
    }
}
