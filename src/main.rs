#![cfg_attr(target_arch = "avr", no_std)]
#![cfg_attr(target_arch = "avr", no_main)]
#![cfg_attr(target_arch = "avr", feature(abi_avr_interrupt))]

#[cfg(target_arch = "avr")]
mod firmware {
    use core::cell::RefCell;

    use avr_device::atmega2560::Peripherals;
    use embedded_hal::blocking::delay::DelayMs;
    use panic_halt as _;

    use kinetic_sculpture::config::SeekStop;
    use kinetic_sculpture::hal::gpio::direction_pins;
    use kinetic_sculpture::hal::{
        Pwm, TachInterrupt, TachInterrupts, Timer0Clock, Timer0Delay, Uart,
    };
    use kinetic_sculpture::logger::{Event, EventSink, Level, SerialLogger};
    use kinetic_sculpture::{Disc, DiscSide, Motor, MotorConfig, Tachometer};

    // Tachometer state shared with the edge interrupts
    static BACK_TACH: Tachometer = Tachometer::new();
    static FRONT_TACH: Tachometer = Tachometer::new();

    /// Disc speeds (back, front) the sculpture cycles through
    const PROGRAM: [(f32, f32); 4] = [(10.0, -10.0), (20.0, 20.0), (-15.0, 5.0), (0.0, 0.0)];

    const HOLD_MS: u16 = 5_000;

    #[avr_device::interrupt(atmega2560)]
    fn TIMER0_OVF() {
        Timer0Clock::on_overflow();
    }

    #[avr_device::interrupt(atmega2560)]
    fn INT4() {
        BACK_TACH.on_edge(&Timer0Clock);
    }

    #[avr_device::interrupt(atmega2560)]
    fn INT5() {
        FRONT_TACH.on_edge(&Timer0Clock);
    }

    /// Both discs log to the one console
    struct Console<'a>(&'a RefCell<SerialLogger<Uart>>);

    impl EventSink for Console<'_> {
        fn record(&mut self, event: Event) {
            self.0.borrow_mut().record(event);
        }
    }

    #[avr_device::entry]
    fn main() -> ! {
        let Some(dp) = Peripherals::take() else {
            loop {}
        };

        let clock = Timer0Clock::start(dp.TC0);
        let mut hold = Timer0Delay::new(clock);

        let level = if cfg!(feature = "debug") {
            Level::Debug
        } else {
            Level::Info
        };
        let console = RefCell::new(SerialLogger::new(Uart::new(dp.USART0), level));

        let (back_pwm, front_pwm) = Pwm::new(dp.TC1).split(dp.PORTB);
        let (back_dir, front_dir) = direction_pins(dp.PORTJ);

        let config = MotorConfig::default()
            .with_max_iterations(600)
            .with_seek_stop(SeekStop::Passed)
            .with_stall_timeout_us(250_000);

        let mut back = Disc::new(
            DiscSide::Back,
            Motor::new(back_dir, back_pwm, &BACK_TACH),
            Timer0Delay::new(clock),
            clock,
            Console(&console),
            config,
        );
        let mut front = Disc::new(
            DiscSide::Front,
            Motor::new(front_dir, front_pwm, &FRONT_TACH),
            Timer0Delay::new(clock),
            clock,
            Console(&console),
            config,
        );

        let mut tach_lines = TachInterrupts::new(dp.EXINT, dp.PORTE);
        tach_lines.listen_falling(TachInterrupt::Int4);
        tach_lines.listen_falling(TachInterrupt::Int5);

        // Enable interrupts globally
        unsafe { avr_device::interrupt::enable() };

        let _ = console.borrow_mut().write_line("Kinetic sculpture v0.1.0");
        back.rezero();
        front.rezero();

        loop {
            for (back_rpm, front_rpm) in PROGRAM {
                // Failures are already on the console; carry on with the program
                let _ = back.update_rpm(back_rpm);
                let _ = front.update_rpm(front_rpm);
                hold.delay_ms(HOLD_MS);
                back.report_position();
                front.report_position();
            }

            let _ = back.set_to_start_position();
            let _ = front.set_to_start_position();
            let _ = back.seek_relative(0.5);
            let _ = front.seek_relative(-0.5);
            hold.delay_ms(HOLD_MS);
        }
    }
}

// The firmware only exists on the ATmega2560; host builds carry the library alone.
#[cfg(not(target_arch = "avr"))]
fn main() {}
