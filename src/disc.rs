//! One sculpture disc: a motor plus everything its control loops need.
//!
//! `Disc` owns its motor, delay, clock and log sink outright and forwards calls to the
//! controllers, so the main loop deals in disc speeds and positions only.

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::OutputPin;
use embedded_hal::PwmPin;

use crate::config::{board, MotorConfig};
use crate::control::{Error, Position, PositionSeeker, SpeedController};
use crate::drivers::Motor;
use crate::hal::PulseClock;
use crate::logger::{Event, EventSink};

/// Which disc of the sculpture
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiscSide {
    /// Front disc, left motor
    Front,
    /// Back disc, right motor
    Back,
}

impl DiscSide {
    pub fn direction_pin(self) -> u8 {
        match self {
            DiscSide::Front => board::FRONT_DIRECTION_PIN,
            DiscSide::Back => board::BACK_DIRECTION_PIN,
        }
    }

    pub fn tach_pin(self) -> u8 {
        match self {
            DiscSide::Front => board::FRONT_TACH_PIN,
            DiscSide::Back => board::BACK_TACH_PIN,
        }
    }

    pub fn log_prefix(self) -> &'static str {
        match self {
            DiscSide::Front => "L",
            DiscSide::Back => "R",
        }
    }
}

pub struct Disc<'t, DIR, PWM, D, C, L> {
    side: DiscSide,
    motor: Motor<'t, DIR, PWM>,
    delay: D,
    clock: C,
    log: L,
    speed: SpeedController,
    seeker: PositionSeeker,
}

impl<'t, DIR, PWM, D, C, L> Disc<'t, DIR, PWM, D, C, L>
where
    DIR: OutputPin,
    PWM: PwmPin<Duty = u16>,
    D: DelayMs<u16>,
    C: PulseClock,
    L: EventSink,
{
    pub fn new(
        side: DiscSide,
        mut motor: Motor<'t, DIR, PWM>,
        delay: D,
        clock: C,
        log: L,
        config: MotorConfig,
    ) -> Self {
        motor.setup_motor();
        Self {
            side,
            motor,
            delay,
            clock,
            log,
            speed: SpeedController::new(config),
            seeker: PositionSeeker::new(config),
        }
    }

    #[inline]
    pub fn side(&self) -> DiscSide {
        self.side
    }

    /// Tachometer pin whose interrupt feeds this disc
    #[inline]
    pub fn tach_pin(&self) -> u8 {
        self.side.tach_pin()
    }

    pub fn motor(&self) -> &Motor<'t, DIR, PWM> {
        &self.motor
    }

    pub fn motor_mut(&mut self) -> &mut Motor<'t, DIR, PWM> {
        &mut self.motor
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    /// Regulate to `desired_rpm` disc RPM (clamped to ±30). Blocks until reached.
    pub fn update_rpm(&mut self, desired_rpm: f32) -> Result<u32, Error<DIR::Error>> {
        self.speed.regulate(
            &mut self.motor,
            &mut self.delay,
            &self.clock,
            &mut self.log,
            desired_rpm,
        )
    }

    pub fn rotations_per_minute(&self) -> u32 {
        self.motor.rotations_per_minute()
    }

    pub fn run_disc(&mut self, percent: f32) -> Result<(), Error<DIR::Error>> {
        self.motor.run_motor(percent).map_err(Error::Pin)
    }

    pub fn turn_on_motor(&mut self) {
        self.motor.turn_on_motor();
    }

    pub fn turn_off_motor(&mut self) {
        self.motor.turn_off_motor();
    }

    pub fn position(&self) -> Position {
        self.seeker.position(&self.motor)
    }

    /// Log the current position and return it
    pub fn report_position(&mut self) -> Position {
        let position = self.position();
        self.log.record(Event::Position {
            side: self.side,
            position: position.eighths(),
        });
        position
    }

    pub fn seek_relative(&mut self, offset_revolutions: f32) -> Result<Position, Error<DIR::Error>> {
        self.seeker.seek_relative(
            &mut self.motor,
            &mut self.delay,
            &mut self.log,
            offset_revolutions,
        )
    }

    /// Seek back to the position origin
    pub fn set_to_start_position(&mut self) -> Result<Position, Error<DIR::Error>> {
        self.seeker
            .seek_to_zero(&mut self.motor, &mut self.delay, &mut self.log)
    }

    /// Make the current rotation count the new position origin
    pub fn rezero(&mut self) {
        let rotations = self.motor.rezero();
        self.log.record(Event::Rezeroed { rotations });
    }
}
