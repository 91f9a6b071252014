//! DC motor with direction pin, inverted PWM drive and tachometer feedback

use embedded_hal::digital::v2::OutputPin;
use embedded_hal::PwmPin;

use crate::config::{DUTY_FULL_OFF, DUTY_FULL_ON, MAX_POWER_PERCENT};
use crate::drivers::tachometer::{TachState, Tachometer};

/// Spin direction, as driven onto the direction pin (high = forward)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    /// Direction for a signed power request; zero counts as forward
    #[inline]
    pub fn of_percent(percent: f32) -> Self {
        if percent < 0.0 {
            Direction::Reverse
        } else {
            Direction::Forward
        }
    }
}

/// Clamp a power request to [-100, 100]. A non-finite request means off.
#[inline]
pub fn clamp_percent(percent: f32) -> f32 {
    if !percent.is_finite() {
        return 0.0;
    }
    percent.clamp(-MAX_POWER_PERCENT, MAX_POWER_PERCENT)
}

/// Convert a signed power percentage into the inverted 8-bit duty (0 = full on, 255 = off)
pub fn to_duty(percent: f32) -> u16 {
    let magnitude = clamp_percent(percent).abs();
    (255.0 - 255.0 * magnitude / MAX_POWER_PERCENT) as u16
}

/// One disc motor.
///
/// The tachometer is shared with the pin's edge interrupt; everything else is owned here.
pub struct Motor<'t, DIR, PWM> {
    direction_pin: DIR,
    pwm: PWM,
    tach: &'t Tachometer,
    percentage: f32,
    direction: Direction,
    /// Rotation count treated as the origin of positions
    zero_rotations: i32,
}

impl<'t, DIR, PWM> Motor<'t, DIR, PWM>
where
    DIR: OutputPin,
    PWM: PwmPin<Duty = u16>,
{
    /// Take ownership of the pins and leave the motor switched off
    pub fn new(direction_pin: DIR, pwm: PWM, tach: &'t Tachometer) -> Self {
        let mut motor = Self {
            direction_pin,
            pwm,
            tach,
            percentage: 0.0,
            direction: Direction::Forward,
            zero_rotations: 0,
        };
        motor.setup_motor();
        motor
    }

    /// Enable the PWM channel with the output forced off. Safe to call repeatedly.
    pub fn setup_motor(&mut self) {
        self.pwm.enable();
        self.pwm.set_duty(DUTY_FULL_OFF);
    }

    /// Drive at `percent` power right away, no feedback. Positive spins forward.
    pub fn run_motor(&mut self, percent: f32) -> Result<(), DIR::Error> {
        let percent = clamp_percent(percent);
        let direction = Direction::of_percent(percent);

        match direction {
            Direction::Forward => self.direction_pin.set_high()?,
            Direction::Reverse => self.direction_pin.set_low()?,
        }
        self.direction = direction;
        self.tach.latch_direction(direction);

        self.pwm.set_duty(to_duty(percent));
        self.percentage = percent;
        Ok(())
    }

    pub fn turn_on_motor(&mut self) {
        self.pwm.set_duty(DUTY_FULL_ON);
    }

    /// Cut the drive. The recorded percentage is left as it was.
    pub fn turn_off_motor(&mut self) {
        self.pwm.set_duty(DUTY_FULL_OFF);
    }

    /// Cut the drive and record zero power
    pub fn stop(&mut self) {
        self.turn_off_motor();
        self.percentage = 0.0;
    }

    pub fn increase_percentage(&mut self, step: f32) -> Result<(), DIR::Error> {
        if self.percentage < MAX_POWER_PERCENT {
            self.run_motor(self.percentage + step)?;
        }
        Ok(())
    }

    pub fn decrease_percentage(&mut self, step: f32) -> Result<(), DIR::Error> {
        if self.percentage > -MAX_POWER_PERCENT {
            self.run_motor(self.percentage - step)?;
        }
        Ok(())
    }

    /// Latest instantaneous tachometer RPM (unsigned)
    pub fn rotations_per_minute(&self) -> u32 {
        self.tach.snapshot().rpm()
    }

    #[inline]
    pub fn percentage(&self) -> f32 {
        self.percentage
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn tach_state(&self) -> TachState {
        self.tach.snapshot()
    }

    /// Motor rotations counted since the last re-zero
    pub fn rotations(&self) -> i32 {
        self.tach
            .snapshot()
            .rotations()
            .wrapping_sub(self.zero_rotations)
    }

    /// Make the current rotation count the position origin
    pub fn rezero(&mut self) -> i32 {
        self.zero_rotations = self.tach.snapshot().rotations();
        self.zero_rotations
    }
}
