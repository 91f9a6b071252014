//! Relative position seeking at fixed power.
//!
//! The seeker drives at a constant ±50% until the quantized position equals the target. There is
//! no deceleration, so a fast disc can cross a whole eighth between two polls and never see the
//! target; [`SeekStop::Passed`] stops on crossing instead.

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::OutputPin;
use embedded_hal::PwmPin;

use crate::config::{MotorConfig, SeekStop};
use crate::control::quantizer::{disc_position, Position};
use crate::control::Error;
use crate::drivers::Motor;
use crate::logger::{eighths, Event, EventSink};

#[derive(Clone, Copy, Debug)]
pub struct PositionSeeker {
    config: MotorConfig,
}

impl PositionSeeker {
    pub fn new(config: MotorConfig) -> Self {
        Self { config }
    }

    /// Current quantized disc position of `motor`
    pub fn position<DIR, PWM>(&self, motor: &Motor<'_, DIR, PWM>) -> Position
    where
        DIR: OutputPin,
        PWM: PwmPin<Duty = u16>,
    {
        disc_position(motor.rotations())
    }

    fn arrived(&self, current: f32, target: f32, forward: bool) -> bool {
        if current == target {
            return true;
        }
        match self.config.seek_stop {
            SeekStop::Exact => false,
            SeekStop::Passed if forward => current >= target,
            SeekStop::Passed => current <= target,
        }
    }

    /// Move the disc by `offset_revolutions` from where it is now, then stop the motor.
    /// Returns the position the disc stopped at.
    pub fn seek_relative<DIR, PWM, D, L>(
        &self,
        motor: &mut Motor<'_, DIR, PWM>,
        delay: &mut D,
        log: &mut L,
        offset_revolutions: f32,
    ) -> Result<Position, Error<DIR::Error>>
    where
        DIR: OutputPin,
        PWM: PwmPin<Duty = u16>,
        D: DelayMs<u16>,
        L: EventSink,
    {
        let start = self.position(motor);
        let target = start.revolutions() + offset_revolutions;
        let forward = target > start.revolutions();
        log.record(Event::SeekStart {
            current: start.eighths(),
            target: eighths(target),
        });

        let mut iteration = 0u32;
        loop {
            let current = self.position(motor);
            let current_revs = current.revolutions();

            if self.arrived(current_revs, target, forward) {
                motor.stop();
                log.record(Event::Arrived {
                    position: current.eighths(),
                });
                return Ok(current);
            }

            if self.config.exhausted(iteration) {
                motor.stop();
                log.record(Event::DidNotConverge {
                    iterations: iteration,
                });
                return Err(Error::DidNotConverge {
                    iterations: iteration,
                });
            }

            log.record(Event::SeekStep {
                current: current.eighths(),
                target: eighths(target),
            });

            let power = if target > current_revs {
                self.config.seek_power_percent
            } else {
                -self.config.seek_power_percent
            };
            motor.run_motor(power).map_err(Error::Pin)?;

            delay.delay_ms(self.config.poll_interval_ms);
            iteration += 1;
        }
    }

    /// Seek back to position zero
    pub fn seek_to_zero<DIR, PWM, D, L>(
        &self,
        motor: &mut Motor<'_, DIR, PWM>,
        delay: &mut D,
        log: &mut L,
    ) -> Result<Position, Error<DIR::Error>>
    where
        DIR: OutputPin,
        PWM: PwmPin<Duty = u16>,
        D: DelayMs<u16>,
        L: EventSink,
    {
        let offset = -self.position(motor).revolutions();
        self.seek_relative(motor, delay, log, offset)
    }
}
