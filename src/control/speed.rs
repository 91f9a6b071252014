//! Closed-loop disc speed regulation.
//!
//! A pure proportional loop: every poll the power changes by the tachometer RPM error divided by
//! a fixed gain. There is no integral or derivative term and, unless a minimum kick is
//! configured, nothing to break static friction, so a motor resting at 0% with a small error can
//! crawl for a long time before it turns.

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::OutputPin;
use embedded_hal::PwmPin;

use crate::config::{
    MotorConfig, DISC_TO_TACH_SCALE, MAX_DISC_RPM, PROPORTIONAL_DIVISOR, TACH_TOLERANCE_RPM,
};
use crate::control::Error;
use crate::drivers::{Direction, Motor};
use crate::hal::PulseClock;
use crate::logger::{centi, Event, EventSink};

/// Clamp a disc speed request to what the motors can reach. A non-finite request means stop.
#[inline]
pub fn clamp_disc_rpm(desired_disc_rpm: f32) -> f32 {
    if !desired_disc_rpm.is_finite() {
        return 0.0;
    }
    desired_disc_rpm.clamp(-MAX_DISC_RPM, MAX_DISC_RPM)
}

/// Tachometer RPM target for a disc speed request
#[inline]
pub fn tach_target(desired_disc_rpm: f32) -> f32 {
    clamp_disc_rpm(desired_disc_rpm) * DISC_TO_TACH_SCALE
}

/// True when `measured` lies in the tolerance band around `target`
#[inline]
pub fn in_band(measured: f32, target: f32) -> bool {
    measured >= target - TACH_TOLERANCE_RPM && measured <= target + TACH_TOLERANCE_RPM
}

/// Drives a motor towards a disc RPM using tachometer feedback
#[derive(Clone, Copy, Debug)]
pub struct SpeedController {
    config: MotorConfig,
}

impl SpeedController {
    pub fn new(config: MotorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MotorConfig {
        &self.config
    }

    /// Signed tachometer RPM: the sampler only sees pulse spacing, the sign comes from the
    /// direction the motor is being driven.
    pub fn measured_rpm<DIR, PWM, C>(&self, motor: &Motor<'_, DIR, PWM>, clock: &C) -> f32
    where
        DIR: OutputPin,
        PWM: PwmPin<Duty = u16>,
        C: PulseClock,
    {
        let rpm = motor
            .tach_state()
            .rpm_at(clock.micros(), self.config.stall_timeout_us) as f32;
        match motor.direction() {
            Direction::Forward => rpm,
            Direction::Reverse => -rpm,
        }
    }

    /// Block until the motor turns at `desired_disc_rpm` (clamped to ±30), polling the tachometer
    /// every poll interval. Returns the number of polls taken.
    ///
    /// Without an iteration budget this never returns if the speed cannot be reached.
    pub fn regulate<DIR, PWM, D, C, L>(
        &self,
        motor: &mut Motor<'_, DIR, PWM>,
        delay: &mut D,
        clock: &C,
        log: &mut L,
        desired_disc_rpm: f32,
    ) -> Result<u32, Error<DIR::Error>>
    where
        DIR: OutputPin,
        PWM: PwmPin<Duty = u16>,
        D: DelayMs<u16>,
        C: PulseClock,
        L: EventSink,
    {
        let target = tach_target(desired_disc_rpm);
        log.record(Event::RegulateStart {
            target_tach_rpm: target as i32,
        });

        let mut iteration = 0u32;
        loop {
            if self.config.exhausted(iteration) {
                log.record(Event::DidNotConverge {
                    iterations: iteration,
                });
                return Err(Error::DidNotConverge {
                    iterations: iteration,
                });
            }

            delay.delay_ms(self.config.poll_interval_ms);
            iteration += 1;

            let measured = self.measured_rpm(motor, clock);
            log.record(Event::RegulateStep {
                iteration,
                measured_rpm: measured as i32,
                power_centi: centi(motor.percentage()),
            });

            if in_band(measured, target) {
                log.record(Event::Converged {
                    iterations: iteration,
                });
                return Ok(iteration);
            }

            if self.kick(motor, target, log)? {
                continue;
            }

            if measured < target {
                motor
                    .increase_percentage((target - measured) / PROPORTIONAL_DIVISOR)
                    .map_err(Error::Pin)?;
            } else if measured > target {
                motor
                    .decrease_percentage((measured - target) / PROPORTIONAL_DIVISOR)
                    .map_err(Error::Pin)?;
            }
        }
    }

    /// Jump a motor sitting at exactly 0% to the configured kick power
    fn kick<DIR, PWM, L>(
        &self,
        motor: &mut Motor<'_, DIR, PWM>,
        target: f32,
        log: &mut L,
    ) -> Result<bool, Error<DIR::Error>>
    where
        DIR: OutputPin,
        PWM: PwmPin<Duty = u16>,
        L: EventSink,
    {
        let Some(kick) = self.config.min_kick_percent else {
            return Ok(false);
        };
        if motor.percentage() != 0.0 || target == 0.0 {
            return Ok(false);
        }

        let power = if target < 0.0 { -kick } else { kick };
        motor.run_motor(power).map_err(Error::Pin)?;
        log.record(Event::Kick {
            power_centi: centi(power),
        });
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::Tachometer;
    use crate::sim::{LevelPin, Plant, RecordingPwm, SimClock};
    use core::cell::Cell;
    use std::vec::Vec;

    #[test]
    fn clamp_law() {
        for desired in [-1000.0, -31.0, -30.0, -12.5, 0.0, 7.0, 30.0, 30.5, 1e9] {
            assert_eq!(clamp_disc_rpm(desired), (-30.0f32).max(desired.min(30.0)));
        }
        assert_eq!(tach_target(10.0), 12_500.0);
        assert_eq!(tach_target(45.0), 37_500.0);
        assert_eq!(tach_target(-45.0), -37_500.0);
        assert_eq!(clamp_disc_rpm(f32::NAN), 0.0);
        assert_eq!(tach_target(f32::INFINITY), 0.0);
    }

    #[test]
    fn non_finite_speed_regulates_to_standstill() {
        let tach = Tachometer::new();
        let clock = SimClock::default();
        let duty = Cell::new(0);
        let mut motor = Motor::new(LevelPin::default(), RecordingPwm::new(&duty), &tach);
        let mut plant = Plant::new(&tach, &clock, &duty, 50);
        let mut events = Vec::new();

        let controller = SpeedController::new(MotorConfig::default().with_max_iterations(10));
        let polls = controller
            .regulate(&mut motor, &mut plant, &clock, &mut events, f32::NAN)
            .unwrap();

        assert_eq!(polls, 1);
        assert_eq!(events[0], Event::RegulateStart { target_tach_rpm: 0 });
        assert_eq!(duty.get(), 255);
    }

    #[test]
    fn tolerance_band() {
        assert!(in_band(12_450.0, 12_500.0));
        assert!(in_band(12_550.0, 12_500.0));
        assert!(!in_band(12_449.0, 12_500.0));
        assert!(!in_band(12_551.0, 12_500.0));
        assert!(in_band(-12_480.0, -12_500.0));
    }

    #[test]
    fn converges_from_standstill() {
        let tach = Tachometer::new();
        let clock = SimClock::default();
        let duty = Cell::new(0);
        let mut motor = Motor::new(LevelPin::default(), RecordingPwm::new(&duty), &tach);
        let mut plant = Plant::new(&tach, &clock, &duty, 50);
        let mut events = Vec::new();

        let controller = SpeedController::new(MotorConfig::default().with_max_iterations(2_000));
        let polls = controller
            .regulate(&mut motor, &mut plant, &clock, &mut events, 10.0)
            .unwrap();

        assert!(polls < 2_000);
        assert_eq!(plant.delays(), polls);
        let rpm = motor.rotations_per_minute() as f32;
        assert!(in_band(rpm, 12_500.0), "settled at {}", rpm);
        assert!(motor.percentage() > 0.0 && motor.percentage() <= 100.0);
        assert_eq!(events.first(), Some(&Event::RegulateStart { target_tach_rpm: 12_500 }));
        assert_eq!(events.last(), Some(&Event::Converged { iterations: polls }));
    }

    #[test]
    fn polls_at_the_configured_interval() {
        let tach = Tachometer::new();
        let clock = SimClock::default();
        let duty = Cell::new(0);
        let mut motor = Motor::new(LevelPin::default(), RecordingPwm::new(&duty), &tach);
        let mut plant = Plant::new(&tach, &clock, &duty, 50);

        let config = MotorConfig::default()
            .with_poll_interval_ms(20)
            .with_max_iterations(5);
        let result =
            SpeedController::new(config).regulate(&mut motor, &mut plant, &clock, &mut (), 10.0);

        assert_eq!(result, Err(Error::DidNotConverge { iterations: 5 }));
        assert_eq!(clock.micros(), 5 * 20_000);
    }

    #[test]
    fn converges_in_reverse() {
        let tach = Tachometer::new();
        let clock = SimClock::default();
        let duty = Cell::new(0);
        let mut motor = Motor::new(LevelPin::default(), RecordingPwm::new(&duty), &tach);
        let mut plant = Plant::new(&tach, &clock, &duty, 50);

        let controller = SpeedController::new(MotorConfig::default().with_max_iterations(2_000));
        controller
            .regulate(&mut motor, &mut plant, &clock, &mut (), -10.0)
            .unwrap();

        assert_eq!(motor.direction(), Direction::Reverse);
        assert!(motor.percentage() < 0.0 && motor.percentage() >= -100.0);
        assert!(in_band(controller.measured_rpm(&motor, &clock), -12_500.0));
        assert!(tach.snapshot().rotations() < 0);
    }

    #[test]
    fn first_poll_is_a_pure_proportional_step() {
        let tach = Tachometer::new();
        let clock = SimClock::default();
        let duty = Cell::new(0);
        let mut motor = Motor::new(LevelPin::default(), RecordingPwm::new(&duty), &tach);
        let mut plant = Plant::new(&tach, &clock, &duty, 50);

        let controller = SpeedController::new(MotorConfig::default().with_max_iterations(1));
        let result = controller.regulate(&mut motor, &mut plant, &clock, &mut (), 10.0);

        assert_eq!(result, Err(Error::DidNotConverge { iterations: 1 }));
        assert_eq!(motor.percentage(), 1.25);
    }

    #[test]
    fn unreachable_speed_is_clamped_and_reported() {
        let tach = Tachometer::new();
        let clock = SimClock::default();
        let duty = Cell::new(0);
        let mut motor = Motor::new(LevelPin::default(), RecordingPwm::new(&duty), &tach);
        let mut plant = Plant::new(&tach, &clock, &duty, 50);
        let mut events = Vec::new();

        let controller = SpeedController::new(MotorConfig::default().with_max_iterations(600));
        let result = controller.regulate(&mut motor, &mut plant, &clock, &mut events, 45.0);

        assert_eq!(result, Err(Error::DidNotConverge { iterations: 600 }));
        assert_eq!(events[0], Event::RegulateStart { target_tach_rpm: 37_500 });
        assert_eq!(motor.percentage(), 100.0);
        assert_eq!(duty.get(), 0);
    }

    #[test]
    fn kick_from_zero_power() {
        let tach = Tachometer::new();
        let clock = SimClock::default();
        let duty = Cell::new(0);
        let mut motor = Motor::new(LevelPin::default(), RecordingPwm::new(&duty), &tach);
        let mut plant = Plant::new(&tach, &clock, &duty, 50);
        let mut events = Vec::new();

        let config = MotorConfig::default()
            .with_min_kick(20.0)
            .with_max_iterations(1);
        let result =
            SpeedController::new(config).regulate(&mut motor, &mut plant, &clock, &mut events, -5.0);

        assert!(result.is_err());
        assert_eq!(motor.percentage(), -20.0);
        assert!(events.contains(&Event::Kick { power_centi: -2_000 }));
    }

    #[test]
    fn stalled_shaft_reads_as_zero() {
        let tach = Tachometer::new();
        let clock = SimClock::default();
        let duty = Cell::new(0);
        let motor = Motor::new(LevelPin::default(), RecordingPwm::new(&duty), &tach);
        tach.on_falling_edge(0);
        tach.on_falling_edge(2_000);
        clock.set(1_000_000);

        let stalled = SpeedController::new(MotorConfig::default().with_stall_timeout_us(250_000));
        assert_eq!(stalled.measured_rpm(&motor, &clock), 0.0);

        let shipped = SpeedController::new(MotorConfig::default());
        assert_eq!(shipped.measured_rpm(&motor, &clock), 12_000.0);
    }
}
