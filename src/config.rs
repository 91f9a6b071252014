//! Calibration constants and runtime tuning for the disc drives

/// CPU frequency in Hz
pub const CPU_FREQ_HZ: u32 = 16_000_000;

/// UART baud rate for the trace console
pub const UART_BAUD: u32 = 9600;

/// Microseconds-per-minute constant divided by the tachometer pulses per motor revolution.
/// Dividing it by the pulse period in microseconds yields tachometer RPM.
pub const TACH_RPM_NUMERATOR: u32 = 24_000_000;

/// Tachometer edges per counted motor rotation
pub const EDGES_PER_ROTATION: u8 = 25;

/// Motor rotations per disc revolution
pub const GEAR_RATIO: f32 = 64.0;

/// Converts a disc RPM into the equivalent tachometer RPM
pub const DISC_TO_TACH_SCALE: f32 = 1250.0;

/// Fastest disc speed the motors were measured to reach
pub const MAX_DISC_RPM: f32 = 30.0;

/// Half-width of the accepted tachometer RPM band around a target
pub const TACH_TOLERANCE_RPM: f32 = 50.0;

/// Tachometer RPM error per percent of power correction
pub const PROPORTIONAL_DIVISOR: f32 = 10_000.0;

/// Delay between control-loop iterations
pub const POLL_INTERVAL_MS: u16 = 100;

/// Fixed drive power while seeking a position
pub const SEEK_POWER_PERCENT: f32 = 50.0;

/// Power percentage domain
pub const MAX_POWER_PERCENT: f32 = 100.0;

/// PWM duty for a fully driven motor (the signal is inverted)
pub const DUTY_FULL_ON: u16 = 0;

/// PWM duty for a motor with no drive
pub const DUTY_FULL_OFF: u16 = 255;

/// Arduino Mega pin wiring of the two discs
pub mod board {
    /// Direction pin of the back disc (right motor)
    pub const BACK_DIRECTION_PIN: u8 = 14;
    /// Direction pin of the front disc (left motor)
    pub const FRONT_DIRECTION_PIN: u8 = 15;
    /// Tachometer pin of the back disc (INT4)
    pub const BACK_TACH_PIN: u8 = 2;
    /// Tachometer pin of the front disc (INT5)
    pub const FRONT_TACH_PIN: u8 = 3;
    /// Back disc PWM on Timer1 OC1A
    pub const BACK_PWM_PIN: u8 = 11;
    /// Front disc PWM on Timer1 OC1B
    pub const FRONT_PWM_PIN: u8 = 12;
}

/// When a position seek may stop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeekStop {
    /// Stop only when the quantized position equals the target
    Exact,
    /// Also stop once the position has reached or passed the target in the direction of travel
    Passed,
}

/// Runtime tuning of the regulation and seek loops.
///
/// The default reproduces the shipped firmware: no kick from standstill, unbounded loops,
/// exact-match seek termination and no stall detection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotorConfig {
    /// Power applied when regulation finds the motor at exactly 0% with a non-zero target
    pub min_kick_percent: Option<f32>,
    /// Iteration cap for `regulate` and `seek_relative`
    pub max_iterations: Option<u32>,
    pub seek_stop: SeekStop,
    /// RPM reads report zero once no edge arrived for this long
    pub stall_timeout_us: Option<u32>,
    pub poll_interval_ms: u16,
    pub seek_power_percent: f32,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            min_kick_percent: None,
            max_iterations: None,
            seek_stop: SeekStop::Exact,
            stall_timeout_us: None,
            poll_interval_ms: POLL_INTERVAL_MS,
            seek_power_percent: SEEK_POWER_PERCENT,
        }
    }
}

impl MotorConfig {
    pub fn with_min_kick(mut self, percent: f32) -> Self {
        self.min_kick_percent = Some(percent.abs().min(MAX_POWER_PERCENT));
        self
    }

    pub fn with_max_iterations(mut self, iterations: u32) -> Self {
        self.max_iterations = Some(iterations);
        self
    }

    pub fn with_seek_stop(mut self, stop: SeekStop) -> Self {
        self.seek_stop = stop;
        self
    }

    pub fn with_stall_timeout_us(mut self, timeout_us: u32) -> Self {
        self.stall_timeout_us = Some(timeout_us);
        self
    }

    pub fn with_poll_interval_ms(mut self, ms: u16) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// True when `iteration` has used up the configured budget
    #[inline]
    pub fn exhausted(&self, iteration: u32) -> bool {
        matches!(self.max_iterations, Some(max) if iteration >= max)
    }
}
