//! Interrupt-fed tachometer sampling
//!
//! The tachometer pin fires a falling edge per pulse. The edge handler runs in interrupt context
//! and updates a [`TachState`] kept behind a critical-section mutex; the control loops only ever
//! see copies taken inside a short critical section, so no read can observe a half-written
//! sample.

use core::cell::RefCell;
use critical_section::Mutex;

use crate::config::{EDGES_PER_ROTATION, TACH_RPM_NUMERATOR};
use crate::drivers::motor::Direction;
use crate::hal::PulseClock;

/// Direction-aware count of whole motor rotations
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RotationCounter {
    edges: u8,
    rotations: i32,
}

impl RotationCounter {
    pub const fn new() -> Self {
        Self {
            edges: 0,
            rotations: 0,
        }
    }

    /// Count one edge. Every `EDGES_PER_ROTATION`th edge moves the rotation count one step in
    /// `direction` and returns true.
    pub fn count_edge(&mut self, direction: Direction) -> bool {
        self.edges += 1;
        if self.edges < EDGES_PER_ROTATION {
            return false;
        }

        self.edges = 0;
        self.rotations = match direction {
            Direction::Forward => self.rotations.wrapping_add(1),
            Direction::Reverse => self.rotations.wrapping_sub(1),
        };
        true
    }

    #[inline]
    pub fn rotations(&self) -> i32 {
        self.rotations
    }

    /// Edges seen since the last counted rotation
    #[inline]
    pub fn pending_edges(&self) -> u8 {
        self.edges
    }
}

/// Instantaneous tachometer RPM for a pulse period, or `None` for a zero period
#[inline]
pub fn rpm_from_interval(interval_us: u32) -> Option<u32> {
    if interval_us == 0 {
        None
    } else {
        Some(TACH_RPM_NUMERATOR / interval_us)
    }
}

/// Everything the edge handler writes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TachState {
    last_edge_us: Option<u32>,
    interval_us: u32,
    rpm: u32,
    counter: RotationCounter,
    /// Level of the direction pin as last driven by the motor
    direction: Direction,
}

impl Default for TachState {
    fn default() -> Self {
        Self::new()
    }
}

impl TachState {
    pub const fn new() -> Self {
        Self {
            last_edge_us: None,
            interval_us: 0,
            rpm: 0,
            counter: RotationCounter::new(),
            direction: Direction::Forward,
        }
    }

    /// Handle one falling edge observed at `now_us`.
    ///
    /// The first edge after boot only records its timestamp. A zero interval (contact bounce)
    /// keeps the previous RPM sample but still counts the edge.
    pub fn on_falling_edge(&mut self, now_us: u32) {
        if let Some(last) = self.last_edge_us {
            let interval = now_us.wrapping_sub(last);
            if let Some(rpm) = rpm_from_interval(interval) {
                self.interval_us = interval;
                self.rpm = rpm;
            }
        }
        self.last_edge_us = Some(now_us);
        self.counter.count_edge(self.direction);
    }

    #[inline]
    pub fn rpm(&self) -> u32 {
        self.rpm
    }

    #[inline]
    pub fn interval_us(&self) -> u32 {
        self.interval_us
    }

    #[inline]
    pub fn last_edge_us(&self) -> Option<u32> {
        self.last_edge_us
    }

    #[inline]
    pub fn rotations(&self) -> i32 {
        self.counter.rotations()
    }

    #[inline]
    pub fn counter(&self) -> RotationCounter {
        self.counter
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// RPM as seen at `now_us`; zero when a stall timeout is given and the last edge is older
    /// than it (or no edge has ever arrived).
    pub fn rpm_at(&self, now_us: u32, stall_timeout_us: Option<u32>) -> u32 {
        let Some(timeout) = stall_timeout_us else {
            return self.rpm;
        };
        match self.last_edge_us {
            Some(last) if now_us.wrapping_sub(last) <= timeout => self.rpm,
            _ => 0,
        }
    }
}

/// Tachometer state shared between its edge interrupt and the control loop
pub struct Tachometer {
    state: Mutex<RefCell<TachState>>,
}

impl Default for Tachometer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tachometer {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(TachState::new())),
        }
    }

    /// Edge callback. Call from the tachometer pin's falling-edge interrupt.
    pub fn on_falling_edge(&self, now_us: u32) {
        critical_section::with(|cs| self.state.borrow_ref_mut(cs).on_falling_edge(now_us));
    }

    /// Edge callback reading the timestamp from `clock`
    pub fn on_edge<C: PulseClock>(&self, clock: &C) {
        critical_section::with(|cs| {
            let now = clock.micros();
            self.state.borrow_ref_mut(cs).on_falling_edge(now);
        });
    }

    /// Record the level the motor just drove onto its direction pin
    pub fn latch_direction(&self, direction: Direction) {
        critical_section::with(|cs| self.state.borrow_ref_mut(cs).direction = direction);
    }

    /// Consistent copy of the shared state
    pub fn snapshot(&self) -> TachState {
        critical_section::with(|cs| *self.state.borrow_ref(cs))
    }
}
