//! Control loop trace output
//!
//! Controllers report what they do as [`Event`]s to an [`EventSink`]. The firmware renders them
//! on the serial console through [`SerialLogger`]; `()` discards them. Everything is logged as
//! integers since `ufmt` has no float support: power in hundredths of a percent, positions in
//! eighths of a revolution.

use ufmt::{uWrite, uwrite};

use crate::disc::DiscSide;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Error,
    Info,
    Debug,
}

impl Level {
    fn tag(self) -> &'static str {
        match self {
            Level::Error => "[ERR] ",
            Level::Info => "[INF] ",
            Level::Debug => "[DBG] ",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    RegulateStart {
        target_tach_rpm: i32,
    },
    RegulateStep {
        iteration: u32,
        measured_rpm: i32,
        power_centi: i32,
    },
    Kick {
        power_centi: i32,
    },
    Converged {
        iterations: u32,
    },
    SeekStart {
        current: i32,
        target: i32,
    },
    SeekStep {
        current: i32,
        target: i32,
    },
    Arrived {
        position: i32,
    },
    DidNotConverge {
        iterations: u32,
    },
    Rezeroed {
        rotations: i32,
    },
    Position {
        side: DiscSide,
        position: i32,
    },
}

impl Event {
    pub fn level(&self) -> Level {
        match self {
            Event::DidNotConverge { .. } => Level::Error,
            Event::RegulateStep { .. } | Event::SeekStep { .. } => Level::Debug,
            _ => Level::Info,
        }
    }
}

/// Percent as hundredths, for integer-only logging
#[inline]
pub fn centi(percent: f32) -> i32 {
    (percent * 100.0) as i32
}

/// Revolutions as eighths, for integer-only logging
#[inline]
pub fn eighths(revolutions: f32) -> i32 {
    (revolutions * 8.0) as i32
}

pub trait EventSink {
    fn record(&mut self, event: Event);
}

impl EventSink for () {
    #[inline]
    fn record(&mut self, _event: Event) {}
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    #[inline]
    fn record(&mut self, event: Event) {
        (**self).record(event)
    }
}

/// Write a count of eighths as whole revolutions and eighths: `1+1/8`, `-1-3/8`, `2`, `-1/8`
fn write_revolutions<W: uWrite>(w: &mut W, eighths: i32) -> Result<(), W::Error> {
    let whole = eighths / 8;
    let rest = eighths % 8;
    if rest == 0 {
        uwrite!(w, "{}", whole)
    } else if whole == 0 {
        uwrite!(w, "{}/8", rest)
    } else if whole > 0 {
        uwrite!(w, "{}+{}/8", whole, rest)
    } else {
        uwrite!(w, "{}-{}/8", whole, -rest)
    }
}

/// Writes events as text lines, dropping those above `max_level`
pub struct SerialLogger<W> {
    writer: W,
    max_level: Level,
}

impl<W: uWrite> SerialLogger<W> {
    pub fn new(writer: W, max_level: Level) -> Self {
        Self { writer, max_level }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn write_line(&mut self, s: &str) -> Result<(), W::Error> {
        self.writer.write_str(s)?;
        self.writer.write_str("\r\n")
    }

    fn write_event(&mut self, event: Event) -> Result<(), W::Error> {
        let w = &mut self.writer;
        w.write_str(event.level().tag())?;
        match event {
            Event::RegulateStart { target_tach_rpm } => {
                uwrite!(w, "regulate target {} rpm", target_tach_rpm)?
            }
            Event::RegulateStep {
                iteration,
                measured_rpm,
                power_centi,
            } => uwrite!(
                w,
                "#{} rpm {} power {}",
                iteration,
                measured_rpm,
                power_centi
            )?,
            Event::Kick { power_centi } => uwrite!(w, "kick power {}", power_centi)?,
            Event::Converged { iterations } => {
                uwrite!(w, "converged after {} polls", iterations)?
            }
            Event::SeekStart { current, target } => {
                uwrite!(w, "seek {} -> {}", current, target)?
            }
            Event::SeekStep { current, target } => {
                uwrite!(w, "{} wanted: {}", current, target)?
            }
            Event::Arrived { position } => uwrite!(w, "arrived at {}", position)?,
            Event::DidNotConverge { iterations } => {
                uwrite!(w, "no convergence after {} polls", iterations)?
            }
            Event::Rezeroed { rotations } => uwrite!(w, "zero at rotation {}", rotations)?,
            Event::Position { side, position } => {
                uwrite!(w, "{}: ", side.log_prefix())?;
                write_revolutions(w, position)?
            }
        }
        w.write_str("\r\n")
    }
}

impl<W: uWrite> EventSink for SerialLogger<W> {
    fn record(&mut self, event: Event) {
        if event.level() > self.max_level {
            return;
        }
        // Console output is best effort
        let _ = self.write_event(event);
    }
}
