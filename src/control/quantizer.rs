//! Disc position in eighths of a revolution.
//!
//! The fractional part of a revolution count is always rounded *up* to the next eighth: a disc
//! that has just left a whole revolution already reports the first eighth, and one that has
//! travelled 88% of the way reports the full revolution.

use core::ops::Add;

use crate::config::GEAR_RATIO;

/// Percentage of a revolution (inclusive upper bound) covered by each eighth
const EIGHTH_THRESHOLDS: [u8; 7] = [12, 25, 37, 50, 62, 75, 87];

/// Absorbs binary representation error of decimal inputs such as 0.13
const DECIMAL_EPSILON: f32 = 1e-3;

/// Signed disc position, held exactly as a count of eighths of a revolution
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position(i32);

impl Position {
    pub const fn from_eighths(eighths: i32) -> Self {
        Self(eighths)
    }

    #[inline]
    pub const fn eighths(self) -> i32 {
        self.0
    }

    #[inline]
    pub fn revolutions(self) -> f32 {
        self.0 as f32 / 8.0
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position(self.0.wrapping_add(rhs.0))
    }
}

/// Eighths bucket (1..=8) for a fractional revolution in percent
fn eighths_bucket(decimals: u8) -> i32 {
    EIGHTH_THRESHOLDS
        .iter()
        .position(|&limit| decimals <= limit)
        .map_or(8, |idx| idx as i32 + 1)
}

/// Quantize a revolution count into eighths.
///
/// `include_whole` keeps the whole revolutions; otherwise only the signed fraction is returned.
///
/// The fraction is taken in whole percent after adding `DECIMAL_EPSILON`, so an input less
/// than 0.001% below a threshold counts as having crossed it: 0.129995 lands in the second
/// eighth where plain truncation would give the first. Gear-derived inputs (multiples of 1/64)
/// are never that close to a threshold.
pub fn quantize(raw_revolutions: f32, include_whole: bool) -> Position {
    let whole = raw_revolutions as i32;
    let frac = (raw_revolutions - whole as f32).abs();
    let decimals = (frac * 100.0 + DECIMAL_EPSILON) as u8;

    let bucket = eighths_bucket(decimals);
    let fraction = if raw_revolutions < 0.0 { -bucket } else { bucket };

    if include_whole {
        Position(whole.wrapping_mul(8).wrapping_add(fraction))
    } else {
        Position(fraction)
    }
}

/// Disc position for a motor rotation count
pub fn disc_position(rotations: i32) -> Position {
    quantize(rotations as f32 / GEAR_RATIO, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fraction(raw: f32) -> f32 {
        quantize(raw, false).revolutions()
    }

    #[test]
    fn boundaries_round_up_to_the_next_eighth() {
        let cases = [
            (0.12, 0.125),
            (0.13, 0.25),
            (0.25, 0.25),
            (0.26, 0.375),
            (0.37, 0.375),
            (0.50, 0.5),
            (0.62, 0.625),
            (0.75, 0.75),
            (0.87, 0.875),
            (0.88, 1.0),
        ];
        for (raw, expected) in cases {
            assert_eq!(fraction(raw), expected, "raw {}", raw);
            assert_eq!(fraction(-raw), -expected, "raw -{}", raw);
        }
    }

    #[test]
    fn epsilon_only_moves_inputs_just_under_a_threshold() {
        assert_eq!(fraction(0.129995), 0.25);
        assert_eq!(fraction(0.1298), 0.125);
        assert_eq!(fraction(-0.129995), -0.25);
        for k in 0..64 {
            let raw = k as f32 / GEAR_RATIO;
            let truncated = eighths_bucket((raw * 100.0) as u8) as f32 / 8.0;
            assert_eq!(fraction(raw), truncated, "{}/64", k);
        }
    }

    #[test]
    fn whole_revolution_reports_first_eighth() {
        assert_eq!(quantize(0.0, true), Position::from_eighths(1));
        assert_eq!(quantize(2.0, true).revolutions(), 2.125);
        assert_eq!(quantize(0.99, false).revolutions(), 1.0);
    }

    #[test]
    fn whole_part_is_kept_on_request() {
        assert_eq!(quantize(2.26, true).revolutions(), 2.375);
        assert_eq!(quantize(2.26, false).revolutions(), 0.375);
        assert_eq!(quantize(-1.5, true).revolutions(), -1.5);
        assert_eq!(quantize(-1.3, true).revolutions(), -1.375);
    }

    #[test]
    fn rotation_counts_through_the_gearbox() {
        assert_eq!(disc_position(0).eighths(), 1);
        assert_eq!(disc_position(32).revolutions(), 0.5);
        assert_eq!(disc_position(33).revolutions(), 0.625);
        assert_eq!(disc_position(64).revolutions(), 1.125);
        assert_eq!(disc_position(-16).revolutions(), -0.25);
    }

    #[test]
    fn positions_add_in_eighths() {
        let sum = Position::from_eighths(3) + Position::from_eighths(-5);
        assert_eq!(sum.eighths(), -2);
        assert!(Position::from_eighths(-1) < Position::from_eighths(1));
    }
}
