//! Unit types for physical quantities.
//!
//! Provides type-safe representations of linear travel and motor steps to
//! prevent unit confusion at compile time.

use core::ops::Neg;

use serde::{Deserialize, Serialize};

/// Linear travel in millimetres.
///
/// Used for configuration and user-facing API. Converted to [`Steps`] per axis.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f64);

impl Millimeters {
    /// Create a new Millimeters value.
    #[inline]
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl Neg for Millimeters {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

/// Signed step count. Positive values travel away from home.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Steps(pub i64);

impl Steps {
    /// Create a new Steps value.
    #[inline]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// Number of pulses needed, ignoring direction.
    #[inline]
    pub fn abs(self) -> u64 {
        self.0.unsigned_abs()
    }

    /// Whether this step count moves the axis at all.
    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Whether travel is in the positive direction.
    #[inline]
    pub const fn is_forward(self) -> bool {
        self.0 > 0
    }

    /// Convert to millimetres using the axis calibration.
    #[inline]
    pub fn to_mm(self, steps_per_mm: f64) -> Millimeters {
        Millimeters(self.0 as f64 / steps_per_mm)
    }

    /// Create from millimetres, rounding to the nearest whole step.
    #[inline]
    pub fn from_mm(mm: Millimeters, steps_per_mm: f64) -> Self {
        Self((mm.0 * steps_per_mm).round() as i64)
    }

    /// Same magnitude in the direction of `direction`.
    #[inline]
    pub fn with_sign_of(count: u64, direction: Steps) -> Self {
        let count = count as i64;
        if direction.0 < 0 {
            Self(-count)
        } else {
            Self(count)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_mm_rounds_to_nearest() {
        assert_eq!(Steps::from_mm(Millimeters(2.0), 100.0), Steps(200));
        assert_eq!(Steps::from_mm(Millimeters(0.004), 100.0), Steps(0));
        assert_eq!(Steps::from_mm(Millimeters(0.006), 100.0), Steps(1));
        assert_eq!(Steps::from_mm(Millimeters(-0.006), 100.0), Steps(-1));
        // 0.29 * 100 is 28.999999999999996 in binary floating point
        assert_eq!(Steps::from_mm(Millimeters(0.29), 100.0), Steps(29));
    }

    #[test]
    fn test_steps_to_mm() {
        let mm = Steps::new(-4000).to_mm(200.0);
        assert!((mm.value() + 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_with_sign_of() {
        assert_eq!(Steps::with_sign_of(5, Steps(-12)), Steps(-5));
        assert_eq!(Steps::with_sign_of(5, Steps(12)), Steps(5));
        assert_eq!(Steps::with_sign_of(0, Steps(-12)), Steps(0));
    }
}
