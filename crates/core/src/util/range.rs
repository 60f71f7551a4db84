use crate::Hours;
use derive_more::Display;
use std::{
    fmt::{Debug, Display},
    ops,
};
use validator::ValidationError;

/// A type of value that we can create ranges of, where a range has a min and
/// max. All our rangeable types are thin wrappers around `f64`, so the math
/// is always done on `f64` and the wrapper is carried along for type safety.
pub trait Rangeable:
    Copy
    + Debug
    + Display
    + PartialOrd
    + From<f64>
    + Into<f64>
    + ops::Add<Self, Output = Self>
    + ops::Sub<Self, Output = Self>
{
    fn zero() -> Self {
        0.0.into()
    }

    fn one() -> Self {
        1.0.into()
    }
}

impl Rangeable for f64 {}
impl Rangeable for Hours {}

/// A range between two numeric values, inclusive on both ends.
#[derive(Copy, Clone, Debug, Display, PartialEq)]
#[display(fmt = "[{}, {}]", min, max)]
pub struct NumRange<T: Rangeable = f64> {
    pub min: T,
    pub max: T,
}

impl<T: Rangeable> NumRange<T> {
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    /// Get a [0,1] range for this type.
    pub fn normal_range() -> Self {
        Self::new(T::zero(), T::one())
    }

    /// Create a [RangeValue] in this range, which is convenient for chaining
    /// operations on a single value.
    pub fn value(self, value: T) -> RangeValue<T> {
        RangeValue { value, range: self }
    }

    /// Max minus min
    pub fn span(&self) -> T {
        self.max - self.min
    }

    /// Check if a value is in this range. Ranges are inclusive on both ends.
    pub fn contains(&self, value: T) -> bool {
        self.min <= value && value <= self.max
    }

    /// Checks if the value is in this range. If it isn't, return a
    /// validation error with the `range` code, so it can be attached to
    /// whichever field the value came from.
    pub fn ensure_contains(&self, value: T) -> Result<(), ValidationError> {
        if self.contains(value) {
            Ok(())
        } else {
            let mut error = ValidationError::new("range");
            error.message =
                Some(format!("value {} is not in range {}", value, self).into());
            Err(error)
        }
    }

    /// Map a value from this range to the target range. If the span of this
    /// range is zero, we can't properly map the value because we don't know
    /// where on the target range it should fall. In that case, we just always
    /// return the **minimum** of the target range.
    pub fn map_to(&self, dest_range: &Self, value: T) -> T {
        let span: f64 = self.span().into();
        if span > 0.0 {
            let offset: f64 = (value - self.min).into();
            dest_range.lerp(offset / span)
        } else {
            dest_range.min
        }
    }

    /// Map a value from this range to the range [0, 1]
    pub fn normalize(&self, value: T) -> T {
        self.map_to(&Self::normal_range(), value)
    }

    /// Linear interpolation from `min` to `max`. `t` is **not** clamped, so
    /// values outside [0,1] extrapolate.
    pub fn lerp(&self, t: f64) -> T {
        let min: f64 = self.min.into();
        let span: f64 = self.span().into();
        (min + span * t).into()
    }

    /// Force a value into this range. If it's already in the range, return
    /// that value. If it's outside the range, return the bound (lower or upper)
    /// that's closest to the value. NaN maps to the minimum.
    pub fn clamp(&self, value: T) -> T {
        if value > self.max {
            self.max
        } else if value >= self.min {
            value
        } else {
            self.min
        }
    }
}

/// An alternative interface for [NumRange] that makes it easy to chain
/// operations on a single value.
///
/// ```
/// use skyvale::NumRange;
///
/// let range: NumRange = NumRange::new(-1.0, 1.0);
/// let value = range.value(0.5).normalize().apply(|x| x * 2.0).clamp().inner();
/// assert_eq!(value, 1.0);
/// ```
#[derive(Copy, Clone, Debug)]
pub struct RangeValue<T: Rangeable> {
    value: T,
    range: NumRange<T>,
}

impl<T: Rangeable> RangeValue<T> {
    /// Get the value from this struct
    pub fn inner(self) -> T {
        self.value
    }

    /// Map this value to the range [0,1]
    pub fn normalize(self) -> Self {
        self.map_to(NumRange::normal_range())
    }

    /// Invert this value in the range, so that its distance from the min
    /// becomes its distance from the max, and vice versa. For example,
    /// inverting `0.7` in the range `[0,1]` returns `0.3`.
    pub fn invert(mut self) -> Self {
        let flipped = NumRange::new(self.range.max, self.range.min);
        self.value = self.range.map_to(&flipped, self.value);
        self
    }

    /// Map this value from the current range to a new range.
    pub fn map_to(self, range: NumRange<T>) -> Self {
        let value = self.range.map_to(&range, self.value);
        Self { value, range }
    }

    /// Force the value into its range.
    pub fn clamp(self) -> Self {
        Self {
            value: self.range.clamp(self.value),
            range: self.range,
        }
    }

    /// Apply the given mapping function to this value. The value will be
    /// replaced with the output of the function, the range stays the same.
    pub fn apply(self, f: impl FnOnce(T) -> T) -> Self {
        Self {
            value: f(self.value),
            range: self.range,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_normal_range() {
        let range: NumRange = NumRange::normal_range();
        assert_approx_eq!(range.min, 0.0);
        assert_approx_eq!(range.max, 1.0);
    }

    #[test]
    fn test_contains() {
        let range: NumRange = NumRange::new(1.0, 3.0);
        assert!(!range.contains(0.9));
        assert!(range.contains(1.0));
        assert!(range.contains(3.0));
        assert!(!range.contains(3.1));
        assert!(!range.contains(f64::NAN));
        assert!(range.ensure_contains(2.0).is_ok());
        assert_eq!(range.ensure_contains(4.0).unwrap_err().code, "range");
    }

    #[test]
    fn test_map_to() {
        let input_range: NumRange = NumRange::new(1.0, 3.0);
        let output_range: NumRange = NumRange::new(20.0, 40.0);
        assert_approx_eq!(input_range.map_to(&output_range, 1.0), 20.0);
        assert_approx_eq!(input_range.map_to(&output_range, 2.0), 30.0);
        assert_approx_eq!(input_range.map_to(&output_range, 6.0), 70.0);

        // Zero-length span always maps to the min of the output range
        let input_range: NumRange = NumRange::new(1.0, 1.0);
        assert_approx_eq!(input_range.map_to(&output_range, 1.5), 20.0);
    }

    #[test]
    fn test_lerp() {
        let range: NumRange = NumRange::new(0.2, 1.2);
        assert_approx_eq!(range.lerp(0.0), 0.2);
        assert_approx_eq!(range.lerp(0.5), 0.7);
        assert_approx_eq!(range.lerp(1.0), 1.2);
    }

    #[test]
    fn test_clamp() {
        let range: NumRange = NumRange::normal_range();
        assert_approx_eq!(range.clamp(-0.5), 0.0);
        assert_approx_eq!(range.clamp(0.25), 0.25);
        assert_approx_eq!(range.clamp(1.5), 1.0);
        assert_approx_eq!(range.clamp(f64::NAN), 0.0);
    }

    #[test]
    fn test_value_chain() {
        let noise_range: NumRange = NumRange::new(-1.0, 1.0);
        let value = noise_range.value(0.5).normalize().invert().inner();
        assert_approx_eq!(value, 0.25);

        let hours = NumRange::new(Hours(6.0), Hours(18.0))
            .value(Hours(12.0))
            .normalize()
            .inner();
        assert_approx_eq!(hours.0, 0.5);
    }
}
