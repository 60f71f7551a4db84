use crate::{
    error::{SimError, SimResult},
    Rgb,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// What a curve does when evaluated outside the span of its keys.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapMode {
    /// Hold the first/last value
    Clamp,
    /// Repeat the key span forever in both directions
    Loop,
}

/// A single point on a [Curve].
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f64,
    pub value: f64,
}

impl Keyframe {
    pub const fn new(time: f64, value: f64) -> Self {
        Self { time, value }
    }
}

/// A piecewise-linear function defined by a sorted list of keyframes. Used
/// for shaping raw noise into terrain elevation, and for time-of-day lighting
/// curves.
///
/// Segments are interpolated linearly. Smooth tangents aren't supported; add
/// more keys if you need a smoother shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    pub wrap: WrapMode,
    pub keys: Vec<Keyframe>,
}

impl Curve {
    /// The identity on [0,1]: `(0,0) -> (1,1)`, clamped outside that.
    pub fn linear() -> Self {
        Self {
            wrap: WrapMode::Clamp,
            keys: vec![Keyframe::new(0.0, 0.0), Keyframe::new(1.0, 1.0)],
        }
    }

    /// A curve that outputs the same value everywhere.
    pub fn constant(value: f64) -> Self {
        Self {
            wrap: WrapMode::Clamp,
            keys: vec![Keyframe::new(0.0, value)],
        }
    }

    /// Build a curve from `(time, value)` pairs.
    pub fn from_points(wrap: WrapMode, points: &[(f64, f64)]) -> Self {
        Self {
            wrap,
            keys: points
                .iter()
                .map(|&(time, value)| Keyframe::new(time, value))
                .collect(),
        }
    }

    /// Make sure this curve can actually be evaluated: at least one key,
    /// nothing non-finite, and times strictly increasing. Errors are
    /// reported against the `keys` field.
    pub fn validate(&self) -> SimResult<()> {
        let keys_ok = !self.keys.is_empty()
            && self
                .keys
                .iter()
                .all(|key| key.time.is_finite() && key.value.is_finite())
            && self.keys.windows(2).all(|pair| pair[0].time < pair[1].time);
        if keys_ok {
            Ok(())
        } else {
            Err(SimError::invalid_field("keys", "curve"))
        }
    }

    /// Evaluate the curve at `t`. A curve with no keys evaluates to zero
    /// everywhere (validation prevents that from happening in practice).
    pub fn evaluate(&self, t: f64) -> f64 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };
        let span = last.time - first.time;
        let t = match self.wrap {
            WrapMode::Loop if span > 0.0 => {
                first.time + (t - first.time).rem_euclid(span)
            }
            _ => t,
        };

        if t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }

        // Find the first key strictly after t. There must be one, and it
        // can't be the first key, because of the bounds checks above
        let upper = self.keys.partition_point(|key| key.time <= t);
        let a = self.keys[upper - 1];
        let b = self.keys[upper];
        let fraction = (t - a.time) / (b.time - a.time);
        a.value + (b.value - a.value) * fraction
    }
}

/// A color stop on a [Gradient]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorKey {
    pub time: f64,
    pub color: Rgb,
}

/// A looping color gradient over the normalized day `[0,1)`. Keys don't need
/// to be at 0 and 1; the segment between the last key and the first key
/// (wrapping through midnight) is interpolated too.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    pub keys: Vec<ColorKey>,
}

impl Gradient {
    pub fn validate(&self) -> SimResult<()> {
        let keys_ok = !self.keys.is_empty()
            && self
                .keys
                .iter()
                .all(|key| (0.0..=1.0).contains(&key.time))
            && self.keys.windows(2).all(|pair| pair[0].time < pair[1].time);
        if keys_ok {
            Ok(())
        } else {
            Err(SimError::invalid_field("keys", "gradient"))
        }
    }

    pub fn evaluate(&self, t: f64) -> Rgb {
        let t = t.rem_euclid(1.0);
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Rgb::BLACK,
        };

        let upper = self.keys.partition_point(|key| key.time <= t);
        let (a, b, gap, offset) = match upper {
            // Before the first key, so we're on the wraparound segment
            0 => (last, first, first.time + 1.0 - last.time, t + 1.0 - last.time),
            // After the last key, also the wraparound segment
            n if n == self.keys.len() => {
                (last, first, first.time + 1.0 - last.time, t - last.time)
            }
            n => {
                let (a, b) = (self.keys[n - 1], self.keys[n]);
                (a, b, b.time - a.time, t - a.time)
            }
        };
        match gap.partial_cmp(&0.0) {
            Some(Ordering::Greater) => a.color.lerp(b.color, offset / gap),
            _ => a.color,
        }
    }
}
