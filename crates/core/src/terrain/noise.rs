use crate::{
    config::{NoiseFnConfig, NoiseFnType},
    NumRange,
};
use noise::{
    BasicMulti, Billow, Fbm, HybridMulti, MultiFractal, NoiseFn, Perlin,
    RidgedMulti,
};
use std::fmt::{self, Debug};

/// Helper trait so we can hold any of the noise function types behind one
/// trait object. `Send + Sync` lets generation sample from several threads.
trait NoiseFn2d: NoiseFn<f64, 2> + Send + Sync {}

impl<T: NoiseFn<f64, 2> + Send + Sync> NoiseFn2d for T {}

/// A pure mapping from heightmap grid coordinates to a raw height in [0,1].
/// Built once per noise seed/config; sampling never mutates anything, so the
/// same inputs always produce bit-identical outputs.
pub struct HeightField {
    noise_fn: Box<dyn NoiseFn2d>,
    noise_type: NoiseFnType,
    resolution: u32,
}

impl HeightField {
    /// What [HeightField::sample] returns when the scale is zero, negative or
    /// not a number: the middle of the output range, i.e. flat terrain at
    /// half height.
    pub const FLAT_VALUE: f64 = 0.5;

    /// The output range of the underlying noise functions. Used to map noise
    /// values onto [0,1].
    const NOISE_FN_OUTPUT_RANGE: NumRange = NumRange::new(-1.0, 1.0);

    /// Build a height field for a grid with `resolution` samples per side.
    pub fn new(seed: u32, config: &NoiseFnConfig, resolution: u32) -> Self {
        Self {
            noise_fn: Self::make_noise_fn(seed, config),
            noise_type: config.noise_type,
            resolution: resolution.max(1),
        }
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Sample the field at a grid cell. The noise function is evaluated at
    /// `(x / resolution * scale, y / resolution * scale)`, so `scale` is the
    /// number of noise periods across the whole grid.
    pub fn sample(&self, x: u32, y: u32, scale: f64) -> f64 {
        if !scale.is_finite() || scale <= 0.0 {
            return Self::FLAT_VALUE;
        }

        let resolution = self.resolution as f64;
        let point = [
            x as f64 / resolution * scale,
            y as f64 / resolution * scale,
        ];
        Self::NOISE_FN_OUTPUT_RANGE
            .value(self.noise_fn.get(point))
            .normalize()
            // Fractal types can overshoot [-1,1] a little
            .clamp()
            .inner()
    }

    /// The noise types don't share a constructor trait we can box, so each
    /// one gets configured separately.
    fn make_noise_fn(seed: u32, config: &NoiseFnConfig) -> Box<dyn NoiseFn2d> {
        // Frequency stays at 1, the sample coordinates carry the scale
        macro_rules! fractal {
            ($type:ident) => {
                Box::new(
                    $type::<Perlin>::new(seed)
                        .set_octaves(config.octaves)
                        .set_frequency(1.0)
                        .set_lacunarity(config.lacunarity)
                        .set_persistence(config.persistence),
                )
            };
        }

        match config.noise_type {
            NoiseFnType::Perlin => Box::new(Perlin::new(seed)),
            NoiseFnType::BasicMulti => fractal!(BasicMulti),
            NoiseFnType::Billow => fractal!(Billow),
            NoiseFnType::Fbm => fractal!(Fbm),
            NoiseFnType::HybridMulti => fractal!(HybridMulti),
            NoiseFnType::RidgedMulti => fractal!(RidgedMulti),
        }
    }
}

impl Debug for HeightField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeightField")
            .field("noise_type", &self.noise_type)
            .field("resolution", &self.resolution)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(noise_type: NoiseFnType) -> HeightField {
        let config = NoiseFnConfig {
            noise_type,
            ..Default::default()
        };
        HeightField::new(1234, &config, 65)
    }

    #[test]
    fn test_deterministic() {
        let a = field(NoiseFnType::Perlin);
        let b = field(NoiseFnType::Perlin);
        for (x, y) in [(0, 0), (3, 7), (31, 12), (64, 64)] {
            let first = a.sample(x, y, 20.0);
            assert_eq!(first.to_bits(), a.sample(x, y, 20.0).to_bits());
            assert_eq!(first.to_bits(), b.sample(x, y, 20.0).to_bits());
        }
    }

    #[test]
    fn test_output_range() {
        for noise_type in [
            NoiseFnType::Perlin,
            NoiseFnType::BasicMulti,
            NoiseFnType::Billow,
            NoiseFnType::Fbm,
            NoiseFnType::HybridMulti,
            NoiseFnType::RidgedMulti,
        ] {
            let field = field(noise_type);
            for x in 0..65 {
                for y in (0..65).step_by(5) {
                    let value = field.sample(x, y, 7.5);
                    assert!(
                        (0.0..=1.0).contains(&value),
                        "{noise_type} produced {value} at ({x}, {y})"
                    );
                }
            }
        }
    }

    #[test]
    fn test_flat_for_bad_scale() {
        let field = field(NoiseFnType::Perlin);
        for scale in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            assert_eq!(field.sample(10, 20, scale), HeightField::FLAT_VALUE);
        }
    }

    #[test]
    fn test_seed_changes_output() {
        let config = NoiseFnConfig::default();
        let a = HeightField::new(1, &config, 65);
        let b = HeightField::new(2, &config, 65);
        let differs = (0..65).any(|x| a.sample(x, 17, 20.0) != b.sample(x, 17, 20.0));
        assert!(differs);
    }
}
