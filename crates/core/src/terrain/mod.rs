mod heightmap;
mod noise;
pub mod placement;

pub use self::{
    heightmap::{HeightStats, Heightmap},
    noise::HeightField,
};

use crate::{
    config::TerrainConfig,
    error::{SimError, SimResult},
    timed, Meter, NumRange,
};
use log::info;
use rayon::prelude::*;
use std::sync::Arc;
use validator::Validate;

/// Owns the terrain config and the currently published heightmap, and
/// rebuilds the heightmap on demand.
///
/// The published heightmap is shared as an [Arc]. Regeneration always builds
/// a complete new grid first and only then swaps the reference, so anyone
/// holding a previous snapshot keeps a consistent (old) grid, and a failed
/// regeneration leaves the published grid alone.
#[derive(Debug)]
pub struct HeightmapGenerator {
    config: TerrainConfig,
    noise_seed: u32,
    field: HeightField,
    heightmap: Option<Arc<Heightmap>>,
    generation: u64,
}

impl HeightmapGenerator {
    /// Create a generator. Nothing is generated until
    /// [HeightmapGenerator::regenerate] is called. Returns an error if the
    /// config is invalid.
    pub fn new(config: TerrainConfig, noise_seed: u32) -> SimResult<Self> {
        config.validate()?;
        let field =
            HeightField::new(noise_seed, &config.noise, config.resolution);
        Ok(Self {
            config,
            noise_seed,
            field,
            heightmap: None,
            generation: 0,
        })
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Replace the whole config. The new config is validated first, and
    /// nothing changes if it's invalid. Does **not** regenerate.
    pub fn set_config(&mut self, config: TerrainConfig) -> SimResult<()> {
        config.validate()?;
        self.field =
            HeightField::new(self.noise_seed, &config.noise, config.resolution);
        self.config = config;
        Ok(())
    }

    /// Change the height multiplier, which is how weather reshapes the
    /// terrain. Does **not** regenerate.
    pub fn set_height_multiplier(&mut self, multiplier: f64) -> SimResult<()> {
        if multiplier.is_finite() {
            self.config.height_multiplier = multiplier;
            Ok(())
        } else {
            Err(SimError::invalid_field("height_multiplier", "finite"))
        }
    }

    /// The most recently published heightmap, or `None` if terrain hasn't
    /// been generated yet.
    pub fn heightmap(&self) -> Option<Arc<Heightmap>> {
        self.heightmap.clone()
    }

    /// Number of heightmaps published so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Build a heightmap from a height field and config. Every cell is
    /// independent, so rows are computed in parallel; the call only returns
    /// once every cell has been written.
    ///
    /// For each cell: `raw = field(x, y)`, inverted if configured, then
    /// `clamp01(curve(raw * multiplier))`.
    pub fn generate(
        field: &HeightField,
        config: &TerrainConfig,
        generation: u64,
    ) -> SimResult<Heightmap> {
        config.validate()?;
        if field.resolution() != config.resolution {
            return Err(SimError::invalid_field("resolution", "mismatch"));
        }

        let resolution = config.resolution;
        let normal_range = NumRange::normal_range();
        let mut cells = vec![0.0; (resolution as usize).pow(2)];
        cells
            .par_chunks_mut(resolution as usize)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, cell) in row.iter_mut().enumerate() {
                    let raw =
                        field.sample(x as u32, y as u32, config.noise_scale);
                    let raw = if config.invert {
                        normal_range.value(raw).invert().inner()
                    } else {
                        raw
                    };
                    let shaped = config
                        .shaping_curve
                        .evaluate(raw * config.height_multiplier);
                    *cell = normal_range.clamp(shaped);
                }
            });

        Ok(Heightmap::new(resolution, generation, cells))
    }

    /// Generate a new heightmap from the current config and publish it,
    /// replacing the previous one. On error, the previous heightmap stays
    /// published.
    pub fn regenerate(&mut self) -> SimResult<Arc<Heightmap>> {
        let generation = self.generation + 1;
        let heightmap = timed!(
            format!("Terrain generation #{}", generation),
            Self::generate(&self.field, &self.config, generation)
        )?;
        let heightmap = Arc::new(heightmap);

        self.heightmap = Some(Arc::clone(&heightmap));
        self.generation = generation;
        info!(
            "Published terrain generation {} ({}x{}, multiplier {})",
            generation,
            self.config.resolution,
            self.config.resolution,
            self.config.height_multiplier
        );
        Ok(heightmap)
    }

    /// Normalized [0,1] terrain height at a world position, interpolated
    /// between grid cells. Positions outside the terrain are clamped to its
    /// edge. `None` until the first heightmap is published.
    pub fn sample_normalized(&self, world_x: f64, world_z: f64) -> Option<f64> {
        let heightmap = self.heightmap.as_ref()?;
        let (gx, gy) = self.world_to_grid(world_x, world_z);
        Some(heightmap.sample_bilinear(gx, gy))
    }

    /// World-space terrain height at a world position. See
    /// [HeightmapGenerator::sample_normalized].
    pub fn sample_height(&self, world_x: f64, world_z: f64) -> Option<Meter> {
        self.sample_normalized(world_x, world_z)
            .map(|height| Meter(height * self.config.height_scale))
    }

    /// The centre of the terrain in world space, sitting on the terrain
    /// surface: `[x, y, z]`
    pub fn center(&self) -> Option<[f64; 3]> {
        let x = self.config.width / 2.0;
        let z = self.config.length / 2.0;
        let y = self.sample_height(x, z)?;
        Some([x, y.0, z])
    }

    /// Convert world (x, z) to fractional grid coordinates. The terrain's
    /// corner sits at the world origin and the grid spans the full width and
    /// length, so the last row/column lands exactly on the far edge.
    fn world_to_grid(&self, world_x: f64, world_z: f64) -> (f64, f64) {
        let cells_per_edge = self.config.resolution.saturating_sub(1) as f64;
        (
            world_x / self.config.width * cells_per_edge,
            world_z / self.config.length * cells_per_edge,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::curve::{Curve, WrapMode};
    use assert_approx_eq::assert_approx_eq;

    fn small_config() -> TerrainConfig {
        TerrainConfig {
            resolution: 33,
            noise_scale: 4.0,
            width: 64.0,
            length: 32.0,
            height_scale: 10.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_nothing_before_first_generation() {
        let generator = HeightmapGenerator::new(small_config(), 7).unwrap();
        assert!(generator.heightmap().is_none());
        assert_eq!(generator.sample_height(1.0, 1.0), None);
        assert_eq!(generator.center(), None);
    }

    #[test]
    fn test_regenerate_publishes() {
        let mut generator = HeightmapGenerator::new(small_config(), 7).unwrap();
        let first = generator.regenerate().unwrap();
        assert_eq!(first.generation(), 1);
        assert_eq!(first.cells().len(), 33 * 33);
        assert!(first.cells().iter().all(|h| (0.0..=1.0).contains(h)));

        let second = generator.regenerate().unwrap();
        assert_eq!(second.generation(), 2);
        assert_eq!(generator.generation(), 2);
        // Same config, same noise, same cells
        assert_eq!(first.cells(), second.cells());
        // The old snapshot is untouched
        assert_eq!(first.generation(), 1);
    }

    #[test]
    fn test_invert() {
        let mut generator = HeightmapGenerator::new(small_config(), 7).unwrap();
        let normal = generator.regenerate().unwrap();
        generator
            .set_config(TerrainConfig {
                invert: true,
                ..small_config()
            })
            .unwrap();
        let inverted = generator.regenerate().unwrap();
        for (a, b) in normal.cells().iter().zip(inverted.cells()) {
            assert_approx_eq!(a + b, 1.0);
        }
    }

    #[test]
    fn test_multiplier_and_curve_clamp() {
        let mut generator = HeightmapGenerator::new(
            TerrainConfig {
                shaping_curve: Curve::from_points(
                    WrapMode::Clamp,
                    &[(0.0, -1.0), (1.0, 3.0)],
                ),
                ..small_config()
            },
            7,
        )
        .unwrap();
        generator.set_height_multiplier(5.0).unwrap();
        let heightmap = generator.regenerate().unwrap();
        assert!(heightmap.cells().iter().all(|h| (0.0..=1.0).contains(h)));

        assert!(generator.set_height_multiplier(f64::NAN).is_err());
        assert_approx_eq!(generator.config().height_multiplier, 5.0);
    }

    #[test]
    fn test_flat_terrain_for_zero_scale() {
        let mut generator = HeightmapGenerator::new(
            TerrainConfig {
                noise_scale: 0.0,
                ..small_config()
            },
            7,
        )
        .unwrap();
        let heightmap = generator.regenerate().unwrap();
        assert!(heightmap.cells().iter().all(|&h| h == HeightField::FLAT_VALUE));
        assert_approx_eq!(generator.sample_height(10.0, 10.0).unwrap().0, 5.0);
    }

    #[test]
    fn test_invalid_config_keeps_old_heightmap() {
        let mut generator = HeightmapGenerator::new(small_config(), 7).unwrap();
        let published = generator.regenerate().unwrap();

        let err = generator
            .set_config(TerrainConfig {
                resolution: 0,
                ..small_config()
            })
            .unwrap_err();
        assert_eq!(err.invalid_fields(), ["resolution"]);

        let err = generator
            .set_config(TerrainConfig {
                noise_scale: f64::INFINITY,
                ..small_config()
            })
            .unwrap_err();
        assert_eq!(err.invalid_fields(), ["noise_scale"]);

        let current = generator.heightmap().unwrap();
        assert!(Arc::ptr_eq(&published, &current));
        assert_eq!(generator.config().resolution, 33);
    }

    #[test]
    fn test_sample_height_matches_cells() {
        let mut generator = HeightmapGenerator::new(small_config(), 7).unwrap();
        let heightmap = generator.regenerate().unwrap();
        // World (64, 32) is the far corner, grid cell (32, 32)
        let corner = heightmap.get(32, 32).unwrap();
        assert_approx_eq!(generator.sample_normalized(64.0, 32.0).unwrap(), corner);
        assert_approx_eq!(
            generator.sample_height(64.0, 32.0).unwrap().0,
            corner * 10.0
        );
        // Off the terrain clamps to the edge
        assert_approx_eq!(
            generator.sample_normalized(1000.0, 1000.0).unwrap(),
            corner
        );
        // Grid cell (16, 16) is at world (32, 16)
        let [x, y, z] = generator.center().unwrap();
        assert_approx_eq!(x, 32.0);
        assert_approx_eq!(z, 16.0);
        assert_approx_eq!(y, heightmap.get(16, 16).unwrap() * 10.0);
    }
}
