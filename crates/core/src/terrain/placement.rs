use crate::terrain::HeightmapGenerator;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A world-space point resting on the terrain surface, where a host can drop
/// an object.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub x: f64,
    /// Terrain height at (x, z), plus the requested offset
    pub y: f64,
    pub z: f64,
}

/// Pick `count` uniformly random points inside the terrain bounds and lift
/// each one onto the terrain surface plus `height_offset`. Returns nothing if
/// no heightmap has been published yet.
pub fn scatter(
    generator: &HeightmapGenerator,
    rng: &mut impl Rng,
    count: usize,
    height_offset: f64,
) -> Vec<Placement> {
    if generator.heightmap().is_none() {
        return Vec::new();
    }

    let width = generator.config().width;
    let length = generator.config().length;
    (0..count)
        .filter_map(|_| {
            let x = rng.gen_range(0.0..=width);
            let z = rng.gen_range(0.0..=length);
            let height = generator.sample_height(x, z)?;
            Some(Placement {
                x,
                y: height.0 + height_offset,
                z,
            })
        })
        .collect()
}
