use serde::{Deserialize, Serialize};

/// A square grid of terrain heights, each normalized to [0,1]. Cells are
/// stored row-major: `x` runs along the world X axis, `y` along the world Z
/// axis.
///
/// A heightmap is immutable once built. Regenerating terrain produces a whole
/// new heightmap, which replaces the old one in a single step, so anyone
/// holding a reference to a heightmap never sees it change underneath them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Heightmap {
    resolution: u32,
    /// Incremented every time the generator publishes a new grid
    generation: u64,
    cells: Vec<f64>,
}

/// Summary statistics over every cell of a [Heightmap]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeightStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl Heightmap {
    /// Wrap a fully populated cell buffer. The buffer must hold exactly
    /// `resolution²` cells; this is only called by the generator, which
    /// guarantees that.
    pub(crate) fn new(
        resolution: u32,
        generation: u64,
        cells: Vec<f64>,
    ) -> Self {
        debug_assert_eq!(
            cells.len(),
            (resolution as usize).pow(2),
            "heightmap buffer doesn't match resolution"
        );
        Self {
            resolution,
            generation,
            cells,
        }
    }

    /// Number of samples along each edge
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Which generation pass produced this grid. The first is 1.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// All cells, row-major
    pub fn cells(&self) -> &[f64] {
        &self.cells
    }

    /// Height of a single cell, or `None` if the coordinates are off the grid.
    pub fn get(&self, x: u32, y: u32) -> Option<f64> {
        if x < self.resolution && y < self.resolution {
            self.cells.get(self.index(x, y)).copied()
        } else {
            None
        }
    }

    /// Sample the grid at fractional grid coordinates by blending the four
    /// surrounding cells. Coordinates off the grid are clamped to the nearest
    /// edge.
    pub fn sample_bilinear(&self, gx: f64, gy: f64) -> f64 {
        let max = (self.resolution - 1) as f64;
        // NaN falls through to 0
        let fx = if gx.is_nan() { 0.0 } else { gx.clamp(0.0, max) };
        let fy = if gy.is_nan() { 0.0 } else { gy.clamp(0.0, max) };

        let x0 = fx.floor() as u32;
        let y0 = fy.floor() as u32;
        let x1 = (x0 + 1).min(self.resolution - 1);
        let y1 = (y0 + 1).min(self.resolution - 1);
        let tx = fx - fx.floor();
        let ty = fy - fy.floor();

        let h00 = self.cells[self.index(x0, y0)];
        let h10 = self.cells[self.index(x1, y0)];
        let h01 = self.cells[self.index(x0, y1)];
        let h11 = self.cells[self.index(x1, y1)];

        let h0 = h00 * (1.0 - tx) + h10 * tx;
        let h1 = h01 * (1.0 - tx) + h11 * tx;
        h0 * (1.0 - ty) + h1 * ty
    }

    pub fn stats(&self) -> HeightStats {
        let min = self.cells.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self.cells.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = self.cells.iter().sum::<f64>() / self.cells.len() as f64;
        HeightStats { min, max, mean }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.resolution as usize + x as usize
    }
}
