//! Visual output for heightmaps. Only 2D top-down renders are supported.

#[cfg(feature = "svg")]
pub mod svg;

use crate::{terrain::Heightmap, Rgb};

/// Largest number of cells drawn along each edge. Bigger heightmaps are
/// downsampled by skipping cells.
pub const MAX_RENDER_CELLS: u32 = 128;

/// Grayscale color for a normalized height: black at 0, white at 1.
pub fn height_color(height: f64) -> Rgb {
    Rgb::BLACK.lerp(Rgb::WHITE, height)
}

/// Grid step needed to fit a heightmap into [MAX_RENDER_CELLS] cells per
/// edge.
pub fn render_step(heightmap: &Heightmap) -> u32 {
    ((heightmap.resolution() + MAX_RENDER_CELLS - 1) / MAX_RENDER_CELLS).max(1)
}

/// Every rendered cell as `(column, row, height)`, in screen order.
pub fn render_cells(
    heightmap: &Heightmap,
) -> impl Iterator<Item = (u32, u32, f64)> + '_ {
    let step = render_step(heightmap) as usize;
    let resolution = heightmap.resolution();
    (0..resolution)
        .step_by(step)
        .enumerate()
        .flat_map(move |(row, y)| {
            (0..resolution).step_by(step).enumerate().filter_map(
                move |(column, x)| {
                    heightmap
                        .get(x, y)
                        .map(|height| (column as u32, row as u32, height))
                },
            )
        })
}
