use crate::{
    render::{self, height_color},
    terrain::Heightmap,
    SimConfig,
};
use svg::{
    node::{element::Rectangle, Comment},
    Document,
};

/// Render a heightmap as a top-down grayscale SVG. Each cell is a 1x1
/// square, so the view box is as many units wide as there are rendered
/// cells. The config is embedded as a comment so renders can be traced back
/// to what produced them.
pub fn heightmap_to_svg(heightmap: &Heightmap, config: &SimConfig) -> Document {
    let step = render::render_step(heightmap);
    let cells_per_edge = (heightmap.resolution() + step - 1) / step;

    let mut document = Document::new()
        .set("viewBox", (0, 0, cells_per_edge, cells_per_edge))
        .set("shape-rendering", "crispEdges")
        .add(Comment::new(format!("\n{:#?}\n", config)));

    for (column, row, height) in render::render_cells(heightmap) {
        document = document.add(
            Rectangle::new()
                .set("x", column)
                .set("y", row)
                .set("width", 1)
                .set("height", 1)
                .set("fill", height_color(height).to_html()),
        );
    }

    document
}
