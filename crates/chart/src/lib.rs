pub mod projector;
pub mod svg;

pub use projector::{project, Point, PolylineGeometry, Projection, Viewport};
pub use svg::render_svg;
