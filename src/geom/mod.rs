mod dissolve;
mod geom;
mod simplify;

pub(crate) use dissolve::*;
pub use geom::Geom;
pub(crate) use geom::count_vertices;
pub(crate) use simplify::*;
