pub mod geojson_bounds;
pub mod geometry;
pub mod geometry_codec;
pub mod kernel;
pub mod protocol;

pub use geojson_bounds::*;
pub use geometry::*;
pub use geometry_codec::*;
pub use kernel::*;
pub use protocol::*;
