mod color;
pub mod camera;
pub mod geometry;
pub mod label;
pub mod picking;
pub mod projection;
mod raster;
pub mod region;
pub mod renderer;
pub mod scene;
pub mod selection;

pub use camera::OrbitCamera;
pub use color::Rgb;
pub use projection::Mercator;
pub use renderer::{MapLayers, MapRenderer};
pub use scene::{MapScene, MeshId, RegionId};
pub use selection::{Selection, TooltipCommand};
