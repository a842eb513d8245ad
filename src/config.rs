use std::f64::consts::PI;
use std::path::PathBuf;

use clap::Parser;

use crate::map::Rgb;

/// Command line configuration
#[derive(Parser, Debug, Clone)]
#[command(name = "tui-choropleth", about = "3D choropleth map in the terminal")]
pub struct Args {
    /// GeoJSON feature collection with the region boundaries
    #[arg(long, default_value = "data/zhejiang.json")]
    pub boundary: PathBuf,

    /// Typeface JSON font used for region labels
    #[arg(long, default_value = "data/f.json")]
    pub font: PathBuf,

    /// Attraction records keyed by city name
    #[arg(long, default_value = "data/travel.json")]
    pub travel: PathBuf,

    /// Projection center longitude
    #[arg(long, default_value_t = 120.153576, allow_negative_numbers = true)]
    pub center_lon: f64,

    /// Projection center latitude
    #[arg(long, default_value_t = 30.287459, allow_negative_numbers = true)]
    pub center_lat: f64,

    /// Region painted with the special base color
    #[arg(long, default_value = "杭州市")]
    pub special_region: String,

    /// Log file (the terminal is owned by the UI)
    #[arg(long, default_value = "tui-choropleth.log")]
    pub log_file: PathBuf,
}

/// Fill palette indexed by feature order
pub const PALETTE: [Rgb; 11] = [
    Rgb::from_u32(0x6d8cbe),
    Rgb::from_u32(0x7390bf),
    Rgb::from_u32(0x87a0c4),
    Rgb::from_u32(0x7e99c3),
    Rgb::from_u32(0x7591bf),
    Rgb::from_u32(0x7c97c1),
    Rgb::from_u32(0x809bc3),
    Rgb::from_u32(0x7290c1),
    Rgb::from_u32(0x869fc4),
    Rgb::from_u32(0x7c98c3),
    Rgb::from_u32(0x6c8bbf),
];

/// Extrusion depth of every region solid
pub const EXTRUDE_DEPTH: f64 = 10.0;
/// Outline polyline z offset
pub const OUTLINE_Z: f64 = 9.0;
/// Label z offset, beyond the outline
pub const LABEL_Z: f64 = 10.0;
pub const LABEL_SIZE: f64 = 0.2;
pub const LABEL_DEPTH: f64 = 0.1;
/// Fill material opacity
pub const FILL_OPACITY: f64 = 0.9;

/// Colors, picking key and root transform of the map
#[derive(Clone, Debug)]
pub struct MapStyle {
    pub palette: Vec<Rgb>,
    /// Used once the palette runs out
    pub fallback_color: Rgb,
    pub special_region: String,
    pub special_color: Rgb,
    pub highlight_color: Rgb,
    pub label_color: Rgb,
    pub background: Rgb,
    /// In-plane scale of the root transform
    pub scale: f64,
    /// Rotation about x of the root transform, in radians
    pub rotation_x: f64,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            palette: PALETTE.to_vec(),
            fallback_color: Rgb::from_u32(0x6a88bc),
            special_region: "杭州市".to_string(),
            special_color: Rgb::from_u32(0x3d68b6),
            highlight_color: Rgb::from_u32(0xc699aa),
            label_color: Rgb::from_u32(0xffffff),
            background: Rgb::from_u32(0xf0f0f0),
            scale: 15.0,
            rotation_x: -PI / 2.0,
        }
    }
}

impl MapStyle {
    pub fn from_args(args: &Args) -> Self {
        Self {
            special_region: args.special_region.clone(),
            ..Self::default()
        }
    }
}

/// Perspective camera orbiting the origin at a fixed distance
#[derive(Clone, Debug)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov_deg: f64,
    pub near: f64,
    pub far: f64,
    /// Starting eye position, pulled onto the orbit sphere
    pub initial_position: (f64, f64, f64),
    /// Orbit radius (min and max distance are equal)
    pub distance: f64,
    pub min_polar: f64,
    pub max_polar: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_deg: 45.0,
            near: 1.0,
            far: 500.0,
            initial_position: (0.0, 370.0, 250.0),
            distance: 370.0,
            min_polar: PI * 0.05,
            max_polar: PI * 0.48,
        }
    }
}
