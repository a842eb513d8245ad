use std::f64::consts::{FRAC_PI_4, PI};

/// Default Mercator scale: a full 360° of longitude spans 961 planar units.
pub const DEFAULT_SCALE: f64 = 961.0 / (2.0 * PI);

/// Mercator projection pinned to a reference center.
///
/// The reference center projects to `(0, 0)`. X grows eastward and y grows
/// southward (screen convention), so callers that build geometry in a
/// y-up space must negate y.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mercator {
    /// Reference center longitude in degrees
    pub center_lon: f64,
    /// Reference center latitude in degrees
    pub center_lat: f64,
    /// Planar units per radian
    pub scale: f64,
    center_y: f64,
}

impl Mercator {
    pub fn new(center_lon: f64, center_lat: f64) -> Self {
        Self::with_scale(center_lon, center_lat, DEFAULT_SCALE)
    }

    pub fn with_scale(center_lon: f64, center_lat: f64, scale: f64) -> Self {
        Self {
            center_lon,
            center_lat,
            scale,
            center_y: mercator_y(center_lat.to_radians()),
        }
    }

    /// Project a geographic coordinate (lon, lat) to planar coordinates
    #[inline]
    pub fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        let x = (lon - self.center_lon).to_radians() * self.scale;
        let y = -(mercator_y(lat.to_radians()) - self.center_y) * self.scale;
        (x, y)
    }

    /// Invert planar coordinates back to (lon, lat)
    pub fn invert(&self, x: f64, y: f64) -> (f64, f64) {
        let lon = self.center_lon + (x / self.scale).to_degrees();
        let merc = self.center_y - y / self.scale;
        let lat = (2.0 * merc.exp().atan() - PI / 2.0).to_degrees();
        (lon, lat)
    }
}

#[inline(always)]
fn mercator_y(lat_rad: f64) -> f64 {
    (FRAC_PI_4 + lat_rad / 2.0).tan().ln()
}
