use std::f64::consts::PI;

use glam::{DMat4, DVec3, DVec4};

use crate::config::CameraConfig;
use crate::map::picking::Ray;

/// Perspective camera orbiting a target at a fixed distance.
/// Orientation is kept in spherical form (polar from +Y, azimuth around Y),
/// the same parametrization drag-to-orbit controls use.
#[derive(Clone, Debug)]
pub struct OrbitCamera {
    config: CameraConfig,
    target: DVec3,
    polar: f64,
    azimuth: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl OrbitCamera {
    pub fn new(config: CameraConfig, width: usize, height: usize) -> Self {
        let mut camera = Self {
            config,
            target: DVec3::ZERO,
            polar: 0.0,
            azimuth: 0.0,
            width,
            height,
        };
        camera.reset();
        camera
    }

    /// Back to the configured starting position
    pub fn reset(&mut self) {
        let (x, y, z) = self.config.initial_position;
        let offset = DVec3::new(x, y, z) - self.target;
        let radius = offset.length().max(f64::EPSILON);
        self.azimuth = offset.x.atan2(offset.z);
        self.polar = (offset.y / radius).clamp(-1.0, 1.0).acos();
        self.clamp_polar();
    }

    fn clamp_polar(&mut self) {
        self.polar = self.polar.clamp(self.config.min_polar, self.config.max_polar);
    }

    /// Orbit by a pixel drag delta. A drag across the full canvas height
    /// turns the camera by a full revolution.
    pub fn rotate_drag(&mut self, dx: i32, dy: i32) {
        let h = self.height.max(1) as f64;
        self.azimuth -= 2.0 * PI * dx as f64 / h;
        self.polar -= 2.0 * PI * dy as f64 / h;
        self.azimuth = self.azimuth.rem_euclid(2.0 * PI);
        self.clamp_polar();
    }

    pub fn set_size(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }

    pub fn polar(&self) -> f64 {
        self.polar
    }

    pub fn azimuth(&self) -> f64 {
        self.azimuth
    }

    pub fn eye(&self) -> DVec3 {
        let (sin_p, cos_p) = self.polar.sin_cos();
        let (sin_a, cos_a) = self.azimuth.sin_cos();
        self.target + self.config.distance * DVec3::new(sin_p * sin_a, cos_p, sin_p * cos_a)
    }

    fn aspect(&self) -> f64 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f64 / self.height as f64
        }
    }

    pub fn view_projection(&self) -> DMat4 {
        let proj = DMat4::perspective_rh_gl(
            self.config.fov_deg.to_radians(),
            self.aspect(),
            self.config.near,
            self.config.far,
        );
        let view = DMat4::look_at_rh(self.eye(), self.target, DVec3::Y);
        proj * view
    }

    /// Project a world point to canvas pixels plus NDC depth.
    /// Returns `None` for points behind the near plane.
    pub fn project(&self, world: DVec3) -> Option<(f64, f64, f64)> {
        project_with(&self.view_projection(), world, self.width, self.height, self.config.near)
    }

    /// Ray from the eye through normalized device coordinates
    pub fn ray(&self, ndc_x: f64, ndc_y: f64) -> Ray {
        let inv = self.view_projection().inverse();
        let eye = self.eye();
        let through = inv.project_point3(DVec3::new(ndc_x, ndc_y, 0.5));
        Ray::new(eye, through - eye)
    }
}

/// Project with a precomputed view-projection matrix, for hot loops
#[inline]
pub fn project_with(vp: &DMat4, world: DVec3, width: usize, height: usize, near: f64) -> Option<(f64, f64, f64)> {
    let clip = *vp * DVec4::new(world.x, world.y, world.z, 1.0);
    if clip.w < near {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    let px = (ndc.x + 1.0) * 0.5 * width as f64;
    let py = (1.0 - ndc.y) * 0.5 * height as f64;
    Some((px, py, ndc.z))
}

/// Canvas pixel to normalized device coordinates (y up)
pub fn pointer_to_ndc(px: f64, py: f64, width: usize, height: usize) -> (f64, f64) {
    let w = width.max(1) as f64;
    let h = height.max(1) as f64;
    (px / w * 2.0 - 1.0, -(py / h) * 2.0 + 1.0)
}
