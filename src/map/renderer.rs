use glam::DVec3;

use crate::braille::BrailleCanvas;
use crate::config::{MapStyle, FILL_OPACITY};
use crate::map::camera::{project_with, OrbitCamera};
use crate::map::geometry::Face;
use crate::map::raster::{draw_line, fill_triangle, ScreenPoint};
use crate::map::scene::MapScene;
use crate::map::Rgb;

/// Outlines sit just under the top cap; pull them forward so they stay visible
const OUTLINE_DEPTH_BIAS: f64 = 1e-4;

/// Ground grid: total size and cell count
const GRID_SIZE: f64 = 2500.0;
const GRID_DIVISIONS: usize = 100;
const GRID_COLOR: Rgb = Rgb(0x88, 0x88, 0x88);

/// Wall dot coverage relative to the cap
const WALL_COVERAGE: f64 = 0.45;

/// Display settings for map layers
#[derive(Clone)]
pub struct DisplaySettings {
    pub show_outlines: bool,
    pub show_labels: bool,
    pub show_grid: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_outlines: true,
            show_labels: true,
            show_grid: true,
        }
    }
}

/// Rendered frame: the shaded canvas plus text labels in character cells
pub struct MapLayers {
    pub canvas: BrailleCanvas,
    pub labels: Vec<(u16, u16, String)>,
}

/// Rasterizes the map scene onto a Braille canvas
pub struct MapRenderer {
    pub settings: DisplaySettings,
    style: MapStyle,
}

impl MapRenderer {
    pub fn new(style: MapStyle) -> Self {
        Self {
            settings: DisplaySettings::default(),
            style,
        }
    }

    pub fn style(&self) -> &MapStyle {
        &self.style
    }

    /// Render all map objects for a canvas of `width` x `height` characters
    pub fn render(&self, scene: &MapScene, camera: &OrbitCamera, width: usize, height: usize) -> MapLayers {
        let mut canvas = BrailleCanvas::new(width, height);
        let (pw, ph) = (canvas.pixel_width(), canvas.pixel_height());
        let vp = camera.view_projection();
        let mvp = vp * scene.root_transform();
        let near = 1e-6;
        let project = |m: &glam::DMat4, p: DVec3| -> Option<ScreenPoint> {
            project_with(m, p, pw, ph, near).filter(|&(_, _, z)| (-1.0..=1.0).contains(&z))
        };

        // Solids first so they fill the depth buffer
        for mesh in scene.meshes() {
            let geometry = &mesh.geometry;
            let screen: Vec<Option<ScreenPoint>> = geometry.vertices.iter().map(|&v| project(&mvp, v)).collect();
            let cap_color = mesh.color.over(self.style.background, FILL_OPACITY);

            for (idx, tri) in geometry.triangles.iter().enumerate() {
                let coverage = match geometry.face(idx) {
                    // Always faces away from a camera above the map
                    Face::Bottom => continue,
                    Face::Top => FILL_OPACITY,
                    Face::Wall => WALL_COVERAGE,
                };
                let (Some(a), Some(b), Some(c)) = (screen[tri[0] as usize], screen[tri[1] as usize], screen[tri[2] as usize]) else {
                    continue;
                };
                fill_triangle(&mut canvas, [a, b, c], coverage, cap_color);
            }
        }

        if self.settings.show_outlines {
            for region in scene.regions() {
                for outline in &region.outlines {
                    for (a, b) in outline.segments() {
                        if let (Some(pa), Some(pb)) = (project(&mvp, a), project(&mvp, b)) {
                            draw_line(
                                &mut canvas,
                                (pa.0, pa.1, pa.2 - OUTLINE_DEPTH_BIAS),
                                (pb.0, pb.1, pb.2 - OUTLINE_DEPTH_BIAS),
                                outline.color,
                            );
                        }
                    }
                }
            }
        }

        if self.settings.show_grid {
            self.draw_grid(&mut canvas, &|p| project(&vp, p));
        }

        let mut labels = Vec::new();
        if self.settings.show_labels {
            for region in scene.regions() {
                let Some(label) = region.label.ready() else {
                    continue;
                };
                if let Some((px, py, _)) = project(&mvp, label.position) {
                    if px >= 0.0 && py >= 0.0 && (px as usize) < pw && (py as usize) < ph {
                        labels.push(((px / 2.0) as u16, (py / 4.0) as u16, label.text.clone()));
                    }
                }
            }
        }

        MapLayers { canvas, labels }
    }

    /// Ground plane grid at world y = 0. Lines are split into cell-sized
    /// pieces so the parts behind the camera can be dropped.
    fn draw_grid(&self, canvas: &mut BrailleCanvas, project: &dyn Fn(DVec3) -> Option<ScreenPoint>) {
        let half = GRID_SIZE / 2.0;
        let step = GRID_SIZE / GRID_DIVISIONS as f64;

        for i in 0..=GRID_DIVISIONS {
            let k = -half + i as f64 * step;
            for j in 0..GRID_DIVISIONS {
                let s0 = -half + j as f64 * step;
                let s1 = s0 + step;
                for (a, b) in [
                    (DVec3::new(k, 0.0, s0), DVec3::new(k, 0.0, s1)),
                    (DVec3::new(s0, 0.0, k), DVec3::new(s1, 0.0, k)),
                ] {
                    if let (Some(pa), Some(pb)) = (project(a), project(b)) {
                        draw_line(canvas, pa, pb, GRID_COLOR);
                    }
                }
            }
        }
    }
}
