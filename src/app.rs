use std::sync::mpsc::Receiver;

use tracing::{error, info, warn};

use crate::assets::{spawn_loaders, AssetEvent};
use crate::config::{Args, CameraConfig, MapStyle};
use crate::map::camera::pointer_to_ndc;
use crate::map::label::LabelFont;
use crate::map::picking::{self, Ray};
use crate::map::scene::Region;
use crate::map::{MapRenderer, MapScene, Mercator, MeshId, OrbitCamera, Selection, TooltipCommand};
use crate::tooltip::{AttractionIndex, Tooltip};

/// Keyboard orbit step, in canvas pixels of equivalent drag
const ORBIT_STEP: i32 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetStatus {
    Loading,
    Ready,
    Failed,
}

#[derive(Clone, Copy, Debug)]
pub struct AssetStatuses {
    pub boundaries: AssetStatus,
    pub font: AssetStatus,
    pub attractions: AssetStatus,
}

impl AssetStatuses {
    fn settled(&self) -> bool {
        [self.boundaries, self.font, self.attractions]
            .iter()
            .all(|s| *s != AssetStatus::Loading)
    }
}

/// Application state
pub struct App {
    pub scene: MapScene,
    pub camera: OrbitCamera,
    pub renderer: MapRenderer,
    pub selection: Selection,
    pub tooltip: Tooltip,
    pub attractions: AttractionIndex,
    pub status: AssetStatuses,
    /// Pointer is over a pickable region
    pub hovering: bool,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position for cursor marker
    pub mouse_pos: Option<(u16, u16)>,
    dragged: bool,
    projection: Mercator,
    /// Font that arrived before the boundaries
    pending_font: Option<LabelFont>,
    assets: Option<Receiver<AssetEvent>>,
}

impl App {
    /// Start the asset loaders and build an empty map
    pub fn new(args: &Args, width: usize, height: usize) -> Self {
        let projection = Mercator::new(args.center_lon, args.center_lat);
        Self::with_assets(
            MapStyle::from_args(args),
            CameraConfig::default(),
            projection,
            spawn_loaders(args),
            width,
            height,
        )
    }

    pub fn with_assets(
        style: MapStyle,
        camera: CameraConfig,
        projection: Mercator,
        assets: Receiver<AssetEvent>,
        width: usize,
        height: usize,
    ) -> Self {
        let (pixel_width, pixel_height) = map_pixels(width, height);
        Self {
            scene: MapScene::empty(&style),
            camera: OrbitCamera::new(camera, pixel_width, pixel_height),
            renderer: MapRenderer::new(style),
            selection: Selection::default(),
            tooltip: Tooltip::default(),
            attractions: AttractionIndex::default(),
            status: AssetStatuses {
                boundaries: AssetStatus::Loading,
                font: AssetStatus::Loading,
                attractions: AssetStatus::Loading,
            },
            hovering: false,
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
            dragged: false,
            projection,
            pending_font: None,
            assets: Some(assets),
        }
    }

    /// Apply every finished load without blocking
    pub fn poll_assets(&mut self) {
        let events: Vec<AssetEvent> = match &self.assets {
            Some(rx) => rx.try_iter().collect(),
            None => return,
        };
        for event in events {
            self.handle_asset(event);
        }
        if self.status.settled() {
            self.assets = None;
        }
    }

    fn handle_asset(&mut self, event: AssetEvent) {
        match event {
            AssetEvent::Boundaries(Ok(features)) => {
                self.scene = MapScene::build(&features, &self.projection, self.renderer.style());
                self.selection = Selection::Idle;
                self.tooltip.apply(TooltipCommand::Hide, &self.attractions);
                self.status.boundaries = AssetStatus::Ready;
                match (self.pending_font.take(), self.status.font) {
                    (Some(font), _) => self.scene.resolve_labels(&font),
                    (None, AssetStatus::Failed) => self.scene.mark_labels_unavailable(),
                    _ => {}
                }
            }
            AssetEvent::Boundaries(Err(e)) => {
                error!(error = %format!("{e:#}"), "boundary load failed; map stays empty");
                self.status.boundaries = AssetStatus::Failed;
            }
            AssetEvent::Font(Ok(font)) => {
                info!(family = %font.family, glyphs = font.advances.len(), "font loaded");
                self.status.font = AssetStatus::Ready;
                if self.status.boundaries == AssetStatus::Ready {
                    self.scene.resolve_labels(&font);
                } else {
                    self.pending_font = Some(font);
                }
            }
            AssetEvent::Font(Err(e)) => {
                warn!(error = %format!("{e:#}"), "font load failed; labels unavailable");
                self.status.font = AssetStatus::Failed;
                self.scene.mark_labels_unavailable();
            }
            AssetEvent::Attractions(Ok(records)) => {
                self.attractions = AttractionIndex::new(records);
                info!(cities = self.attractions.len(), "attractions loaded");
                self.status.attractions = AssetStatus::Ready;
                self.tooltip.refresh(&self.attractions);
            }
            AssetEvent::Attractions(Err(e)) => {
                warn!(error = %format!("{e:#}"), "attraction load failed");
                self.status.attractions = AssetStatus::Failed;
            }
        }
    }

    /// Ray through the center of the Braille cell under a terminal position
    fn ray_at(&self, col: u16, row: u16) -> Option<Ray> {
        let (px, py) = self.cell_to_pixel(col, row)?;
        let (nx, ny) = pointer_to_ndc(px, py, self.camera.width, self.camera.height);
        Some(self.camera.ray(nx, ny))
    }

    /// Terminal cell to canvas pixel, `None` outside the map area
    pub fn cell_to_pixel(&self, col: u16, row: u16) -> Option<(f64, f64)> {
        // Account for the border
        let cx = (col as usize).checked_sub(1)?;
        let cy = (row as usize).checked_sub(1)?;
        let (px, py) = (cx * 2 + 1, cy * 4 + 2);
        (px < self.camera.width && py < self.camera.height).then_some((px as f64, py as f64))
    }

    /// Pick at a terminal position and run the selection transition
    pub fn click(&mut self, col: u16, row: u16) {
        let Some(ray) = self.ray_at(col, row) else {
            return;
        };
        let pick = picking::resolve(&ray, &self.scene);
        self.select(pick);
    }

    /// Same as clicking empty space
    pub fn clear_selection(&mut self) {
        self.select(None);
    }

    fn select(&mut self, pick: Option<MeshId>) {
        let highlight = self.renderer.style().highlight_color;
        let command = self.selection.apply(pick, &mut self.scene, highlight);
        self.tooltip.apply(command, &self.attractions);
    }

    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
    }

    pub fn hover_at(&mut self, col: u16, row: u16) {
        self.set_mouse_pos(col, row);
        self.hovering = self
            .ray_at(col, row)
            .is_some_and(|ray| picking::hover(&ray, &self.scene));
    }

    pub fn start_drag(&mut self, col: u16, row: u16) {
        self.last_mouse = Some((col, row));
        self.dragged = false;
    }

    /// Orbit by the cell delta since the last drag event
    pub fn handle_drag(&mut self, col: u16, row: u16) {
        self.set_mouse_pos(col, row);
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = (col as i32 - last_x as i32) * 2;
            let dy = (row as i32 - last_y as i32) * 4;
            if dx != 0 || dy != 0 {
                self.camera.rotate_drag(dx, dy);
                self.dragged = true;
            }
        }
        self.last_mouse = Some((col, row));
    }

    /// A press and release without movement is a click
    pub fn end_drag(&mut self, col: u16, row: u16) {
        let was_press = self.last_mouse.is_some();
        self.last_mouse = None;
        if was_press && !self.dragged {
            self.click(col, row);
        }
        self.dragged = false;
    }

    pub fn orbit(&mut self, steps_x: i32, steps_y: i32) {
        self.camera.rotate_drag(steps_x * ORBIT_STEP, steps_y * ORBIT_STEP);
    }

    pub fn reset_camera(&mut self) {
        self.camera.reset();
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        let (pixel_width, pixel_height) = map_pixels(width, height);
        self.camera.set_size(pixel_width, pixel_height);
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn selected_region(&self) -> Option<&Region> {
        let mesh = self.scene.mesh(self.selection.mesh()?)?;
        self.scene.region(mesh.region)
    }

    pub fn selected_name(&self) -> Option<&str> {
        self.selected_region().map(|r| r.name.as_str())
    }
}

/// Braille canvas size for a terminal of `width` x `height` characters.
/// 2 border columns; 2 border rows plus the status bar.
fn map_pixels(width: usize, height: usize) -> (usize, usize) {
    (width.saturating_sub(2) * 2, height.saturating_sub(3) * 4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::region::{Feature, FeatureGeometry};
    use crate::tooltip::{Attraction, AttractionRecord};
    use glam::DVec3;
    use std::sync::mpsc::{self, Sender};

    fn square(name: &str, lon: f64, lat: f64) -> Feature {
        Feature {
            name: name.into(),
            center_hint: None,
            geometry: FeatureGeometry::Polygon(vec![vec![
                (lon - 1.0, lat - 1.0),
                (lon - 1.0, lat + 1.0),
                (lon + 1.0, lat + 1.0),
                (lon + 1.0, lat - 1.0),
                (lon - 1.0, lat - 1.0),
            ]]),
        }
    }

    /// 82x23 terminal: 80x20 map cells, so cell (41, 11) is the canvas center
    fn app() -> (App, Sender<AssetEvent>) {
        let (tx, rx) = mpsc::channel();
        let app = App::with_assets(
            MapStyle::default(),
            CameraConfig::default(),
            Mercator::new(120.0, 30.0),
            rx,
            82,
            23,
        );
        (app, tx)
    }

    fn loaded_app() -> App {
        let (mut app, tx) = app();
        tx.send(AssetEvent::Boundaries(Ok(vec![square("杭州市", 120.0, 30.0)]))).unwrap();
        tx.send(AssetEvent::Attractions(Ok(vec![AttractionRecord {
            city: "杭州市".into(),
            attractions: vec![Attraction {
                name: "西湖".into(),
                description: "湖".into(),
            }],
        }])))
        .unwrap();
        app.poll_assets();
        app
    }

    #[test]
    fn test_poll_builds_scene() {
        let app = loaded_app();
        assert_eq!(app.status.boundaries, AssetStatus::Ready);
        assert_eq!(app.status.attractions, AssetStatus::Ready);
        assert_eq!(app.status.font, AssetStatus::Loading);
        assert_eq!(app.scene.regions().len(), 1);
    }

    #[test]
    fn test_click_toggles_selection_and_tooltip() {
        let mut app = loaded_app();
        let highlight = app.renderer.style().highlight_color;

        app.click(41, 11);
        assert_eq!(app.selected_name(), Some("杭州市"));
        assert_eq!(app.scene.meshes()[0].color, highlight);
        let content = app.tooltip.content().unwrap();
        assert_eq!(content.heading, "杭州市");
        assert_eq!(content.entries.len(), 1);

        app.click(41, 11);
        assert_eq!(app.selection, Selection::Idle);
        assert!(!app.tooltip.is_visible());
        assert_eq!(app.scene.meshes()[0].color, app.scene.meshes()[0].base_color);
    }

    fn record(city: &str, names: &[&str]) -> AttractionRecord {
        AttractionRecord {
            city: city.into(),
            attractions: names
                .iter()
                .map(|n| Attraction {
                    name: (*n).into(),
                    description: format!("{n}简介"),
                })
                .collect(),
        }
    }

    /// Terminal cell over the middle of a region's top cap
    fn cell_over(app: &App, name: &str) -> (u16, u16) {
        let region = app.scene.find_region(name).unwrap();
        let b = app.scene.mesh(region.meshes[0]).unwrap().geometry.bounds;
        let top = DVec3::new((b.min.x + b.max.x) / 2.0, (b.min.y + b.max.y) / 2.0, b.max.z);
        let (px, py, _) = app.camera.project(app.scene.to_world(top)).unwrap();
        ((px / 2.0) as u16 + 1, (py / 4.0) as u16 + 1)
    }

    #[test]
    fn test_switching_regions_shows_new_attractions() {
        let (mut app, tx) = app();
        tx.send(AssetEvent::Boundaries(Ok(vec![
            square("杭州市", 120.0, 30.0),
            square("宁波市", 122.0, 30.0),
        ])))
        .unwrap();
        tx.send(AssetEvent::Attractions(Ok(vec![
            record("杭州市", &["西湖"]),
            record("宁波市", &["天一阁", "东钱湖"]),
        ])))
        .unwrap();
        app.poll_assets();

        let (a_col, a_row) = cell_over(&app, "杭州市");
        let (b_col, b_row) = cell_over(&app, "宁波市");
        assert_ne!((a_col, a_row), (b_col, b_row));

        app.click(a_col, a_row);
        assert_eq!(app.selected_name(), Some("杭州市"));
        assert_eq!(app.tooltip.content().unwrap().entries[0].name, "西湖");

        app.click(b_col, b_row);
        assert_eq!(app.selected_name(), Some("宁波市"));
        let content = app.tooltip.content().unwrap();
        assert_eq!(content.heading, "宁波市");
        let names: Vec<_> = content.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["天一阁", "东钱湖"]);

        let highlight = app.renderer.style().highlight_color;
        let hangzhou = app.scene.find_region("杭州市").unwrap().meshes[0];
        let ningbo = app.scene.find_region("宁波市").unwrap().meshes[0];
        let hangzhou = app.scene.mesh(hangzhou).unwrap();
        assert_eq!(hangzhou.color, hangzhou.base_color);
        assert_eq!(app.scene.mesh(ningbo).unwrap().color, highlight);
    }

    #[test]
    fn test_boundary_reload_hides_tooltip() {
        let (mut app, tx) = app();
        tx.send(AssetEvent::Boundaries(Ok(vec![square("杭州市", 120.0, 30.0)]))).unwrap();
        app.poll_assets();
        app.click(41, 11);
        assert!(app.tooltip.is_visible());

        tx.send(AssetEvent::Boundaries(Ok(vec![square("杭州市", 120.0, 30.0)]))).unwrap();
        app.poll_assets();
        assert_eq!(app.selection, Selection::Idle);
        assert!(!app.tooltip.is_visible());
    }

    #[test]
    fn test_click_empty_space_clears() {
        let mut app = loaded_app();
        app.click(41, 11);
        // Top-left corner looks at the sky
        app.click(1, 1);
        assert_eq!(app.selection, Selection::Idle);
        assert!(!app.tooltip.is_visible());
    }

    #[test]
    fn test_click_on_border_is_ignored() {
        let mut app = loaded_app();
        app.click(41, 11);
        app.click(0, 0);
        assert_eq!(app.selected_name(), Some("杭州市"));
    }

    #[test]
    fn test_hover() {
        let mut app = loaded_app();
        app.hover_at(41, 11);
        assert!(app.hovering);
        app.hover_at(1, 1);
        assert!(!app.hovering);
    }

    #[test]
    fn test_press_release_without_drag_clicks() {
        let mut app = loaded_app();
        app.start_drag(41, 11);
        app.end_drag(41, 11);
        assert_eq!(app.selected_name(), Some("杭州市"));

        let azimuth = app.camera.azimuth();
        app.start_drag(41, 11);
        app.handle_drag(45, 11);
        app.end_drag(45, 11);
        assert_ne!(app.camera.azimuth(), azimuth);
        assert_eq!(app.selected_name(), Some("杭州市"));
    }

    #[test]
    fn test_font_before_boundaries_is_applied_later() {
        let (mut app, tx) = app();
        tx.send(AssetEvent::Font(Ok(LabelFont {
            family: "Test".into(),
            resolution: 1.0,
            advances: "杭州市".chars().map(|c| (c, 1.0)).collect(),
        })))
        .unwrap();
        app.poll_assets();
        assert!(app.scene.is_empty());

        tx.send(AssetEvent::Boundaries(Ok(vec![square("杭州市", 120.0, 30.0)]))).unwrap();
        app.poll_assets();
        assert!(app.scene.regions()[0].label.ready().is_some());
    }

    #[test]
    fn test_failed_loads_keep_map_usable() {
        let (mut app, tx) = app();
        tx.send(AssetEvent::Font(Err(anyhow::anyhow!("bad font")))).unwrap();
        tx.send(AssetEvent::Attractions(Err(anyhow::anyhow!("bad travel")))).unwrap();
        tx.send(AssetEvent::Boundaries(Ok(vec![square("温州市", 120.0, 30.0)]))).unwrap();
        app.poll_assets();
        assert!(app.status.settled());
        assert!(app.scene.regions()[0].label.ready().is_none());

        app.click(41, 11);
        let content = app.tooltip.content().unwrap();
        assert_eq!(content.heading, "温州市");
        assert!(content.entries.is_empty());
    }

    #[test]
    fn test_boundary_failure_leaves_empty_scene() {
        let (mut app, tx) = app();
        tx.send(AssetEvent::Boundaries(Err(anyhow::anyhow!("bad geojson")))).unwrap();
        app.poll_assets();
        assert_eq!(app.status.boundaries, AssetStatus::Failed);
        assert!(app.scene.is_empty());
        app.click(41, 11);
        assert_eq!(app.selection, Selection::Idle);
    }

    #[test]
    fn test_cell_to_pixel() {
        let (app, _tx) = app();
        assert_eq!(app.cell_to_pixel(0, 5), None);
        assert_eq!(app.cell_to_pixel(1, 1), Some((1.0, 2.0)));
        assert_eq!(app.cell_to_pixel(81, 1), None);
    }
}
