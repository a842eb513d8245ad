use glam::DVec3;

use crate::map::geometry::ExtrudedMesh;
use crate::map::scene::{MapScene, MeshId, RegionId};

/// Outline hit tolerance in world units
pub const LINE_THRESHOLD: f64 = 1.0;

const EPSILON: f64 = 1e-12;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: DVec3,
    /// Unit direction
    pub dir: DVec3,
}

impl Ray {
    pub fn new(origin: DVec3, dir: DVec3) -> Self {
        Self {
            origin,
            dir: dir.try_normalize().unwrap_or(DVec3::NEG_Z),
        }
    }

    pub fn at(&self, t: f64) -> DVec3 {
        self.origin + self.dir * t
    }
}

/// Something in the scene graph a ray can hit
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SceneObject {
    /// Extruded region solid, tagged with its region
    Mesh(MeshId),
    /// Outline `index` of a region; carries no tag
    Outline(RegionId, usize),
    /// Text label of a region; carries no tag
    Label(RegionId),
}

impl SceneObject {
    /// Whether the object carries a region tag
    pub fn is_tagged(&self) -> bool {
        matches!(self, SceneObject::Mesh(_))
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Intersection {
    pub object: SceneObject,
    /// World-space distance from the ray origin
    pub distance: f64,
    pub point: DVec3,
}

/// Intersect a world-space ray with every object under the scene root,
/// nearest first. Ties keep scene order.
pub fn intersect(ray: &Ray, scene: &MapScene) -> Vec<Intersection> {
    let inv = scene.root_inverse();
    // Affine map: the parameter t is the same in both spaces, and since
    // the world direction is unit length, t is the world distance.
    let local_origin = inv.transform_point3(ray.origin);
    let local_dir = inv.transform_vector3(ray.dir);

    let mut hits = Vec::new();

    for mesh in scene.meshes() {
        if let Some(t) = intersect_mesh(&mesh.geometry, local_origin, local_dir) {
            hits.push(Intersection {
                object: SceneObject::Mesh(mesh.id),
                distance: t,
                point: ray.at(t),
            });
        }
    }

    let scale = scene.root_transform().to_scale_rotation_translation().0;
    let local_threshold = LINE_THRESHOLD / ((scale.x + scale.y + scale.z) / 3.0);
    let unit_dir = local_dir.normalize_or_zero();

    for region in scene.regions() {
        for (idx, outline) in region.outlines.iter().enumerate() {
            let mut best: Option<f64> = None;
            for (a, b) in outline.segments() {
                let Some((on_ray, dist2)) = ray_segment_closest(local_origin, unit_dir, a, b) else {
                    continue;
                };
                if dist2 > local_threshold * local_threshold {
                    continue;
                }
                let world = scene.to_world(on_ray);
                let d = world.distance(ray.origin);
                if best.is_none_or(|bd| d < bd) {
                    best = Some(d);
                }
            }
            if let Some(d) = best {
                hits.push(Intersection {
                    object: SceneObject::Outline(region.id, idx),
                    distance: d,
                    point: ray.at(d),
                });
            }
        }

        if let Some(label) = region.label.ready() {
            if let Some(t) = label.bounds.ray_hit(local_origin, local_dir) {
                hits.push(Intersection {
                    object: SceneObject::Label(region.id),
                    distance: t,
                    point: ray.at(t),
                });
            }
        }
    }

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

/// Nearest extruded solid under the ray. Outlines and labels never win.
pub fn resolve(ray: &Ray, scene: &MapScene) -> Option<MeshId> {
    intersect(ray, scene).into_iter().find_map(|hit| match hit.object {
        SceneObject::Mesh(id) => Some(id),
        _ => None,
    })
}

/// Pointer affordance: whether the topmost hit carries a region tag
pub fn hover(ray: &Ray, scene: &MapScene) -> bool {
    intersect(ray, scene)
        .first()
        .is_some_and(|hit| hit.object.is_tagged())
}

/// Nearest triangle hit, or `None` when the bounds are missed
fn intersect_mesh(mesh: &ExtrudedMesh, origin: DVec3, dir: DVec3) -> Option<f64> {
    mesh.bounds.ray_hit(origin, dir)?;

    let mut best: Option<f64> = None;
    for idx in 0..mesh.triangles.len() {
        if let Some(t) = ray_triangle(origin, dir, mesh.triangle(idx)) {
            if best.is_none_or(|b| t < b) {
                best = Some(t);
            }
        }
    }
    best
}

/// Möller–Trumbore, double sided
fn ray_triangle(origin: DVec3, dir: DVec3, [v0, v1, v2]: [DVec3; 3]) -> Option<f64> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let h = dir.cross(edge2);
    let a = edge1.dot(h);

    // Ray is parallel to triangle
    if a.abs() < EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = origin - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * dir.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    if t > EPSILON { Some(t) } else { None }
}

/// Closest approach of a ray (unit `dir`) and segment `a..b`.
/// Returns the point on the ray and the squared gap.
fn ray_segment_closest(origin: DVec3, dir: DVec3, a: DVec3, b: DVec3) -> Option<(DVec3, f64)> {
    if dir == DVec3::ZERO {
        return None;
    }
    let seg = b - a;
    let seg_len2 = seg.length_squared();
    let w = origin - a;

    let (s, u) = if seg_len2 < EPSILON {
        (w.dot(-dir).max(0.0), 0.0)
    } else {
        let bd = dir.dot(seg);
        let d = dir.dot(w);
        let e = seg.dot(w);
        let denom = seg_len2 - bd * bd;

        let mut u = if denom.abs() < EPSILON { 0.0 } else { ((e - bd * d) / denom).clamp(0.0, 1.0) };
        let mut s = (bd * u - d).max(0.0);
        // Re-project onto the segment for the clamped ray parameter
        u = ((s * bd + e) / seg_len2).clamp(0.0, 1.0);
        s = (bd * u - d).max(0.0);
        (s, u)
    };

    let on_ray = origin + dir * s;
    let on_seg = a + seg * u;
    Some((on_ray, on_ray.distance_squared(on_seg)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CameraConfig, MapStyle, EXTRUDE_DEPTH};
    use crate::map::camera::OrbitCamera;
    use crate::map::label::LabelFont;
    use crate::map::projection::Mercator;
    use crate::map::region::{Feature, FeatureGeometry};

    fn square(name: &str, lon: f64, lat: f64, size: f64) -> Feature {
        Feature {
            name: name.to_string(),
            center_hint: None,
            geometry: FeatureGeometry::Polygon(vec![vec![
                (lon, lat),
                (lon, lat + size),
                (lon + size, lat + size),
                (lon + size, lat),
                (lon, lat),
            ]]),
        }
    }

    fn scene() -> (MapScene, Mercator) {
        let proj = Mercator::new(120.0, 30.0);
        let features = vec![square("west", 119.5, 29.5, 0.4), square("east", 120.5, 29.5, 0.4)];
        (MapScene::build(&features, &proj, &MapStyle::default()), proj)
    }

    /// Straight-down ray over a geographic point
    fn ray_over(scene: &MapScene, proj: &Mercator, lon: f64, lat: f64) -> Ray {
        let (x, y) = proj.project(lon, lat);
        let world = scene.to_world(DVec3::new(x, -y, 0.0));
        Ray::new(DVec3::new(world.x, 100.0, world.z), DVec3::NEG_Y)
    }

    #[test]
    fn test_resolve_nearest_mesh() {
        let (scene, proj) = scene();
        let ray = ray_over(&scene, &proj, 119.7, 29.7);
        let hit = resolve(&ray, &scene).unwrap();
        assert_eq!(scene.region_name(hit), Some("west"));

        let ray = ray_over(&scene, &proj, 120.7, 29.7);
        assert_eq!(scene.region_name(resolve(&ray, &scene).unwrap()), Some("east"));
    }

    #[test]
    fn test_top_cap_distance() {
        let (scene, proj) = scene();
        let ray = ray_over(&scene, &proj, 119.7, 29.7);
        let hits = intersect(&ray, &scene);
        let mesh_hit = hits.iter().find(|h| matches!(h.object, SceneObject::Mesh(_))).unwrap();
        // Root maps local z to world y, so the cap sits at y = depth
        assert!((mesh_hit.distance - (100.0 - EXTRUDE_DEPTH)).abs() < 1e-6);
    }

    #[test]
    fn test_miss_outside_regions() {
        let (scene, proj) = scene();
        let ray = ray_over(&scene, &proj, 122.0, 32.0);
        assert!(resolve(&ray, &scene).is_none());
        assert!(!hover(&ray, &scene));
    }

    #[test]
    fn test_north_south_not_inverted() {
        let proj = Mercator::new(120.0, 30.0);
        let features = vec![square("north", 119.9, 30.5, 0.3), square("south", 119.9, 29.2, 0.3)];
        let scene = MapScene::build(&features, &proj, &MapStyle::default());

        // North lies toward world -z after the root rotation
        let (x, y) = proj.project(120.05, 30.65);
        assert!(y < 0.0 && x > 0.0);
        let ray = Ray::new(DVec3::new(15.0 * x, 100.0, 15.0 * y), DVec3::NEG_Y);
        assert_eq!(scene.region_name(resolve(&ray, &scene).unwrap()), Some("north"));

        let (x, y) = proj.project(120.05, 29.35);
        let ray = Ray::new(DVec3::new(15.0 * x, 100.0, 15.0 * y), DVec3::NEG_Y);
        assert_eq!(scene.region_name(resolve(&ray, &scene).unwrap()), Some("south"));
    }

    #[test]
    fn test_outline_not_pickable_but_hit() {
        let (scene, proj) = scene();
        // Horizontal ray grazing the west outline edge at outline height
        let (x, y) = proj.project(119.5, 29.7);
        let edge = scene.to_world(DVec3::new(x, -y, crate::config::OUTLINE_Z));
        let ray = Ray::new(DVec3::new(edge.x - 50.0, edge.y, edge.z), DVec3::X);
        let hits = intersect(&ray, &scene);
        assert!(hits.iter().any(|h| matches!(h.object, SceneObject::Outline(_, 0))));
        // Resolution still lands on a solid, never on the outline
        if let Some(id) = resolve(&ray, &scene) {
            assert!(scene.mesh(id).is_some());
        }
    }

    #[test]
    fn test_label_hit_is_untagged() {
        let (mut scene, _proj) = scene();
        let font = LabelFont {
            family: "Test".into(),
            resolution: 1.0,
            advances: "westa".chars().map(|c| (c, 1.0)).collect(),
        };
        scene.resolve_labels(&font);
        let label = scene.regions()[0].label.ready().unwrap().clone();
        let center = (label.bounds.min + label.bounds.max) * 0.5;
        let world = scene.to_world(center);
        let ray = Ray::new(DVec3::new(world.x, 100.0, world.z), DVec3::NEG_Y);

        let hits = intersect(&ray, &scene);
        assert!(matches!(hits[0].object, SceneObject::Label(_)));
        assert!(!hover(&ray, &scene));
        assert_eq!(scene.region_name(resolve(&ray, &scene).unwrap()), Some("west"));
    }

    #[test]
    fn test_camera_center_ray() {
        let proj = Mercator::new(120.0, 30.0);
        let scene = MapScene::build(&[square("center", 119.8, 29.8, 0.4)], &proj, &MapStyle::default());
        let cam = OrbitCamera::new(CameraConfig::default(), 200, 100);
        let hit = resolve(&cam.ray(0.0, 0.0), &scene).unwrap();
        assert_eq!(scene.region_name(hit), Some("center"));
        assert!(hover(&cam.ray(0.0, 0.0), &scene));
    }

    #[test]
    fn test_ray_triangle() {
        let tri = [DVec3::ZERO, DVec3::X, DVec3::Y];
        let t = ray_triangle(DVec3::new(0.2, 0.2, 1.0), DVec3::NEG_Z, tri).unwrap();
        assert!((t - 1.0).abs() < 1e-12);
        assert!(ray_triangle(DVec3::new(0.8, 0.8, 1.0), DVec3::NEG_Z, tri).is_none());
        assert!(ray_triangle(DVec3::new(0.2, 0.2, 1.0), DVec3::Z, tri).is_none());
    }

    #[test]
    fn test_ray_segment_closest() {
        let (p, d2) = ray_segment_closest(DVec3::new(0.0, 1.0, 0.0), DVec3::X, DVec3::new(2.0, 0.0, -1.0), DVec3::new(2.0, 0.0, 1.0)).unwrap();
        assert!((p - DVec3::new(2.0, 1.0, 0.0)).length() < 1e-12);
        assert!((d2 - 1.0).abs() < 1e-12);
    }
}
