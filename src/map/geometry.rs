use glam::{DVec2, DVec3};
use tracing::debug;

use crate::config::{EXTRUDE_DEPTH, OUTLINE_Z};
use crate::map::projection::Mercator;
use crate::map::Rgb;

/// A geographic ring (sequence of lon/lat coordinates)
pub type Ring = Vec<(f64, f64)>;

/// Axis-aligned bounding box in local map space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    pub fn from_points(points: &[DVec3]) -> Self {
        let mut min = DVec3::splat(f64::MAX);
        let mut max = DVec3::splat(f64::MIN);
        for p in points {
            min = min.min(*p);
            max = max.max(*p);
        }
        Self { min, max }
    }

    /// Slab test; returns the entry distance along `dir`
    pub fn ray_hit(&self, origin: DVec3, dir: DVec3) -> Option<f64> {
        let mut t_min = 0.0_f64;
        let mut t_max = f64::MAX;

        for axis in 0..3 {
            let o = origin[axis];
            let d = dir[axis];
            let (min, max) = (self.min[axis], self.max[axis]);

            if d.abs() < 1e-12 {
                if o < min || o > max {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / d;
            let mut t1 = (min - o) * inv;
            let mut t2 = (max - o) * inv;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }

            t_min = t_min.max(t1);
            t_max = t_max.min(t2);
            if t_max < t_min {
                return None;
            }
        }

        Some(t_min)
    }
}

/// Which face of an extrusion a triangle belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Face {
    Bottom,
    Top,
    Wall,
}

/// A ring extruded into a closed solid.
///
/// Vertex layout: `ring_len` bottom vertices at `z = 0`, then the same
/// `ring_len` vertices at `z = depth`. Triangle layout: bottom cap, top cap
/// (same count), then two wall triangles per ring edge.
#[derive(Clone, Debug)]
pub struct ExtrudedMesh {
    pub vertices: Vec<DVec3>,
    pub triangles: Vec<[u32; 3]>,
    pub bounds: Aabb,
    ring_len: usize,
    cap_len: usize,
}

impl ExtrudedMesh {
    pub fn ring_len(&self) -> usize {
        self.ring_len
    }

    pub fn face(&self, triangle: usize) -> Face {
        if triangle < self.cap_len {
            Face::Bottom
        } else if triangle < self.cap_len * 2 {
            Face::Top
        } else {
            Face::Wall
        }
    }

    /// Planar outline of the top cap, in local (y-up) coordinates
    pub fn footprint(&self) -> impl Iterator<Item = DVec2> + '_ {
        self.vertices[self.ring_len..].iter().map(|v| v.truncate())
    }

    pub fn triangle(&self, idx: usize) -> [DVec3; 3] {
        let [a, b, c] = self.triangles[idx];
        [
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        ]
    }
}

/// Closed polyline drawn around a region ring
#[derive(Clone, Debug)]
pub struct RegionOutline {
    pub points: Vec<DVec3>,
    pub color: Rgb,
}

impl RegionOutline {
    /// Every edge of the closed polyline, including the closing one
    pub fn segments(&self) -> impl Iterator<Item = (DVec3, DVec3)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }
}

/// Project a ring and flip y so north points up in local space.
/// A trailing vertex equal to the first (GeoJSON closure) is dropped.
pub fn project_ring(ring: &[(f64, f64)], projection: &Mercator) -> Vec<DVec2> {
    let mut points: Vec<DVec2> = ring
        .iter()
        .map(|&(lon, lat)| {
            let (x, y) = projection.project(lon, lat);
            DVec2::new(x, -y)
        })
        .collect();

    if points.len() >= 2 {
        let first = points[0];
        let last = points[points.len() - 1];
        if (first - last).abs().max_element() < 1e-12 {
            points.pop();
        }
    }
    points
}

/// Build the extruded fill solid for one ring.
/// Returns `None` when the ring is degenerate (fewer than 3 vertices or no
/// triangles from the triangulator).
pub fn build_mesh(ring: &[(f64, f64)], projection: &Mercator) -> Option<ExtrudedMesh> {
    extrude(&project_ring(ring, projection), EXTRUDE_DEPTH)
}

/// Extrude a planar polygon from `z = 0` to `z = depth`, no bevel
pub fn extrude(shape: &[DVec2], depth: f64) -> Option<ExtrudedMesh> {
    let n = shape.len();
    if n < 3 {
        debug!(vertices = n, "skipping degenerate ring");
        return None;
    }

    let flat: Vec<f64> = shape.iter().flat_map(|p| [p.x, p.y]).collect();
    let cap = match earcutr::earcut(&flat, &[], 2) {
        Ok(ix) if !ix.is_empty() => ix,
        Ok(_) => {
            debug!(vertices = n, "ring triangulated to nothing");
            return None;
        }
        Err(err) => {
            debug!(vertices = n, "triangulation failed: {:?}", err);
            return None;
        }
    };

    let mut vertices = Vec::with_capacity(n * 2);
    vertices.extend(shape.iter().map(|p| p.extend(0.0)));
    vertices.extend(shape.iter().map(|p| p.extend(depth)));

    let cap_len = cap.len() / 3;
    let top = n as u32;
    let mut triangles = Vec::with_capacity(cap_len * 2 + n * 2);

    // Bottom cap faces down, so reverse the winding
    for t in cap.chunks_exact(3) {
        triangles.push([t[0] as u32, t[2] as u32, t[1] as u32]);
    }
    for t in cap.chunks_exact(3) {
        triangles.push([t[0] as u32 + top, t[1] as u32 + top, t[2] as u32 + top]);
    }
    for i in 0..n {
        let a = i as u32;
        let b = ((i + 1) % n) as u32;
        triangles.push([a, b, b + top]);
        triangles.push([a, b + top, a + top]);
    }

    let bounds = Aabb::from_points(&vertices);
    Some(ExtrudedMesh {
        vertices,
        triangles,
        bounds,
        ring_len: n,
        cap_len,
    })
}

/// Build the outline companion of a ring, just under the top cap
pub fn build_outline(ring: &[(f64, f64)], color: Rgb, projection: &Mercator) -> RegionOutline {
    RegionOutline {
        points: project_ring(ring, projection)
            .into_iter()
            .map(|p| p.extend(OUTLINE_Z))
            .collect(),
        color,
    }
}
