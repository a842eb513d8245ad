use crate::map::geometry::{build_mesh, build_outline, ExtrudedMesh, RegionOutline, Ring};
use crate::map::label::{LabelRequest, LabelSlot};
use crate::map::projection::Mercator;
use crate::map::Rgb;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeometryKind {
    Polygon,
    MultiPolygon,
}

/// Polygon boundaries of one feature
#[derive(Clone, Debug, PartialEq)]
pub enum FeatureGeometry {
    /// Rings of a single polygon
    Polygon(Vec<Ring>),
    /// Polygons, each a list of rings
    MultiPolygon(Vec<Vec<Ring>>),
}

impl FeatureGeometry {
    pub fn kind(&self) -> GeometryKind {
        match self {
            FeatureGeometry::Polygon(_) => GeometryKind::Polygon,
            FeatureGeometry::MultiPolygon(_) => GeometryKind::MultiPolygon,
        }
    }

    /// Every ring, flattened across polygons
    pub fn rings(&self) -> Box<dyn Iterator<Item = &Ring> + '_> {
        match self {
            FeatureGeometry::Polygon(rings) => Box::new(rings.iter()),
            FeatureGeometry::MultiPolygon(polys) => Box::new(polys.iter().flatten()),
        }
    }
}

/// One administrative region read from the boundary file
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub name: String,
    pub center_hint: Option<(f64, f64)>,
    pub geometry: FeatureGeometry,
}

/// Everything built for one feature, before it is merged into the scene
#[derive(Clone, Debug)]
pub struct AssembledRegion {
    pub name: String,
    pub center_hint: Option<(f64, f64)>,
    pub color: Rgb,
    pub meshes: Vec<ExtrudedMesh>,
    pub outlines: Vec<RegionOutline>,
    pub anchor: Option<(f64, f64)>,
    pub label: LabelSlot,
}

/// Label anchor: plain mean of every vertex in the feature.
/// Not an area centroid, so dense coastlines pull the label toward them.
pub fn label_anchor(geometry: &FeatureGeometry) -> Option<(f64, f64)> {
    let mut sum = (0.0, 0.0);
    let mut count = 0usize;
    for &(lon, lat) in geometry.rings().flatten() {
        sum.0 += lon;
        sum.1 += lat;
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some((sum.0 / count as f64, sum.1 / count as f64))
}

/// Build fill solids, outlines and a label request for one feature.
/// Outlines share the fill color. A ring the triangulator rejects still
/// gets its outline.
pub fn assemble(feature: &Feature, projection: &Mercator, color: Rgb) -> AssembledRegion {
    let mut meshes = Vec::new();
    let mut outlines = Vec::new();

    for ring in feature.geometry.rings() {
        meshes.extend(build_mesh(ring, projection));
        outlines.push(build_outline(ring, color, projection));
    }

    let anchor = label_anchor(&feature.geometry);
    let label = match anchor {
        Some((lon, lat)) => {
            let (x, y) = projection.project(lon, lat);
            LabelSlot::Pending(LabelRequest::at_projected(&feature.name, x, y))
        }
        None => LabelSlot::Unavailable,
    };

    AssembledRegion {
        name: feature.name.clone(),
        center_hint: feature.center_hint,
        color,
        meshes,
        outlines,
        anchor,
        label,
    }
}
