use std::collections::HashMap;

use glam::{DMat4, DVec3};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::MapStyle;
use crate::map::geometry::{ExtrudedMesh, RegionOutline};
use crate::map::label::{LabelFont, LabelSlot};
use crate::map::projection::Mercator;
use crate::map::region::{assemble, Feature};
use crate::map::Rgb;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub usize);

/// One extruded solid, tagged with its owning region
#[derive(Clone, Debug)]
pub struct RegionMesh {
    pub id: MeshId,
    pub region: RegionId,
    pub geometry: ExtrudedMesh,
    /// Current material color
    pub color: Rgb,
    /// Color assigned at build time
    pub base_color: Rgb,
}

#[derive(Clone, Debug)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    pub center_hint: Option<(f64, f64)>,
    pub meshes: Vec<MeshId>,
    pub outlines: Vec<RegionOutline>,
    /// Label anchor in (lon, lat)
    pub anchor: Option<(f64, f64)>,
    pub label: LabelSlot,
}

/// Fill color for the feature at `index`
pub fn fill_color(style: &MapStyle, index: usize, name: &str) -> Rgb {
    if name == style.special_region {
        return style.special_color;
    }
    style.palette.get(index).copied().unwrap_or(style.fallback_color)
}

/// Assembled map: arenas of regions and meshes under one root transform
#[derive(Clone, Debug)]
pub struct MapScene {
    regions: Vec<Region>,
    meshes: Vec<RegionMesh>,
    by_name: HashMap<String, RegionId>,
    root: DMat4,
    root_inverse: DMat4,
}

impl MapScene {
    pub fn empty(style: &MapStyle) -> Self {
        let root = root_transform(style);
        Self {
            regions: Vec::new(),
            meshes: Vec::new(),
            by_name: HashMap::new(),
            root,
            root_inverse: root.inverse(),
        }
    }

    /// Assemble every feature. Regions are built in parallel and merged in
    /// input order, so ids and colors are deterministic.
    pub fn build(features: &[Feature], projection: &Mercator, style: &MapStyle) -> Self {
        let assembled: Vec<_> = features
            .par_iter()
            .enumerate()
            .map(|(index, feature)| {
                let color = fill_color(style, index, &feature.name);
                assemble(feature, projection, color)
            })
            .collect();

        let mut scene = Self::empty(style);
        for part in assembled {
            let region_id = RegionId(scene.regions.len());
            if scene.by_name.insert(part.name.clone(), region_id).is_some() {
                warn!(name = %part.name, "duplicate region name; picks and tooltips will be ambiguous");
            }

            let mut mesh_ids = Vec::with_capacity(part.meshes.len());
            for geometry in part.meshes {
                let id = MeshId(scene.meshes.len());
                scene.meshes.push(RegionMesh {
                    id,
                    region: region_id,
                    geometry,
                    color: part.color,
                    base_color: part.color,
                });
                mesh_ids.push(id);
            }

            scene.regions.push(Region {
                id: region_id,
                name: part.name,
                center_hint: part.center_hint,
                meshes: mesh_ids,
                outlines: part.outlines,
                anchor: part.anchor,
                label: part.label,
            });
        }

        info!(regions = scene.regions.len(), meshes = scene.meshes.len(), "map scene built");
        scene
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn meshes(&self) -> &[RegionMesh] {
        &self.meshes
    }

    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id.0)
    }

    pub fn mesh(&self, id: MeshId) -> Option<&RegionMesh> {
        self.meshes.get(id.0)
    }

    pub fn mesh_mut(&mut self, id: MeshId) -> Option<&mut RegionMesh> {
        self.meshes.get_mut(id.0)
    }

    /// Region name a mesh is tagged with
    pub fn region_name(&self, mesh: MeshId) -> Option<&str> {
        let region = self.mesh(mesh)?.region;
        self.region(region).map(|r| r.name.as_str())
    }

    pub fn find_region(&self, name: &str) -> Option<&Region> {
        self.by_name.get(name).and_then(|&id| self.region(id))
    }

    /// Local map space to world space
    pub fn root_transform(&self) -> DMat4 {
        self.root
    }

    pub fn root_inverse(&self) -> DMat4 {
        self.root_inverse
    }

    pub fn to_world(&self, local: DVec3) -> DVec3 {
        self.root.transform_point3(local)
    }

    /// Turn every pending label request into a text label
    pub fn resolve_labels(&mut self, font: &LabelFont) {
        let mut resolved = 0;
        for region in &mut self.regions {
            if let LabelSlot::Pending(request) = &region.label {
                region.label = LabelSlot::Ready(request.resolve(font));
                resolved += 1;
            }
        }
        info!(resolved, font = %font.family, "labels attached");
    }

    /// Font is gone for good; drop pending labels, keep the geometry
    pub fn mark_labels_unavailable(&mut self) {
        for region in &mut self.regions {
            if matches!(region.label, LabelSlot::Pending(_)) {
                region.label = LabelSlot::Unavailable;
            }
        }
    }
}

/// Rotate the construction plane to face up, after scaling in-plane only
fn root_transform(style: &MapStyle) -> DMat4 {
    DMat4::from_rotation_x(style.rotation_x) * DMat4::from_scale(DVec3::new(style.scale, style.scale, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::region::FeatureGeometry;

    fn square_feature(name: &str, lon: f64, lat: f64) -> Feature {
        Feature {
            name: name.to_string(),
            center_hint: None,
            geometry: FeatureGeometry::Polygon(vec![vec![
                (lon, lat),
                (lon, lat + 0.1),
                (lon + 0.1, lat + 0.1),
                (lon + 0.1, lat),
                (lon, lat),
            ]]),
        }
    }

    #[test]
    fn test_palette_then_fallback() {
        let style = MapStyle::default();
        let features: Vec<Feature> = (0..13)
            .map(|i| square_feature(&format!("r{i}"), 120.0 + i as f64 * 0.2, 30.0))
            .collect();
        let scene = MapScene::build(&features, &Mercator::new(120.0, 30.0), &style);

        assert_eq!(scene.meshes().len(), 13);
        for (i, mesh) in scene.meshes().iter().enumerate() {
            let expected = if i < style.palette.len() {
                style.palette[i]
            } else {
                style.fallback_color
            };
            assert_eq!(mesh.color, expected, "mesh {i}");
        }
        // The 12th region gets the fallback, not a wrapped palette entry
        assert_eq!(scene.meshes()[11].color, style.fallback_color);
        assert_ne!(scene.meshes()[11].color, style.palette[0]);
    }

    #[test]
    fn test_outlines_follow_fill_color() {
        let ring = |lon: f64| vec![(lon, 30.0), (lon, 30.1), (lon + 0.1, 30.1), (lon + 0.1, 30.0), (lon, 30.0)];
        let features = vec![
            square_feature("杭州市", 120.0, 30.0),
            Feature {
                name: "宁波市".into(),
                center_hint: None,
                geometry: FeatureGeometry::MultiPolygon(vec![vec![ring(121.0)], vec![ring(121.5)]]),
            },
        ];
        let style = MapStyle::default();
        let scene = MapScene::build(&features, &Mercator::new(120.0, 30.0), &style);

        for region in scene.regions() {
            let fill = scene.mesh(region.meshes[0]).map(|m| m.base_color);
            assert!(!region.outlines.is_empty());
            assert!(region.outlines.iter().all(|o| Some(o.color) == fill), "{}", region.name);
        }
        let ningbo = scene.find_region("宁波市").unwrap();
        assert_eq!(ningbo.outlines.len(), 2);
        assert_eq!(ningbo.outlines[0].color, style.palette[1]);
    }

    #[test]
    fn test_special_region_color() {
        let style = MapStyle::default();
        assert_eq!(fill_color(&style, 0, "杭州市"), style.special_color);
        assert_eq!(fill_color(&style, 40, "杭州市"), style.special_color);
        assert_eq!(fill_color(&style, 1, "宁波市"), style.palette[1]);
    }

    #[test]
    fn test_root_transform() {
        let scene = MapScene::empty(&MapStyle::default());
        let w = scene.to_world(DVec3::new(1.0, 2.0, 3.0));
        assert!((w - DVec3::new(15.0, 3.0, -30.0)).length() < 1e-9);
        let back = scene.root_inverse().transform_point3(w);
        assert!((back - DVec3::new(1.0, 2.0, 3.0)).length() < 1e-9);
    }

    #[test]
    fn test_meshes_tagged_with_region() {
        let features = vec![square_feature("a", 120.0, 30.0), square_feature("b", 121.0, 30.0)];
        let scene = MapScene::build(&features, &Mercator::new(120.0, 30.0), &MapStyle::default());
        assert_eq!(scene.region_name(MeshId(0)), Some("a"));
        assert_eq!(scene.region_name(MeshId(1)), Some("b"));
        assert_eq!(scene.find_region("b").map(|r| r.id), Some(RegionId(1)));
        assert!(scene.region_name(MeshId(9)).is_none());
    }

    #[test]
    fn test_label_resolution() {
        let features = vec![square_feature("ab", 120.0, 30.0)];
        let mut scene = MapScene::build(&features, &Mercator::new(120.0, 30.0), &MapStyle::default());
        assert!(matches!(scene.regions()[0].label, LabelSlot::Pending(_)));

        let mut failed = scene.clone();
        failed.mark_labels_unavailable();
        assert!(matches!(failed.regions()[0].label, LabelSlot::Unavailable));
        assert_eq!(failed.meshes().len(), 1);

        let font = LabelFont {
            family: "Test".into(),
            resolution: 1.0,
            advances: [('a', 1.0), ('b', 1.0)].into_iter().collect(),
        };
        scene.resolve_labels(&font);
        assert_eq!(scene.regions()[0].label.ready().map(|l| l.text.as_str()), Some("ab"));
    }
}
