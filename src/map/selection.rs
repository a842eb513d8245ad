use tracing::debug;

use crate::map::scene::{MapScene, MeshId};
use crate::map::Rgb;

/// What the tooltip should do after a pick
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TooltipCommand {
    Show(String),
    Hide,
}

/// Currently highlighted mesh and the color it had before highlighting.
///
/// While `Selected`, the stored mesh shows the highlight color and every
/// other mesh keeps its own color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    Idle,
    Selected { mesh: MeshId, original: Rgb },
}

impl Selection {
    pub fn mesh(&self) -> Option<MeshId> {
        match self {
            Selection::Idle => None,
            Selection::Selected { mesh, .. } => Some(*mesh),
        }
    }

    /// Advance on a click pick result.
    ///
    /// Picking the same region name again toggles it off. Only the stored
    /// mesh is restored: in a multi-ring region, other rings sharing the
    /// name are left as they are.
    pub fn apply(&mut self, pick: Option<MeshId>, scene: &mut MapScene, highlight: Rgb) -> TooltipCommand {
        let next = match (*self, pick) {
            (Selection::Idle, None) => (Selection::Idle, TooltipCommand::Hide),

            (Selection::Idle, Some(picked)) => highlight_mesh(scene, picked, highlight),

            (Selection::Selected { mesh, original }, Some(picked)) => {
                let same = scene.region_name(mesh).is_some() && scene.region_name(mesh) == scene.region_name(picked);
                restore(scene, mesh, original);
                if same {
                    (Selection::Idle, TooltipCommand::Hide)
                } else {
                    highlight_mesh(scene, picked, highlight)
                }
            }

            (Selection::Selected { mesh, original }, None) => {
                restore(scene, mesh, original);
                (Selection::Idle, TooltipCommand::Hide)
            }
        };

        debug!(from = ?self, to = ?next.0, "selection transition");
        *self = next.0;
        next.1
    }
}

fn highlight_mesh(scene: &mut MapScene, picked: MeshId, highlight: Rgb) -> (Selection, TooltipCommand) {
    let Some(name) = scene.region_name(picked).map(str::to_owned) else {
        return (Selection::Idle, TooltipCommand::Hide);
    };
    let Some(mesh) = scene.mesh_mut(picked) else {
        return (Selection::Idle, TooltipCommand::Hide);
    };
    let original = mesh.color;
    mesh.color = highlight;
    (Selection::Selected { mesh: picked, original }, TooltipCommand::Show(name))
}

fn restore(scene: &mut MapScene, id: MeshId, original: Rgb) {
    if let Some(mesh) = scene.mesh_mut(id) {
        mesh.color = original;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapStyle;
    use crate::map::projection::Mercator;
    use crate::map::region::{Feature, FeatureGeometry};

    const HL: Rgb = Rgb(0xc6, 0x99, 0xaa);

    fn ring(lon: f64) -> Vec<(f64, f64)> {
        vec![(lon, 30.0), (lon, 30.1), (lon + 0.1, 30.1), (lon + 0.1, 30.0), (lon, 30.0)]
    }

    /// Regions "A" and "B", plus "M" made of two rings
    fn scene() -> MapScene {
        let features = vec![
            Feature {
                name: "A".into(),
                center_hint: None,
                geometry: FeatureGeometry::Polygon(vec![ring(120.0)]),
            },
            Feature {
                name: "B".into(),
                center_hint: None,
                geometry: FeatureGeometry::Polygon(vec![ring(120.5)]),
            },
            Feature {
                name: "M".into(),
                center_hint: None,
                geometry: FeatureGeometry::MultiPolygon(vec![vec![ring(121.0)], vec![ring(121.5)]]),
            },
        ];
        MapScene::build(&features, &Mercator::new(120.0, 30.0), &MapStyle::default())
    }

    const A: MeshId = MeshId(0);
    const B: MeshId = MeshId(1);
    const M0: MeshId = MeshId(2);
    const M1: MeshId = MeshId(3);

    fn color(scene: &MapScene, id: MeshId) -> Rgb {
        scene.mesh(id).unwrap().color
    }

    fn untouched(scene: &MapScene) -> bool {
        scene.meshes().iter().all(|m| m.color == m.base_color)
    }

    #[test]
    fn test_idle_empty_pick() {
        let mut scene = scene();
        let mut sel = Selection::Idle;
        assert_eq!(sel.apply(None, &mut scene, HL), TooltipCommand::Hide);
        assert_eq!(sel, Selection::Idle);
        assert!(untouched(&scene));
    }

    #[test]
    fn test_pick_highlights() {
        let mut scene = scene();
        let before = color(&scene, A);
        let mut sel = Selection::Idle;
        assert_eq!(sel.apply(Some(A), &mut scene, HL), TooltipCommand::Show("A".into()));
        assert_eq!(sel, Selection::Selected { mesh: A, original: before });
        assert_eq!(color(&scene, A), HL);
        assert_eq!(color(&scene, B), scene.mesh(B).unwrap().base_color);
    }

    #[test]
    fn test_same_pick_toggles_off() {
        let mut scene = scene();
        let before = color(&scene, A);
        let mut sel = Selection::Idle;
        sel.apply(Some(A), &mut scene, HL);
        assert_eq!(sel.apply(Some(A), &mut scene, HL), TooltipCommand::Hide);
        assert_eq!(sel, Selection::Idle);
        assert_eq!(color(&scene, A), before);
        assert!(untouched(&scene));
    }

    #[test]
    fn test_pick_elsewhere_switches() {
        let mut scene = scene();
        let mut sel = Selection::Idle;
        sel.apply(Some(A), &mut scene, HL);
        let b_before = color(&scene, B);
        assert_eq!(sel.apply(Some(B), &mut scene, HL), TooltipCommand::Show("B".into()));
        assert_eq!(sel, Selection::Selected { mesh: B, original: b_before });
        assert_eq!(color(&scene, A), scene.mesh(A).unwrap().base_color);
        assert_eq!(color(&scene, B), HL);
    }

    #[test]
    fn test_empty_pick_clears() {
        let mut scene = scene();
        let mut sel = Selection::Idle;
        sel.apply(Some(B), &mut scene, HL);
        assert_eq!(sel.apply(None, &mut scene, HL), TooltipCommand::Hide);
        assert_eq!(sel, Selection::Idle);
        assert!(untouched(&scene));
    }

    #[test]
    fn test_other_ring_of_same_region_toggles_off() {
        let mut scene = scene();
        let mut sel = Selection::Idle;
        sel.apply(Some(M0), &mut scene, HL);
        assert_eq!(sel.apply(Some(M1), &mut scene, HL), TooltipCommand::Hide);
        assert_eq!(sel, Selection::Idle);
        // Only the stored ring is restored; the other ring was never touched
        assert!(untouched(&scene));
        assert_eq!(color(&scene, M1), scene.mesh(M1).unwrap().base_color);
    }

    #[test]
    fn test_unknown_mesh_is_ignored() {
        let mut scene = scene();
        let mut sel = Selection::Idle;
        assert_eq!(sel.apply(Some(MeshId(99)), &mut scene, HL), TooltipCommand::Hide);
        assert_eq!(sel, Selection::Idle);
    }
}
