use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use geojson::{GeoJson, JsonValue, Value};
use serde::Deserialize;

use crate::map::geometry::Ring;
use crate::map::label::LabelFont;
use crate::map::region::{Feature, FeatureGeometry};
use crate::tooltip::AttractionRecord;

/// Load the region boundary feature collection.
/// The data is not validated beyond what is needed to read it: a feature
/// without a name or with a non-polygon geometry fails the whole load.
pub fn load_boundaries(path: &Path) -> Result<Vec<Feature>> {
    let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let geojson: GeoJson = content.parse().with_context(|| format!("parsing {}", path.display()))?;
    features_from_geojson(geojson)
}

pub fn features_from_geojson(geojson: GeoJson) -> Result<Vec<Feature>> {
    let GeoJson::FeatureCollection(fc) = geojson else {
        bail!("boundary data is not a FeatureCollection");
    };

    fc.features
        .into_iter()
        .enumerate()
        .map(|(idx, feature)| {
            let props = feature.properties.as_ref();

            let name = props
                .and_then(|p| p.get("name"))
                .and_then(JsonValue::as_str)
                .ok_or_else(|| anyhow!("feature {idx} has no properties.name"))?
                .to_string();

            // Optional [lon, lat]
            let center_hint = props
                .and_then(|p| p.get("center"))
                .and_then(JsonValue::as_array)
                .and_then(|c| Some((c.first()?.as_f64()?, c.get(1)?.as_f64()?)));

            let geometry = feature
                .geometry
                .ok_or_else(|| anyhow!("feature {name:?} has no geometry"))?;

            let geometry = match geometry.value {
                Value::Polygon(rings) => FeatureGeometry::Polygon(rings.iter().map(|r| to_ring(r)).collect()),
                Value::MultiPolygon(polys) => FeatureGeometry::MultiPolygon(
                    polys
                        .iter()
                        .map(|rings| rings.iter().map(|r| to_ring(r)).collect())
                        .collect(),
                ),
                other => bail!("feature {name:?} has unsupported geometry {}", geometry_type(&other)),
            };

            Ok(Feature {
                name,
                center_hint,
                geometry,
            })
        })
        .collect()
}

fn geometry_type(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn to_ring(coords: &[Vec<f64>]) -> Ring {
    coords
        .iter()
        .filter(|c| c.len() >= 2)
        .map(|c| (c[0], c[1]))
        .collect()
}

/// Load attraction records (`[{ city, attractions: [{ name, description }] }]`)
pub fn load_attractions(path: &Path) -> Result<Vec<AttractionRecord>> {
    let mut bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    simd_json::serde::from_slice(&mut bytes).with_context(|| format!("parsing {}", path.display()))
}

#[derive(Deserialize)]
struct TypefaceFile {
    glyphs: HashMap<String, TypefaceGlyph>,
    #[serde(rename = "familyName", default)]
    family_name: String,
    #[serde(default = "default_resolution")]
    resolution: f64,
}

#[derive(Deserialize)]
struct TypefaceGlyph {
    #[serde(default)]
    ha: f64,
}

fn default_resolution() -> f64 {
    1000.0
}

/// Load a typeface JSON font (the format text geometry generators consume)
pub fn load_font(path: &Path) -> Result<LabelFont> {
    let mut bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    parse_font(&mut bytes).with_context(|| format!("parsing {}", path.display()))
}

pub fn parse_font(bytes: &mut [u8]) -> Result<LabelFont> {
    let file: TypefaceFile = simd_json::serde::from_slice(bytes)?;
    if file.glyphs.is_empty() {
        bail!("font has no glyphs");
    }

    let advances = file
        .glyphs
        .into_iter()
        .filter_map(|(key, glyph)| {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => Some((ch, glyph.ha)),
                _ => None,
            }
        })
        .collect();

    Ok(LabelFont {
        family: if file.family_name.is_empty() {
            "unnamed".to_string()
        } else {
            file.family_name
        },
        resolution: file.resolution,
        advances,
    })
}

fn rect(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Ring {
    vec![
        (min_lon, min_lat),
        (min_lon, max_lat),
        (max_lon, max_lat),
        (max_lon, min_lat),
        (min_lon, min_lat),
    ]
}

fn polygon(name: &str, center: (f64, f64), rings: Vec<Ring>) -> Feature {
    Feature {
        name: name.to_string(),
        center_hint: Some(center),
        geometry: FeatureGeometry::Polygon(rings),
    }
}

/// Coarse stand-in for the province when no boundary file is available
pub fn sample_features() -> Vec<Feature> {
    vec![
        polygon(
            "杭州市",
            (120.153576, 30.287459),
            vec![vec![
                (118.4, 29.7),
                (118.6, 30.2),
                (119.2, 30.4),
                (119.8, 30.4),
                (120.3, 30.4),
                (120.3, 30.0),
                (120.0, 29.7),
                (119.3, 29.5),
                (118.4, 29.7),
            ]],
        ),
        polygon("宁波市", (121.549792, 29.868388), vec![rect(121.0, 29.2, 122.0, 30.4)]),
        polygon("温州市", (120.672111, 28.000575), vec![rect(120.2, 27.1, 121.2, 28.4)]),
        polygon("嘉兴市", (120.750865, 30.762653), vec![rect(120.3, 30.4, 121.3, 31.0)]),
        polygon("湖州市", (120.102398, 30.867198), vec![rect(119.2, 30.4, 120.3, 31.2)]),
        polygon("绍兴市", (120.582112, 29.997117), vec![rect(120.3, 29.3, 121.0, 30.4)]),
        polygon("金华市", (119.649506, 29.089524), vec![rect(119.3, 28.6, 120.5, 29.5)]),
        polygon("衢州市", (118.87263, 28.941708), vec![rect(118.0, 28.4, 119.3, 29.5)]),
        Feature {
            name: "舟山市".to_string(),
            center_hint: Some((122.106863, 30.016028)),
            geometry: FeatureGeometry::MultiPolygon(vec![
                vec![rect(122.0, 29.8, 122.4, 30.2)],
                vec![rect(122.2, 30.3, 122.6, 30.7)],
            ]),
        },
        polygon("台州市", (121.428599, 28.661378), vec![rect(120.5, 28.4, 121.8, 29.2)]),
        polygon("丽水市", (119.921786, 28.451993), vec![rect(118.8, 27.5, 120.2, 28.6)]),
    ]
}
