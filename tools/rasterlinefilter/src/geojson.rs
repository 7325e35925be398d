//! GeoJSON line input and classified segment output.
//!
//! Input `LineString` features yield one line each; `MultiLineString` features
//! yield one line per part, all sharing the source feature's attributes.
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use linefilter_core::{Point, Polyline};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Input schema ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    geometry: Option<Geometry>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    LineString { coordinates: Vec<Vec<f64>> },
    MultiLineString { coordinates: Vec<Vec<Vec<f64>>> },
    #[serde(other)]
    Other,
}

/// One polyline to classify, with the attributes copied from its feature.
#[derive(Debug, Clone)]
pub struct LineRecord {
    /// Index of the source feature in the input collection.
    pub feature: usize,
    pub attrs: Map<String, Value>,
    pub line: Polyline,
}

fn to_polyline(coords: &[Vec<f64>], feature: usize) -> Result<Polyline> {
    coords
        .iter()
        .map(|c| match c.as_slice() {
            [x, y, ..] => Ok(Point::new(*x, *y)),
            _ => bail!("Feature {feature}: position with fewer than 2 ordinates"),
        })
        .collect::<Result<Vec<Point>>>()
        .map(Polyline::new)
}

/// Copy the requested `fields` from a feature's properties; missing fields are null.
fn copy_fields(props: Option<&Map<String, Value>>, fields: &[String]) -> Map<String, Value> {
    fields
        .iter()
        .map(|f| {
            let v = props.and_then(|p| p.get(f)).cloned().unwrap_or(Value::Null);
            (f.clone(), v)
        })
        .collect()
}

pub fn parse_lines(text: &str, fields: &[String]) -> Result<Vec<LineRecord>> {
    let fc: FeatureCollection = serde_json::from_str(text).context("Not a GeoJSON FeatureCollection")?;
    let mut out = Vec::new();

    for (i, feature) in fc.features.into_iter().enumerate() {
        let attrs = copy_fields(feature.properties.as_ref(), fields);
        match feature.geometry {
            Some(Geometry::LineString { coordinates }) => {
                out.push(LineRecord { feature: i, attrs, line: to_polyline(&coordinates, i)? });
            }
            Some(Geometry::MultiLineString { coordinates }) => {
                for part in &coordinates {
                    out.push(LineRecord {
                        feature: i,
                        attrs: attrs.clone(),
                        line: to_polyline(part, i)?,
                    });
                }
            }
            Some(Geometry::Other) | None => {
                log::warn!("feature {i}: not a (multi)linestring, skipped");
            }
        }
    }
    Ok(out)
}

pub fn read_lines(path: &Path, fields: &[String]) -> Result<Vec<LineRecord>> {
    let text = fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    parse_lines(&text, fields).with_context(|| format!("Cannot parse {}", path.display()))
}

// ── Output schema ────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct OutGeometry {
    #[serde(rename = "type")]
    kind: &'static str,
    coordinates: Vec<[f64; 2]>,
}

#[derive(Serialize)]
pub struct OutFeature {
    #[serde(rename = "type")]
    kind: &'static str,
    geometry: OutGeometry,
    properties: Map<String, Value>,
}

impl OutFeature {
    /// A LineString feature with `attrs` plus `label_field = label`.
    pub fn segment(points: &[Point], attrs: &Map<String, Value>, label_field: &str, label: &str) -> Self {
        let mut properties = attrs.clone();
        properties.insert(label_field.to_string(), Value::String(label.to_string()));
        Self {
            kind: "Feature",
            geometry: OutGeometry {
                kind: "LineString",
                coordinates: points.iter().map(|p| [p.x, p.y]).collect(),
            },
            properties,
        }
    }
}

#[derive(Serialize)]
struct OutCollection<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    features: &'a [OutFeature],
}

pub fn write_features<W: Write>(writer: W, features: &[OutFeature]) -> Result<()> {
    let collection = OutCollection { kind: "FeatureCollection", features };
    serde_json::to_writer(writer, &collection)?;
    Ok(())
}

pub fn write_segments(path: &Path, features: &[OutFeature]) -> Result<()> {
    let file = fs::File::create(path).with_context(|| format!("Cannot create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_features(&mut writer, features)?;
    writer.flush().with_context(|| format!("Write failed: {}", path.display()))?;
    Ok(())
}
