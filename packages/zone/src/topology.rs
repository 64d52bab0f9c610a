//! Arc-indexed topology decoding.
//!
//! Converts the named objects of an encoded topology into `GeoJSON`
//! features. Arcs may be quantized (delta-encoded with a `transform`) or
//! stored as absolute positions. A negative arc index `~i` refers to arc
//! `i` traversed in reverse.

use geojson::feature::Id;
use geojson::{Feature, Geometry, JsonObject, JsonValue, Position, Value};
use serde::Deserialize;

use crate::ZoneError;

/// Quantization transform of a topology.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Transform {
    /// Multiplier applied to each quantized coordinate.
    pub scale: [f64; 2],
    /// Offset added after scaling.
    pub translate: [f64; 2],
}

impl Transform {
    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x.mul_add(self.scale[0], self.translate[0]),
            y.mul_add(self.scale[1], self.translate[1]),
        )
    }
}

#[derive(Deserialize)]
struct RawTopology {
    #[serde(default)]
    arcs: Vec<Vec<Vec<f64>>>,
    #[serde(default)]
    transform: Option<Transform>,
    #[serde(default)]
    objects: JsonObject,
}

/// A parsed topology with its arcs already decoded to absolute positions.
#[derive(Debug, Clone)]
pub struct Topology {
    arcs: Vec<Vec<Position>>,
    transform: Option<Transform>,
    objects: JsonObject,
}

impl Topology {
    /// Parses a topology document.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Json`] if `arcs`, `transform`, or `objects` are
    /// not shaped like a topology.
    pub fn from_value(value: &JsonValue) -> Result<Self, ZoneError> {
        let raw = RawTopology::deserialize(value)?;
        let arcs = raw
            .arcs
            .iter()
            .map(|arc| decode_arc(arc, raw.transform.as_ref()))
            .collect();
        Ok(Self {
            arcs,
            transform: raw.transform,
            objects: raw.objects,
        })
    }

    /// Named geometry objects, in document order.
    #[must_use]
    pub const fn objects(&self) -> &JsonObject {
        &self.objects
    }

    /// Decodes a topology object into features.
    ///
    /// A `GeometryCollection` yields one feature per member geometry; any
    /// other object yields a single feature. Each feature carries the
    /// object's `id` and `properties` (an empty bag when absent). A member
    /// whose geometry cannot be decoded keeps its slot with no geometry.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::Topology`] if a collection's `geometries` is
    /// not an array.
    pub fn features(&self, object: &JsonValue) -> Result<Vec<Feature>, ZoneError> {
        if geometry_type(object) == Some("GeometryCollection") {
            Ok(members(object)?
                .iter()
                .map(|member| self.feature(member))
                .collect())
        } else {
            Ok(vec![self.feature(object)])
        }
    }

    fn feature(&self, object: &JsonValue) -> Feature {
        let properties = object
            .get("properties")
            .and_then(JsonValue::as_object)
            .cloned()
            .unwrap_or_default();
        let id = match object.get("id") {
            Some(JsonValue::String(s)) => Some(Id::String(s.clone())),
            Some(JsonValue::Number(n)) => Some(Id::Number(n.clone())),
            _ => None,
        };
        let geometry = self.geometry(object).unwrap_or_else(|e| {
            log::warn!("Keeping undecodable topology geometry as an empty feature: {e}");
            None
        });

        Feature {
            bbox: None,
            geometry,
            id,
            properties: Some(properties),
            foreign_members: None,
        }
    }

    fn geometry(&self, object: &JsonValue) -> Result<Option<Geometry>, ZoneError> {
        let value = match geometry_type(object) {
            None => return Ok(None),
            Some("Point") => Value::Point(self.point(coordinates(object)?)?),
            Some("MultiPoint") => Value::MultiPoint(
                as_array(coordinates(object)?, "MultiPoint coordinates")?
                    .iter()
                    .map(|p| self.point(p))
                    .collect::<Result<_, _>>()?,
            ),
            Some("LineString") => Value::LineString(self.line(arc_list(object)?)?),
            Some("MultiLineString") => Value::MultiLineString(
                as_array(arc_list(object)?, "MultiLineString arcs")?
                    .iter()
                    .map(|line| self.line(line))
                    .collect::<Result<_, _>>()?,
            ),
            Some("Polygon") => Value::Polygon(self.polygon(arc_list(object)?)?),
            Some("MultiPolygon") => Value::MultiPolygon(
                as_array(arc_list(object)?, "MultiPolygon arcs")?
                    .iter()
                    .map(|polygon| self.polygon(polygon))
                    .collect::<Result<_, _>>()?,
            ),
            Some("GeometryCollection") => Value::GeometryCollection(
                members(object)?
                    .iter()
                    .filter_map(|member| self.geometry(member).transpose())
                    .collect::<Result<_, _>>()?,
            ),
            Some(other) => {
                return Err(ZoneError::Topology {
                    message: format!("unsupported geometry type '{other}'"),
                });
            }
        };
        Ok(Some(Geometry::new(value)))
    }

    fn point(&self, coordinates: &JsonValue) -> Result<Position, ZoneError> {
        let mut position = numbers(coordinates)?;
        if position.len() < 2 {
            return Err(ZoneError::Topology {
                message: "position has fewer than two coordinates".to_string(),
            });
        }
        if let Some(transform) = &self.transform {
            let (x, y) = transform.apply(position[0], position[1]);
            position[0] = x;
            position[1] = y;
        }
        Ok(position)
    }

    /// Concatenates arcs into one line, dropping the shared junction point
    /// between consecutive arcs.
    fn line(&self, arcs: &JsonValue) -> Result<Vec<Position>, ZoneError> {
        let mut points: Vec<Position> = Vec::new();
        for index in as_array(arcs, "arc index list")? {
            let index = index.as_i64().ok_or_else(|| ZoneError::Topology {
                message: format!("arc index {index} is not an integer"),
            })?;
            let (arc, reversed) = self.arc(index)?;

            points.pop();
            let start = points.len();
            points.extend(arc.iter().cloned());
            if reversed {
                points[start..].reverse();
            }
        }
        if points.len() == 1 {
            points.push(points[0].clone());
        }
        Ok(points)
    }

    /// A closed ring, padded to at least four positions.
    fn ring(&self, arcs: &JsonValue) -> Result<Vec<Position>, ZoneError> {
        let mut points = self.line(arcs)?;
        if let Some(first) = points.first().cloned() {
            while points.len() < 4 {
                points.push(first.clone());
            }
        }
        Ok(points)
    }

    fn polygon(&self, rings: &JsonValue) -> Result<Vec<Vec<Position>>, ZoneError> {
        as_array(rings, "polygon ring list")?
            .iter()
            .map(|ring| self.ring(ring))
            .collect()
    }

    fn arc(&self, index: i64) -> Result<(&[Position], bool), ZoneError> {
        let (position, reversed) = if index < 0 {
            (!index, true)
        } else {
            (index, false)
        };
        usize::try_from(position)
            .ok()
            .and_then(|i| self.arcs.get(i))
            .map(|arc| (arc.as_slice(), reversed))
            .ok_or_else(|| ZoneError::Topology {
                message: format!(
                    "arc index {index} out of range ({} arcs)",
                    self.arcs.len()
                ),
            })
    }
}

/// Decodes one arc to absolute positions, undoing delta encoding when the
/// topology is quantized. Extra dimensions pass through untouched.
fn decode_arc(arc: &[Vec<f64>], transform: Option<&Transform>) -> Vec<Position> {
    let Some(transform) = transform else {
        return arc.to_vec();
    };

    let (mut x, mut y) = (0.0, 0.0);
    arc.iter()
        .filter(|p| p.len() >= 2)
        .map(|p| {
            x += p[0];
            y += p[1];
            let (tx, ty) = transform.apply(x, y);
            let mut position = vec![tx, ty];
            position.extend_from_slice(&p[2..]);
            position
        })
        .collect()
}

fn geometry_type(object: &JsonValue) -> Option<&str> {
    object.get("type").and_then(JsonValue::as_str)
}

fn members(object: &JsonValue) -> Result<&[JsonValue], ZoneError> {
    match object.get("geometries") {
        None => Ok(&[]),
        Some(geometries) => as_array(geometries, "geometries").map(Vec::as_slice),
    }
}

fn coordinates(object: &JsonValue) -> Result<&JsonValue, ZoneError> {
    object.get("coordinates").ok_or_else(|| ZoneError::Topology {
        message: "geometry has no coordinates".to_string(),
    })
}

fn arc_list(object: &JsonValue) -> Result<&JsonValue, ZoneError> {
    object.get("arcs").ok_or_else(|| ZoneError::Topology {
        message: "geometry has no arcs".to_string(),
    })
}

fn as_array<'a>(value: &'a JsonValue, what: &str) -> Result<&'a Vec<JsonValue>, ZoneError> {
    value.as_array().ok_or_else(|| ZoneError::Topology {
        message: format!("{what} is not an array"),
    })
}

fn numbers(value: &JsonValue) -> Result<Vec<f64>, ZoneError> {
    as_array(value, "position")?
        .iter()
        .map(|n| {
            n.as_f64().ok_or_else(|| ZoneError::Topology {
                message: format!("coordinate {n} is not a number"),
            })
        })
        .collect()
}
