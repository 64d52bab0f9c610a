//! Nearest-centroid matching against a fallback geometry set.
//!
//! The primary zone source sometimes omits a well-known zone. A separately
//! sourced polygon collection covering an overlapping region can fill the
//! gap, but shares no identifiers with the primary source, so the match is
//! made by spatial proximity alone.
//!
//! Centroids are the unweighted mean of the first ring's positions and the
//! distance is planar squared distance in degrees. Both are approximations
//! that hold at county scale.

use desire_lines_zone_models::FallbackZone;
use geo::Coord;
use geojson::{Feature, Geometry, JsonObject, JsonValue, Position, Value};

use crate::ZoneLayer;
use crate::shape::{ObjectKey, classify, into_features};

/// First ring of a polygon, or of the first polygon of a multipolygon.
fn first_ring(value: &Value) -> Option<&[Position]> {
    match value {
        Value::Polygon(rings) => rings.first().map(Vec::as_slice),
        Value::MultiPolygon(polygons) => polygons.first()?.first().map(Vec::as_slice),
        _ => None,
    }
}

/// Arithmetic mean of the first ring's positions.
///
/// Returns `None` when the geometry has no polygon ring or the ring holds
/// no usable position.
#[must_use]
pub fn ring_centroid(geometry: &Geometry) -> Option<Coord<f64>> {
    let ring = first_ring(&geometry.value)?;
    let (mut sx, mut sy, mut n) = (0.0_f64, 0.0_f64, 0_u32);
    for position in ring {
        if let [x, y, ..] = position.as_slice() {
            sx += *x;
            sy += *y;
            n += 1;
        }
    }
    (n > 0).then(|| {
        let n = f64::from(n);
        Coord {
            x: sx / n,
            y: sy / n,
        }
    })
}

/// Finds the candidate whose centroid is nearest `target`.
///
/// Ties resolve to the first candidate encountered. Returns `None` when no
/// candidate has a usable polygon ring.
#[must_use]
pub fn find_nearest(candidates: &[Geometry], target: Coord<f64>) -> Option<&Geometry> {
    let mut best: Option<(&Geometry, f64)> = None;
    for candidate in candidates {
        let Some(centroid) = ring_centroid(candidate) else {
            continue;
        };
        let (dx, dy) = (centroid.x - target.x, centroid.y - target.y);
        let distance = dx.mul_add(dx, dy * dy);
        match best {
            Some((_, best_distance)) if best_distance <= distance => {}
            _ => best = Some((candidate, distance)),
        }
    }
    best.map(|(geometry, _)| geometry)
}

/// Polygon geometries available for matching in a fallback collection.
///
/// Reads `features[].geometry` of a feature collection or the entries of a
/// geometry collection; anything else yields no candidates.
#[must_use]
pub fn candidate_geometries(collection: &JsonValue) -> Vec<Geometry> {
    match into_features(classify(collection, ObjectKey::Preferred(""))) {
        Ok(features) => features
            .into_iter()
            .filter_map(|feature| feature.geometry)
            .collect(),
        Err(e) => {
            log::warn!("Fallback geometry has no usable candidates: {e}");
            Vec::new()
        }
    }
}

/// A zone recovered from the fallback geometry set.
///
/// The caller appends `feature` to its zone features and registers the
/// name at `index`.
#[derive(Debug, Clone)]
pub struct FallbackInjection {
    /// The synthesized zone feature.
    pub feature: Feature,
    /// Sequential index to register the zone name under.
    pub index: desire_lines_flow_models::ZoneId,
    /// Display name of the zone.
    pub name: String,
}

impl ZoneLayer {
    /// Appends an injected zone after the source features.
    pub fn append(&mut self, injection: FallbackInjection) {
        self.names.register(injection.index, injection.name);
        self.features.push(injection.feature);
    }
}

/// Recovers `zone` from `candidates` when no registered name contains it.
///
/// Returns `None` when the zone is already present or no candidate is
/// usable.
#[must_use]
pub fn recover_zone(
    layer: &ZoneLayer,
    candidates: &[Geometry],
    zone: &FallbackZone,
) -> Option<FallbackInjection> {
    if layer.names.contains_name(&zone.name) {
        log::debug!("Zone '{}' present in primary geometry", zone.name);
        return None;
    }

    let target = Coord {
        x: zone.lon,
        y: zone.lat,
    };
    let Some(geometry) = find_nearest(candidates, target) else {
        log::warn!(
            "Zone '{}' missing and no fallback geometry matched among {} candidates",
            zone.name,
            candidates.len()
        );
        return None;
    };

    let mut properties = JsonObject::new();
    properties.insert("NAME".to_string(), JsonValue::from(zone.name.clone()));
    properties.insert("LOGRECNO".to_string(), JsonValue::from(zone.identifier));
    properties.insert("GEOID".to_string(), JsonValue::from(zone.geoid.clone()));

    let index = layer.names.next_index();
    log::info!(
        "Injecting fallback geometry for zone '{}' at index {index}",
        zone.name
    );

    Some(FallbackInjection {
        feature: Feature {
            bbox: None,
            geometry: Some(geometry.clone()),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        },
        index,
        name: zone.name.clone(),
    })
}
