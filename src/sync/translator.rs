//! Translation of raw index records into persistable location proofs.
//!
//! Translation is pure: the same record and clock always produce the same
//! output, so re-ingesting a record is idempotent all the way down to the
//! derived status.

use astral_domain::{AttestationUid, ChainId, ProofStatus};
use astral_eas_client::RawAttestation;
use astral_repository::NewLocationProof;
use geo_types::{Coord, Geometry};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum TranslationError {
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },
}

/// Translate one raw attestation into a location proof for `chain_id`.
///
/// `now` is the clock against which expiry is judged; callers pass a single
/// timestamp per batch so one batch derives statuses consistently.
pub(crate) fn translate(
    raw: &RawAttestation,
    chain_id: ChainId,
    now: i64,
) -> Result<NewLocationProof, TranslationError> {
    let mut payload = decode_payload(&raw.data)?;

    let srs = take_string(&mut payload, "srs")?.ok_or(TranslationError::MissingField("srs"))?;
    let spatial_type = take_string(&mut payload, "locationType")?
        .ok_or(TranslationError::MissingField("locationType"))?;
    let location_wkt = take_string(&mut payload, "location")?
        .ok_or(TranslationError::MissingField("location"))?;

    let geometry = parse_geometry(&location_wkt)?;
    check_declared_type(&spatial_type, &geometry)?;

    let Coord {
        x: longitude,
        y: latitude,
    } = representative_coordinate(&geometry)
        .ok_or_else(|| TranslationError::InvalidField {
            field: "location",
            reason: "geometry has no coordinates".to_string(),
        })?;

    if srs.eq_ignore_ascii_case("EPSG:4326") {
        check_wgs84_range(longitude, latitude)?;
    }

    let recipe_type = take_string(&mut payload, "recipeType")?;
    let recipe_payload = payload.remove("recipePayload");
    let media_type = take_string(&mut payload, "mediaType")?;
    let media_data = take_string(&mut payload, "mediaData")?;
    let memo = take_string(&mut payload, "memo")?;

    let revocation_time = normalize_timestamp(raw.revocation_time);
    let expiration_time = normalize_timestamp(raw.expiration_time);

    let status = derive_status(raw, revocation_time, expiration_time, now);

    Ok(NewLocationProof {
        attestation_uid: AttestationUid::from(raw.id.as_str()),
        schema_uid: raw.schema_id.clone(),
        event_timestamp: raw.time,
        expiration_time,
        revoked: raw.revoked || revocation_time.is_some(),
        revocation_time,
        ref_uid: normalize_uid(raw.ref_uid.as_deref()),
        revocable: raw.revocable,
        srs,
        spatial_type,
        location_wkt,
        longitude,
        latitude,
        recipe_type,
        recipe_payload,
        media_type,
        media_data,
        memo,
        status,
        block_number: raw.block_number.map(|block| block as i64),
        transaction_hash: raw.txid.clone(),
        cid: raw.cid.clone(),
        chain_id,
        attester: raw.attester.clone(),
        recipient: raw.recipient.clone(),
        // Whatever the schema carries beyond the known keys survives verbatim.
        extra: Value::Object(payload),
    })
}

/// Lifecycle status, highest precedence first: an explicit revocation beats a
/// passed expiry, which beats any storage evidence.
fn derive_status(
    raw: &RawAttestation,
    revocation_time: Option<i64>,
    expiration_time: Option<i64>,
    now: i64,
) -> ProofStatus {
    if raw.revoked || revocation_time.is_some() {
        return ProofStatus::Revoked;
    }
    if let Some(expiry) = expiration_time {
        if expiry <= now {
            return ProofStatus::Expired;
        }
    }
    if raw.block_number.is_some() && raw.txid.is_some() {
        return ProofStatus::Validated;
    }
    if raw.cid.is_some() {
        return ProofStatus::OffchainStored;
    }
    ProofStatus::Pending
}

/// The index delivers the schema payload either as a JSON object or as a
/// JSON-encoded string.
fn decode_payload(data: &Value) -> Result<Map<String, Value>, TranslationError> {
    let decoded = match data {
        Value::Object(map) => return Ok(map.clone()),
        Value::String(text) => {
            serde_json::from_str::<Value>(text).map_err(|e| TranslationError::InvalidField {
                field: "data",
                reason: e.to_string(),
            })?
        }
        Value::Null => return Err(TranslationError::MissingField("data")),
        _ => {
            return Err(TranslationError::InvalidField {
                field: "data",
                reason: "expected an object or a JSON-encoded string".to_string(),
            });
        }
    };

    match decoded {
        Value::Object(map) => Ok(map),
        _ => Err(TranslationError::InvalidField {
            field: "data",
            reason: "decoded payload is not an object".to_string(),
        }),
    }
}

fn take_string(
    payload: &mut Map<String, Value>,
    key: &'static str,
) -> Result<Option<String>, TranslationError> {
    match payload.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(other) => Err(TranslationError::InvalidField {
            field: key,
            reason: format!("expected a string, got {}", type_name(&other)),
        }),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn parse_geometry(location_wkt: &str) -> Result<Geometry<f64>, TranslationError> {
    let parsed: wkt::Wkt<f64> =
        location_wkt
            .parse()
            .map_err(|e: &str| TranslationError::InvalidField {
                field: "location",
                reason: e.to_string(),
            })?;

    Geometry::try_from(parsed).map_err(|e| TranslationError::InvalidField {
        field: "location",
        reason: e.to_string(),
    })
}

fn check_declared_type(
    declared: &str,
    geometry: &Geometry<f64>,
) -> Result<(), TranslationError> {
    let actual = geometry_kind(geometry);
    if declared.eq_ignore_ascii_case(actual) {
        return Ok(());
    }
    Err(TranslationError::InvalidField {
        field: "locationType",
        reason: format!("declared '{declared}' but WKT is a {actual}"),
    })
}

fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "point",
        Geometry::Line(_) | Geometry::LineString(_) => "linestring",
        Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => "polygon",
        Geometry::MultiPoint(_) => "multipoint",
        Geometry::MultiLineString(_) => "multilinestring",
        Geometry::MultiPolygon(_) => "multipolygon",
        Geometry::GeometryCollection(_) => "geometrycollection",
    }
}

/// A single lon/lat pair standing in for the whole geometry, so bounding-box
/// queries work on plain SQL columns.
fn representative_coordinate(geometry: &Geometry<f64>) -> Option<Coord<f64>> {
    match geometry {
        Geometry::Point(point) => Some(point.0),
        Geometry::Line(line) => Some(line.start),
        Geometry::LineString(line) => line.0.first().copied(),
        Geometry::Polygon(polygon) => polygon.exterior().0.first().copied(),
        Geometry::Rect(rect) => Some(rect.min()),
        Geometry::Triangle(triangle) => Some(triangle.v1()),
        Geometry::MultiPoint(points) => points.0.first().map(|point| point.0),
        Geometry::MultiLineString(lines) => {
            lines.0.first().and_then(|line| line.0.first().copied())
        }
        Geometry::MultiPolygon(polygons) => polygons
            .0
            .first()
            .and_then(|polygon| polygon.exterior().0.first().copied()),
        Geometry::GeometryCollection(collection) => collection
            .0
            .first()
            .and_then(representative_coordinate),
    }
}

fn check_wgs84_range(longitude: f64, latitude: f64) -> Result<(), TranslationError> {
    if !(-180.0..=180.0).contains(&longitude) || !(-90.0..=90.0).contains(&latitude) {
        return Err(TranslationError::InvalidField {
            field: "location",
            reason: format!("coordinates ({longitude}, {latitude}) outside EPSG:4326 range"),
        });
    }
    Ok(())
}

/// The index reports unset timestamps as 0.
fn normalize_timestamp(value: Option<i64>) -> Option<i64> {
    value.filter(|ts| *ts > 0)
}

/// The index reports a missing reference as the zero uid.
fn normalize_uid(value: Option<&str>) -> Option<String> {
    value
        .filter(|uid| !uid.is_empty() && uid.trim_start_matches("0x").bytes().any(|b| b != b'0'))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn raw(overrides: Value) -> RawAttestation {
        let mut base = json!({
            "id": "0xaaa",
            "attester": "0xA000000000000000000000000000000000000001",
            "recipient": "0xA000000000000000000000000000000000000002",
            "revoked": false,
            "time": NOW - 3600,
            "data": {
                "srs": "EPSG:4326",
                "locationType": "point",
                "location": "POINT(13.4 52.5)"
            },
            "schemaId": "0xschema",
            "txid": "0xdead",
            "blockNumber": 100
        });
        if let (Value::Object(base_map), Value::Object(extra)) = (&mut base, overrides) {
            for (key, value) in extra {
                base_map.insert(key, value);
            }
        }
        serde_json::from_value(base).unwrap()
    }

    #[test]
    fn translates_a_point_record() {
        let proof = translate(&raw(json!({})), ChainId::from(1), NOW).unwrap();

        assert_eq!(proof.attestation_uid.as_str(), "0xaaa");
        assert_eq!(proof.spatial_type, "point");
        assert_eq!(proof.longitude, 13.4);
        assert_eq!(proof.latitude, 52.5);
        assert_eq!(proof.status, ProofStatus::Validated);
        assert_eq!(proof.extra, json!({}));
    }

    #[test]
    fn payload_as_json_string_is_decoded() {
        let record = raw(json!({
            "data": "{\"srs\":\"EPSG:4326\",\"locationType\":\"point\",\"location\":\"POINT(1 2)\"}"
        }));
        let proof = translate(&record, ChainId::from(1), NOW).unwrap();
        assert_eq!(proof.longitude, 1.0);
        assert_eq!(proof.latitude, 2.0);
    }

    #[test]
    fn unknown_payload_fields_survive_in_extra() {
        let record = raw(json!({
            "data": {
                "srs": "EPSG:4326",
                "locationType": "point",
                "location": "POINT(0 0)",
                "customField": { "nested": [1, 2, 3] }
            }
        }));
        let proof = translate(&record, ChainId::from(1), NOW).unwrap();
        assert_eq!(proof.extra, json!({ "customField": { "nested": [1, 2, 3] } }));
    }

    #[test]
    fn revocation_beats_expiration_and_onchain_evidence() {
        let record = raw(json!({
            "revoked": true,
            "expirationTime": NOW - 10,
        }));
        let proof = translate(&record, ChainId::from(1), NOW).unwrap();
        assert_eq!(proof.status, ProofStatus::Revoked);
    }

    #[test]
    fn revocation_time_alone_marks_revoked() {
        let record = raw(json!({ "revocationTime": NOW - 5 }));
        let proof = translate(&record, ChainId::from(1), NOW).unwrap();
        assert_eq!(proof.status, ProofStatus::Revoked);
        assert!(proof.revoked);
    }

    #[test]
    fn past_expiration_marks_expired() {
        let record = raw(json!({ "expirationTime": NOW - 1 }));
        let proof = translate(&record, ChainId::from(1), NOW).unwrap();
        assert_eq!(proof.status, ProofStatus::Expired);
    }

    #[test]
    fn future_expiration_keeps_onchain_status() {
        let record = raw(json!({ "expirationTime": NOW + 3600 }));
        let proof = translate(&record, ChainId::from(1), NOW).unwrap();
        assert_eq!(proof.status, ProofStatus::Validated);
    }

    #[test]
    fn zero_expiration_means_unset() {
        let record = raw(json!({ "expirationTime": 0 }));
        let proof = translate(&record, ChainId::from(1), NOW).unwrap();
        assert_eq!(proof.expiration_time, None);
        assert_eq!(proof.status, ProofStatus::Validated);
    }

    #[test]
    fn cid_without_onchain_data_is_offchain_stored() {
        let record = raw(json!({
            "txid": null,
            "blockNumber": null,
            "cid": "bafybeibexample"
        }));
        let proof = translate(&record, ChainId::from(1), NOW).unwrap();
        assert_eq!(proof.status, ProofStatus::OffchainStored);
    }

    #[test]
    fn no_evidence_at_all_is_pending() {
        let record = raw(json!({ "txid": null, "blockNumber": null }));
        let proof = translate(&record, ChainId::from(1), NOW).unwrap();
        assert_eq!(proof.status, ProofStatus::Pending);
    }

    #[test]
    fn translation_is_deterministic() {
        let record = raw(json!({}));
        let first = translate(&record, ChainId::from(1), NOW).unwrap();
        let second = translate(&record, ChainId::from(1), NOW).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_geometry_fields_are_rejected_by_name() {
        let record = raw(json!({ "data": { "srs": "EPSG:4326", "locationType": "point" } }));
        let error = translate(&record, ChainId::from(1), NOW).unwrap_err();
        assert!(matches!(error, TranslationError::MissingField("location")));
    }

    #[test]
    fn unparseable_wkt_is_rejected() {
        let record = raw(json!({
            "data": { "srs": "EPSG:4326", "locationType": "point", "location": "POINT(oops)" }
        }));
        assert!(translate(&record, ChainId::from(1), NOW).is_err());
    }

    #[test]
    fn declared_type_must_match_the_wkt() {
        let record = raw(json!({
            "data": {
                "srs": "EPSG:4326",
                "locationType": "polygon",
                "location": "POINT(1 2)"
            }
        }));
        let error = translate(&record, ChainId::from(1), NOW).unwrap_err();
        assert!(matches!(
            error,
            TranslationError::InvalidField { field: "locationType", .. }
        ));
    }

    #[test]
    fn out_of_range_wgs84_coordinates_are_rejected() {
        let record = raw(json!({
            "data": {
                "srs": "EPSG:4326",
                "locationType": "point",
                "location": "POINT(200 95)"
            }
        }));
        assert!(translate(&record, ChainId::from(1), NOW).is_err());
    }

    #[test]
    fn polygon_uses_first_exterior_coordinate() {
        let record = raw(json!({
            "data": {
                "srs": "EPSG:4326",
                "locationType": "polygon",
                "location": "POLYGON((10 20, 11 20, 11 21, 10 20))"
            }
        }));
        let proof = translate(&record, ChainId::from(1), NOW).unwrap();
        assert_eq!(proof.longitude, 10.0);
        assert_eq!(proof.latitude, 20.0);
    }

    #[test]
    fn zero_ref_uid_is_normalized_away() {
        let record = raw(json!({
            "refUID": "0x0000000000000000000000000000000000000000000000000000000000000000"
        }));
        let proof = translate(&record, ChainId::from(1), NOW).unwrap();
        assert_eq!(proof.ref_uid, None);
    }
}
