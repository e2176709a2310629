use std::time::Duration;

use astral_domain::SyncCursor;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{ClientError, Result},
    types::{AttestationPage, RawAttestation},
};

/// GraphQL query mirroring the upstream attestation index schema.
/// Ordered by block number then id — the same key the cursor advances on —
/// so a page's last record is always the page's maximum position.
const ATTESTATIONS_QUERY: &str = r#"
query GetAttestations($where: AttestationWhereInput, $first: Int!) {
  attestations(where: $where, orderBy: [{ blockNumber: asc }, { id: asc }], first: $first) {
    id
    attester
    recipient
    revoked
    revocationTime
    expirationTime
    revocable
    time
    data
    schemaId
    refUID
    txid
    blockNumber
    cid
  }
}
"#;

/// Query interface over the remote attestation index.
///
/// The orchestrator drives pagination by repeated calls until a page returns
/// fewer than `page_size` records.
#[async_trait]
pub trait AttestationIndex: Send + Sync {
    /// Fetch attestations for `schema_uid` strictly after `cursor`.
    ///
    /// The cursor's tie-breaker uid splits records within the watermark
    /// block, so a block holding more than one page of records still pages
    /// through instead of re-fetching the same page.
    async fn fetch_since(
        &self,
        schema_uid: &str,
        cursor: &SyncCursor,
        page_size: u32,
    ) -> Result<AttestationPage>;
}

#[derive(Debug, Clone)]
pub struct EasClientConfig {
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for EasClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000,
            request_timeout_ms: 30_000,
        }
    }
}

/// HTTP client for one chain's attestation index endpoint.
pub struct EasIndexClient {
    client: reqwest::Client,
    endpoint: String,
}

impl EasIndexClient {
    pub fn new(endpoint: impl Into<String>, config: &EasClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            // Connection pooling: keep up to 10 idle connections per host
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            // TCP keepalive to detect dead connections
            .tcp_keepalive(Duration::from_secs(60))
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            // Exceeding this is the same failure class as a connection error
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AttestationIndex for EasIndexClient {
    async fn fetch_since(
        &self,
        schema_uid: &str,
        cursor: &SyncCursor,
        page_size: u32,
    ) -> Result<AttestationPage> {
        let body = build_request_body(schema_uid, cursor, page_size);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let payload: GraphQlResponse = response
            .json()
            .await
            .map_err(|e| ClientError::MalformedResponse(e.to_string()))?;

        let records = parse_page(payload)?;

        tracing::trace!(
            endpoint = %self.endpoint,
            schema_uid,
            cursor = %cursor,
            records = records.len(),
            "Fetched attestation page"
        );

        Ok(AttestationPage {
            next_cursor: next_cursor_of(&records),
            records,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<AttestationsData>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct AttestationsData {
    attestations: Vec<RawAttestation>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

/// Build the GraphQL request payload for a fetch-since query.
///
/// With a tie-breaker uid the filter resumes strictly after the watermark
/// record: later blocks, or the watermark block with a greater id. Without
/// one (fresh chain, or a cursor predating the tie-breaker) the block filter
/// is `gte` so records in the start block are not lost; idempotent upsert
/// makes the overlap harmless.
pub(crate) fn build_request_body(schema_uid: &str, cursor: &SyncCursor, page_size: u32) -> Value {
    let schema_filter = json!({ "schemaId": { "equals": schema_uid } });

    let where_clause = match &cursor.last_uid {
        Some(last_uid) => json!({
            "AND": [
                schema_filter,
                { "OR": [
                    { "blockNumber": { "gt": cursor.block_number } },
                    {
                        "blockNumber": { "equals": cursor.block_number },
                        "id": { "gt": last_uid.as_str() },
                    },
                ]},
            ]
        }),
        None if cursor.block_number > 0 => json!({
            "AND": [
                schema_filter,
                { "blockNumber": { "gte": cursor.block_number } },
            ]
        }),
        None => schema_filter,
    };

    json!({
        "query": ATTESTATIONS_QUERY,
        "variables": {
            "where": where_clause,
            "first": page_size,
        },
    })
}

fn parse_page(payload: GraphQlResponse) -> Result<Vec<RawAttestation>> {
    if let Some(errors) = payload.errors {
        let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
        return Err(ClientError::GraphQl(messages.join("; ")));
    }

    match payload.data {
        Some(data) => Ok(data.attestations),
        None => Err(ClientError::MalformedResponse(
            "response carried neither data nor errors".to_string(),
        )),
    }
}

fn next_cursor_of(records: &[RawAttestation]) -> Option<SyncCursor> {
    records.last().map(|last| SyncCursor {
        block_number: last.block_number.unwrap_or_default(),
        last_uid: Some(last.id.as_str().into()),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn raw(uid: &str, block: Option<u64>) -> RawAttestation {
        serde_json::from_value(json!({
            "id": uid,
            "attester": "0xAbC0000000000000000000000000000000000001",
            "recipient": "0xAbC0000000000000000000000000000000000002",
            "revoked": false,
            "time": 1_700_000_000,
            "schemaId": "0xschema",
            "blockNumber": block,
        }))
        .unwrap()
    }

    #[test]
    fn request_body_omits_block_filter_at_genesis_cursor() {
        let body = build_request_body("0xschema", &SyncCursor::from_start(0), 100);
        let where_clause = &body["variables"]["where"];
        assert_eq!(where_clause["schemaId"]["equals"], "0xschema");
        assert!(where_clause.get("blockNumber").is_none());
        assert_eq!(body["variables"]["first"], 100);
    }

    #[test]
    fn fresh_deployment_cursor_uses_an_inclusive_block_filter() {
        let body = build_request_body("0xschema", &SyncCursor::from_start(120), 50);
        let clauses = &body["variables"]["where"]["AND"];
        assert_eq!(clauses[0]["schemaId"]["equals"], "0xschema");
        assert_eq!(clauses[1]["blockNumber"]["gte"], 120);
    }

    #[test]
    fn resume_with_a_watermark_uid_filters_strictly_past_it() {
        let cursor = SyncCursor::advanced_to(120, "0xaa".into());
        let body = build_request_body("0xschema", &cursor, 50);

        let or = &body["variables"]["where"]["AND"][1]["OR"];
        assert_eq!(or[0]["blockNumber"]["gt"], 120);
        assert_eq!(or[1]["blockNumber"]["equals"], 120);
        assert_eq!(or[1]["id"]["gt"], "0xaa");
    }

    /// Minimal evaluation of the filter grammar the client emits, standing in
    /// for the remote index in pagination tests.
    fn index_matches(record: &RawAttestation, where_clause: &Value) -> bool {
        if let Some(and) = where_clause.get("AND").and_then(Value::as_array) {
            return and.iter().all(|clause| index_matches(record, clause));
        }
        if let Some(or) = where_clause.get("OR").and_then(Value::as_array) {
            return or.iter().any(|clause| index_matches(record, clause));
        }

        let mut matched = true;
        if let Some(filter) = where_clause.get("blockNumber") {
            let block = record.block_number.unwrap_or_default();
            if let Some(gt) = filter.get("gt").and_then(Value::as_u64) {
                matched &= block > gt;
            }
            if let Some(gte) = filter.get("gte").and_then(Value::as_u64) {
                matched &= block >= gte;
            }
            if let Some(equals) = filter.get("equals").and_then(Value::as_u64) {
                matched &= block == equals;
            }
        }
        if let Some(filter) = where_clause.get("id") {
            if let Some(gt) = filter.get("gt").and_then(Value::as_str) {
                matched &= record.id.as_str() > gt;
            }
        }
        matched
    }

    #[test]
    fn a_block_larger_than_one_page_still_pages_through() {
        // Three records share block 100 with a page size of two; the cursor
        // must walk through the block by uid instead of re-fetching it.
        let all = vec![
            raw("0x01", Some(100)),
            raw("0x02", Some(100)),
            raw("0x03", Some(100)),
            raw("0x04", Some(101)),
        ];

        let mut cursor = SyncCursor::from_start(100);
        let mut seen: Vec<String> = Vec::new();
        for _ in 0..4 {
            let body = build_request_body("0xschema", &cursor, 2);
            let page: Vec<RawAttestation> = all
                .iter()
                .filter(|record| index_matches(record, &body["variables"]["where"]))
                .take(2)
                .cloned()
                .collect();
            let Some(next) = next_cursor_of(&page) else {
                break;
            };
            seen.extend(page.iter().map(|record| record.id.clone()));
            cursor = next;
        }

        assert_eq!(seen, vec!["0x01", "0x02", "0x03", "0x04"]);
        assert_eq!(cursor.block_number, 101);
        assert_eq!(cursor.last_uid.unwrap().as_str(), "0x04");
    }

    #[test]
    fn page_parses_records_and_next_cursor() {
        let payload: GraphQlResponse = serde_json::from_value(json!({
            "data": {
                "attestations": [
                    {
                        "id": "0x01",
                        "attester": "0xA",
                        "recipient": "0xB",
                        "revoked": false,
                        "revocationTime": 0,
                        "expirationTime": null,
                        "revocable": true,
                        "time": 1_700_000_100,
                        "data": { "srs": "EPSG:4326" },
                        "schemaId": "0xschema",
                        "refUID": null,
                        "txid": "0xdead",
                        "blockNumber": 101,
                        "cid": null
                    }
                ]
            }
        }))
        .unwrap();

        let records = parse_page(payload).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].txid.as_deref(), Some("0xdead"));

        let cursor = next_cursor_of(&records).unwrap();
        assert_eq!(cursor.block_number, 101);
        assert_eq!(cursor.last_uid.as_ref().unwrap().as_str(), "0x01");
    }

    #[test]
    fn graphql_errors_fail_the_whole_call() {
        let payload: GraphQlResponse = serde_json::from_value(json!({
            "errors": [{ "message": "schema endpoint unavailable" }]
        }))
        .unwrap();

        let result = parse_page(payload);
        assert!(matches!(
            result,
            Err(ClientError::GraphQl(ref msg)) if msg.contains("schema endpoint unavailable")
        ));
    }

    #[test]
    fn missing_data_and_errors_is_malformed() {
        let payload: GraphQlResponse = serde_json::from_value(json!({})).unwrap();
        assert!(matches!(
            parse_page(payload),
            Err(ClientError::MalformedResponse(_))
        ));
    }

    #[test]
    fn mistyped_field_rejects_the_page() {
        // revoked as a string must not be coerced to a bool
        let result: std::result::Result<GraphQlResponse, _> = serde_json::from_value(json!({
            "data": {
                "attestations": [{
                    "id": "0x01",
                    "attester": "0xA",
                    "recipient": "0xB",
                    "revoked": "nope",
                    "time": 1,
                    "schemaId": "0xschema"
                }]
            }
        }));
        assert!(result.is_err());
    }
}
