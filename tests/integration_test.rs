//! Integration tests for airtable-kit
//!
//! Drives the public API against `MockTransport` and checks the requests it
//! sends and how responses are mapped.

use airtable_kit::api::{FieldSpec, RecordQuery, MAX_URL_LENGTH};
use airtable_kit::formulas::field;
use airtable_kit::models::{FieldType, Fields, UpdateRecordDict, WebhookSpecification};
use airtable_kit::testing::{connect_error, mock_api, MockTransport, FAKE_API_KEY};
use airtable_kit::{retry_strategy, AirtableError, Api};
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

const BASE_ID: &str = "appAAAAAAAAAAAAAA";

fn record_json(id: &str, fields: Value) -> Value {
    json!({"id": id, "createdTime": "2024-01-01T00:00:00.000Z", "fields": fields})
}

fn fields(value: Value) -> Fields {
    value.as_object().cloned().unwrap_or_default()
}

fn query_values(mock: &MockTransport, index: usize, key: &str) -> Vec<String> {
    mock.requests()[index]
        .url
        .query_pairs()
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
        .collect()
}

#[tokio::test]
async fn test_rate_limited_requests_are_retried() {
    let (api, mock) = mock_api().unwrap();
    mock.push_json(429, json!({"errors": []}))
        .push_rate_limited(0)
        .push_json(200, json!({"id": "usrAAAAAAAAAAAAAA", "scopes": ["data.records:read"]}));

    let me = assert_ok!(api.whoami().await);
    assert_eq!(me.scopes.unwrap(), vec!["data.records:read"]);
    assert_eq!(mock.request_count(), 3);
}

#[tokio::test]
async fn test_retries_give_up_after_total() {
    let mock = Arc::new(MockTransport::new());
    let api = Api::builder()
        .with_api_key(FAKE_API_KEY)
        .with_transport(mock.clone())
        .with_retry_strategy(retry_strategy().with_total(2).with_backoff_factor(0.0))
        .build()
        .unwrap();
    for _ in 0..4 {
        mock.push_json(429, json!({"error": "RATE_LIMIT_REACHED"}));
    }

    let err = assert_err!(api.whoami().await);
    assert_eq!(err.status(), Some(429));
    assert_eq!(mock.request_count(), 3);
    assert_eq!(mock.remaining(), 1);
}

#[tokio::test]
async fn test_connection_errors_are_retried() {
    let (api, mock) = mock_api().unwrap();
    mock.push_error(connect_error().await)
        .push_json(200, json!({"id": "usrAAAAAAAAAAAAAA"}));

    let me = assert_ok!(api.whoami().await);
    assert_eq!(me.id, "usrAAAAAAAAAAAAAA");
    assert_eq!(mock.request_count(), 2);
}

fn api_with_retries(total: u32) -> (Api, Arc<MockTransport>) {
    let mock = Arc::new(MockTransport::new());
    let api = Api::builder()
        .with_api_key(FAKE_API_KEY)
        .with_transport(mock.clone())
        .with_retry_strategy(retry_strategy().with_total(total).with_backoff_factor(0.0))
        .build()
        .unwrap();
    (api, mock)
}

#[tokio::test]
async fn test_connection_retries_share_the_budget() {
    let (api, mock) = api_with_retries(1);
    mock.push_error(connect_error().await)
        .push_error(connect_error().await)
        .push_json(200, json!({"id": "usrAAAAAAAAAAAAAA"}));

    let err = assert_err!(api.whoami().await);
    assert!(matches!(err, AirtableError::Http(_)));
    assert_eq!(err.status(), None);
    assert_eq!(mock.request_count(), 2);
    assert_eq!(mock.remaining(), 1);

    let (api, mock) = api_with_retries(1);
    mock.push_error(connect_error().await)
        .push_rate_limited(0)
        .push_json(200, json!({"id": "usrAAAAAAAAAAAAAA"}));

    let err = assert_err!(api.whoami().await);
    assert_eq!(err.status(), Some(429));
    assert_eq!(mock.request_count(), 2);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let (api, mock) = mock_api().unwrap();
    mock.push_json(
        422,
        json!({"error": {"type": "INVALID_REQUEST_UNKNOWN", "message": "Invalid request"}}),
    );
    mock.push_json(404, json!({"error": "NOT_FOUND"}));

    let table = api.table(BASE_ID, "Contacts");
    match table.create(Fields::new(), false).await {
        Err(AirtableError::Api {
            status,
            error_type,
            message,
        }) => {
            assert_eq!(status, 422);
            assert_eq!(error_type, "INVALID_REQUEST_UNKNOWN");
            assert_eq!(message, "Invalid request");
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(mock.request_count(), 1);

    let err = assert_err!(table.get("recMISSINGMISSING", &RecordQuery::new()).await);
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_pagination_follows_offset() {
    let (api, mock) = mock_api().unwrap();
    mock.push_json(
        200,
        json!({"records": [record_json("rec1", json!({"Name": "A"}))], "offset": "itrNEXT/rec1"}),
    )
    .push_json(200, json!({"records": [record_json("rec2", json!({"Name": "B"}))]}));

    let table = api.table(BASE_ID, "Contacts");
    let query = RecordQuery::new()
        .with_view("Grid view")
        .with_sort(["-Name"])
        .with_formula(field("Name").not_equals(""));
    let records = table.all(&query).await.unwrap();

    let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["rec1", "rec2"]);
    mock.assert_request(0, Method::GET, "/v0/appAAAAAAAAAAAAAA/Contacts");
    assert!(query_values(&mock, 0, "offset").is_empty());
    assert_eq!(query_values(&mock, 1, "offset"), vec!["itrNEXT/rec1"]);
    assert_eq!(query_values(&mock, 1, "sort[0][direction]"), vec!["desc"]);
    assert_eq!(query_values(&mock, 1, "filterByFormula"), vec!["{Name}!=''"]);
}

#[tokio::test]
async fn test_max_records_stops_iteration() {
    let (api, mock) = mock_api().unwrap();
    mock.push_json(
        200,
        json!({
            "records": [
                record_json("rec1", json!({})),
                record_json("rec2", json!({})),
                record_json("rec3", json!({})),
            ],
            "offset": "itrMORE",
        }),
    );

    let table = api.table(BASE_ID, "Contacts");
    let records = table
        .all(&RecordQuery::new().with_max_records(2))
        .await
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(mock.request_count(), 1);
}

#[tokio::test]
async fn test_first_requests_one_record() {
    let (api, mock) = mock_api().unwrap();
    mock.push_json(200, json!({"records": []}));

    let table = api.table(BASE_ID, "Contacts");
    assert!(table.first(&RecordQuery::new()).await.unwrap().is_none());
    assert_eq!(query_values(&mock, 0, "pageSize"), vec!["1"]);
    assert_eq!(query_values(&mock, 0, "maxRecords"), vec!["1"]);
}

#[tokio::test]
async fn test_long_urls_switch_to_post() {
    let (api, mock) = mock_api().unwrap();
    mock.push_json(200, json!({"records": [record_json("rec1", json!({}))], "offset": "itr2"}))
        .push_json(200, json!({"records": [record_json("rec2", json!({}))]}));

    let names: Vec<String> = (0..1000).map(|i| format!("A rather long field name {}", i)).collect();
    let query = RecordQuery::new().with_fields(names.clone());
    assert!(names.iter().map(|n| n.len()).sum::<usize>() > MAX_URL_LENGTH);

    let table = api.table(BASE_ID, "Contacts");
    let records = table.all(&query).await.unwrap();
    assert_eq!(records.len(), 2);

    mock.assert_request(0, Method::POST, "/Contacts/listRecords");
    let requests = mock.requests();
    let first = requests[0].body.as_ref().unwrap();
    assert_eq!(first["fields"].as_array().unwrap().len(), 1000);
    assert!(first.get("offset").is_none());
    assert_eq!(requests[1].body.as_ref().unwrap()["offset"], "itr2");
    assert!(requests[1].url.query().is_none());
}

#[tokio::test]
async fn test_batch_create_chunks_in_order() {
    let (api, mock) = mock_api().unwrap();
    let input: Vec<Fields> = (0..25).map(|i| fields(json!({"N": i}))).collect();
    for chunk in input.chunks(10) {
        let records: Vec<Value> = chunk
            .iter()
            .map(|f| record_json(&format!("rec{:014}", f["N"]), Value::Object(f.clone())))
            .collect();
        mock.push_json(200, json!({"records": records}));
    }

    let table = api.table(BASE_ID, "Numbers");
    let created = table.batch_create(&input, true).await.unwrap();

    assert_eq!(created.len(), 25);
    assert_eq!(created[0].fields["N"], 0);
    assert_eq!(created[24].fields["N"], 24);

    let requests = mock.requests();
    assert_eq!(requests.len(), 3);
    let sizes: Vec<usize> = requests
        .iter()
        .map(|r| r.body.as_ref().unwrap()["records"].as_array().unwrap().len())
        .collect();
    assert_eq!(sizes, vec![10, 10, 5]);
    assert_eq!(requests[0].body.as_ref().unwrap()["typecast"], true);
    assert_eq!(requests[2].body.as_ref().unwrap()["records"][0]["fields"]["N"], 20);
}

#[tokio::test]
async fn test_update_uses_patch_or_put() {
    let (api, mock) = mock_api().unwrap();
    let updated = record_json("recAAAAAAAAAAAAAA", json!({"Name": "B"}));
    mock.push_json(200, updated.clone())
        .push_json(200, updated)
        .push_json(200, json!({"records": [record_json("recAAAAAAAAAAAAAA", json!({}))]}));

    let table = api.table(BASE_ID, "Contacts");
    table
        .update("recAAAAAAAAAAAAAA", fields(json!({"Name": "B"})), false, false)
        .await
        .unwrap();
    table
        .update("recAAAAAAAAAAAAAA", fields(json!({"Name": "B"})), true, false)
        .await
        .unwrap();
    table
        .batch_update(
            &[UpdateRecordDict {
                id: "recAAAAAAAAAAAAAA".to_string(),
                fields: Fields::new(),
            }],
            false,
            false,
        )
        .await
        .unwrap();

    mock.assert_request(0, Method::PATCH, "/Contacts/recAAAAAAAAAAAAAA");
    mock.assert_request(1, Method::PUT, "/Contacts/recAAAAAAAAAAAAAA");
    mock.assert_request(2, Method::PATCH, "/Contacts");
}

#[tokio::test]
async fn test_batch_upsert_merges_results() {
    let (api, mock) = mock_api().unwrap();
    let input: Vec<Fields> = (0..12)
        .map(|i| fields(json!({"Email": format!("u{}@example.com", i)})))
        .collect();
    mock.push_json(
        200,
        json!({"createdRecords": ["rec1"], "updatedRecords": ["rec2"], "records": [record_json("rec1", json!({})), record_json("rec2", json!({}))]}),
    )
    .push_json(
        200,
        json!({"createdRecords": ["rec3"], "updatedRecords": [], "records": [record_json("rec3", json!({}))]}),
    );

    let table = api.table(BASE_ID, "Users");
    let result = table
        .batch_upsert(&input, &["Email"], false, false)
        .await
        .unwrap();

    assert_eq!(result.created_records, vec!["rec1", "rec3"]);
    assert_eq!(result.updated_records, vec!["rec2"]);
    assert_eq!(result.records.len(), 3);
    let body = mock.requests()[0].body.clone().unwrap();
    assert_eq!(body["performUpsert"]["fieldsToMergeOn"], json!(["Email"]));

    let missing = vec![fields(json!({"Name": "no email"}))];
    assert!(matches!(
        table.batch_upsert(&missing, &["Email"], false, false).await,
        Err(AirtableError::InvalidParameter(_))
    ));
    assert_eq!(mock.request_count(), 2);
}

#[tokio::test]
async fn test_batch_delete_sends_ids() {
    let (api, mock) = mock_api().unwrap();
    mock.push_json(
        200,
        json!({"records": [{"id": "rec1", "deleted": true}, {"id": "rec2", "deleted": true}]}),
    );

    let table = api.table(BASE_ID, "Contacts");
    let deleted = table.batch_delete(&["rec1", "rec2"]).await.unwrap();
    assert!(deleted.iter().all(|d| d.deleted));
    assert_eq!(query_values(&mock, 0, "records[]"), vec!["rec1", "rec2"]);
    assert_eq!(mock.requests()[0].method, Method::DELETE);
}

#[tokio::test]
async fn test_use_field_ids_is_sent() {
    let mock = Arc::new(MockTransport::new());
    let api = Api::builder()
        .with_api_key(FAKE_API_KEY)
        .with_transport(mock.clone())
        .with_use_field_ids(true)
        .build()
        .unwrap();
    mock.push_json(200, json!({"records": []}))
        .push_json(200, record_json("rec1", json!({})));

    let table = api.table(BASE_ID, "tblAAAAAAAAAAAAAA");
    table.all(&RecordQuery::new()).await.unwrap();
    table.create(Fields::new(), false).await.unwrap();

    assert_eq!(query_values(&mock, 0, "returnFieldsByFieldId"), vec!["true"]);
    assert_eq!(mock.requests()[1].body.as_ref().unwrap()["returnFieldsByFieldId"], true);
}

#[tokio::test]
async fn test_comments() {
    let (api, mock) = mock_api().unwrap();
    let comment = json!({
        "id": "comAAAAAAAAAAAAAA",
        "text": "Hello @[usrAAAAAAAAAAAAAA]",
        "createdTime": "2024-01-01T00:00:00.000Z",
        "author": {"id": "usrBBBBBBBBBBBBBB", "email": "b@example.com"},
    });
    mock.push_json(200, json!({"comments": [comment.clone()], "offset": "next"}))
        .push_json(200, json!({"comments": [], "offset": null}))
        .push_json(200, comment);

    let table = api.table(BASE_ID, "Contacts");
    let comments = table.comments("recAAAAAAAAAAAAAA").await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].author.email.as_deref(), Some("b@example.com"));

    table
        .add_comment("recAAAAAAAAAAAAAA", "Hello @[usrAAAAAAAAAAAAAA]")
        .await
        .unwrap();
    mock.assert_request(2, Method::POST, "/recAAAAAAAAAAAAAA/comments");
    assert_eq!(
        mock.requests()[2].body.as_ref().unwrap()["text"],
        "Hello @[usrAAAAAAAAAAAAAA]"
    );
}

fn schema_json() -> Value {
    json!({
        "tables": [{
            "id": "tblAAAAAAAAAAAAAA",
            "name": "Contacts",
            "primaryFieldId": "fldAAAAAAAAAAAAAA",
            "fields": [
                {"id": "fldAAAAAAAAAAAAAA", "name": "Name", "type": "singleLineText"},
                {"id": "fldBBBBBBBBBBBBBB", "name": "Score", "type": "someFutureType"}
            ],
            "views": [{"id": "viwAAAAAAAAAAAAAA", "name": "Grid view", "type": "grid"}]
        }]
    })
}

#[tokio::test]
async fn test_schema_is_cached_and_invalidated() {
    let (api, mock) = mock_api().unwrap();
    mock.push_json(200, schema_json())
        .push_json(
            200,
            json!({"id": "fldCCCCCCCCCCCCCC", "name": "Age", "type": "number"}),
        )
        .push_json(200, schema_json());

    let base = api.base(BASE_ID);
    let table = base.table("Contacts");
    let schema = table.schema().await.unwrap();
    assert_eq!(schema.id, "tblAAAAAAAAAAAAAA");
    assert_eq!(schema.field("Score").unwrap().field_type, FieldType::Unknown);
    assert_eq!(base.tables().await.unwrap().len(), 1);
    assert_eq!(mock.request_count(), 1);

    let created = table
        .create_field(&FieldSpec::new("Age", FieldType::Number))
        .await
        .unwrap();
    assert_eq!(created.id, "fldCCCCCCCCCCCCCC");
    mock.assert_request(1, Method::POST, "/meta/bases/appAAAAAAAAAAAAAA/tables/tblAAAAAAAAAAAAAA/fields");

    base.schema().await.unwrap();
    assert_eq!(mock.request_count(), 3);
}

#[tokio::test]
async fn test_upload_attachment_uses_content_endpoint() {
    let (api, mock) = mock_api().unwrap();
    mock.push_json(
        200,
        json!({
            "id": "recAAAAAAAAAAAAAA",
            "createdTime": "2024-01-01T00:00:00.000Z",
            "fields": {"fldAAAAAAAAAAAAAA": [{"id": "att1", "url": "https://example.com/a.txt"}]}
        }),
    );

    let table = api.table(BASE_ID, "Contacts");
    let result = table
        .upload_attachment("recAAAAAAAAAAAAAA", "Files", "a.txt", b"hello", "text/plain")
        .await
        .unwrap();
    assert_eq!(result.fields["fldAAAAAAAAAAAAAA"].len(), 1);

    let request = mock.last_request().unwrap();
    assert_eq!(request.url.host_str(), Some("content.airtable.com"));
    assert!(request.url.path().ends_with("/recAAAAAAAAAAAAAA/Files/uploadAttachment"));
    assert_eq!(request.body.as_ref().unwrap()["file"], "aGVsbG8=");
}

fn payload_json(n: u64) -> Value {
    json!({
        "timestamp": "2024-01-01T00:00:00.000Z",
        "baseTransactionNumber": n,
        "payloadFormat": "v0",
        "changedTablesById": {}
    })
}

#[tokio::test]
async fn test_webhooks() {
    let (api, mock) = mock_api().unwrap();
    mock.push_json(
        200,
        json!({"id": "achAAAAAAAAAAAAAA", "macSecretBase64": "c2VjcmV0", "expirationTime": "2024-01-08T00:00:00.000Z"}),
    )
    .push_json(
        200,
        json!({"payloads": [payload_json(1), payload_json(2)], "cursor": 3, "mightHaveMore": true}),
    )
    .push_json(
        200,
        json!({"payloads": [payload_json(3)], "cursor": 4, "mightHaveMore": false}),
    );

    let base = api.base(BASE_ID);
    let spec = WebhookSpecification::data_types(["tableData"]);
    let created = base
        .add_webhook("https://example.com/hook", &spec)
        .await
        .unwrap();
    assert_eq!(created.mac_secret_base64, "c2VjcmV0");
    let body = mock.requests()[0].body.clone().unwrap();
    assert_eq!(body["notificationUrl"], "https://example.com/hook");
    assert_eq!(body["specification"]["options"]["filters"]["dataTypes"], json!(["tableData"]));

    let payloads = base
        .webhook_payloads(&created.id, None, None)
        .collect_all()
        .await
        .unwrap();
    let cursors: Vec<_> = payloads.iter().map(|p| p.cursor).collect();
    assert_eq!(cursors, vec![Some(1), Some(2), Some(3)]);
    mock.assert_request(1, Method::GET, "/bases/appAAAAAAAAAAAAAA/webhooks/achAAAAAAAAAAAAAA/payloads");
    assert_eq!(query_values(&mock, 1, "cursor"), vec!["1"]);
    assert_eq!(query_values(&mock, 2, "cursor"), vec!["3"]);
}

#[tokio::test]
async fn test_workspace_and_enterprise() {
    let (api, mock) = mock_api().unwrap();
    mock.push_json(200, json!({}))
        .push_json(
            200,
            json!({"users": [{"id": "usrAAAAAAAAAAAAAA", "email": "a@example.com"}]}),
        )
        .push_json(
            200,
            json!({
                "events": [{"id": "evt1", "timestamp": "2024-01-01T00:00:00.000Z", "action": "createBase"}],
                "pagination": {"next": "page2"}
            }),
        )
        .push_json(200, json!({"events": [], "pagination": {}}));

    api.workspace("wspAAAAAAAAAAAAAA")
        .move_base(BASE_ID, "wspBBBBBBBBBBBBBB", Some(0))
        .await
        .unwrap();
    mock.assert_request(0, Method::POST, "/meta/workspaces/wspAAAAAAAAAAAAAA/moveBase");
    assert_eq!(
        mock.requests()[0].body,
        Some(json!({"baseId": BASE_ID, "targetWorkspaceId": "wspBBBBBBBBBBBBBB", "targetIndex": 0}))
    );

    let enterprise = api.enterprise("entAAAAAAAAAAAAAA");
    let users = enterprise.users_by_email(&["a@example.com"]).await.unwrap();
    assert_eq!(users[0].id, "usrAAAAAAAAAAAAAA");
    assert_eq!(query_values(&mock, 1, "email"), vec!["a@example.com"]);

    let events = enterprise
        .audit_log(Default::default())
        .unwrap()
        .collect_all()
        .await
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(query_values(&mock, 3, "next"), vec!["page2"]);
    assert_eq!(mock.remaining(), 0);
}

#[tokio::test]
async fn test_create_base_requires_tables() {
    let (api, mock) = mock_api().unwrap();
    assert!(matches!(
        api.create_base("wspAAAAAAAAAAAAAA", "Empty", &[]).await,
        Err(AirtableError::InvalidParameter(_))
    ));
    assert_eq!(mock.request_count(), 0);
}
