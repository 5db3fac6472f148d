//! HTTP-level tests for the Airtable client against a local mock server.

use record_store::{
    update_in_batches, AirtableClient, FieldValue, ListRecordsOptions, RecordPatch, RecordSource,
    StoreConfig, StoreError,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BASE: &str = "appTEST12345678";

fn client_for(server: &MockServer) -> AirtableClient {
    let config = StoreConfig::new("test-key", BASE).with_api_url(server.uri());
    AirtableClient::new(config).unwrap()
}

fn patches(count: usize) -> Vec<RecordPatch> {
    (0..count)
        .map(|i| RecordPatch::new(format!("rec{}", i)).set("Notes", "n"))
        .collect()
}

#[tokio::test]
async fn test_list_records_sends_query_and_decodes_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/v0/{}/Invoices", BASE)))
        .and(header("Authorization", "Bearer test-key"))
        .and(query_param("fields[]", "Customer"))
        .and(query_param("fields[]", "Amount"))
        .and(query_param("filterByFormula", "NOT({Paid} = 'true')"))
        .and(query_param("pageSize", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [
                {"id": "rec1", "fields": {"Customer": ["cus_123"], "Amount": 19.99}},
                {"id": "rec2", "fields": {}}
            ],
            "offset": "itrNext"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let options = ListRecordsOptions::table("Invoices")
        .with_fields(["Customer", "Amount"])
        .with_filter("NOT({Paid} = 'true')")
        .with_page_size(100);

    let page = client.list_records(&options).await.unwrap();

    assert_eq!(page.records.len(), 2);
    assert_eq!(page.records[0].id, "rec1");
    assert_eq!(
        page.records[0].field("Amount"),
        Some(&FieldValue::Number(19.99))
    );
    assert_eq!(page.offset.as_deref(), Some("itrNext"));
}

#[tokio::test]
async fn test_list_records_passes_offset() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/v0/{}/Invoices", BASE)))
        .and(query_param("offset", "itrNext"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"records": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let options = ListRecordsOptions::table("Invoices").with_offset(Some("itrNext".to_string()));

    let page = client.list_records(&options).await.unwrap();
    assert!(page.records.is_empty());
    assert!(page.offset.is_none());
}

#[tokio::test]
async fn test_list_records_requires_table() {
    let server = MockServer::start().await;
    let client = client_for(&server);

    let result = client.list_records(&ListRecordsOptions::default()).await;
    assert!(matches!(result, Err(StoreError::Config(_))));
}

#[tokio::test]
async fn test_unauthorized_is_classified() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"type": "AUTHENTICATION_REQUIRED", "message": "Authentication required"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .list_records(&ListRecordsOptions::table("Invoices"))
        .await
        .unwrap_err();

    assert!(err.is_auth());
    assert!(err.to_string().contains("AUTHENTICATION_REQUIRED"));
}

#[tokio::test]
async fn test_malformed_page_is_a_json_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .list_records(&ListRecordsOptions::table("Invoices"))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Json(_)), "got {:?}", err);
    assert!(!err.is_auth());
}

#[tokio::test]
async fn test_api_error_with_bare_code() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "NOT_FOUND"})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    match client.list_records(&ListRecordsOptions::table("Nope")).await {
        Err(StoreError::Api { status, message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "NOT_FOUND");
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_connect_probes_table() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/v0/{}/Invoices", BASE)))
        .and(query_param("pageSize", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"records": []})))
        .expect(1)
        .mount(&server)
        .await;

    let config = StoreConfig::new("test-key", BASE).with_api_url(server.uri());
    let client = AirtableClient::connect(config, "Invoices").await.unwrap();
    assert_eq!(client.config().base_id, BASE);
}

#[tokio::test]
async fn test_connect_fails_on_bad_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let config = StoreConfig::new("bad-key", BASE).with_api_url(server.uri());
    let err = AirtableClient::connect(config, "Invoices").await.unwrap_err();
    assert!(err.is_auth());
}

#[tokio::test]
async fn test_partial_update_sends_only_given_fields() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path(format!("/v0/{}/Invoices", BASE)))
        .and(header("Authorization", "Bearer test-key"))
        .and(body_json(json!({
            "records": [
                {"id": "rec1", "fields": {"Notes": "Confirmation number: pi_abc", "Paid": "true"}}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"records": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let patch = RecordPatch::new("rec1")
        .set("Paid", "true")
        .set("Notes", "Confirmation number: pi_abc");

    client.partial_update("Invoices", &[patch]).await.unwrap();
}

#[tokio::test]
async fn test_partial_update_rejects_eleven_records_without_request() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .partial_update("Invoices", &patches(11))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::BatchTooLarge { count: 11, max: 10 }));
}

#[tokio::test]
async fn test_update_in_batches_chunks_eleven_records() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path(format!("/v0/{}/Invoices", BASE)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"records": []})))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    update_in_batches(&client, "Invoices", &patches(11)).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let sizes: Vec<usize> = requests
        .iter()
        .map(|request| {
            let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
            body["records"].as_array().unwrap().len()
        })
        .collect();
    assert_eq!(sizes, vec![10, 1]);
}

#[tokio::test]
async fn test_partial_update_surfaces_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "error": {"type": "INVALID_VALUE_FOR_COLUMN", "message": "bad value"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .partial_update("Invoices", &patches(1))
        .await
        .unwrap_err();

    match err {
        StoreError::Api { status, message } => {
            assert_eq!(status, 422);
            assert!(message.contains("bad value"));
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}
