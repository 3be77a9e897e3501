mod common;

use httpmock::prelude::*;
use rates_conformance::directory::fetch_variant_codes;
use rates_conformance::{
    AsyncHttpClient, CodePolicy, ConformanceError, DirectoryVariant, HttpClientConfig,
    fetch_reference_codes,
};

use common::{DIRECTORY_PATH, mock_directory};

fn client_for(server: &MockServer) -> AsyncHttpClient {
    AsyncHttpClient::new(HttpClientConfig::new(server.base_url())).unwrap()
}

#[tokio::test]
async fn test_reference_codes_are_the_union_of_both_variants() {
    let server = MockServer::start_async().await;
    let (daily, monthly) = mock_directory(&server, "directory_monthly.xml").await;
    let client = client_for(&server);

    let codes = fetch_reference_codes(&client, DIRECTORY_PATH, CodePolicy::Reject)
        .await
        .unwrap();

    daily.assert_async().await;
    monthly.assert_async().await;
    assert_eq!(codes.iter().collect::<Vec<_>>(), vec![36, 392, 826, 840, 978]);
}

#[tokio::test]
async fn test_reconciliation_is_repeatable() {
    let server = MockServer::start_async().await;
    let (daily, monthly) = mock_directory(&server, "directory_monthly.xml").await;
    let client = client_for(&server);

    let first = fetch_reference_codes(&client, DIRECTORY_PATH, CodePolicy::Reject)
        .await
        .unwrap();
    let second = fetch_reference_codes(&client, DIRECTORY_PATH, CodePolicy::Reject)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(daily.hits_async().await, 2);
    assert_eq!(monthly.hits_async().await, 2);
}

#[tokio::test]
async fn test_single_variant_codes_in_document_order() {
    let server = MockServer::start_async().await;
    mock_directory(&server, "directory_monthly.xml").await;
    let client = client_for(&server);

    let monthly = fetch_variant_codes(
        &client,
        DIRECTORY_PATH,
        DirectoryVariant::Monthly,
        CodePolicy::Reject,
    )
    .await
    .unwrap();

    // The empty ISO_Num_Code entry is not a code.
    assert_eq!(monthly, vec![826, 392, 36]);
}

#[tokio::test]
async fn test_non_numeric_code_rejected_by_default() {
    let server = MockServer::start_async().await;
    mock_directory(&server, "directory_monthly_bad_code.xml").await;
    let client = client_for(&server);

    let error = fetch_reference_codes(&client, DIRECTORY_PATH, CodePolicy::Reject)
        .await
        .unwrap_err();

    match error {
        ConformanceError::CodeConversion { field, value } => {
            assert_eq!(field, "ISO_Num_Code");
            assert_eq!(value, "3X2");
        }
        other => panic!("Expected CodeConversion, got {:?}", other),
    }
}

#[tokio::test]
async fn test_non_numeric_code_skipped_on_request() {
    let server = MockServer::start_async().await;
    mock_directory(&server, "directory_monthly_bad_code.xml").await;
    let client = client_for(&server);

    let codes = fetch_reference_codes(&client, DIRECTORY_PATH, CodePolicy::Skip)
        .await
        .unwrap();

    assert!(!codes.contains(392));
    assert_eq!(codes.iter().collect::<Vec<_>>(), vec![36, 826, 840, 978]);
}
