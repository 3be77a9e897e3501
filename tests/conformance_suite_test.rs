mod common;

use std::time::Duration;

use httpmock::prelude::*;
use rates_conformance::{CheckStatus, ConformanceSuite, ParsedDocument, TIMEOUT_MESSAGE};

use common::{
    DAILY_PATH, DIRECTORY_PATH, fixture, fixture_date, mock_daily, mock_directory, test_config,
};

fn failure_message(status: &CheckStatus) -> &str {
    match status {
        CheckStatus::Failed { message } => message,
        other => panic!("Expected Failed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_conforming_service_passes_every_check() {
    let server = MockServer::start_async().await;
    mock_daily(&server, "daily_valid.xml").await;
    mock_directory(&server, "directory_monthly.xml").await;

    let suite = ConformanceSuite::new(&test_config(&server))
        .unwrap()
        .with_today(fixture_date());
    let report = suite.run(&[]).await;

    let names: Vec<_> = report.outcomes.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "schema_conformance",
            "root_tag",
            "current_date",
            "currency_codes",
            "field_completeness",
        ]
    );
    for outcome in &report.outcomes {
        assert!(outcome.status.is_passed(), "{}: {:?}", outcome.name, outcome.status);
    }
    assert!(report.success());
}

#[tokio::test]
async fn test_windows_1251_response_is_decoded() {
    let server = MockServer::start_async().await;
    mock_daily(&server, "daily_windows1251.xml").await;

    let suite = ConformanceSuite::new(&test_config(&server))
        .unwrap()
        .with_today(fixture_date());
    let report = suite
        .run(&["schema".to_string(), "root".to_string(), "completeness".to_string()])
        .await;

    assert_eq!(report.outcomes.len(), 3);
    assert!(report.success(), "{:?}", report.outcomes);

    let doc = ParsedDocument::parse(&fixture("daily_windows1251.xml")).unwrap();
    let names: Vec<_> = doc.root().iter("Name").filter_map(|e| e.text()).collect();
    assert_eq!(names, vec!["Австралийский доллар", "Доллар США", "Японских иен"]);
}

#[tokio::test]
async fn test_schema_violation_fails_schema_check() {
    let server = MockServer::start_async().await;
    mock_daily(&server, "daily_schema_violation.xml").await;

    let suite = ConformanceSuite::new(&test_config(&server)).unwrap();
    let report = suite.run(&["schema_conformance".to_string()]).await;

    let message = failure_message(&report.outcomes[0].status);
    assert!(message.starts_with("response body does not conform to the schema"));
    assert!(message.contains("84a"), "{}", message);
}

#[tokio::test]
async fn test_missing_schema_file_is_an_error() {
    let server = MockServer::start_async().await;
    mock_daily(&server, "daily_valid.xml").await;

    let mut config = test_config(&server);
    config.service.schema_path = common::fixtures_dir().join("missing.xsd");
    let suite = ConformanceSuite::new(&config).unwrap();
    let report = suite.run(&["schema_conformance".to_string()]).await;

    assert!(report.outcomes[0].status.is_errored());
    assert_eq!(report.exit_code(), 1);
}

#[tokio::test]
async fn test_wrong_root_tag_fails() {
    let server = MockServer::start_async().await;
    mock_daily(&server, "daily_wrong_root.xml").await;

    let suite = ConformanceSuite::new(&test_config(&server)).unwrap();
    let report = suite.run(&["root_tag".to_string()]).await;

    assert_eq!(
        failure_message(&report.outcomes[0].status),
        "root element is Rates, expected ValCurs"
    );
}

#[tokio::test]
async fn test_current_date_mismatch_names_both_dates() {
    let server = MockServer::start_async().await;
    mock_daily(&server, "daily_valid.xml").await;

    let tomorrow = fixture_date().succ_opt().unwrap();
    let suite = ConformanceSuite::new(&test_config(&server))
        .unwrap()
        .with_today(tomorrow);
    let report = suite.run(&["current_date".to_string()]).await;

    assert_eq!(
        failure_message(&report.outcomes[0].status),
        "current date 15.10.2026 does not match the date in the response 14.10.2026"
    );
}

#[tokio::test]
async fn test_requested_date_is_echoed_with_dots() {
    let server = MockServer::start_async().await;
    let body = fixture("daily_requested.xml");
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path(DAILY_PATH)
                .query_param("date_req", "31/12/2010");
            then.status(200).body(body);
        })
        .await;

    let mut config = test_config(&server);
    config.checks.historical_dates = vec!["31/12/2010".to_string()];
    let suite = ConformanceSuite::new(&config).unwrap();
    let report = suite.run(&["requested_date".to_string()]).await;

    mock.assert_async().await;
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.outcomes[0].name, "requested_date[31/12/2010]");
    assert!(report.outcomes[0].status.is_passed());
}

#[tokio::test]
async fn test_requested_date_mismatch_fails() {
    let server = MockServer::start_async().await;
    let body = fixture("daily_requested.xml");
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path(DAILY_PATH)
                .query_param("date_req", "02/03/2002");
            then.status(200).body(body);
        })
        .await;

    let mut config = test_config(&server);
    config.checks.historical_dates = vec!["02/03/2002".to_string()];
    let suite = ConformanceSuite::new(&config).unwrap();
    let report = suite.run(&["requested_date".to_string()]).await;

    assert_eq!(
        failure_message(&report.outcomes[0].status),
        "requested date 02.03.2002 does not match the date in the response 31.12.2010"
    );
}

#[tokio::test]
async fn test_unknown_currency_code_fails() {
    let server = MockServer::start_async().await;
    mock_daily(&server, "daily_unknown_code.xml").await;
    mock_directory(&server, "directory_monthly.xml").await;

    let suite = ConformanceSuite::new(&test_config(&server)).unwrap();
    let report = suite.run(&["currency_codes".to_string()]).await;

    assert_eq!(
        failure_message(&report.outcomes[0].status),
        "currency code 999 from the response is not in the currency directory"
    );
}

#[tokio::test]
async fn test_bad_directory_code_errors_currency_check() {
    let server = MockServer::start_async().await;
    mock_daily(&server, "daily_valid.xml").await;
    mock_directory(&server, "directory_monthly_bad_code.xml").await;

    let suite = ConformanceSuite::new(&test_config(&server)).unwrap();
    let report = suite.run(&["currency_codes".to_string()]).await;

    assert!(report.outcomes[0].status.is_errored());
}

#[tokio::test]
async fn test_empty_field_names_entry_and_field() {
    let server = MockServer::start_async().await;
    mock_daily(&server, "daily_empty_field.xml").await;

    let suite = ConformanceSuite::new(&test_config(&server)).unwrap();
    let report = suite.run(&["field_completeness".to_string()]).await;

    assert_eq!(
        failure_message(&report.outcomes[0].status),
        "entry R01235 has an empty field Name"
    );
}

#[tokio::test]
async fn test_empty_document_passes_entry_checks() {
    let server = MockServer::start_async().await;
    mock_daily(&server, "daily_empty.xml").await;
    mock_directory(&server, "directory_monthly.xml").await;

    let suite = ConformanceSuite::new(&test_config(&server)).unwrap();
    let report = suite
        .run(&["currency_codes".to_string(), "field_completeness".to_string()])
        .await;

    assert_eq!(report.outcomes.len(), 2);
    assert!(report.success(), "{:?}", report.outcomes);
}

#[tokio::test]
async fn test_malformed_response_is_an_error() {
    let server = MockServer::start_async().await;
    mock_daily(&server, "daily_malformed.xml").await;

    let suite = ConformanceSuite::new(&test_config(&server)).unwrap();
    let report = suite.run(&["root_tag".to_string()]).await;

    assert!(report.outcomes[0].status.is_errored());
}

#[tokio::test]
async fn test_timeout_fails_with_fixed_message() {
    let server = MockServer::start_async().await;
    let body = fixture("daily_valid.xml");
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path(DAILY_PATH);
            then.status(200).body(body).delay(Duration::from_secs(3));
        })
        .await;

    let mut config = test_config(&server);
    config.network.timeout_seconds = 1;
    let suite = ConformanceSuite::new(&config).unwrap();
    let report = suite.run(&["root_tag".to_string()]).await;

    assert_eq!(failure_message(&report.outcomes[0].status), TIMEOUT_MESSAGE);
    assert_eq!(mock.hits_async().await, 1);
}

#[tokio::test]
async fn test_directory_timeout_fails_currency_check() {
    let server = MockServer::start_async().await;
    mock_daily(&server, "daily_valid.xml").await;
    let body = fixture("directory_daily.xml");
    let directory = server
        .mock_async(|when, then| {
            when.method(GET).path(DIRECTORY_PATH).query_param("d", "0");
            then.status(200).body(body).delay(Duration::from_secs(3));
        })
        .await;

    let mut config = test_config(&server);
    config.network.timeout_seconds = 1;
    let suite = ConformanceSuite::new(&config).unwrap();
    let report = suite.run(&["currency_codes".to_string()]).await;

    assert_eq!(
        report.outcomes[0].status,
        CheckStatus::Failed {
            message: TIMEOUT_MESSAGE.to_string()
        }
    );
    assert_eq!(directory.hits_async().await, 1);
}

#[tokio::test]
async fn test_malformed_directory_errors_currency_check() {
    let server = MockServer::start_async().await;
    mock_daily(&server, "daily_valid.xml").await;
    let daily_directory = fixture("directory_daily.xml");
    let malformed = fixture("daily_malformed.xml");
    server
        .mock_async(|when, then| {
            when.method(GET).path(DIRECTORY_PATH).query_param("d", "0");
            then.status(200).body(daily_directory);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path(DIRECTORY_PATH).query_param("d", "1");
            then.status(200).body(malformed);
        })
        .await;

    let suite = ConformanceSuite::new(&test_config(&server)).unwrap();
    let report = suite.run(&["currency_codes".to_string()]).await;

    assert!(report.outcomes[0].status.is_errored(), "{:?}", report.outcomes[0]);
}
