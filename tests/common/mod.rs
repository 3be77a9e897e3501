#![allow(dead_code)]

use std::path::PathBuf;

use chrono::NaiveDate;
use httpmock::prelude::*;
use rates_conformance::Config;

pub const DAILY_PATH: &str = "/XML_daily.asp";
pub const DIRECTORY_PATH: &str = "/XML_valFull.asp";

/// Date carried by the daily fixtures
pub fn fixture_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
}

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("xml")
}

pub fn fixture(name: &str) -> Vec<u8> {
    std::fs::read(fixtures_dir().join(name)).unwrap()
}

pub fn schema_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("schemas")
        .join("ValCurs.xsd")
}

/// Config pointing at a mock server, with no historical dates
pub fn test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.service.entrypoint = server.base_url();
    config.service.schema_path = schema_path();
    config.network.timeout_seconds = 2;
    config.checks.historical_dates.clear();
    config
}

/// Serve `fixture` for the daily method without a date parameter
pub async fn mock_daily<'a>(server: &'a MockServer, fixture_name: &str) -> httpmock::Mock<'a> {
    let body = fixture(fixture_name);
    server
        .mock_async(|when, then| {
            when.method(GET).path(DAILY_PATH);
            then.status(200)
                .header("content-type", "application/xml")
                .body(body);
        })
        .await
}

/// Serve both directory variants
pub async fn mock_directory<'a>(
    server: &'a MockServer,
    monthly_fixture: &str,
) -> (httpmock::Mock<'a>, httpmock::Mock<'a>) {
    let daily = fixture("directory_daily.xml");
    let monthly = fixture(monthly_fixture);

    let daily_mock = server
        .mock_async(|when, then| {
            when.method(GET).path(DIRECTORY_PATH).query_param("d", "0");
            then.status(200).body(daily);
        })
        .await;
    let monthly_mock = server
        .mock_async(|when, then| {
            when.method(GET).path(DIRECTORY_PATH).query_param("d", "1");
            then.status(200).body(monthly);
        })
        .await;

    (daily_mock, monthly_mock)
}
