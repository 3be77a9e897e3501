//! Runs against a real deployment. Set `RATES_CONFORMANCE_ENTRYPOINT` and
//! run with `cargo test -- --ignored`.

use std::path::PathBuf;

use rates_conformance::{CodePolicy, Config, ConformanceSuite};

fn live_config() -> Config {
    let entrypoint = std::env::var("RATES_CONFORMANCE_ENTRYPOINT")
        .expect("RATES_CONFORMANCE_ENTRYPOINT must name the service under test");
    let mut config = Config::default();
    config.service.entrypoint = entrypoint;
    config.service.schema_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("schemas")
        .join("ValCurs.xsd");
    config
}

#[tokio::test]
#[ignore] // Requires a reachable service
async fn test_live_service_conforms() {
    let config = live_config();

    let report = ConformanceSuite::new(&config).unwrap().run(&[]).await;
    for outcome in &report.outcomes {
        assert!(outcome.status.is_passed(), "{}: {:?}", outcome.name, outcome.status);
    }
}

#[tokio::test]
#[ignore] // Requires a reachable service
async fn test_live_directory_reconciles() {
    let config = live_config();

    let client = rates_conformance::AsyncHttpClient::new(rates_conformance::HttpClientConfig::new(
        config.service.entrypoint.clone(),
    ))
    .unwrap();
    let codes = rates_conformance::fetch_reference_codes(
        &client,
        &config.service.directory_path,
        CodePolicy::Skip,
    )
    .await
    .unwrap();
    assert!(codes.contains(840));
}
