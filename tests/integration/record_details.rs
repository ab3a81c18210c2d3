//! Record-details phase: parsing, input-order preservation, and per-record
//! failure tolerance.

use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bdtd_scraper::search::FailureKind;
use bdtd_scraper::fetcher::FetchError;
use bdtd_scraper::{Bdtd, FetchPolicy};

use super::support;

fn fast_policy() -> FetchPolicy {
    FetchPolicy::default()
        .with_interval(Duration::ZERO)
        .with_max_retries(1)
}

#[tokio::test]
async fn details_are_parsed_in_input_order() {
    let server = MockServer::start().await;
    support::mount_record_page(
        &server,
        "B_2",
        support::record_page("Segundo título", "Resumo dois"),
    )
    .await;
    support::mount_record_page(
        &server,
        "A_1",
        support::record_page("Primeiro título", "Resumo um"),
    )
    .await;

    let bdtd = Bdtd::new().with_base_url(Url::parse(&server.uri()).unwrap());
    let ids = vec!["A_1".to_string(), "B_2".to_string()];
    let outcome = bdtd.get_records(&ids, &fast_policy()).await.unwrap();

    assert_eq!(outcome.details.len(), 2);
    assert_eq!(outcome.details[0].id, "A_1");
    assert_eq!(outcome.details[0].title, "Primeiro título");
    assert_eq!(outcome.details[0].abstract_text, "Resumo um");
    assert_eq!(outcome.details[0].field("Idioma"), Some("Português"));
    assert_eq!(outcome.details[1].id, "B_2");
    assert!(outcome.failures.is_empty());
}

#[tokio::test]
async fn failed_record_is_tolerated_and_reported() {
    let server = MockServer::start().await;
    support::mount_record_page(
        &server,
        "A_1",
        support::record_page("Primeiro título", "Resumo um"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/Record/GONE_9"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let bdtd = Bdtd::new().with_base_url(Url::parse(&server.uri()).unwrap());
    let ids = vec!["A_1".to_string(), "GONE_9".to_string()];
    let outcome = bdtd.get_records(&ids, &fast_policy()).await.unwrap();

    assert_eq!(outcome.details.len(), 1);
    assert_eq!(outcome.details[0].id, "A_1");

    assert_eq!(outcome.failures.len(), 1);
    let failure = &outcome.failures[0];
    assert_eq!(failure.id, "GONE_9");
    assert_eq!(failure.attempts, 1);
    assert_eq!(
        failure.kind,
        FailureKind::Fetch(FetchError::Status { status: 404 })
    );
}

#[tokio::test]
async fn unparseable_record_page_is_a_parse_failure() {
    let server = MockServer::start().await;
    support::mount_record_page(&server, "A_1", "<html><body>sem título</body></html>".to_string())
        .await;

    let bdtd = Bdtd::new().with_base_url(Url::parse(&server.uri()).unwrap());
    let ids = vec!["A_1".to_string()];
    let outcome = bdtd.get_records(&ids, &fast_policy()).await.unwrap();

    assert!(outcome.details.is_empty());
    assert_eq!(outcome.failures.len(), 1);
    assert!(matches!(outcome.failures[0].kind, FailureKind::Parse(_)));
}
