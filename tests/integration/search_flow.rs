//! End-to-end search behavior: pagination, ordering, caps, the defensive
//! empty-page stop, partial-failure tolerance, and interval spacing.

use std::time::{Duration, Instant};
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bdtd_scraper::{Bdtd, FetchPolicy, SearchQuery};

use super::support::{self, listing_entry, results_page};

fn fast_policy(workers: usize) -> FetchPolicy {
    FetchPolicy::default()
        .with_workers(workers)
        .with_interval(Duration::ZERO)
        .with_max_retries(1)
}

fn bdtd_for(server: &MockServer) -> Bdtd {
    Bdtd::new().with_base_url(Url::parse(&server.uri()).unwrap())
}

/// Two pages of two records each, in a fixed order.
async fn mount_two_page_search(server: &MockServer) {
    let base = server.uri();
    support::mount_results_page(
        server,
        1,
        results_page(
            &[
                listing_entry(&base, "A_1", "Título A1"),
                listing_entry(&base, "A_2", "Título A2"),
            ],
            2,
        ),
        None,
    )
    .await;
    support::mount_results_page(
        server,
        2,
        results_page(
            &[
                listing_entry(&base, "B_1", "Título B1"),
                listing_entry(&base, "B_2", "Título B2"),
            ],
            2,
        ),
        None,
    )
    .await;
}

#[tokio::test]
async fn two_page_search_collects_ordered_records() {
    let server = MockServer::start().await;
    mount_two_page_search(&server).await;

    let query = SearchQuery::new("coronavírus")
        .with_max_pages(2)
        .with_policy(fast_policy(20));
    let outcome = bdtd_for(&server).search(&query).await.unwrap();

    let ids: Vec<&str> = outcome.hits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["A_1", "A_2", "B_1", "B_2"]);
    assert_eq!(outcome.pages_planned, 2);
    assert!(outcome.failed_pages.is_empty());
    assert!(!outcome.interrupted);

    // Exactly one request per page
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn record_order_is_identical_for_any_worker_count() {
    let mut orders = Vec::new();

    for workers in [1, 20] {
        let server = MockServer::start().await;
        mount_two_page_search(&server).await;

        let query = SearchQuery::new("coronavírus").with_policy(fast_policy(workers));
        let outcome = bdtd_for(&server).search(&query).await.unwrap();
        orders.push(
            outcome
                .hits
                .iter()
                .map(|h| h.id.clone())
                .collect::<Vec<_>>(),
        );
    }

    assert_eq!(orders[0], orders[1]);
    assert_eq!(orders[0], vec!["A_1", "A_2", "B_1", "B_2"]);
}

#[tokio::test]
async fn max_pages_caps_submitted_jobs() {
    let server = MockServer::start().await;
    let base = server.uri();

    // The site reports five pages; only the first two may ever be requested.
    support::mount_results_page(
        &server,
        1,
        results_page(&[listing_entry(&base, "A_1", "Título A1")], 5),
        Some(1),
    )
    .await;
    support::mount_results_page(
        &server,
        2,
        results_page(&[listing_entry(&base, "B_1", "Título B1")], 5),
        Some(1),
    )
    .await;
    for page in 3..=5 {
        support::mount_results_page(&server, page, results_page(&[], 5), Some(0)).await;
    }

    let query = SearchQuery::new("coronavírus")
        .with_max_pages(2)
        .with_policy(fast_policy(20));
    let outcome = bdtd_for(&server).search(&query).await.unwrap();

    assert_eq!(outcome.pages_discovered, 5);
    assert_eq!(outcome.pages_planned, 2);
    let ids: Vec<&str> = outcome.hits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["A_1", "B_1"]);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2, "at most max_pages requests are issued");
}

#[tokio::test]
async fn empty_page_stops_enumeration_and_truncates() {
    let server = MockServer::start().await;
    let base = server.uri();

    support::mount_results_page(
        &server,
        1,
        results_page(&[listing_entry(&base, "A_1", "Título A1")], 3),
        None,
    )
    .await;
    // The server lied about three pages: page 2 is empty.
    support::mount_results_page(&server, 2, results_page(&[], 3), None).await;
    support::mount_results_page(
        &server,
        3,
        results_page(&[listing_entry(&base, "C_1", "Título C1")], 3),
        Some(0),
    )
    .await;

    // One worker makes submission order deterministic: page 2 parses empty
    // before page 3 would be submitted.
    let query = SearchQuery::new("coronavírus").with_policy(fast_policy(1));
    let outcome = bdtd_for(&server).search(&query).await.unwrap();

    let ids: Vec<&str> = outcome.hits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["A_1"], "records past the empty page are dropped");
    assert_eq!(outcome.truncated_after, Some(2));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2, "page 3 is never requested");
}

#[tokio::test]
async fn failed_middle_page_is_reported_not_fatal() {
    let server = MockServer::start().await;
    let base = server.uri();

    support::mount_results_page(
        &server,
        1,
        results_page(&[listing_entry(&base, "A_1", "Título A1")], 3),
        None,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/Search/Results"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    support::mount_results_page(
        &server,
        3,
        results_page(&[listing_entry(&base, "C_1", "Título C1")], 3),
        None,
    )
    .await;

    let query = SearchQuery::new("coronavírus").with_policy(fast_policy(4));
    let outcome = bdtd_for(&server).search(&query).await.unwrap();

    let ids: Vec<&str> = outcome.hits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["A_1", "C_1"]);
    assert_eq!(outcome.failed_pages.len(), 1);
    assert_eq!(outcome.failed_pages[0].page_index, 2);
    assert_eq!(outcome.failed_pages[0].attempts, 1);
}

#[tokio::test]
async fn single_page_search_issues_one_request() {
    let server = MockServer::start().await;
    let base = server.uri();

    support::mount_results_page(
        &server,
        1,
        results_page(&[listing_entry(&base, "A_1", "Título A1")], 1),
        Some(1),
    )
    .await;

    let query = SearchQuery::new("coronavírus").with_policy(fast_policy(8));
    let outcome = bdtd_for(&server).search(&query).await.unwrap();

    assert_eq!(outcome.pages_discovered, 1);
    assert_eq!(outcome.pages_planned, 1);
    assert_eq!(outcome.hits.len(), 1);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn raw_search_returns_page_bodies_in_page_order() {
    let server = MockServer::start().await;
    mount_two_page_search(&server).await;

    let query = SearchQuery::new("coronavírus").with_policy(fast_policy(20));
    let outcomes = bdtd_for(&server).search_raw(&query).await.unwrap();

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].job.page_index, 1);
    assert_eq!(outcomes[1].job.page_index, 2);
    assert!(outcomes.iter().all(|o| o.is_success()));
    assert!(outcomes[0].body().unwrap().contains("Título A1"));
    assert!(outcomes[1].body().unwrap().contains("Título B1"));
}

#[tokio::test]
async fn consecutive_requests_respect_the_interval() {
    let server = MockServer::start().await;
    mount_two_page_search(&server).await;

    let interval = Duration::from_millis(150);
    let query = SearchQuery::new("coronavírus").with_policy(
        FetchPolicy::default()
            .with_workers(8)
            .with_interval(interval)
            .with_max_retries(1),
    );

    let start = Instant::now();
    let outcome = bdtd_for(&server).search(&query).await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(outcome.hits.len(), 4);
    // Two requests through the gate: the second cannot start before one
    // interval has elapsed.
    assert!(
        elapsed >= interval,
        "expected >= {interval:?} for two gated requests, got {elapsed:?}"
    );
}
