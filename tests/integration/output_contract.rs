//! Output-folder contract at the CLI level: what lands on disk, when the
//! folder is created at all, and idempotence across reruns.

use clap::Parser;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bdtd_scraper::cli::Cli;
use bdtd_scraper::shutdown::StopCoordinator;

use super::support::{self, listing_entry, results_page};

async fn mock_search_site(server: &MockServer) {
    let base = server.uri();
    support::mount_results_page(
        server,
        1,
        results_page(
            &[
                listing_entry(&base, "A_1", "Título A1"),
                listing_entry(&base, "B_2", "Título B2"),
            ],
            1,
        ),
        None,
    )
    .await;
    support::mount_record_page(
        server,
        "A_1",
        support::record_page("Título A1", "Resumo A1"),
    )
    .await;
    support::mount_record_page(
        server,
        "B_2",
        support::record_page("Título B2", "Resumo B2"),
    )
    .await;
}

fn cli_for(server: &MockServer, out: &std::path::Path, extra: &[&str]) -> Cli {
    let mut args = vec![
        "bdtd-scraper".to_string(),
        "coronavírus".to_string(),
        "--base-url".to_string(),
        server.uri(),
        "-o".to_string(),
        out.to_str().unwrap().to_string(),
        "--interval".to_string(),
        "0".to_string(),
        "--retries".to_string(),
        "1".to_string(),
    ];
    args.extend(extra.iter().map(|s| s.to_string()));
    Cli::parse_from(args)
}

#[tokio::test]
async fn successful_run_writes_all_csv_files() {
    let server = MockServer::start().await;
    mock_search_site(&server).await;

    let dir = tempfile::TempDir::new().unwrap();
    let out = dir.path().join("BDTD (coronavírus)");

    let cli = cli_for(&server, &out, &["--no-pdfs"]);
    cli.execute(StopCoordinator::shared()).await.unwrap();

    assert!(out.join("data-search.csv").is_file());
    assert!(out.join("data-records.csv").is_file());
    assert!(out.join("data.csv").is_file());
    assert!(!out.join("data-pdfs.csv").exists());
    assert!(!out.join("pdf").exists());

    let mut reader = csv::Reader::from_path(out.join("data-search.csv")).unwrap();
    let rows: Vec<_> = reader.records().collect::<Result<_, _>>().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "A_1");
    assert_eq!(&rows[1][0], "B_2");

    // The combined file joins search and detail columns on the record id
    let mut combined = csv::Reader::from_path(out.join("data.csv")).unwrap();
    let headers: Vec<String> = combined.headers().unwrap().iter().map(String::from).collect();
    assert!(headers.contains(&"Registro".to_string()));
    assert!(headers.contains(&"Título".to_string()));
    assert!(headers.contains(&"Detalhes_Resumo".to_string()));
    let combined_rows: Vec<_> = combined.records().collect::<Result<_, _>>().unwrap();
    assert_eq!(combined_rows.len(), 2);
}

#[tokio::test]
async fn fatal_first_page_leaves_no_output_folder() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Search/Results"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let out = dir.path().join("BDTD (coronavírus)");

    let cli = cli_for(&server, &out, &["--no-pdfs"]);
    let result = cli.execute(StopCoordinator::shared()).await;

    assert!(result.is_err());
    assert!(
        !out.exists(),
        "a fatal first-page failure must not create the output folder"
    );
}

#[tokio::test]
async fn no_details_skips_the_records_file() {
    let server = MockServer::start().await;
    mock_search_site(&server).await;

    let dir = tempfile::TempDir::new().unwrap();
    let out = dir.path().join("saida");

    let cli = cli_for(&server, &out, &["--no-pdfs", "--no-details"]);
    cli.execute(StopCoordinator::shared()).await.unwrap();

    assert!(out.join("data-search.csv").is_file());
    assert!(!out.join("data-records.csv").exists());
    assert!(out.join("data.csv").is_file());

    // Only the listing requests hit the server: no /Record/ fetches
    let requests = server.received_requests().await.unwrap();
    assert!(requests
        .iter()
        .all(|r| !r.url.path().starts_with("/Record/")));
}

#[tokio::test]
async fn rerun_with_identical_inputs_is_byte_identical() {
    let server = MockServer::start().await;
    mock_search_site(&server).await;

    let dir = tempfile::TempDir::new().unwrap();
    let out = dir.path().join("saida");

    cli_for(&server, &out, &["--no-pdfs"])
        .execute(StopCoordinator::shared())
        .await
        .unwrap();
    let first_search = std::fs::read(out.join("data-search.csv")).unwrap();
    let first_combined = std::fs::read(out.join("data.csv")).unwrap();

    cli_for(&server, &out, &["--no-pdfs"])
        .execute(StopCoordinator::shared())
        .await
        .unwrap();
    let second_search = std::fs::read(out.join("data-search.csv")).unwrap();
    let second_combined = std::fs::read(out.join("data.csv")).unwrap();

    assert_eq!(first_search, second_search);
    assert_eq!(first_combined, second_combined);
}
