//! Unit tests for the CLI argument surface

use clap::Parser;

use bdtd_scraper::cli::Cli;

/// The documented defaults: 8 workers, 0.5s interval, 3 retries.
#[test]
fn test_cli_defaults() {
    let cli = Cli::parse_from(["bdtd-scraper", "coronavírus"]);

    assert_eq!(cli.workers, 8, "default workers should be 8");
    assert_eq!(cli.interval, 0.5, "default interval should be 0.5s");
    assert_eq!(cli.max_retries, 3, "default retries should be 3");
    assert_eq!(cli.search_type, "AllFields");
    assert_eq!(cli.timeout, 10);
    assert_eq!(cli.max_pages, None, "pages are unlimited by default");
}

#[test]
fn test_cli_short_flags() {
    let cli = Cli::parse_from([
        "bdtd-scraper",
        "coronavírus",
        "-o",
        "saida",
        "-p",
        "2",
        "-t",
        "Title",
        "-w",
        "20",
    ]);

    assert_eq!(cli.output_folder.as_deref().unwrap().to_str(), Some("saida"));
    assert_eq!(cli.max_pages, Some(2));
    assert_eq!(cli.search_type, "Title");
    assert_eq!(cli.workers, 20);
}

#[test]
fn test_cli_phase_toggles() {
    let cli = Cli::parse_from(["bdtd-scraper", "termo", "--no-details", "--no-pdfs"]);
    assert!(cli.no_details);
    assert!(cli.no_pdfs);

    let cli = Cli::parse_from(["bdtd-scraper", "termo"]);
    assert!(!cli.no_details);
    assert!(!cli.no_pdfs);
}
