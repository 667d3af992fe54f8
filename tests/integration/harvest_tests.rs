//! Integration tests for the harvester
//!
//! These tests use wiremock to serve business websites and run the full
//! harvest cycle end-to-end over the HTTP session backend and a CSV store.

use contact_harvest::config::{Config, DEFAULT_USER_AGENT};
use contact_harvest::crawler::harvest;
use contact_harvest::storage::{load_records, open_store, resume_source, RecordSet, RecordStore};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PLAIN_PAGE: &str = "<html><body><h1>Welcome</h1><p>We sell widgets.</p></body></html>";

/// Creates a test configuration with short timeouts and no delay
fn create_test_config() -> Config {
    let mut config = Config::default();
    config.crawl.main_page_timeout_ms = 2_000;
    config.crawl.secondary_timeout_ms = 2_000;
    config.session.page_load_timeout_ms = 2_000;
    config.run.politeness_delay_ms = 0;
    config
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html; charset=utf-8")
}

async fn serve_root(body: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(body)
        .mount(&server)
        .await;
    server
}

fn write_csv(dir: &TempDir, rows: &[(&str, &str)]) -> PathBuf {
    let input = dir.path().join("businesses.csv");
    let mut writer = csv::Writer::from_path(&input).unwrap();
    writer.write_record(["Name", "Website", "Phone"]).unwrap();
    for (name, website) in rows {
        writer.write_record([*name, *website, "555-0100"]).unwrap();
    }
    writer.flush().unwrap();
    input
}

fn email_cells(records: &RecordSet) -> Vec<String> {
    records
        .records()
        .iter()
        .map(|r| r.email().unwrap_or("").to_string())
        .collect()
}

async fn run(input: &Path, output: &Path, start_from: usize) -> contact_harvest::Result<()> {
    let records = load_records(resume_source(input, output, start_from))?;
    harvest(
        create_test_config(),
        records,
        output,
        start_from,
        std::future::pending(),
    )
    .await
    .map(|_| ())
}

#[tokio::test]
async fn test_full_harvest() {
    // Mailto link on the home page
    let mailto_site = serve_root(html(
        r#"<html><body>Questions? <a href="mailto:owner@acme-widgets.com">Email us</a>
        or sales@acme-widgets.com</body></html>"#,
    ))
    .await;

    // Address only on the contact page
    let contact_site = serve_root(html(PLAIN_PAGE)).await;
    Mock::given(method("GET"))
        .and(path("/contact"))
        .respond_with(html("<html><body>Reach us at office@bakery.net.</body></html>"))
        .mount(&contact_site)
        .await;

    // Server error on the home page
    let broken_site = serve_root(ResponseTemplate::new(500)).await;

    // Nothing anywhere
    let empty_site = serve_root(html(PLAIN_PAGE)).await;

    let dir = TempDir::new().unwrap();
    let input = write_csv(
        &dir,
        &[
            ("Acme Widgets", &mailto_site.uri()),
            ("No Site", ""),
            ("Bakery", &contact_site.uri()),
            ("Broken", &broken_site.uri()),
            ("Blank", "   "),
            ("Quiet", &empty_site.uri()),
        ],
    );
    let output = dir.path().join("businesses_updated_emails.csv");

    let records = load_records(&input).unwrap();
    let summary = harvest(create_test_config(), records, &output, 0, std::future::pending())
        .await
        .unwrap();

    assert_eq!(summary.processed, 5);
    assert_eq!(summary.found, 2);
    assert_eq!(summary.not_found, 1);
    assert_eq!(summary.no_website, 1);
    assert_eq!(summary.errors, 1);
    assert!(!summary.interrupted);
    assert!(summary.is_complete());

    let saved = load_records(&output).unwrap();
    assert_eq!(saved.len(), 6);
    assert_eq!(saved.headers(), &["Name", "Website", "Phone", "Email"]);
    assert_eq!(
        email_cells(&saved),
        vec![
            "owner@acme-widgets.com",
            "",
            "office@bakery.net",
            "Website timeout or error",
            "No website URL provided",
            "No email found on website",
        ]
    );
    let names: Vec<_> = saved.records().iter().map(|r| r.label().to_string()).collect();
    assert_eq!(
        names,
        vec!["Acme Widgets", "No Site", "Bakery", "Broken", "Blank", "Quiet"]
    );
}

#[tokio::test]
async fn test_requests_carry_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", DEFAULT_USER_AGENT))
        .respond_with(html("<html><body>hello@ua-check.org</body></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let input = write_csv(&dir, &[("UA", &server.uri())]);
    let output = dir.path().join("out.csv");

    run(&input, &output, 0).await.unwrap();
    let saved = load_records(&output).unwrap();
    assert_eq!(email_cells(&saved), vec!["hello@ua-check.org"]);
}

#[tokio::test]
async fn test_follows_redirects_and_discovered_links() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/home"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/home"))
        .respond_with(html(
            r#"<html><body><a href="/team">Team</a><a href="/say-hello">Contact</a></body></html>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/say-hello"))
        .respond_with(html("<html><body>Write to hello@found-late.io</body></html>"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let input = write_csv(&dir, &[("Late", &server.uri())]);
    let output = dir.path().join("out.csv");

    run(&input, &output, 0).await.unwrap();
    let saved = load_records(&output).unwrap();
    assert_eq!(email_cells(&saved), vec!["hello@found-late.io"]);
}

#[tokio::test]
async fn test_non_html_home_page_is_unreachable() {
    let server = serve_root(
        ResponseTemplate::new(200).set_body_raw(br#"{"email":"api@json.io"}"#.to_vec(), "application/json"),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let input = write_csv(&dir, &[("Api", &server.uri())]);
    let output = dir.path().join("out.csv");

    run(&input, &output, 0).await.unwrap();
    let saved = load_records(&output).unwrap();
    assert_eq!(email_cells(&saved), vec!["Website timeout or error"]);
}

#[tokio::test]
async fn test_placeholder_addresses_are_ignored() {
    let server = serve_root(html(
        "<html><body><input placeholder='you@example.com'> user@domain.com</body></html>",
    ))
    .await;

    let dir = TempDir::new().unwrap();
    let input = write_csv(&dir, &[("Forms", &server.uri())]);
    let output = dir.path().join("out.csv");

    run(&input, &output, 0).await.unwrap();
    let saved = load_records(&output).unwrap();
    assert_eq!(email_cells(&saved), vec!["No email found on website"]);
}

#[tokio::test]
async fn test_resume_keeps_earlier_outcomes() {
    let first = serve_root(html("<html><body>first@one.com</body></html>")).await;
    let second = serve_root(html("<html><body>second@two.com</body></html>")).await;

    let dir = TempDir::new().unwrap();
    let input = write_csv(&dir, &[("One", &first.uri()), ("Two", &second.uri())]);
    let output = dir.path().join("out.csv");

    // An earlier run finished the first record only
    let mut partial = load_records(&input).unwrap();
    partial
        .get_mut(0)
        .unwrap()
        .set_outcome(&contact_harvest::EmailOutcome::Found("first@one.com".to_string()));
    open_store(&output)
        .unwrap()
        .save(&partial)
        .unwrap();

    run(&input, &output, 1).await.unwrap();

    let saved = load_records(&output).unwrap();
    assert_eq!(email_cells(&saved), vec!["first@one.com", "second@two.com"]);
    assert!(first.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sqlite_records() {
    let server = serve_root(html("<html><body>db@records.org</body></html>")).await;

    let dir = TempDir::new().unwrap();
    let csv_input = write_csv(&dir, &[("Db", &server.uri()), ("None", "")]);
    let db_input = dir.path().join("businesses.db");
    open_store(&db_input)
        .unwrap()
        .save(&load_records(&csv_input).unwrap())
        .unwrap();
    let output = dir.path().join("businesses_updated_emails.db");

    run(&db_input, &output, 0).await.unwrap();

    let saved = load_records(&output).unwrap();
    assert_eq!(email_cells(&saved), vec!["db@records.org", ""]);
}
