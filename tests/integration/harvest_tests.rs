//! Integration tests for the harvester
//!
//! These tests use wiremock to serve a small catalog and run the full
//! listing → detail → image → sink cycle end-to-end.

use catalog_harvest::config::{parse_config, Config};
use catalog_harvest::crawler::{harvest, Termination};
use catalog_harvest::output::{write_outputs, CsvSink, RecordSink, SqliteSink};
use catalog_harvest::IssueKind;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONFIG_TEMPLATE: &str = r##"
[catalog]
source = "testshop"
listing-url = "@URI@/list?pageSize={page_size}&startIndex={offset}&_mz_partial=true"
page-size = 100

[http]
timeout-secs = 5
connect-timeout-secs = 2
politeness-delay-ms = 0
max-attempts = 2
retry-base-delay-ms = 1

[http.headers]
user-agent = "HarvestTest/1.0"

[listing]
item-selector = "li.productlist-item"
link-selector = "a.mz-productlisting-title"

[fields.item_id]
selector = "div.product-padding dd[itemprop='sku']"

[fields.item_name]
selector = "div.product-padding h1.mz-pagetitle"

[fields.item_description]
selector = "#mobileProductDetailsContainer"
join = "; "

[fields.item_price]
selector = "div.pdpSectionPrice span[itemprop='price']"

[fields.item_image]
selector = "div.mz-pdp-noslick-product-image img"
attribute = "src"

[output]
dir = "@OUT@"
images-dir = "@IMAGES@"
"##;

/// Creates a test configuration pointing at the mock server
fn create_test_config(server: &MockServer, out: &Path) -> Config {
    let text = CONFIG_TEMPLATE
        .replace("@URI@", &server.uri())
        .replace("@OUT@", &out.to_string_lossy())
        .replace("@IMAGES@", &out.join("images").to_string_lossy());
    parse_config(&text).expect("Test config should be valid")
}

fn listing_page(hrefs: &[&str]) -> String {
    let items: String = hrefs
        .iter()
        .map(|href| {
            format!(
                r#"<li class="productlist-item">
                    <a class="mz-productlisting-title" href="{}">Product</a>
                </li>"#,
                href
            )
        })
        .collect();
    format!(
        r#"<html><body><ul class="productlist">{}</ul></body></html>"#,
        items
    )
}

fn detail_page(sku: &str, name: &str, price: Option<&str>, image: &str) -> String {
    let price = price
        .map(|p| {
            format!(
                r#"<div class="pdpSectionPrice"><span itemprop="price">{}</span></div>"#,
                p
            )
        })
        .unwrap_or_default();
    format!(
        r#"<html><body>
        <div class="product-padding">
            <h1 class="mz-pagetitle">
                {name}
            </h1>
            <dl><dd itemprop="sku">{sku}</dd></dl>
        </div>
        <div id="mobileProductDetailsContainer">
            <ul>
                <li>Three stainless steel burners
                </li>
                <li>  Porcelain-enameled lid </li>
            </ul>
        </div>
        {price}
        <div class="mz-pdp-noslick-product-image"><img src="{image}"></div>
        </body></html>"#
    )
}

async fn mount_listing(server: &MockServer, offset: &str, body: String, expected: u64) {
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("startIndex", offset))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(expected)
        .mount(server)
        .await;
}

async fn mount_html(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_harvest_to_both_sinks() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    let host = server.uri().trim_start_matches("http:").to_string();

    mount_listing(
        &server,
        "0",
        listing_page(&[
            "/departments/grills/8005960/weber-spirit",
            "/departments/grills/8005961/char-broil",
        ]),
        1,
    )
    .await;
    mount_listing(&server, "100", listing_page(&[]), 1).await;
    // never requested after the empty page
    mount_listing(&server, "200", listing_page(&["/departments/grills/1/x"]), 0).await;

    // Protocol-relative image: becomes https://, which the mock cannot serve
    mount_html(
        &server,
        "/departments/grills/8005960/weber-spirit",
        detail_page(
            "8005960",
            "Weber Spirit II E-310",
            Some("$499.00"),
            &format!("{}/img/a.jpg", host),
        ),
    )
    .await;
    // No price element; site-relative image
    mount_html(
        &server,
        "/departments/grills/8005961/char-broil",
        detail_page("8005961", "Char-Broil Performance", None, "/img/b.jpg"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/img/b.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0]))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server, out.path());
    let run = harvest(&config, &CancellationToken::new())
        .await
        .expect("Harvest should start");

    assert_eq!(run.termination, Termination::EndOfCatalog);
    assert_eq!(run.summary.pages_fetched, 2);
    assert_eq!(run.records.len(), 2);

    let weber = &run.records[0];
    assert_eq!(weber.item_id, "8005960");
    assert_eq!(weber.item_name, "Weber Spirit II E-310");
    assert_eq!(weber.item_category, "8005960");
    assert_eq!(
        weber.item_description,
        "Three stainless steel burners; Porcelain-enameled lid"
    );
    assert_eq!(weber.item_price, "$499.00");
    assert!(weber.item_image.starts_with("https://"));

    let char_broil = &run.records[1];
    assert_eq!(char_broil.item_price, "");
    assert_eq!(char_broil.item_image, format!("{}/img/b.jpg", server.uri()));

    // The failed image degrades the record but keeps it
    assert_eq!(run.summary.succeeded, 1);
    assert_eq!(run.summary.degraded, 1);
    assert_eq!(run.issues.len(), 1);
    assert_eq!(run.issues[0].kind, IssueKind::AssetMissing);
    assert_eq!(run.issues[0].item_id.as_deref(), Some("8005960"));

    let images = out.path().join("images");
    assert!(images.join("8005961.jpg").exists());
    assert!(!images.join("8005960.jpg").exists());

    let db_path = out.path().join("catalog.db");
    let mut sinks: Vec<Box<dyn RecordSink>> = vec![
        Box::new(CsvSink::new(out.path(), "testshop")),
        Box::new(SqliteSink::new(&db_path, "products", 1000).unwrap()),
    ];
    let outcomes = write_outputs(&run, &mut sinks);
    assert!(outcomes.iter().all(|o| o.is_ok()));

    let csv_path = CsvSink::new(out.path(), "testshop").path_for(run.run_date());
    let mut reader = csv::Reader::from_path(&csv_path).expect("CSV file should exist");
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "8005960");
    assert_eq!(&rows[1][0], "8005961");
    assert_eq!(&rows[1][4], "");

    let conn = rusqlite::Connection::open(&db_path).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_structural_and_fetch_failures_are_reported() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount_listing(
        &server,
        "0",
        listing_page(&["/short/page", "/departments/grills/77/missing", "/departments/grills/78/ok"]),
        1,
    )
    .await;
    mount_listing(&server, "100", listing_page(&[]), 1).await;

    mount_html(
        &server,
        "/short/page",
        detail_page("76", "Too Short", Some("$1"), "/img/76.jpg"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/departments/grills/77/missing"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;
    mount_html(
        &server,
        "/departments/grills/78/ok",
        detail_page("78", "Fine Grill", Some("$2"), "/img/78.jpg"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/img/78.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3]))
        .mount(&server)
        .await;

    let config = create_test_config(&server, out.path());
    let run = harvest(&config, &CancellationToken::new()).await.unwrap();

    assert_eq!(run.records.len(), 1);
    assert_eq!(run.records[0].item_id, "78");
    assert_eq!(run.summary.succeeded, 1);
    assert_eq!(run.summary.degraded, 1);
    assert_eq!(run.summary.failed, 1);

    let kinds: Vec<IssueKind> = run.issues.iter().map(|i| i.kind).collect();
    assert_eq!(kinds, vec![IssueKind::Structural, IssueKind::FetchFailed]);

    // Issues sidecar labels the partial output
    let mut sink = CsvSink::new(out.path(), "testshop");
    sink.write(&run).unwrap();
    let issues = std::fs::read_to_string(sink.issues_path_for(run.run_date())).unwrap();
    assert!(issues.contains("structural"));
    assert!(issues.contains("fetch-failed"));
}

#[tokio::test]
async fn test_sinks_fail_independently() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount_listing(
        &server,
        "0",
        listing_page(&["/departments/grills/5/only"]),
        1,
    )
    .await;
    mount_listing(&server, "100", listing_page(&[]), 1).await;
    mount_html(
        &server,
        "/departments/grills/5/only",
        detail_page("5", "Only Grill", Some("$5"), ""),
    )
    .await;

    let config = create_test_config(&server, out.path());
    let run = harvest(&config, &CancellationToken::new()).await.unwrap();
    assert_eq!(run.records.len(), 1);

    // A regular file where the database directory should be
    let blocker = out.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let mut sinks: Vec<Box<dyn RecordSink>> = vec![
        Box::new(SqliteSink::new(blocker.join("catalog.db"), "products", 1000).unwrap()),
        Box::new(CsvSink::new(out.path(), "testshop")),
    ];
    let outcomes = write_outputs(&run, &mut sinks);

    assert!(!outcomes[0].is_ok());
    assert!(outcomes[1].is_ok());
    assert!(CsvSink::new(out.path(), "testshop")
        .path_for(run.run_date())
        .exists());
}

#[tokio::test]
async fn test_cancellation_keeps_finished_records() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount_listing(
        &server,
        "0",
        listing_page(&[
            "/departments/grills/1/first",
            "/departments/grills/2/second",
            "/departments/grills/3/third",
        ]),
        1,
    )
    .await;
    mount_listing(&server, "100", listing_page(&[]), 0).await;

    for (sku, slug) in [("1", "first"), ("2", "second"), ("3", "third")] {
        Mock::given(method("GET"))
            .and(path(format!("/departments/grills/{}/{}", sku, slug)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(detail_page(sku, "Slow Grill", Some("$9"), ""))
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;
    }

    let config = create_test_config(&server, out.path());
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        trigger.cancel();
    });

    let run = harvest(&config, &cancel).await.unwrap();

    assert!(run.is_cancelled());
    // The detail page in flight when the token fired is finished
    assert_eq!(run.records.len(), 1);
    assert_eq!(run.records[0].item_id, "1");
    assert_eq!(run.summary.detail_urls, 3);
}
