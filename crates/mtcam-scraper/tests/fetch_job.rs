//! Integration tests for `CamFetcher::scrape`.
//!
//! Each test stands up a `wiremock` server as the webcam and a `tempfile`
//! directory as the image root, so no real network or filesystem state is
//! touched.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tokio::time::Instant;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mtcam_core::{Camera, Mountain, ScrapeResult, TzOffsets, TIMEOUT_DETAIL};
use mtcam_scraper::{CamFetcher, FetcherConfig};

const TEST_UA: &str = "mtcam-test/0.1";

fn fetcher(image_root: &Path, job_timeout_secs: u64) -> CamFetcher {
    CamFetcher::new(&FetcherConfig {
        request_timeout_secs: 5,
        user_agent: TEST_UA.to_string(),
        image_root: image_root.to_path_buf(),
        horizon_deg: -12.0,
        job_timeout_secs,
    })
    .expect("failed to build test CamFetcher")
}

/// A mountain at 0°N 0°E with no timezone correction.
fn mountain() -> Mountain {
    Mountain {
        id: 1,
        name: "Null Island".to_string(),
        state: "XX".to_string(),
        latitude: 0.0,
        longitude: 0.0,
        elevation_ft: 0.0,
        tz: TzOffsets::default(),
    }
}

fn camera(url: String, file_ext: &str) -> Camera {
    Camera {
        id: 10,
        mountain_id: 1,
        name: "Summit Cam".to_string(),
        latitude: 0.0,
        longitude: 0.0,
        elevation_ft: 0.0,
        url,
        file_ext: file_ext.to_string(),
        is_active: true,
        interval_mins: 5,
    }
}

fn midday() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap()
}

fn midnight() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap()
}

fn far_deadline() -> Instant {
    Instant::now() + Duration::from_secs(30)
}

// ---------------------------------------------------------------------------
// Success
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ok_response_writes_image_and_records_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cam.jpg"))
        .and(header("user-agent", TEST_UA))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg-bytes".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let fetcher = fetcher(tmp.path(), 30);
    let cam = camera(format!("{}/cam.jpg", server.uri()), "JPG");

    let record = fetcher.scrape(&cam, &mountain(), midday(), far_deadline()).await;

    assert_eq!(record.result, ScrapeResult::Success);
    assert_eq!(record.filename, format!("{}.jpg", midday().timestamp()));
    assert!(record.detail.is_empty());
    assert_eq!(record.created_at, midday());

    let stored = tmp
        .path()
        .join("null_island_xx")
        .join("summit_cam")
        .join(&record.filename);
    assert_eq!(std::fs::read(&stored).unwrap(), b"jpeg-bytes");
    assert!(!stored.with_extension("jpg.part").exists());
}

#[tokio::test]
async fn existing_camera_directory_is_reused() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(tmp.path().join("null_island_xx").join("summit_cam")).unwrap();
    let fetcher = fetcher(tmp.path(), 30);
    let cam = camera(format!("{}/cam.jpg", server.uri()), "jpg");

    let record = fetcher.scrape(&cam, &mountain(), midday(), far_deadline()).await;
    assert_eq!(record.result, ScrapeResult::Success, "got {record:?}");
}

#[tokio::test]
async fn leftover_partial_file_is_swept_on_next_capture() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("null_island_xx").join("summit_cam");
    std::fs::create_dir_all(&dir).unwrap();
    let earlier = dir.join("1710932400.jpg");
    std::fs::write(&earlier, b"earlier").unwrap();
    std::fs::write(dir.join("1710932400.jpg.part"), b"half").unwrap();

    let fetcher = fetcher(tmp.path(), 30);
    let cam = camera(format!("{}/cam.jpg", server.uri()), "jpg");
    let record = fetcher.scrape(&cam, &mountain(), midday(), far_deadline()).await;

    assert_eq!(record.result, ScrapeResult::Success, "got {record:?}");
    assert!(!dir.join("1710932400.jpg.part").exists());
    assert!(earlier.exists());
    assert!(dir.join(&record.filename).exists());
}

// ---------------------------------------------------------------------------
// Idle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn outside_daylight_is_idle_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let fetcher = fetcher(tmp.path(), 30);
    let cam = camera(format!("{}/cam.jpg", server.uri()), "jpg");

    let record = fetcher
        .scrape(&cam, &mountain(), midnight(), far_deadline())
        .await;

    assert_eq!(record.result, ScrapeResult::Idle);
    assert!(record.is_consistent());
    assert!(!tmp.path().join("null_island_xx").exists());
}

// ---------------------------------------------------------------------------
// Failure
// ---------------------------------------------------------------------------

#[tokio::test]
async fn server_error_records_failure_and_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let fetcher = fetcher(tmp.path(), 30);
    let cam = camera(format!("{}/cam.jpg", server.uri()), "jpg");

    let record = fetcher.scrape(&cam, &mountain(), midday(), far_deadline()).await;

    assert_eq!(record.result, ScrapeResult::Failure);
    assert!(record.detail.contains("500"), "detail: {}", record.detail);
    assert!(record.filename.is_empty());
    assert!(!tmp.path().join("null_island_xx").exists());
}

#[tokio::test]
async fn connection_refused_records_failure() {
    // Bind and immediately drop a mock server so its port refuses connections.
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };

    let tmp = tempfile::tempdir().unwrap();
    let fetcher = fetcher(tmp.path(), 30);
    let cam = camera(format!("{uri}/cam.jpg"), "jpg");

    let record = fetcher.scrape(&cam, &mountain(), midday(), far_deadline()).await;

    assert_eq!(record.result, ScrapeResult::Failure);
    assert!(!record.detail.is_empty());
}

#[tokio::test]
async fn unwritable_image_root_records_io_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    // A regular file where the mountain directory should go.
    std::fs::write(tmp.path().join("null_island_xx"), b"not a dir").unwrap();
    let fetcher = fetcher(tmp.path(), 30);
    let cam = camera(format!("{}/cam.jpg", server.uri()), "jpg");

    let record = fetcher.scrape(&cam, &mountain(), midday(), far_deadline()).await;

    assert_eq!(record.result, ScrapeResult::Failure);
    assert!(record.detail.contains("I/O error"), "detail: {}", record.detail);
}

// ---------------------------------------------------------------------------
// Deadline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn slow_camera_past_deadline_records_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"late".to_vec())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let fetcher = fetcher(tmp.path(), 30);
    let cam = camera(format!("{}/cam.jpg", server.uri()), "jpg");
    let deadline = Instant::now() + Duration::from_millis(300);

    let record = fetcher.scrape(&cam, &mountain(), midday(), deadline).await;

    assert_eq!(record.result, ScrapeResult::Failure);
    assert_eq!(record.detail, TIMEOUT_DETAIL);
    let dir = tmp.path().join("null_island_xx").join("summit_cam");
    let leftovers = std::fs::read_dir(&dir).map(Iterator::count).unwrap_or(0);
    assert_eq!(leftovers, 0, "no image or partial file should remain");
}
