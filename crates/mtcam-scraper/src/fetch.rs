//! Single-camera fetch job: solar check, HTTP GET, image write.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use mtcam_core::{daylight_window, AppConfig, Camera, Mountain, ScrapeRecord};
use reqwest::Client;
use tokio::time::Instant;

use crate::error::ScraperError;

/// Settings shared by every fetch job in a tick.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub image_root: PathBuf,
    pub horizon_deg: f64,
    /// Budget for a whole tick, measured from when the jobs are launched.
    pub job_timeout_secs: u64,
}

impl FetcherConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            request_timeout_secs: config.scraper_request_timeout_secs,
            user_agent: config.scraper_user_agent.clone(),
            image_root: config.image_root.clone(),
            horizon_deg: config.solar_horizon_deg,
            job_timeout_secs: config.scraper_job_timeout_secs,
        }
    }
}

/// Fetches webcam images and turns each attempt into a [`ScrapeRecord`].
///
/// One instance is shared (behind an `Arc`) by all jobs of a tick. It holds
/// no mutable state.
#[derive(Debug)]
pub struct CamFetcher {
    client: Client,
    image_root: PathBuf,
    horizon_deg: f64,
    job_timeout: Duration,
}

impl CamFetcher {
    /// Builds a fetcher with the configured request timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(config: &FetcherConfig) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self {
            client,
            image_root: config.image_root.clone(),
            horizon_deg: config.horizon_deg,
            job_timeout: Duration::from_secs(config.job_timeout_secs),
        })
    }

    #[must_use]
    pub fn job_timeout(&self) -> Duration {
        self.job_timeout
    }

    #[must_use]
    pub fn image_root(&self) -> &Path {
        &self.image_root
    }

    /// `<image_root>/<mountain pathname>/<camera pathname>`.
    #[must_use]
    pub fn camera_dir(&self, mountain: &Mountain, camera: &Camera) -> PathBuf {
        self.image_root
            .join(mountain.pathname())
            .join(camera.pathname())
    }

    /// Run one capture attempt and report its outcome.
    ///
    /// Never fails: every error, including running past `deadline`, becomes
    /// a `failure` record. Cameras outside their daylight window yield `idle`
    /// without touching the network.
    pub async fn scrape(
        &self,
        camera: &Camera,
        mountain: &Mountain,
        batch_ts: DateTime<Utc>,
        deadline: Instant,
    ) -> ScrapeRecord {
        let window = daylight_window(mountain, self.horizon_deg, batch_ts);
        if !window.contains(batch_ts) {
            tracing::debug!(
                camera = %camera.name,
                sunrise = %window.sunrise,
                sunset = %window.sunset,
                "outside daylight window"
            );
            return ScrapeRecord::idle(camera.id, batch_ts);
        }

        let dir = self.camera_dir(mountain, camera);
        let filename = image_filename(batch_ts, &camera.file_ext);

        match tokio::time::timeout_at(deadline, self.fetch_to_disk(&camera.url, &dir, &filename))
            .await
        {
            Ok(Ok(bytes)) => {
                tracing::debug!(camera = %camera.name, %filename, bytes, "image saved");
                ScrapeRecord::success(camera.id, batch_ts, filename)
            }
            Ok(Err(e)) => {
                tracing::warn!(camera = %camera.name, url = %camera.url, error = %e, "fetch failed");
                ScrapeRecord::failure(camera.id, batch_ts, e.to_string())
            }
            Err(_) => {
                tracing::warn!(camera = %camera.name, url = %camera.url, "fetch cut off by tick deadline");
                // A write already handed to the blocking pool can still land
                // after this; the next job for this camera sweeps it.
                remove_best_effort(&part_path(&dir, &filename)).await;
                ScrapeRecord::timed_out(camera.id, batch_ts)
            }
        }
    }

    /// GET `url` and store the body as `dir/filename`. Returns the byte count.
    async fn fetch_to_disk(
        &self,
        url: &str,
        dir: &Path,
        filename: &str,
    ) -> Result<usize, ScraperError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response.bytes().await?;

        // Sibling cameras share the mountain directory; create_dir_all
        // tolerates the directory appearing concurrently.
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ScraperError::io(dir, e))?;
        sweep_stale_parts(dir).await;

        let part = part_path(dir, filename);
        let target = dir.join(filename);
        if let Err(e) = write_then_rename(&part, &target, &bytes).await {
            remove_best_effort(&part).await;
            return Err(e);
        }

        Ok(bytes.len())
    }
}

/// `<unix seconds>.<ext>`, extension lowercased.
#[must_use]
pub fn image_filename(batch_ts: DateTime<Utc>, file_ext: &str) -> String {
    format!("{}.{}", batch_ts.timestamp(), file_ext.to_lowercase())
}

fn part_path(dir: &Path, filename: &str) -> PathBuf {
    dir.join(format!("{filename}.part"))
}

async fn write_then_rename(part: &Path, target: &Path, bytes: &[u8]) -> Result<(), ScraperError> {
    tokio::fs::write(part, bytes)
        .await
        .map_err(|e| ScraperError::io(part, e))?;
    tokio::fs::rename(part, target)
        .await
        .map_err(|e| ScraperError::io(target, e))
}

/// Remove `*.part` files left behind by earlier jobs for this camera.
///
/// Only one job per camera runs in a tick, so anything matching is stale.
async fn sweep_stale_parts(dir: &Path) {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "could not list camera directory");
            return;
        }
    };

    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "part") {
                    remove_best_effort(&path).await;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "could not list camera directory");
                break;
            }
        }
    }
}

async fn remove_best_effort(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "removed partial image"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "could not remove partial image"),
    }
}
