pub mod error;
pub mod fetch;
pub mod orchestrator;
pub mod timezone;

pub use error::ScraperError;
pub use fetch::{image_filename, CamFetcher, FetcherConfig};
pub use orchestrator::{run_batch, OrchestratorError, JOIN_GRACE};
pub use timezone::{GoogleTimezone, TimezoneClient, TimezoneError, GOOGLE_TZ_BASE_URL};
