pub mod analytics;
pub mod app;
pub mod assistant;
pub mod backup;
pub mod browse;
pub mod catalog;
pub mod comments;
pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod inbox;
pub mod latency;
pub mod ledger;
pub mod logging;
pub mod metrics;
pub mod ranking;
pub mod session;
pub mod storage;

pub use app::StreamingCatalog;
pub use catalog::Viewer;
pub use config::Config;
pub use error::{CatalogError, Result};
