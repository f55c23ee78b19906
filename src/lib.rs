pub mod aggregate;
pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod process;
pub mod registry;
pub mod scraper;

pub use aggregate::Aggregator;
pub use cache::Cache;
pub use config::{Config, PackageGroups};
pub use model::{CombinedReport, DepKind, GroupReport, ProjectReport};
pub use scraper::Scraper;
