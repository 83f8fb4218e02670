pub mod engine;
pub mod executor;
pub mod planner;
pub mod types;

pub use engine::{CrawlEngine, HttpCrawlEngine};
pub use executor::CrawlExecutor;
pub use types::{FetchOptions, PageFetch};
