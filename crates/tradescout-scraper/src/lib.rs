pub mod clean;
pub mod dedupe;
pub mod error;
pub mod fetch;
pub mod images;
pub mod normalize;
pub mod price;
pub mod sources;

pub use error::ScrapeError;
pub use fetch::PageFetcher;
pub use normalize::normalize;
pub use sources::{parse_detail, source_for_url, Source};
