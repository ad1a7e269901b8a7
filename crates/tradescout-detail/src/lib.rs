pub mod clock;
pub mod enrich;
pub mod fallback_content;
pub mod memo;
pub mod service;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use enrich::{enrich_batch, EnrichItem, EnrichOutcome};
pub use fallback_content::FallbackContent;
pub use memo::DetailMemo;
pub use service::DetailService;
pub use store::{ImageStore, InMemoryListingStore, ListingRecord, ListingStore, StoreError};
