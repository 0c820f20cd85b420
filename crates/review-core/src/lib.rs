pub mod aggregator;
pub mod cache;
pub mod csv_io;
pub mod import;
pub mod query;
pub mod refresh;
pub mod store;

pub use aggregator::ReviewAggregator;
pub use cache::{PageCache, ReviewPage};
pub use csv_io::{export_reviews_csv, parse_reviews_csv, ParsedCsv};
pub use import::{ImportContext, ImportPolicy, ImportService, ImportSummary, RowOutcome};
pub use query::QueryFacade;
pub use refresh::{run_refresh, RefreshOptions, RefreshSummary};
pub use store::{ReviewStore, StoreError, StoreStats};
