pub mod error;
pub mod factory;
pub mod fallback;
pub mod google;
pub mod normalize;
pub mod traits;
pub mod tripadvisor;

pub use error::SourceError;
pub use factory::{ProviderRegistry, SourceStatus};
pub use fallback::fallback_reviews;
pub use traits::ReviewProvider;
