pub mod config;
pub mod credentials;
pub mod paths;

pub use config::{
    default_scheduler_config, CacheConfig, Config, DatabaseConfig, FetchConfig, GoogleConfig,
    SchedulerConfig, TripadvisorConfig,
};
pub use credentials::CredentialStore;
pub use paths::{container_base_path, PathManager};
