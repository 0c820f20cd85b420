pub mod cleanup;
pub mod config;
pub mod daemon;
pub mod export;
pub mod import;
pub mod refresh;
pub mod status;
