pub mod import_log;
pub mod review;
pub mod source;

pub use import_log::{ImportLog, ImportStatus};
pub use review::{relative_time, ReviewRecord, AUTHOR_NAME_MAX, SHORT_DESCRIPTION_MAX};
pub use source::ReviewSource;
