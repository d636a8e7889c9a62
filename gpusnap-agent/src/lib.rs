pub mod collectors;
pub mod error;
pub mod metrics;
pub mod mode;
pub mod snapshot;
