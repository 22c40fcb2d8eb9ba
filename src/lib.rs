pub mod config;
pub mod feed;
pub mod metrics;
pub mod output;
pub mod profiles;
pub mod scoring;
