// fogon-core/src/lib.rs

pub mod cache;
pub mod config;
pub mod feed;
pub mod services;
pub mod test_utils;

pub use config::ChatConfig;
pub use feed::Subscription;
pub use fogon_common::error::Error;
