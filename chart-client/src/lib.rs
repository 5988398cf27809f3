pub mod client;
pub mod error;
pub mod index;
pub mod registry;

pub use client::ChartClient;
pub use error::LookupError;
pub use index::{ChartRecord, VersionRecord};
