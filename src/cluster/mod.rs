pub mod api;
pub mod client;
pub mod types;

pub use api::ClusterApi;
pub use client::{ClientOptions, ClusterClient};
