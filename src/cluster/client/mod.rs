mod core;
mod resources;
mod templates;

pub use self::core::{ClientOptions, ClusterClient};
