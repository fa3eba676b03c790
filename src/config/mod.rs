#[cfg(feature = "cli")]
pub mod cli;
pub mod service_config;

#[cfg(feature = "cli")]
pub use cli::{ClientArgs, ServerArgs};
pub use service_config::ServiceConfig;
