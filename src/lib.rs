pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::client::RegClient;
pub use adapters::http::{router, router_with_timeout};
pub use adapters::ldap::LdapDirectory;
pub use adapters::postgres::PgEvaluationStore;
pub use config::ServiceConfig;
pub use core::resolver::{EvaluationResolver, ResolverSettings};
pub use core::service::RegService;
pub use core::token::{TokenCodec, AUTH_HEADER};
pub use utils::error::{RegError, Result};
