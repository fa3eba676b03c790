// Adapters layer: concrete implementations for external systems (directory, database, http).

pub mod client;
pub mod http;
pub mod ldap;
pub mod postgres;
