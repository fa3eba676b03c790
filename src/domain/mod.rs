// Domain layer: request/report models and the ports the core depends on.

pub mod model;
pub mod ports;
