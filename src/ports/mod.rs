//! Port traits the engine depends on; adapters provide the implementations.

pub mod budget_port;
pub mod config_port;
pub mod holding_port;
pub mod log_port;
pub mod quote_port;
