//! Port traits at the engine's boundaries.

pub mod config_port;
pub mod market_data_port;
pub mod snapshot_port;
