pub mod config_port;
pub mod data_port;
pub mod price_port;
