pub mod config;
pub mod error;
pub mod port;
pub mod state;
pub mod status;
