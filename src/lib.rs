pub mod api;
pub mod config;
pub mod error;
pub mod observability;
pub mod query;
pub mod routing;
pub mod state;
pub mod transport;
