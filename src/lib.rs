pub mod auth;
pub mod config;
pub mod datasource;
pub mod errors;
pub mod executor;
pub mod pipeline;
pub mod server;
