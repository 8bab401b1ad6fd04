pub mod config;
pub mod format;
pub mod models;
pub mod routes;
pub mod schedule;
pub mod session;
pub mod state;
