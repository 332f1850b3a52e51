pub mod access;
pub mod api;
pub mod bootstrap;
pub mod config;
pub mod database;
pub mod engagement;
pub mod error;
pub mod identity;
pub mod posts;
pub mod telemetry;
pub mod users;
pub mod utils;
pub mod views;
