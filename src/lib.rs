//! Book collection REST API with a runtime-switchable database target.

pub mod api;
pub mod book;
pub mod config;
pub mod connection;
pub mod import;
pub mod repository;
pub mod store;
pub mod telemetry;
