//! HTTP handlers

pub mod files;
pub mod health;
pub mod routes;
pub mod static_files;
