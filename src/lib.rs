// Library exports for MiniInsta
// This allows integration tests and the binary to share the same modules

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod flash;
pub mod media;
pub mod routes;
pub mod state;
