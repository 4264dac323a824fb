//! Configuration and wire models shared by every endpoint.

pub mod config;
pub mod models;
