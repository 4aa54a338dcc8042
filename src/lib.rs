//! Odyssey: state store and progression engine for the learning dashboard.

pub mod api;
pub mod config;
pub mod engine;
pub mod generator;
pub mod models;
pub mod store;
