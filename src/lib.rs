// src/lib.rs
pub mod config;
pub mod models;
pub mod provider;
pub mod aggregator;
pub mod handlers;
pub mod presenter;
pub mod utils;
