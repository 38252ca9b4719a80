pub mod cache;
pub mod cli;
pub mod commands;
pub mod constants;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod providers;
pub mod scoring;
pub mod services;
pub mod utils;
