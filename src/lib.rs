#![forbid(unsafe_code)]

pub mod config;
pub mod errors;
pub mod models;
pub mod notify;
pub mod persistence;
pub mod templates;
pub mod validation;
pub mod web;
pub mod workflow;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
