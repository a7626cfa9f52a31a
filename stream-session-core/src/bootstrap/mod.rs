//! Bootstrap module for initializing the stream session broker
//!
//! This module handles:
//! - Configuration loading
//! - Record store connection
//! - Service initialization and dependency injection

pub mod config;
pub mod services;
pub mod store;

pub use config::{load_config, log_effective_config};
pub use services::{init_services, Services};
pub use store::init_repository;
