pub mod bootstrap;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod repository;
pub mod service;
pub mod validation;

pub use config::Config;
pub use error::{Error, Result};
