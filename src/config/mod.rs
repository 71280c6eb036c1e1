//! Configuration loading and validation.

mod settings;

pub use settings::{Config, DatabaseConfig, OracleConfig, RenderConfig};
