//! Shared foundation for the AdPilot workspace: the domain model, the
//! error taxonomy, and the threshold configuration.

pub mod config;
pub mod error;
pub mod types;

pub use config::OptimizerConfig;
pub use error::{OptimizeError, OptimizeResult, PlatformError};
