pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::VerifyConfig;

pub use config::cli::LocalStorage;
pub use config::tolerance::ToleranceConfig;
pub use core::{
    compare::ComparisonEngine, data::DataManager, engine::VerifyEngine,
    pipeline::VerificationPipeline,
};
pub use utils::error::{Result, VerifyError};
