mod application;
pub mod data;
mod runtime_config;

pub use application::{Application, ApplicationError, RunSummary};
pub use runtime_config::RuntimeConfig;
