pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::ConnectorProperties;
pub use error::ConnectorError;
pub use models::*;
pub use services::*;
