pub mod config;
pub mod error;
pub mod secret;

pub use config::ChalkConfig;
pub use error::{ChalkError, Result};
pub use secret::SecretString;
