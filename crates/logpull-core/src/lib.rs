pub mod config;
pub mod credentials;
pub mod error;
pub mod paths;
pub mod transfer;

pub use error::{LogpullError, Result};
