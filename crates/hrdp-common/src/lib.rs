//! HRDP Common Library
//!
//! Shared infrastructure for the HRDP workspace members:
//!
//! - **Error Handling**: the crate-level error and result types
//! - **Logging**: centralized `tracing` subscriber configuration
//!
//! # Example
//!
//! ```no_run
//! use hrdp_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{HrdpError, Result};
