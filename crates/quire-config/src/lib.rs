//! # quire configuration
//!
//! Settings that decide how each dialect's backend is resolved: which
//! native target to connect to, whether a host bridge may be used, and
//! whether the built-in dataset is an acceptable last resort.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quire_config::ConfigLoader;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::load_from_file("quire.toml").await?;
//!     println!("sql target: {:?}", config.sql.target);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod loader;

pub use config::*;
pub use loader::*;
