//! # Masjid Directory
//!
//! Binary support crate for the masjid directory. It wires the PostgreSQL
//! store and the directory service from the environment, makes sure the
//! schema exists, and prints directory reports as JSON.
//!
//! ## Modules
//!
//! - [`config`]: Environment settings and dependency initialization
//! - [`cli`]: Command line arguments
//! - [`report`]: Runs a command and writes its JSON output
//! - [`errors`]: Error types for the binary

pub mod cli;
pub mod config;
pub mod errors;
pub mod report;

pub use config::{ConnectionMode, DatabaseSettings, Dependencies};
pub use errors::AppError;
