//! dcsim-core: Core types for the dcsim datacenter simulator
//!
//! This crate provides the building blocks shared by the engine and the CLI:
//! - Jobs, periodic expansion and servers with their power model
//! - Input file and run configuration
//! - Readers for the job, server and dependency files
//! - Result, power and summary reports
//! - Error handling

pub mod config;
pub mod error;
pub mod input;
pub mod job;
pub mod report;
pub mod server;

pub use config::*;
pub use error::*;
pub use input::*;
pub use job::*;
pub use report::*;
pub use server::*;
