//! dcsim-scheduler: Simulation engine for dcsim
//!
//! This crate drives the datacenter clock and places jobs on servers:
//! - Server election strategies
//! - Dependency layering into branches and waves
//! - The six dispatch policies
//! - EDF feasibility analysis
//! - The tick-by-tick engine

pub mod datacenter;
pub mod election;
pub mod feasibility;
pub mod layering;
pub mod policies;
pub mod queue;

pub use datacenter::Datacenter;
pub use election::{ElectionStrategy, FirstAvailable, MostPowerfulAvailable};
pub use feasibility::Feasibility;
pub use layering::Layering;
pub use policies::DispatchOutcome;
pub use queue::WaitingQueue;
