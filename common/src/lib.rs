// Common library for the scheduling core shared by the scheduler and API binaries

pub mod bootstrap;
pub mod config;
pub mod db;
pub mod errors;
pub mod executor;
pub mod interval;
pub mod models;
pub mod queue;
pub mod scheduler;
pub mod store;
pub mod substitution;
pub mod telemetry;
pub mod worker;
