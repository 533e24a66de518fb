//! Runtime dispatch of phase callbacks over live behavior instances.

pub mod behavior;
pub mod bucket;
pub mod command;
pub mod config;
pub mod phase;
pub mod scheduler;
pub mod setup;
