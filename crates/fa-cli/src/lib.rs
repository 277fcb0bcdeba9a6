//! Command line components for the filing assistant.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod types;
