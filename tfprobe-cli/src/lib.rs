//! tfprobe CLI library.
//!
//! Exposes the command handlers and the matrix runner for integration
//! testing. In production, `tfprobe` is used as a binary (main.rs).

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;
pub mod runner;
