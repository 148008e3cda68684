//! Command-line front end for the Chord key-value ring.
//!
//! Provides commands for:
//! - Running a ring node over TCP
//! - Interactive lookups and inserts against a running node
//! - Bulk loading a dictionary file
//! - Writing a ring report

pub mod commands;
pub mod config;

pub use commands::{Command, CommandResult};
pub use config::{CliConfig, NodeFileConfig};
