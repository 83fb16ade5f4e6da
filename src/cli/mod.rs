//! CLI module for loopos - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for running the loop,
//! inspecting step selection, and scoring text.

pub mod commands;

pub use commands::Cli;
