//! Command-line interface for ollama-relay.
//!
//! The binary in `main.rs` is the composition root: it parses arguments,
//! initialises logging and hands off to a handler. Handlers live here so
//! they can be tested without spawning a process.
#![deny(unsafe_code)]

pub mod commands;
pub mod handlers;
pub mod logging;
pub mod parser;

pub use commands::{Commands, ConfigArgs, ServeArgs};
pub use parser::Cli;
