//! Core logic for badger: a scripted driver for a chat economy bot's badge
//! commands.
//!
//! This crate is transport-agnostic. The Discord adapter lives behind the
//! messaging port in `badger-discord`.

pub mod command;
pub mod config;
pub mod domain;
pub mod errors;
pub mod interpreter;
pub mod logging;
pub mod messaging;
pub mod presets;
pub mod sequence;

pub use errors::{Error, Result};
