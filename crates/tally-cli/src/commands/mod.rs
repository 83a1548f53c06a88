//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function.

pub mod cancel;
pub mod parse;
pub mod status;
pub mod submit;
