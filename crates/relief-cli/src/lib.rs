//! Library side of the `relief` binary: argument parsing, command handlers,
//! terminal output and logging setup.

pub mod commands;
pub mod error;
pub mod logging;
pub mod output;
pub mod router;
