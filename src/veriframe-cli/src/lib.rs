//! Veriframe CLI library.
//!
//! - `cli/` - argument parsing and dispatch
//! - `context` - configuration, token store and session wiring
//! - `*_cmd.rs` - command implementations
//! - `styled_output` - status messages on stderr

pub mod cli;
pub mod context;
pub mod images_cmd;
pub mod login_cmd;
pub mod styled_output;
