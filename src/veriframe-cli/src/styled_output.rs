//! Styled CLI messages.
//!
//! Status messages go to stderr so stdout stays clean for listings and
//! `--json` output. Colors are used only on a terminal and never when
//! `NO_COLOR` is set.

use std::io::{IsTerminal, Write};
use std::sync::OnceLock;

const SUCCESS: &str = "\x1b[38;2;0;245;212m";
const ERROR: &str = "\x1b[38;2;255;107;107m";
const WARNING: &str = "\x1b[38;2;255;200;87m";
const INFO: &str = "\x1b[38;2;72;202;228m";
const DIM: &str = "\x1b[38;2;130;154;177m";
const RESET: &str = "\x1b[0m";

static COLOR_OVERRIDE: OnceLock<bool> = OnceLock::new();

/// Force colors on or off (`--color always|never`). Only the first call counts.
pub fn set_colors_enabled(enabled: bool) {
    let _ = COLOR_OVERRIDE.set(enabled);
}

/// Check if colors should be disabled based on NO_COLOR env var.
fn colors_disabled() -> bool {
    std::env::var("NO_COLOR")
        .map(|v| !v.is_empty() && v != "0" && v.to_lowercase() != "false")
        .unwrap_or(false)
}

#[derive(Debug, Clone, Copy)]
enum MessageType {
    Success,
    Error,
    Warning,
    Info,
    Dim,
}

impl MessageType {
    fn icon(self) -> &'static str {
        match self {
            MessageType::Success => "[OK]",
            MessageType::Error => "[ERROR]",
            MessageType::Warning => "[WARN]",
            MessageType::Info => "[INFO]",
            MessageType::Dim => "-",
        }
    }

    fn color(self) -> &'static str {
        match self {
            MessageType::Success => SUCCESS,
            MessageType::Error => ERROR,
            MessageType::Warning => WARNING,
            MessageType::Info => INFO,
            MessageType::Dim => DIM,
        }
    }
}

fn format_message(msg_type: MessageType, message: &str, use_colors: bool) -> String {
    if use_colors {
        format!("{}{} {}{}", msg_type.color(), msg_type.icon(), message, RESET)
    } else {
        format!("{} {}", msg_type.icon(), message)
    }
}

fn print_styled(msg_type: MessageType, message: &str) {
    let use_colors = match COLOR_OVERRIDE.get() {
        Some(&forced) => forced,
        None => !colors_disabled() && std::io::stderr().is_terminal(),
    };
    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "{}", format_message(msg_type, message, use_colors));
}

pub fn print_success(message: &str) {
    print_styled(MessageType::Success, message);
}

pub fn print_error(message: &str) {
    print_styled(MessageType::Error, message);
}

pub fn print_warning(message: &str) {
    print_styled(MessageType::Warning, message);
}

pub fn print_info(message: &str) {
    print_styled(MessageType::Info, message);
}

/// Secondary information, e.g. hints after an error.
pub fn print_dim(message: &str) {
    print_styled(MessageType::Dim, message);
}
